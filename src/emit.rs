use apollo_compiler::ast;
use apollo_compiler::ast::Argument;
use apollo_compiler::ast::Directive;
use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::DirectiveLocation;
use apollo_compiler::ast::Value;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::name;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::EnumType;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::InterfaceType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::ScalarType;
use apollo_compiler::ty;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use tracing::debug;

use crate::directives::SPECIFIED_DIRECTIVE_NAMES;
use crate::fieldset::FieldSet;
use crate::index::CompositionIndex;
use crate::metadata::SupergraphMetadata;
use crate::metadata::TypeMetadata;
use crate::subgraph::Subgraphs;

/// Serializes the merged schema as supergraph SDL in the join-spec format:
/// a `@core` preamble, the `join__*` machinery, and `@join__owner`,
/// `@join__type` and `@join__field` annotations derived from the metadata.
///
/// Output is built as a fresh [`Schema`] and rendered through the standard
/// serializer, with directive definitions and types inserted in lexicographic
/// order. Parsing the result and serializing it again reproduces the exact
/// same text.
pub(crate) fn emit_supergraph_sdl(
    schema: &Schema,
    metadata: &SupergraphMetadata,
    index: &CompositionIndex,
    subgraphs: &Subgraphs,
) -> String {
    let graph_enum_values = graph_enum_values(subgraphs);
    let mut supergraph = Schema::new();

    {
        let schema_definition = supergraph.schema_definition.make_mut();
        schema_definition.query = schema.schema_definition.query.clone();
        schema_definition.mutation = schema.schema_definition.mutation.clone();
        schema_definition.subscription = schema.schema_definition.subscription.clone();
        schema_definition
            .directives
            .push(Component::new(core_feature("https://specs.apollo.dev/core/v0.1")));
        schema_definition
            .directives
            .push(Component::new(core_feature("https://specs.apollo.dev/join/v0.1")));
        for feature in &index.other_known_directive_usages {
            schema_definition.directives.push(Component::new(core_feature(&format!(
                "https://specs.apollo.dev/{feature}/v0.1"
            ))));
        }
    }

    let mut directive_definitions = vec![
        core_directive_definition(),
        join_field_directive_definition(),
        join_graph_directive_definition(),
        join_owner_directive_definition(),
        join_type_directive_definition(),
    ];
    for (name, definition) in &schema.directive_definitions {
        if SPECIFIED_DIRECTIVE_NAMES.contains(&name.as_str()) {
            continue;
        }
        directive_definitions.push(definition.as_ref().clone());
    }
    directive_definitions.sort_by(|a, b| a.name.cmp(&b.name));
    for definition in directive_definitions {
        supergraph
            .directive_definitions
            .insert(definition.name.clone(), Node::new(definition));
    }

    let mut types: Vec<(Name, ExtendedType)> = vec![
        (
            name!("join__FieldSet"),
            ExtendedType::Scalar(Node::new(field_set_scalar())),
        ),
        (
            name!("join__Graph"),
            ExtendedType::Enum(Node::new(graph_enum(subgraphs, &graph_enum_values))),
        ),
    ];
    for (type_name, extended_type) in &schema.types {
        if extended_type.is_built_in() {
            continue;
        }
        types.push((
            type_name.clone(),
            emit_type(type_name, extended_type, metadata, &graph_enum_values),
        ));
    }
    types.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (type_name, extended_type) in types {
        supergraph.types.insert(type_name, extended_type);
    }

    let sdl = supergraph.to_string();
    debug!(bytes = sdl.len(), "serialized supergraph SDL");
    sdl
}

/// `join__Graph` enum value for each subgraph: the name uppercased with
/// non-alphanumerics replaced by underscores, prefixed when it would start
/// with a digit, and suffixed with a counter on collision.
fn graph_enum_values(subgraphs: &Subgraphs) -> IndexMap<String, Name> {
    let mut assigned: IndexMap<String, Name> = IndexMap::default();
    let mut used: IndexSet<String> = IndexSet::default();
    for subgraph in subgraphs.iter() {
        let mut base: String = subgraph
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        if base.chars().next().map_or(true, |c| c.is_ascii_digit()) {
            base.insert(0, '_');
        }
        let mut candidate = base.clone();
        let mut counter = 1;
        while !used.insert(candidate.clone()) {
            counter += 1;
            candidate = format!("{base}_{counter}");
        }
        assigned.insert(subgraph.name.clone(), Name::new_unchecked(&candidate));
    }
    assigned
}

fn emit_type(
    type_name: &Name,
    extended_type: &ExtendedType,
    metadata: &SupergraphMetadata,
    graph_enum_values: &IndexMap<String, Name>,
) -> ExtendedType {
    let type_metadata = metadata.types.get(type_name);
    match extended_type {
        ExtendedType::Object(object) => {
            let mut directives = type_join_directives(type_metadata, graph_enum_values, true);
            directives.extend(kept_component_directives(&object.directives).0);
            let fields = object
                .fields
                .iter()
                .map(|(field_name, field)| {
                    (
                        field_name.clone(),
                        Component::new(emit_field(
                            type_name,
                            field_name,
                            field,
                            type_metadata,
                            metadata,
                            graph_enum_values,
                            true,
                        )),
                    )
                })
                .collect();
            ExtendedType::Object(Node::new(ObjectType {
                description: object.description.clone(),
                name: object.name.clone(),
                implements_interfaces: object.implements_interfaces.clone(),
                directives,
                fields,
            }))
        }
        ExtendedType::Interface(interface) => {
            let mut directives = type_join_directives(type_metadata, graph_enum_values, false);
            directives.extend(kept_component_directives(&interface.directives).0);
            let fields = interface
                .fields
                .iter()
                .map(|(field_name, field)| {
                    (
                        field_name.clone(),
                        Component::new(emit_field(
                            type_name,
                            field_name,
                            field,
                            type_metadata,
                            metadata,
                            graph_enum_values,
                            false,
                        )),
                    )
                })
                .collect();
            ExtendedType::Interface(Node::new(InterfaceType {
                description: interface.description.clone(),
                name: interface.name.clone(),
                implements_interfaces: interface.implements_interfaces.clone(),
                directives,
                fields,
            }))
        }
        ExtendedType::Union(union_) => {
            let mut union_ = union_.as_ref().clone();
            union_.directives = kept_component_directives(&union_.directives);
            ExtendedType::Union(Node::new(union_))
        }
        ExtendedType::Enum(enum_) => {
            let mut enum_ = enum_.as_ref().clone();
            enum_.directives = kept_component_directives(&enum_.directives);
            for value in enum_.values.values_mut() {
                let value = value.make_mut();
                value.directives = kept_ast_directives(&value.directives);
            }
            ExtendedType::Enum(Node::new(enum_))
        }
        ExtendedType::Scalar(scalar) => {
            let mut scalar = scalar.as_ref().clone();
            scalar.directives = kept_component_directives(&scalar.directives);
            ExtendedType::Scalar(Node::new(scalar))
        }
        ExtendedType::InputObject(input) => {
            let mut input = input.as_ref().clone();
            input.directives = kept_component_directives(&input.directives);
            for field in input.fields.values_mut() {
                let field = field.make_mut();
                field.directives = kept_ast_directives(&field.directives);
            }
            ExtendedType::InputObject(Node::new(input))
        }
    }
}

/// `@join__owner` (objects only) and one `@join__type` per declared key,
/// owning service first.
fn type_join_directives(
    type_metadata: Option<&TypeMetadata>,
    graph_enum_values: &IndexMap<String, Name>,
    is_object: bool,
) -> apollo_compiler::schema::DirectiveList {
    let mut directives = apollo_compiler::schema::DirectiveList(Vec::new());
    let Some(type_metadata) = type_metadata else {
        return directives;
    };
    let Some(owner) = type_metadata.service_name.as_deref() else {
        return directives;
    };
    if type_metadata.keys.is_empty() {
        return directives;
    }
    let Some(owner_value) = graph_enum_values.get(owner) else {
        return directives;
    };
    if is_object {
        directives.push(Component::new(Directive {
            name: name!("join__owner"),
            arguments: vec![argument(name!("graph"), Value::Enum(owner_value.clone()))],
        }));
    }
    for key in type_metadata.keys.get(owner).into_iter().flatten() {
        directives.push(Component::new(join_type_application(owner_value, key)));
    }
    for (service_name, keys) in &type_metadata.keys {
        if service_name == owner {
            continue;
        }
        let Some(value) = graph_enum_values.get(service_name) else {
            continue;
        };
        for key in keys {
            directives.push(Component::new(join_type_application(value, key)));
        }
    }
    directives
}

fn join_type_application(graph: &Name, key: &FieldSet) -> Directive {
    Directive {
        name: name!("join__type"),
        arguments: vec![
            argument(name!("graph"), Value::Enum(graph.clone())),
            argument(name!("key"), Value::String(key.to_string())),
        ],
    }
}

fn emit_field(
    type_name: &Name,
    field_name: &Name,
    field: &Component<ast::FieldDefinition>,
    type_metadata: Option<&TypeMetadata>,
    metadata: &SupergraphMetadata,
    graph_enum_values: &IndexMap<String, Name>,
    with_join_field: bool,
) -> ast::FieldDefinition {
    let mut out = ast::FieldDefinition {
        description: field.description.clone(),
        name: field.name.clone(),
        arguments: field.arguments.clone(),
        ty: field.ty.clone(),
        directives: kept_ast_directives(&field.directives),
    };
    let field_metadata = metadata
        .fields
        .get(&(type_name.clone(), field_name.clone()));
    if with_join_field {
        let owner = type_metadata.and_then(|tm| tm.service_name.as_deref());
        // Fields of an entity default to its owner; a field only names a graph
        // of its own when an extension or `@provides` moved it elsewhere.
        let default_owner = type_metadata
            .is_some_and(|tm| !tm.keys.is_empty())
            .then_some(owner)
            .flatten();
        let service_name = field_metadata
            .and_then(|fm| fm.service_name.as_deref())
            .or(default_owner);
        let requires = field_metadata.and_then(|fm| fm.requires.as_ref());
        let provides = field_metadata.and_then(|fm| fm.provides.as_ref());
        let informative =
            requires.is_some() || provides.is_some() || (service_name.is_some() && service_name != owner);
        if informative {
            if let Some(value) = service_name.and_then(|name| graph_enum_values.get(name)) {
                let mut arguments = vec![argument(name!("graph"), Value::Enum(value.clone()))];
                if let Some(requires) = requires {
                    arguments.push(argument(
                        name!("requires"),
                        Value::String(requires.to_string()),
                    ));
                }
                if let Some(provides) = provides {
                    arguments.push(argument(
                        name!("provides"),
                        Value::String(provides.to_string()),
                    ));
                }
                out.directives.push(Node::new(Directive {
                    name: name!("join__field"),
                    arguments,
                }));
            }
        }
        // Tag usages follow object fields only, like the join annotations.
        if let Some(field_metadata) = field_metadata {
            out.directives
                .extend(field_metadata.other_known_directive_usages.iter().cloned());
        }
    }
    out
}

/// Directives on output types keep only `@deprecated` and `@specifiedBy`;
/// federation inputs were consumed during composition.
fn kept_component_directives(
    directives: &apollo_compiler::schema::DirectiveList,
) -> apollo_compiler::schema::DirectiveList {
    apollo_compiler::schema::DirectiveList(
        directives
            .iter()
            .filter(|directive| is_output_directive(&directive.name))
            .cloned()
            .collect(),
    )
}

fn kept_ast_directives(directives: &ast::DirectiveList) -> ast::DirectiveList {
    ast::DirectiveList(
        directives
            .iter()
            .filter(|directive| is_output_directive(&directive.name))
            .cloned()
            .collect(),
    )
}

fn is_output_directive(name: &str) -> bool {
    name == "deprecated" || name == "specifiedBy"
}

fn argument(name: Name, value: Value) -> Node<Argument> {
    Node::new(Argument {
        name,
        value: Node::new(value),
    })
}

fn core_feature(feature: &str) -> Directive {
    Directive {
        name: name!("core"),
        arguments: vec![argument(
            name!("feature"),
            Value::String(feature.to_string()),
        )],
    }
}

fn string_input_value(name: Name) -> Node<ast::InputValueDefinition> {
    Node::new(ast::InputValueDefinition {
        description: None,
        name,
        ty: ty!(String!).into(),
        default_value: None,
        directives: Default::default(),
    })
}

fn core_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("core"),
        arguments: vec![string_input_value(name!("feature"))],
        repeatable: true,
        locations: vec![DirectiveLocation::Schema],
    }
}

fn join_field_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("join__field"),
        arguments: vec![
            Node::new(ast::InputValueDefinition {
                description: None,
                name: name!("graph"),
                ty: ty!(join__Graph).into(),
                default_value: None,
                directives: Default::default(),
            }),
            Node::new(ast::InputValueDefinition {
                description: None,
                name: name!("requires"),
                ty: ty!(join__FieldSet).into(),
                default_value: None,
                directives: Default::default(),
            }),
            Node::new(ast::InputValueDefinition {
                description: None,
                name: name!("provides"),
                ty: ty!(join__FieldSet).into(),
                default_value: None,
                directives: Default::default(),
            }),
        ],
        repeatable: false,
        locations: vec![DirectiveLocation::FieldDefinition],
    }
}

fn join_graph_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("join__graph"),
        arguments: vec![
            string_input_value(name!("name")),
            string_input_value(name!("url")),
        ],
        repeatable: false,
        locations: vec![DirectiveLocation::EnumValue],
    }
}

fn join_owner_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("join__owner"),
        arguments: vec![Node::new(ast::InputValueDefinition {
            description: None,
            name: name!("graph"),
            ty: ty!(join__Graph!).into(),
            default_value: None,
            directives: Default::default(),
        })],
        repeatable: false,
        locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
    }
}

fn join_type_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("join__type"),
        arguments: vec![
            Node::new(ast::InputValueDefinition {
                description: None,
                name: name!("graph"),
                ty: ty!(join__Graph!).into(),
                default_value: None,
                directives: Default::default(),
            }),
            Node::new(ast::InputValueDefinition {
                description: None,
                name: name!("key"),
                ty: ty!(join__FieldSet).into(),
                default_value: None,
                directives: Default::default(),
            }),
        ],
        repeatable: true,
        locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
    }
}

fn field_set_scalar() -> ScalarType {
    ScalarType {
        description: None,
        name: name!("join__FieldSet"),
        directives: Default::default(),
    }
}

fn graph_enum(subgraphs: &Subgraphs, graph_enum_values: &IndexMap<String, Name>) -> EnumType {
    let mut values = IndexMap::default();
    for subgraph in subgraphs.iter() {
        let Some(value_name) = graph_enum_values.get(&subgraph.name) else {
            continue;
        };
        values.insert(
            value_name.clone(),
            Component::new(ast::EnumValueDefinition {
                description: None,
                value: value_name.clone(),
                directives: ast::DirectiveList(vec![Node::new(Directive {
                    name: name!("join__graph"),
                    arguments: vec![
                        argument(name!("name"), Value::String(subgraph.name.clone())),
                        argument(name!("url"), Value::String(subgraph.url.clone())),
                    ],
                })]),
            }),
        );
    }
    EnumType {
        description: None,
        name: name!("join__Graph"),
        directives: Default::default(),
        values,
    }
}
