use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::Name;
use apollo_compiler::Node;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::debug;

use crate::directives::is_executable_location;
use crate::directives::string_argument_value;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::fieldset::FieldSet;
use crate::metadata::ExternalFieldRecord;
use crate::strip;
use crate::subgraph::Subgraphs;

/// One service's definition or extension of a type. `service_name` is `None`
/// for definitions the indexer synthesizes (empty root types).
#[derive(Clone, Debug)]
pub(crate) struct ServiceDefinition {
    pub(crate) service_name: Option<String>,
    pub(crate) definition: ast::Definition,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TypeOwnership {
    /// The first service to define (not extend) the type.
    pub(crate) owning_service: Option<String>,
    /// Field name to the service whose extension introduced it. The last
    /// extension to declare a field wins.
    pub(crate) extension_fields: IndexMap<Name, String>,
}

/// Everything the downstream stages need to know about the subgraph inputs,
/// gathered in a single pass. Maps preserve first-encounter order so the rest
/// of the pipeline is deterministic for free.
#[derive(Debug, Default)]
pub(crate) struct CompositionIndex {
    pub(crate) type_definitions: IndexMap<Name, Vec<ServiceDefinition>>,
    pub(crate) type_extensions: IndexMap<Name, Vec<ServiceDefinition>>,
    pub(crate) type_ownership: IndexMap<Name, TypeOwnership>,
    /// Executable directive definitions, per directive then per service.
    pub(crate) directive_definitions: IndexMap<Name, IndexMap<String, Node<ast::DirectiveDefinition>>>,
    pub(crate) external_fields: Vec<ExternalFieldRecord>,
    /// `@key` selections per type, then per declaring service.
    pub(crate) keys: IndexMap<Name, IndexMap<String, Vec<FieldSet>>>,
    /// Types whose every definition is structurally identical across services.
    pub(crate) value_types: IndexSet<Name>,
    /// `@tag` applications per type and field, in encounter order.
    pub(crate) field_tag_usages: IndexMap<Name, IndexMap<Name, Vec<Node<ast::Directive>>>>,
    /// Names of recognized non-federation directives seen at least once.
    pub(crate) other_known_directive_usages: IndexSet<Name>,
    /// Malformed field-set strings and similar per-definition problems.
    pub(crate) errors: Vec<CompositionError>,
}

pub(crate) fn build_index(subgraphs: &Subgraphs) -> CompositionIndex {
    let mut index = CompositionIndex::default();
    for subgraph in subgraphs.iter() {
        let stripped = strip::strip_external_fields(&subgraph.document, &subgraph.name);
        let document = strip::strip_type_system_directives(&stripped.document);
        for definition in &document.definitions {
            let reclassified = extends_reclassified(definition);
            let definition = reclassified.as_ref().unwrap_or(definition);
            match definition {
                ast::Definition::DirectiveDefinition(directive) => {
                    index_directive_definition(&mut index, &subgraph.name, directive);
                }
                _ if is_type_definition(definition) => {
                    index_type_definition(&mut index, &subgraph.name, definition);
                }
                _ if is_type_extension(definition) => {
                    index_type_extension(&mut index, &subgraph.name, definition);
                }
                // Schema definitions and operations carry nothing the merge
                // needs; root types are resolved by name.
                _ => {}
            }
        }
        for record in &stripped.external_fields {
            capture_tag_usages(&mut index, &record.parent_type_name, &record.field);
        }
        index.external_fields.extend(stripped.external_fields);
    }
    synthesize_root_types(&mut index);
    debug!(
        types = index.type_definitions.len(),
        extensions = index.type_extensions.len(),
        value_types = index.value_types.len(),
        "indexed subgraph documents"
    );
    index
}

/// `type T @extends { ... }` is the annotation form of `extend type T`; both
/// index identically.
fn extends_reclassified(definition: &ast::Definition) -> Option<ast::Definition> {
    match definition {
        ast::Definition::ObjectTypeDefinition(object) if object.directives.has("extends") => {
            Some(ast::Definition::ObjectTypeExtension(Node::new(
                ast::ObjectTypeExtension {
                    name: object.name.clone(),
                    implements_interfaces: object.implements_interfaces.clone(),
                    directives: object.directives.clone(),
                    fields: object.fields.clone(),
                },
            )))
        }
        ast::Definition::InterfaceTypeDefinition(interface)
            if interface.directives.has("extends") =>
        {
            Some(ast::Definition::InterfaceTypeExtension(Node::new(
                ast::InterfaceTypeExtension {
                    name: interface.name.clone(),
                    implements_interfaces: interface.implements_interfaces.clone(),
                    directives: interface.directives.clone(),
                    fields: interface.fields.clone(),
                },
            )))
        }
        _ => None,
    }
}

fn is_type_definition(definition: &ast::Definition) -> bool {
    matches!(
        definition,
        ast::Definition::ObjectTypeDefinition(_)
            | ast::Definition::InterfaceTypeDefinition(_)
            | ast::Definition::UnionTypeDefinition(_)
            | ast::Definition::EnumTypeDefinition(_)
            | ast::Definition::ScalarTypeDefinition(_)
            | ast::Definition::InputObjectTypeDefinition(_)
    )
}

fn is_type_extension(definition: &ast::Definition) -> bool {
    matches!(
        definition,
        ast::Definition::ObjectTypeExtension(_)
            | ast::Definition::InterfaceTypeExtension(_)
            | ast::Definition::UnionTypeExtension(_)
            | ast::Definition::EnumTypeExtension(_)
            | ast::Definition::ScalarTypeExtension(_)
            | ast::Definition::InputObjectTypeExtension(_)
    )
}

fn index_type_definition(
    index: &mut CompositionIndex,
    service_name: &str,
    definition: &ast::Definition,
) {
    let Some(type_name) = definition.name() else {
        return;
    };
    collect_keys(index, service_name, type_name, definition);
    for field in definition_fields(definition) {
        capture_tag_usages(index, type_name, field);
    }

    // The first service to define a type owns it; later definitions of the
    // same name either mark a value type or get flagged downstream.
    let ownership = index.type_ownership.entry(type_name.clone()).or_default();
    if ownership.owning_service.is_none() {
        ownership.owning_service = Some(service_name.to_owned());
    }

    let service_definition = ServiceDefinition {
        service_name: Some(service_name.to_owned()),
        definition: definition.clone(),
    };
    match index.type_definitions.get_mut(type_name) {
        Some(existing) => {
            // One structurally identical pair is enough: a later diverging
            // definition does not take the status away.
            if let Some(last) = existing.last() {
                if type_nodes_are_equivalent(&last.definition, definition) {
                    index.value_types.insert(type_name.clone());
                }
            }
            existing.push(service_definition);
        }
        None => {
            index
                .type_definitions
                .insert(type_name.clone(), vec![service_definition]);
        }
    }
}

fn index_type_extension(
    index: &mut CompositionIndex,
    service_name: &str,
    definition: &ast::Definition,
) {
    let Some(type_name) = definition.name() else {
        return;
    };
    collect_keys(index, service_name, type_name, definition);

    let ownership = index.type_ownership.entry(type_name.clone()).or_default();
    for field in definition_fields(definition) {
        ownership
            .extension_fields
            .insert(field.name.clone(), service_name.to_owned());
    }
    if let ast::Definition::EnumTypeExtension(enum_) = definition {
        for value in &enum_.values {
            ownership
                .extension_fields
                .insert(value.value.clone(), service_name.to_owned());
        }
    }
    if let ast::Definition::InputObjectTypeExtension(input) = definition {
        for field in &input.fields {
            ownership
                .extension_fields
                .insert(field.name.clone(), service_name.to_owned());
        }
    }
    for field in definition_fields(definition) {
        capture_tag_usages(index, type_name, field);
    }

    index
        .type_extensions
        .entry(type_name.clone())
        .or_default()
        .push(ServiceDefinition {
            service_name: Some(service_name.to_owned()),
            definition: definition.clone(),
        });
}

fn index_directive_definition(
    index: &mut CompositionIndex,
    service_name: &str,
    definition: &Node<ast::DirectiveDefinition>,
) {
    let executable_locations: Vec<_> = definition
        .locations
        .iter()
        .filter(|location| is_executable_location(location))
        .cloned()
        .collect();
    // Purely type-system directives never compose; their applications were
    // already stripped.
    if executable_locations.is_empty() {
        return;
    }
    let mut executable = definition.as_ref().clone();
    executable.locations = executable_locations;
    index
        .directive_definitions
        .entry(definition.name.clone())
        .or_default()
        .entry(service_name.to_owned())
        .or_insert_with(|| Node::new(executable));
}

fn collect_keys(
    index: &mut CompositionIndex,
    service_name: &str,
    type_name: &Name,
    definition: &ast::Definition,
) {
    for key in definition.directives().get_all("key") {
        let Some(fields) = string_argument_value(key, "fields") else {
            continue;
        };
        match FieldSet::parse(fields) {
            Ok(field_set) => {
                index
                    .keys
                    .entry(type_name.clone())
                    .or_default()
                    .entry(service_name.to_owned())
                    .or_default()
                    .push(field_set);
            }
            Err(message) => {
                index.errors.push(CompositionError::with_nodes(
                    ErrorCode::GraphqlValidationFailed,
                    format!(
                        "[{service_name}] {type_name} -> @key specifies invalid fields: {message}"
                    ),
                    vec![type_name.to_string()],
                ));
            }
        }
    }
}

fn definition_fields(definition: &ast::Definition) -> &[Node<ast::FieldDefinition>] {
    match definition {
        ast::Definition::ObjectTypeDefinition(object) => &object.fields,
        ast::Definition::ObjectTypeExtension(object) => &object.fields,
        ast::Definition::InterfaceTypeDefinition(interface) => &interface.fields,
        ast::Definition::InterfaceTypeExtension(interface) => &interface.fields,
        _ => &[],
    }
}

fn capture_tag_usages(
    index: &mut CompositionIndex,
    type_name: &Name,
    field: &Node<ast::FieldDefinition>,
) {
    let tags: Vec<Node<ast::Directive>> = field.directives.get_all("tag").cloned().collect();
    if tags.is_empty() {
        return;
    }
    index.other_known_directive_usages.insert(name!("tag"));
    index
        .field_tag_usages
        .entry(type_name.clone())
        .or_default()
        .entry(field.name.clone())
        .or_default()
        .extend(tags);
}

/// A schema without a `Query` definition still composes: an empty one is
/// synthesized so extensions have something to land on. Same for `Mutation`
/// and `Subscription`, but only when some service extends them.
fn synthesize_root_types(index: &mut CompositionIndex) {
    let query = name!("Query");
    if !index.type_definitions.contains_key(&query) {
        index
            .type_definitions
            .insert(query.clone(), vec![empty_object_definition(query)]);
    }
    for root in [name!("Mutation"), name!("Subscription")] {
        if index.type_extensions.contains_key(&root)
            && !index.type_definitions.contains_key(&root)
        {
            index
                .type_definitions
                .insert(root.clone(), vec![empty_object_definition(root)]);
        }
    }
}

fn empty_object_definition(name: Name) -> ServiceDefinition {
    ServiceDefinition {
        service_name: None,
        definition: ast::Definition::ObjectTypeDefinition(Node::new(ast::ObjectTypeDefinition {
            description: None,
            name,
            implements_interfaces: Vec::new(),
            directives: Default::default(),
            fields: Vec::new(),
        })),
    }
}

/// Structural equivalence for value-type detection: same kind, same fields
/// with the same types and arguments. Field order and descriptions are
/// irrelevant; directive applications are compared only through the shapes
/// they survive in after stripping.
fn type_nodes_are_equivalent(a: &ast::Definition, b: &ast::Definition) -> bool {
    match (a, b) {
        (
            ast::Definition::ObjectTypeDefinition(a),
            ast::Definition::ObjectTypeDefinition(b),
        ) => {
            name_sets_equal(&a.implements_interfaces, &b.implements_interfaces)
                && fields_equivalent(&a.fields, &b.fields)
        }
        (
            ast::Definition::InterfaceTypeDefinition(a),
            ast::Definition::InterfaceTypeDefinition(b),
        ) => {
            name_sets_equal(&a.implements_interfaces, &b.implements_interfaces)
                && fields_equivalent(&a.fields, &b.fields)
        }
        (ast::Definition::UnionTypeDefinition(a), ast::Definition::UnionTypeDefinition(b)) => {
            name_sets_equal(&a.members, &b.members)
        }
        (ast::Definition::EnumTypeDefinition(a), ast::Definition::EnumTypeDefinition(b)) => {
            let a_values: IndexSet<&Name> = a.values.iter().map(|v| &v.value).collect();
            let b_values: IndexSet<&Name> = b.values.iter().map(|v| &v.value).collect();
            a_values == b_values
        }
        (ast::Definition::ScalarTypeDefinition(_), ast::Definition::ScalarTypeDefinition(_)) => {
            true
        }
        (
            ast::Definition::InputObjectTypeDefinition(a),
            ast::Definition::InputObjectTypeDefinition(b),
        ) => input_values_equivalent(&a.fields, &b.fields),
        _ => false,
    }
}

fn name_sets_equal(a: &[Name], b: &[Name]) -> bool {
    let a: IndexSet<&Name> = a.iter().collect();
    let b: IndexSet<&Name> = b.iter().collect();
    a == b
}

fn fields_equivalent(
    a: &[Node<ast::FieldDefinition>],
    b: &[Node<ast::FieldDefinition>],
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|field_a| {
        b.iter().any(|field_b| {
            field_a.name == field_b.name
                && field_a.ty == field_b.ty
                && input_values_equivalent(&field_a.arguments, &field_b.arguments)
        })
    })
}

fn input_values_equivalent(
    a: &[Node<ast::InputValueDefinition>],
    b: &[Node<ast::InputValueDefinition>],
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|value_a| {
        b.iter().any(|value_b| {
            value_a.name == value_b.name
                && value_a.ty == value_b.ty
                && value_a.default_value == value_b.default_value
        })
    })
}
