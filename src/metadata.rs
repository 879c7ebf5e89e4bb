use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::directives::is_repeatable_other_known_directive;
use crate::directives::string_argument_value;
use crate::fieldset::FieldSet;
use crate::index::CompositionIndex;

/// A field declared by a non-owning service solely so its `@key`, `@requires`
/// or `@provides` selections can reference it.
#[derive(Clone, Debug)]
pub struct ExternalFieldRecord {
    pub parent_type_name: Name,
    pub service_name: String,
    pub field: Node<ast::FieldDefinition>,
}

/// Federation facts about one merged type.
#[derive(Clone, Debug, Default)]
pub struct TypeMetadata {
    /// The base service, in subgraph order. `None` for value types and for
    /// synthesized root types.
    pub service_name: Option<String>,
    /// True when every defining service declares a structurally identical
    /// shape, so any service can resolve the type.
    pub is_value_type: bool,
    /// `@key` selections per declaring service, in declaration order.
    pub keys: IndexMap<String, Vec<FieldSet>>,
    /// `@external` fields per declaring service.
    pub externals: IndexMap<String, Vec<ExternalFieldRecord>>,
}

impl TypeMetadata {
    pub fn is_entity(&self) -> bool {
        !self.keys.is_empty()
    }
}

/// Federation facts about one merged field.
#[derive(Clone, Debug, Default)]
pub struct FieldMetadata {
    /// The service that resolves the field when it differs from the type's
    /// base service, i.e. for extension fields and `@provides` fields.
    pub service_name: Option<String>,
    pub requires: Option<FieldSet>,
    pub provides: Option<FieldSet>,
    pub belongs_to_value_type: bool,
    /// Recognized non-federation directive applications (`@tag`), deduplicated
    /// and sorted by directive name.
    pub other_known_directive_usages: Vec<Node<ast::Directive>>,
}

/// Per-service definitions of one executable directive.
#[derive(Clone, Debug, Default)]
pub struct DirectiveMetadata {
    pub definitions: IndexMap<String, Node<ast::DirectiveDefinition>>,
}

/// The typed side table produced by composition. Keyed by type and field
/// names rather than attached to AST nodes, so the merged schema stays a plain
/// [`Schema`] and metadata lookups survive re-serialization.
#[derive(Clone, Debug, Default)]
pub struct SupergraphMetadata {
    pub types: IndexMap<Name, TypeMetadata>,
    pub fields: IndexMap<(Name, Name), FieldMetadata>,
    pub directives: IndexMap<Name, DirectiveMetadata>,
}

impl SupergraphMetadata {
    pub fn type_metadata(&self, type_name: &str) -> Option<&TypeMetadata> {
        self.types.get(type_name)
    }

    pub fn field_metadata(&self, type_name: &Name, field_name: &Name) -> Option<&FieldMetadata> {
        self.fields.get(&(type_name.clone(), field_name.clone()))
    }
}

/// Walks the merged schema and records federation metadata for every element
/// that survived merging. Metadata for types the merge dropped (or never
/// produced) is skipped rather than invented.
pub(crate) fn annotate(schema: &Schema, index: &CompositionIndex) -> SupergraphMetadata {
    let mut metadata = SupergraphMetadata::default();

    for (type_name, ownership) in &index.type_ownership {
        let Some(extended_type) = schema.types.get(type_name) else {
            continue;
        };
        let is_value_type = index.value_types.contains(type_name);
        let service_name = if is_value_type {
            None
        } else {
            ownership.owning_service.clone()
        };
        metadata.types.insert(
            type_name.clone(),
            TypeMetadata {
                service_name: service_name.clone(),
                is_value_type,
                keys: index.keys.get(type_name).cloned().unwrap_or_default(),
                externals: IndexMap::new(),
            },
        );

        let ExtendedType::Object(object) = extended_type else {
            continue;
        };
        for (field_name, field) in &object.fields {
            let Some(provides) = field.directives.get("provides") else {
                continue;
            };
            let Some(value) = string_argument_value(provides, "fields") else {
                continue;
            };
            // Malformed selections were already reported by the indexer.
            let Ok(field_set) = FieldSet::parse(value) else {
                continue;
            };
            let entry = metadata
                .fields
                .entry((type_name.clone(), field_name.clone()))
                .or_default();
            entry.service_name = service_name.clone();
            entry.provides = Some(field_set);
            entry.belongs_to_value_type = is_value_type;
        }
        for (field_name, extending_service) in &ownership.extension_fields {
            let Some(field) = object.fields.get(field_name) else {
                continue;
            };
            let entry = metadata
                .fields
                .entry((type_name.clone(), field_name.clone()))
                .or_default();
            entry.service_name = Some(extending_service.clone());
            if let Some(requires) = field.directives.get("requires") {
                if let Some(value) = string_argument_value(requires, "fields") {
                    if let Ok(field_set) = FieldSet::parse(value) {
                        entry.requires = Some(field_set);
                    }
                }
            }
        }
    }

    for record in &index.external_fields {
        let Some(type_metadata) = metadata.types.get_mut(&record.parent_type_name) else {
            continue;
        };
        type_metadata
            .externals
            .entry(record.service_name.clone())
            .or_default()
            .push(record.clone());
    }

    for (directive_name, per_service) in &index.directive_definitions {
        if !schema.directive_definitions.contains_key(directive_name) {
            continue;
        }
        metadata.directives.insert(
            directive_name.clone(),
            DirectiveMetadata {
                definitions: per_service.clone(),
            },
        );
    }

    for (type_name, field_usages) in &index.field_tag_usages {
        if !schema.types.contains_key(type_name) {
            continue;
        }
        for (field_name, usages) in field_usages {
            // Repeatable directives dedupe on the full application, others on
            // the directive name; the first occurrence wins either way.
            let mut seen_names: IndexSet<Name> = IndexSet::new();
            let mut seen_applications: IndexSet<String> = IndexSet::new();
            let mut kept: Vec<Node<ast::Directive>> = usages
                .iter()
                .filter(|usage| {
                    if is_repeatable_other_known_directive(&usage.name) {
                        seen_applications.insert(usage.serialize().no_indent().to_string())
                    } else {
                        seen_names.insert(usage.name.clone())
                    }
                })
                .cloned()
                .collect();
            kept.sort_by(|a, b| a.name.cmp(&b.name));
            metadata
                .fields
                .entry((type_name.clone(), field_name.clone()))
                .or_default()
                .other_known_directive_usages = kept;
        }
    }

    metadata
}
