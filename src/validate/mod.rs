use apollo_compiler::ast;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Name;
use apollo_compiler::Schema;

use crate::error::CompositionError;
use crate::index::CompositionIndex;
use crate::metadata::SupergraphMetadata;
use crate::subgraph::Subgraph;
use crate::subgraph::Subgraphs;

pub(crate) mod executable_directives;
pub(crate) mod external;
pub(crate) mod keys;
pub(crate) mod provides;
pub(crate) mod requires;
pub(crate) mod tag;

/// Everything a post-composition rule may read. Rules are pure: they never
/// mutate the schema or metadata, and no rule sees another rule's output.
pub(crate) struct CompositionContext<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) metadata: &'a SupergraphMetadata,
    pub(crate) index: &'a CompositionIndex,
    pub(crate) subgraphs: &'a Subgraphs,
}

impl CompositionContext<'_> {
    /// Looks up a field on the merged composite type, wherever it came from.
    pub(crate) fn field(
        &self,
        type_name: &Name,
        field_name: &str,
    ) -> Option<&Component<ast::FieldDefinition>> {
        match self.schema.types.get(type_name)? {
            ExtendedType::Object(object) => object.fields.get(field_name),
            ExtendedType::Interface(interface) => interface.fields.get(field_name),
            _ => None,
        }
    }

    /// The field as the owning service defines it: present on the merged type
    /// and not introduced by an extension.
    pub(crate) fn base_field(
        &self,
        type_name: &Name,
        field_name: &str,
    ) -> Option<&Component<ast::FieldDefinition>> {
        let field = self.field(type_name, field_name)?;
        let from_extension = self
            .index
            .type_ownership
            .get(type_name)
            .is_some_and(|ownership| ownership.extension_fields.contains_key(field_name));
        (!from_extension).then_some(field)
    }
}

/// Whether any selection in the set (at any depth, fragments included)
/// selects a field with the given name.
pub(crate) fn selection_mentions(selections: &[ast::Selection], field_name: &str) -> bool {
    selections.iter().any(|selection| match selection {
        ast::Selection::Field(field) => {
            field.name == field_name || selection_mentions(&field.selection_set, field_name)
        }
        ast::Selection::InlineFragment(fragment) => {
            selection_mentions(&fragment.selection_set, field_name)
        }
        ast::Selection::FragmentSpread(_) => false,
    })
}

pub(crate) type PostCompositionRule = fn(&CompositionContext<'_>) -> Vec<CompositionError>;

/// The fixed rule catalogue, run in order. Rules accumulate: none
/// short-circuits another.
pub(crate) const POST_COMPOSITION_RULES: &[PostCompositionRule] = &[
    external::external_unused,
    external::external_missing_on_base,
    external::external_type_mismatch,
    requires::requires_fields_missing_external,
    requires::requires_fields_missing_on_base,
    keys::key_fields_missing_on_base,
    keys::key_fields_select_invalid_type,
    provides::provides_fields_missing_external,
    provides::provides_fields_select_invalid_type,
    provides::provides_not_on_entity,
    executable_directives::executable_directives_in_all_services,
    executable_directives::executable_directives_identical,
    keys::keys_match_base_service,
];

pub(crate) fn run_post_composition(context: &CompositionContext<'_>) -> Vec<CompositionError> {
    POST_COMPOSITION_RULES
        .iter()
        .flat_map(|rule| rule(context))
        .collect()
}

/// Checks that run on raw subgraph documents, before any stripping or
/// merging.
pub(crate) fn pre_normalization(subgraph: &Subgraph) -> Vec<CompositionError> {
    tag::tag_directive(subgraph)
}
