use apollo_compiler::ast;

use crate::directives::tag_directive_definition;
use crate::directives::CANONICAL_TAG_DEFINITION;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::subgraph::Subgraph;

/// A subgraph may declare `@tag` itself, but only with the canonical shape.
/// Any deviation in arguments, locations or repeatability is rejected before
/// the document ever reaches the merge.
pub(crate) fn tag_directive(subgraph: &Subgraph) -> Vec<CompositionError> {
    let Some(declared) = subgraph
        .document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            ast::Definition::DirectiveDefinition(directive) if directive.name == "tag" => {
                Some(directive)
            }
            _ => None,
        })
    else {
        return Vec::new();
    };

    let canonical = tag_directive_definition();
    let matches = declared.repeatable == canonical.repeatable
        && declared.locations == canonical.locations
        && declared.arguments.len() == canonical.arguments.len()
        && declared
            .arguments
            .iter()
            .zip(&canonical.arguments)
            .all(|(a, b)| a.name == b.name && a.ty == b.ty && a.default_value == b.default_value);
    if matches {
        return Vec::new();
    }
    vec![CompositionError::with_nodes(
        ErrorCode::TagDirectiveDefinitionInvalid,
        format!(
            "[{service}] Found @tag definition in service {service}, but the @tag directive \
             definition was invalid. Please ensure the directive definition in your schema's type \
             definitions matches the following:\n\t{CANONICAL_TAG_DEFINITION}",
            service = subgraph.name,
        ),
        vec!["@tag".to_owned()],
    )]
}
