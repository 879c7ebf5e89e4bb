use itertools::Itertools;

use crate::error::CompositionError;
use crate::error::ErrorCode;

use super::CompositionContext;

/// An executable directive only composes when every service defines it; a
/// gateway cannot plan a directive some service would reject.
pub(crate) fn executable_directives_in_all_services(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (directive_name, per_service) in &context.index.directive_definitions {
        let missing: Vec<&str> = context
            .subgraphs
            .iter()
            .map(|subgraph| subgraph.name.as_str())
            .filter(|service_name| !per_service.contains_key(*service_name))
            .collect();
        if missing.is_empty() {
            continue;
        }
        errors.push(CompositionError::with_nodes(
            ErrorCode::ExecutableDirectivesInAllServices,
            format!(
                "Custom directive @{directive_name} is not defined in the following services: \
                 {services}. All services must define custom executable directives identically.",
                services = missing.join(", "),
            ),
            vec![format!("@{directive_name}")],
        ));
    }
    errors
}

/// The services that do define an executable directive must define it with
/// byte-identical shapes: same arguments, same locations, same repeatability.
pub(crate) fn executable_directives_identical(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (directive_name, per_service) in &context.index.directive_definitions {
        if per_service.len() < 2 {
            continue;
        }
        let rendered: Vec<(&str, String)> = per_service
            .iter()
            .map(|(service_name, definition)| {
                (
                    service_name.as_str(),
                    definition.serialize().no_indent().to_string(),
                )
            })
            .collect();
        if rendered.iter().map(|(_, text)| text).all_equal() {
            continue;
        }
        let listing = rendered
            .iter()
            .map(|(service_name, text)| format!("\t{service_name}: {text}"))
            .join("\n");
        errors.push(CompositionError::with_nodes(
            ErrorCode::ExecutableDirectivesIdentical,
            format!(
                "The custom directive @{directive_name} is defined with different definitions \
                 across services. Executable directives must be defined identically in every \
                 service that defines them. Definitions:\n{listing}"
            ),
            vec![format!("@{directive_name}")],
        ));
    }
    errors
}
