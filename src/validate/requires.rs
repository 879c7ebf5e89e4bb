use crate::error::CompositionError;
use crate::error::ErrorCode;

use super::CompositionContext;

/// Every field a `@requires` selects must be declared `@external` by the
/// requiring service on the same type.
pub(crate) fn requires_fields_missing_external(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for ((type_name, field_name), field_metadata) in &context.metadata.fields {
        let Some(requires) = &field_metadata.requires else {
            continue;
        };
        let Some(service_name) = field_metadata.service_name.as_deref() else {
            continue;
        };
        let externals = context
            .metadata
            .types
            .get(type_name)
            .and_then(|type_metadata| type_metadata.externals.get(service_name));
        for selected in requires.top_level_fields() {
            let declared_external = externals.is_some_and(|records| {
                records.iter().any(|record| record.field.name == selected.name)
            });
            if !declared_external {
                errors.push(CompositionError::with_nodes(
                    ErrorCode::RequiresFieldsMissingExternal,
                    format!(
                        "[{service_name}] {type_name}.{field_name} -> requires the field \
                         \"{selected}\" to be marked as @external.",
                        selected = selected.name,
                    ),
                    vec![format!("{type_name}.{field_name}")],
                ));
            }
        }
    }
    errors
}

/// `@requires` can only select fields the base service actually defines;
/// requiring a field no one owns can never be satisfied.
pub(crate) fn requires_fields_missing_on_base(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for ((type_name, field_name), field_metadata) in &context.metadata.fields {
        let Some(requires) = &field_metadata.requires else {
            continue;
        };
        let Some(service_name) = field_metadata.service_name.as_deref() else {
            continue;
        };
        for selected in requires.top_level_fields() {
            if context.base_field(type_name, &selected.name).is_some() {
                continue;
            }
            errors.push(CompositionError::with_nodes(
                ErrorCode::RequiresFieldsMissingOnBase,
                format!(
                    "[{service_name}] {type_name}.{field_name} -> requires the field \
                     \"{selected}\" but it is not defined on the base service of {type_name}.",
                    selected = selected.name,
                ),
                vec![format!("{type_name}.{field_name}")],
            ));
        }
    }
    errors
}
