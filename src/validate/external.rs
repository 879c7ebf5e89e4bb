use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::metadata::TypeMetadata;

use super::selection_mentions;
use super::CompositionContext;

/// Every `@external` field must be referenced by some `@key`, `@requires` or
/// `@provides` selection; an unused one is dead weight and usually a typo.
pub(crate) fn external_unused(context: &CompositionContext<'_>) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (type_name, type_metadata) in &context.metadata.types {
        for (service_name, records) in &type_metadata.externals {
            for record in records {
                let field_name = record.field.name.as_str();
                let referenced = key_references(type_metadata, field_name)
                    || requires_references(context, type_name, service_name, field_name)
                    || provides_references(context, type_name, field_name);
                if !referenced {
                    errors.push(CompositionError::with_nodes(
                        ErrorCode::ExternalUnused,
                        format!(
                            "[{service_name}] {type_name}.{field_name} -> is marked as @external \
                             but is not used by a @requires, @key, or @provides directive."
                        ),
                        vec![format!("{type_name}.{field_name}")],
                    ));
                }
            }
        }
    }
    errors
}

fn key_references(type_metadata: &TypeMetadata, field_name: &str) -> bool {
    type_metadata
        .keys
        .values()
        .flatten()
        .any(|key| selection_mentions(key.selections(), field_name))
}

/// `@requires` selections reference externals on the same type, from the same
/// extending service.
fn requires_references(
    context: &CompositionContext<'_>,
    type_name: &apollo_compiler::Name,
    service_name: &str,
    field_name: &str,
) -> bool {
    context
        .metadata
        .fields
        .iter()
        .any(|((parent_type, _), field_metadata)| {
            parent_type == type_name
                && field_metadata.service_name.as_deref() == Some(service_name)
                && field_metadata
                    .requires
                    .as_ref()
                    .is_some_and(|requires| selection_mentions(requires.selections(), field_name))
        })
}

/// `@provides` selections reference externals on the type the providing field
/// returns.
fn provides_references(
    context: &CompositionContext<'_>,
    type_name: &apollo_compiler::Name,
    field_name: &str,
) -> bool {
    context
        .metadata
        .fields
        .iter()
        .any(|((parent_type, providing_field), field_metadata)| {
            let Some(provides) = &field_metadata.provides else {
                return false;
            };
            let returns_type = context
                .field(parent_type, providing_field)
                .is_some_and(|field| field.ty.inner_named_type() == type_name);
            returns_type && selection_mentions(provides.selections(), field_name)
        })
}

/// A field can only be declared `@external` if the base service actually
/// defines it.
pub(crate) fn external_missing_on_base(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (type_name, type_metadata) in &context.metadata.types {
        for (service_name, records) in &type_metadata.externals {
            for record in records {
                let field_name = record.field.name.as_str();
                if context.base_field(type_name, field_name).is_some() {
                    continue;
                }
                errors.push(CompositionError::with_nodes(
                    ErrorCode::ExternalMissingOnBase,
                    format!(
                        "[{service_name}] {type_name}.{field_name} -> marked @external but \
                         {field_name} is not defined on the base service of {type_name} \
                         ({owner})",
                        owner = type_metadata.service_name.as_deref().unwrap_or("undefined"),
                    ),
                    vec![format!("{type_name}.{field_name}")],
                ));
            }
        }
    }
    errors
}

/// The declared type of an `@external` field must match the base service's
/// declaration exactly, nullability included.
pub(crate) fn external_type_mismatch(context: &CompositionContext<'_>) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (type_name, type_metadata) in &context.metadata.types {
        for (service_name, records) in &type_metadata.externals {
            for record in records {
                let field_name = record.field.name.as_str();
                let Some(base_field) = context.base_field(type_name, field_name) else {
                    continue;
                };
                if record.field.ty == base_field.ty {
                    continue;
                }
                errors.push(CompositionError::with_nodes(
                    ErrorCode::ExternalTypeMismatch,
                    format!(
                        "[{service_name}] {type_name}.{field_name} -> reported an @external type \
                         of \"{external}\" which does not match the type \"{base}\" declared on \
                         the base service",
                        external = record.field.ty,
                        base = base_field.ty,
                    ),
                    vec![format!("{type_name}.{field_name}")],
                ));
            }
        }
    }
    errors
}
