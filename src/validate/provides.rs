use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Name;

use crate::error::CompositionError;
use crate::error::ErrorCode;

use super::CompositionContext;

/// `@provides` promises that the declaring service can resolve fields of the
/// returned type locally, so those fields must be declared `@external` on
/// the returned type by the same service. Fields of value types are exempt:
/// every service can already resolve them.
pub(crate) fn provides_fields_missing_external(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for ((type_name, field_name), field_metadata) in &context.metadata.fields {
        let Some(provides) = &field_metadata.provides else {
            continue;
        };
        let Some(return_type) = return_type_name(context, type_name, field_name) else {
            continue;
        };
        let Some(target) = context.metadata.types.get(&return_type) else {
            continue;
        };
        if target.is_value_type {
            continue;
        }
        let service_name = field_metadata.service_name.as_deref().unwrap_or("unknown");
        let externals = target.externals.get(service_name);
        for selected in provides.top_level_fields() {
            let declared_external = externals.is_some_and(|records| {
                records.iter().any(|record| record.field.name == selected.name)
            });
            if !declared_external {
                errors.push(CompositionError::with_nodes(
                    ErrorCode::ProvidesFieldsMissingExternal,
                    format!(
                        "[{service_name}] {type_name}.{field_name} -> provides the field \
                         \"{selected}\" and requires {return_type}.{selected} to be marked as \
                         @external.",
                        selected = selected.name,
                    ),
                    vec![format!("{type_name}.{field_name}")],
                ));
            }
        }
    }
    errors
}

/// Every field a `@provides` selects must exist on the returned type, at
/// every nesting level.
pub(crate) fn provides_fields_select_invalid_type(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for ((type_name, field_name), field_metadata) in &context.metadata.fields {
        let Some(provides) = &field_metadata.provides else {
            continue;
        };
        let Some(return_type) = return_type_name(context, type_name, field_name) else {
            continue;
        };
        let service_name = field_metadata.service_name.as_deref().unwrap_or("unknown");
        walk_selectable(
            context,
            service_name,
            type_name,
            field_name,
            &return_type,
            provides.selections(),
            &mut errors,
        );
    }
    errors
}

fn walk_selectable(
    context: &CompositionContext<'_>,
    service_name: &str,
    type_name: &Name,
    field_name: &Name,
    parent_type: &Name,
    selections: &[ast::Selection],
    errors: &mut Vec<CompositionError>,
) {
    for selection in selections {
        let field = match selection {
            ast::Selection::Field(field) => field,
            ast::Selection::InlineFragment(fragment) => {
                let parent = fragment.type_condition.as_ref().unwrap_or(parent_type);
                walk_selectable(
                    context,
                    service_name,
                    type_name,
                    field_name,
                    parent,
                    &fragment.selection_set,
                    errors,
                );
                continue;
            }
            ast::Selection::FragmentSpread(_) => continue,
        };
        let Some(resolved) = context.field(parent_type, &field.name) else {
            errors.push(CompositionError::with_nodes(
                ErrorCode::ProvidesFieldsSelectInvalidType,
                format!(
                    "[{service_name}] {type_name}.{field_name} -> A @provides selects \
                     {parent_type}.{selected}, but it could not be found.",
                    selected = field.name,
                ),
                vec![format!("{type_name}.{field_name}")],
            ));
            continue;
        };
        if !field.selection_set.is_empty() {
            let child_type = resolved.ty.inner_named_type().clone();
            walk_selectable(
                context,
                service_name,
                type_name,
                field_name,
                &child_type,
                &field.selection_set,
                errors,
            );
        }
    }
}

/// `@provides` only makes sense on fields returning an object type that is
/// either an entity or a value type; anything else cannot be provided from
/// another service.
pub(crate) fn provides_not_on_entity(context: &CompositionContext<'_>) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for ((type_name, field_name), field_metadata) in &context.metadata.fields {
        if field_metadata.provides.is_none() {
            continue;
        }
        let service_name = field_metadata.service_name.as_deref().unwrap_or("unknown");
        let Some(return_type) = return_type_name(context, type_name, field_name) else {
            continue;
        };
        match context.schema.types.get(&return_type) {
            Some(ExtendedType::Object(_)) => {
                let target = context.metadata.types.get(&return_type);
                let is_entity = target.is_some_and(|metadata| metadata.is_entity());
                let is_value_type = target.is_some_and(|metadata| metadata.is_value_type);
                if !is_entity && !is_value_type {
                    errors.push(CompositionError::with_nodes(
                        ErrorCode::ProvidesNotOnEntity,
                        format!(
                            "[{service_name}] {type_name}.{field_name} -> uses the @provides \
                             directive but \"{return_type}\" has no @key and is not a value type."
                        ),
                        vec![format!("{type_name}.{field_name}")],
                    ));
                }
            }
            _ => {
                errors.push(CompositionError::with_nodes(
                    ErrorCode::ProvidesNotOnEntity,
                    format!(
                        "[{service_name}] {type_name}.{field_name} -> uses the @provides \
                         directive but \"{return_type}\" is not an object type."
                    ),
                    vec![format!("{type_name}.{field_name}")],
                ));
            }
        }
    }
    errors
}

fn return_type_name(
    context: &CompositionContext<'_>,
    type_name: &Name,
    field_name: &Name,
) -> Option<Name> {
    context
        .field(type_name, field_name)
        .map(|field| field.ty.inner_named_type().clone())
}
