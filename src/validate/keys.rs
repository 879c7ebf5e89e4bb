use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Name;
use indexmap::IndexSet;

use crate::error::CompositionError;
use crate::error::ErrorCode;

use super::CompositionContext;

/// Every field a `@key` selects must exist on the base definition of the type
/// being keyed, at every nesting level.
pub(crate) fn key_fields_missing_on_base(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (type_name, type_metadata) in &context.metadata.types {
        for (service_name, key_sets) in &type_metadata.keys {
            for key in key_sets {
                walk_missing_on_base(
                    context,
                    service_name,
                    type_name,
                    type_name,
                    key.selections(),
                    &mut errors,
                );
            }
        }
    }
    errors
}

fn walk_missing_on_base(
    context: &CompositionContext<'_>,
    service_name: &str,
    entity_name: &Name,
    parent_type: &Name,
    selections: &[ast::Selection],
    errors: &mut Vec<CompositionError>,
) {
    for selection in selections {
        let field = match selection {
            ast::Selection::Field(field) => field,
            ast::Selection::InlineFragment(fragment) => {
                let parent = fragment.type_condition.as_ref().unwrap_or(parent_type);
                walk_missing_on_base(
                    context,
                    service_name,
                    entity_name,
                    parent,
                    &fragment.selection_set,
                    errors,
                );
                continue;
            }
            ast::Selection::FragmentSpread(_) => continue,
        };
        // The entity's own key fields must come from the base definition;
        // nested selections only need the field to exist on the merged type.
        let resolved = if parent_type == entity_name {
            context.base_field(parent_type, &field.name)
        } else {
            context.field(parent_type, &field.name)
        };
        let Some(resolved) = resolved else {
            errors.push(CompositionError::with_nodes(
                ErrorCode::KeyFieldsMissingOnBase,
                format!(
                    "[{service_name}] {entity_name} -> A @key selects \
                     {parent_type}.{field_name}, but it could not be found on the base type \
                     definition.",
                    field_name = field.name,
                ),
                vec![entity_name.to_string()],
            ));
            continue;
        };
        if !field.selection_set.is_empty() {
            let child_type = resolved.ty.inner_named_type().clone();
            walk_missing_on_base(
                context,
                service_name,
                entity_name,
                &child_type,
                &field.selection_set,
                errors,
            );
        }
    }
}

/// Key fields must bottom out in scalars or enums. Interfaces and unions can
/// not be used for entity resolution, and an object-typed key field must
/// nest an explicit selection.
pub(crate) fn key_fields_select_invalid_type(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (type_name, type_metadata) in &context.metadata.types {
        for (service_name, key_sets) in &type_metadata.keys {
            for key in key_sets {
                walk_invalid_types(
                    context,
                    service_name,
                    type_name,
                    type_name,
                    key.selections(),
                    &mut errors,
                );
            }
        }
    }
    errors
}

fn walk_invalid_types(
    context: &CompositionContext<'_>,
    service_name: &str,
    entity_name: &Name,
    parent_type: &Name,
    selections: &[ast::Selection],
    errors: &mut Vec<CompositionError>,
) {
    for selection in selections {
        let field = match selection {
            ast::Selection::Field(field) => field,
            ast::Selection::InlineFragment(fragment) => {
                let parent = fragment.type_condition.as_ref().unwrap_or(parent_type);
                walk_invalid_types(
                    context,
                    service_name,
                    entity_name,
                    parent,
                    &fragment.selection_set,
                    errors,
                );
                continue;
            }
            ast::Selection::FragmentSpread(_) => continue,
        };
        let Some(resolved) = context.field(parent_type, &field.name) else {
            // Non-existent fields are the other key rule's problem.
            continue;
        };
        let return_type = resolved.ty.inner_named_type();
        match context.schema.types.get(return_type) {
            Some(ExtendedType::Interface(_)) | Some(ExtendedType::Union(_)) => {
                errors.push(CompositionError::with_nodes(
                    ErrorCode::KeyFieldsSelectInvalidType,
                    format!(
                        "[{service_name}] {entity_name} -> A @key selects \
                         {parent_type}.{field_name}, which resolves to \"{return_type}\", an \
                         interface or union type. Key fields cannot select interfaces or unions.",
                        field_name = field.name,
                    ),
                    vec![entity_name.to_string()],
                ));
            }
            Some(ExtendedType::Object(_)) => {
                if field.selection_set.is_empty() {
                    errors.push(CompositionError::with_nodes(
                        ErrorCode::KeyFieldsSelectInvalidType,
                        format!(
                            "[{service_name}] {entity_name} -> A @key selects \
                             {parent_type}.{field_name}, which is the object type \
                             \"{return_type}\". Key fields selecting object types must specify a \
                             nested selection set.",
                            field_name = field.name,
                        ),
                        vec![entity_name.to_string()],
                    ));
                } else {
                    let child_type = return_type.clone();
                    walk_invalid_types(
                        context,
                        service_name,
                        entity_name,
                        &child_type,
                        &field.selection_set,
                        errors,
                    );
                }
            }
            _ => {}
        }
    }
}

/// Any service that contributes keys or extension fields to an entity must
/// declare a `@key` matching the base service's.
pub(crate) fn keys_match_base_service(
    context: &CompositionContext<'_>,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for (type_name, type_metadata) in &context.metadata.types {
        if type_metadata.keys.is_empty() {
            continue;
        }
        let Some(owner) = type_metadata.service_name.as_deref() else {
            continue;
        };
        let Some(base_key) = type_metadata.keys.get(owner).and_then(|keys| keys.first()) else {
            errors.push(CompositionError::with_nodes(
                ErrorCode::KeysMatchBaseService,
                format!(
                    "[{owner}] {type_name} -> appears to be an entity, but no @key directive \
                     was found on the originating service ({owner})."
                ),
                vec![type_name.to_string()],
            ));
            continue;
        };
        let base_key_text = base_key.to_string();

        let mut contributing: IndexSet<&str> =
            type_metadata.keys.keys().map(String::as_str).collect();
        if let Some(ownership) = context.index.type_ownership.get(type_name) {
            contributing.extend(ownership.extension_fields.values().map(String::as_str));
        }
        for service_name in contributing {
            if service_name == owner {
                continue;
            }
            let matches = type_metadata.keys.get(service_name).is_some_and(|keys| {
                keys.iter().any(|key| key.to_string() == base_key_text)
            });
            if !matches {
                errors.push(CompositionError::with_nodes(
                    ErrorCode::KeysMatchBaseService,
                    format!(
                        "[{service_name}] {type_name} -> extends or adds fields to the entity \
                         {type_name}, but no @key matching the base service's key \
                         \"{base_key_text}\" was found."
                    ),
                    vec![type_name.to_string()],
                ));
            }
        }
    }
    errors
}
