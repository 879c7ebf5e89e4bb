use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use indexmap::IndexSet;
use tracing::debug;

use crate::directives::federation_directive_definitions;
use crate::directives::other_known_directive_definitions;
use crate::directives::FEDERATION_DIRECTIVE_NAMES;
use crate::error::normalize_diagnostic_message;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::index::CompositionIndex;
use crate::index::ServiceDefinition;

/// The merged schema together with every structural problem found while
/// building it. The schema is always present: when validation fails it is the
/// best-effort partial result, so annotation and the post-composition rules
/// can still run over whatever merged cleanly.
pub(crate) struct MergedSchema {
    pub(crate) schema: Schema,
    pub(crate) errors: Vec<CompositionError>,
}

/// Merges the indexed definitions into a single schema in two stages:
/// definitions first, then extensions on top. Diagnostics are deduplicated by
/// message across the stages so an error in a definition is not reported again
/// when the extensions are layered over it.
pub(crate) fn build_schema_from_definitions_and_extensions(
    index: &CompositionIndex,
) -> MergedSchema {
    let seed = seed_document(index);
    let definitions = definitions_document(index);
    let extensions = extensions_document(index);

    let mut errors = Vec::new();
    let mut reported: IndexSet<String> = IndexSet::new();

    // Stage one surfaces problems that exist before any extension applies.
    // Its partial schema is discarded; stage two rebuilds from scratch.
    if let Err(with_errors) = Schema::builder()
        .adopt_orphan_extensions()
        .add_ast(&seed)
        .add_ast(&definitions)
        .build()
    {
        for diagnostic in with_errors.errors.iter() {
            let message = normalize_diagnostic_message(diagnostic);
            if reported.insert(message.clone()) {
                push_validation_error(&mut errors, message);
            }
        }
    }

    let schema = Schema::builder()
        .adopt_orphan_extensions()
        .add_ast(&seed)
        .add_ast(&definitions)
        .add_ast(&extensions)
        .build();
    let schema = match schema {
        Ok(schema) => schema,
        Err(with_errors) => {
            for diagnostic in with_errors.errors.iter() {
                let message = normalize_diagnostic_message(diagnostic);
                if reported.insert(message.clone()) {
                    push_validation_error(&mut errors, message);
                }
            }
            with_errors.partial
        }
    };

    // Full validation over the merged result. The schema is kept either way.
    let mut schema = match schema.validate() {
        Ok(valid) => valid.into_inner(),
        Err(with_errors) => {
            for diagnostic in with_errors.errors.iter() {
                let message = normalize_diagnostic_message(diagnostic);
                if reported.insert(message.clone()) {
                    push_validation_error(&mut errors, message);
                }
            }
            with_errors.partial
        }
    };

    assign_root_operations(&mut schema);
    for directive_name in FEDERATION_DIRECTIVE_NAMES {
        schema.directive_definitions.shift_remove(directive_name);
    }

    debug!(
        types = schema.types.len(),
        errors = errors.len(),
        "merged subgraph definitions"
    );
    MergedSchema { schema, errors }
}

fn push_validation_error(errors: &mut Vec<CompositionError>, message: String) {
    // The federation directives are defined by the seed document, but
    // subgraphs occasionally redefine them; the resulting duplicate-directive
    // noise is not a composition problem.
    if is_ignored_federation_diagnostic(&message) {
        return;
    }
    errors.push(CompositionError::new(
        ErrorCode::GraphqlValidationFailed,
        message,
    ));
}

fn is_ignored_federation_diagnostic(message: &str) -> bool {
    (message.contains("directive") || message.contains("Directive"))
        && FEDERATION_DIRECTIVE_NAMES.iter().any(|name| {
            message.contains(&format!("`@{name}`")) || message.contains(&format!("\"@{name}\""))
        })
}

/// Root operation types are resolved by conventional name. Explicit `schema`
/// definitions in subgraphs are intentionally ignored.
fn assign_root_operations(schema: &mut Schema) {
    let has_query = schema.types.contains_key("Query");
    let has_mutation = schema.types.contains_key("Mutation");
    let has_subscription = schema.types.contains_key("Subscription");
    let schema_definition = schema.schema_definition.make_mut();
    if has_query {
        schema_definition.query = Some(ComponentName::from(name!("Query")));
    }
    if has_mutation {
        schema_definition.mutation = Some(ComponentName::from(name!("Mutation")));
    }
    if has_subscription {
        schema_definition.subscription = Some(ComponentName::from(name!("Subscription")));
    }
}

/// Directive definitions every merge starts from: the federation directives,
/// plus recognized extras (`@tag`) when some subgraph uses them.
fn seed_document(index: &CompositionIndex) -> ast::Document {
    let mut document = ast::Document::new();
    for definition in federation_directive_definitions() {
        document
            .definitions
            .push(ast::Definition::DirectiveDefinition(Node::new(definition)));
    }
    for definition in other_known_directive_definitions() {
        if index
            .other_known_directive_usages
            .contains(definition.name.as_str())
        {
            document
                .definitions
                .push(ast::Definition::DirectiveDefinition(Node::new(definition)));
        }
    }
    document
}

fn definitions_document(index: &CompositionIndex) -> ast::Document {
    let mut document = ast::Document::new();
    for definitions in index.type_definitions.values() {
        if let Some(definition) = representative_definition(definitions) {
            document.definitions.push(definition);
        }
    }
    for per_service in index.directive_definitions.values() {
        if let Some((_, definition)) = per_service.first() {
            document
                .definitions
                .push(ast::Definition::DirectiveDefinition(definition.clone()));
        }
    }
    document
}

fn extensions_document(index: &CompositionIndex) -> ast::Document {
    let mut document = ast::Document::new();
    for extensions in index.type_extensions.values() {
        for extension in extensions {
            document.definitions.push(extension.definition.clone());
        }
    }
    document
}

/// Duplicate definitions collapse to the last one, except that object and
/// interface definitions keep the union of every occurrence's implemented
/// interfaces, in first-appearance order.
fn representative_definition(definitions: &[ServiceDefinition]) -> Option<ast::Definition> {
    let last = definitions.last()?.definition.clone();
    if definitions.len() == 1 {
        return Some(last);
    }
    let mut interfaces: IndexSet<Name> = IndexSet::new();
    for service_definition in definitions {
        match &service_definition.definition {
            ast::Definition::ObjectTypeDefinition(object) => {
                interfaces.extend(object.implements_interfaces.iter().cloned());
            }
            ast::Definition::InterfaceTypeDefinition(interface) => {
                interfaces.extend(interface.implements_interfaces.iter().cloned());
            }
            _ => {}
        }
    }
    match last {
        ast::Definition::ObjectTypeDefinition(node) => {
            let mut object = node.as_ref().clone();
            object.implements_interfaces = interfaces.into_iter().collect();
            Some(ast::Definition::ObjectTypeDefinition(Node::new(object)))
        }
        ast::Definition::InterfaceTypeDefinition(node) => {
            let mut interface = node.as_ref().clone();
            interface.implements_interfaces = interfaces.into_iter().collect();
            Some(ast::Definition::InterfaceTypeDefinition(Node::new(
                interface,
            )))
        }
        other => Some(other),
    }
}
