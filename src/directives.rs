use apollo_compiler::ast;
use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::DirectiveLocation;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::name;
use apollo_compiler::ty;
use apollo_compiler::Name;
use apollo_compiler::Node;

/// Directives that drive composition. They are consumed by the pipeline and
/// never appear in the supergraph output.
pub(crate) const FEDERATION_DIRECTIVE_NAMES: [&str; 5] =
    ["key", "extends", "external", "requires", "provides"];

/// Non-federation type-system directives the composer recognizes and carries
/// through to the supergraph.
pub(crate) const OTHER_KNOWN_DIRECTIVE_NAMES: [&str; 1] = ["tag"];

/// Built-in directives that survive the type-system directive strip.
pub(crate) const SPECIFIED_DIRECTIVE_NAMES: [&str; 4] =
    ["skip", "include", "deprecated", "specifiedBy"];

pub(crate) fn is_federation_directive(name: &str) -> bool {
    FEDERATION_DIRECTIVE_NAMES.contains(&name)
}

pub(crate) fn is_other_known_directive(name: &str) -> bool {
    OTHER_KNOWN_DIRECTIVE_NAMES.contains(&name)
}

/// Whether a directive application on a type-system node survives the strip
/// that precedes merging.
pub(crate) fn is_kept_type_system_directive(name: &str) -> bool {
    is_federation_directive(name)
        || is_other_known_directive(name)
        || name == "deprecated"
        || name == "specifiedBy"
}

pub(crate) const EXECUTABLE_DIRECTIVE_LOCATIONS: [DirectiveLocation; 8] = [
    DirectiveLocation::Query,
    DirectiveLocation::Mutation,
    DirectiveLocation::Subscription,
    DirectiveLocation::Field,
    DirectiveLocation::FragmentDefinition,
    DirectiveLocation::FragmentSpread,
    DirectiveLocation::InlineFragment,
    DirectiveLocation::VariableDefinition,
];

pub(crate) fn is_executable_location(location: &DirectiveLocation) -> bool {
    EXECUTABLE_DIRECTIVE_LOCATIONS.contains(location)
}

/// Reads a directive argument expected to hold a string, e.g.
/// `@key(fields: "id")`. Returns `None` when the argument is absent or not a
/// string literal.
pub(crate) fn string_argument_value<'a>(
    directive: &'a ast::Directive,
    argument: &str,
) -> Option<&'a str> {
    directive
        .specified_argument_by_name(argument)
        .and_then(|value| value.as_str())
}

fn string_argument(name: Name) -> Node<InputValueDefinition> {
    Node::new(InputValueDefinition {
        description: None,
        name,
        ty: ty!(String!).into(),
        default_value: None,
        directives: Default::default(),
    })
}

/// `directive @key(fields: String!) repeatable on OBJECT | INTERFACE`
///
/// Declared repeatable so a type can carry several alternate keys.
pub(crate) fn key_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("key"),
        arguments: vec![string_argument(name!("fields"))],
        repeatable: true,
        locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
    }
}

/// `directive @extends on OBJECT | INTERFACE`
pub(crate) fn extends_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("extends"),
        arguments: Vec::new(),
        repeatable: false,
        locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
    }
}

/// `directive @external on OBJECT | FIELD_DEFINITION`
pub(crate) fn external_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("external"),
        arguments: Vec::new(),
        repeatable: false,
        locations: vec![
            DirectiveLocation::Object,
            DirectiveLocation::FieldDefinition,
        ],
    }
}

/// `directive @requires(fields: String!) on FIELD_DEFINITION`
pub(crate) fn requires_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("requires"),
        arguments: vec![string_argument(name!("fields"))],
        repeatable: false,
        locations: vec![DirectiveLocation::FieldDefinition],
    }
}

/// `directive @provides(fields: String!) on FIELD_DEFINITION`
pub(crate) fn provides_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("provides"),
        arguments: vec![string_argument(name!("fields"))],
        repeatable: false,
        locations: vec![DirectiveLocation::FieldDefinition],
    }
}

/// The only shape a subgraph-declared `@tag` definition may take.
pub(crate) const CANONICAL_TAG_DEFINITION: &str =
    "directive @tag(name: String!) repeatable on FIELD_DEFINITION";

/// `directive @tag(name: String!) repeatable on FIELD_DEFINITION`
pub(crate) fn tag_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        description: None,
        name: name!("tag"),
        arguments: vec![string_argument(name!("name"))],
        repeatable: true,
        locations: vec![DirectiveLocation::FieldDefinition],
    }
}

pub(crate) fn federation_directive_definitions() -> Vec<DirectiveDefinition> {
    vec![
        key_directive_definition(),
        extends_directive_definition(),
        external_directive_definition(),
        requires_directive_definition(),
        provides_directive_definition(),
    ]
}

pub(crate) fn other_known_directive_definitions() -> Vec<DirectiveDefinition> {
    vec![tag_directive_definition()]
}

pub(crate) fn is_repeatable_other_known_directive(name: &str) -> bool {
    other_known_directive_definitions()
        .iter()
        .any(|definition| definition.name == name && definition.repeatable)
}
