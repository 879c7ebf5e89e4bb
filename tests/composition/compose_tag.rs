use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;
use itertools::Itertools;

use super::assert_composition_errors;
use super::compose_services;
use super::ServiceDefinition;
use supergraph_composition::ErrorCode;

#[test]
fn tag_usages_propagate_to_the_supergraph() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "users",
            type_defs: r#"
                directive @tag(name: String!) repeatable on FIELD_DEFINITION

                type Query {
                    users: [User] @tag(name: "aTaggedOperation")
                }

                type User @key(fields: "id") {
                    id: ID!
                    name: String @tag(name: "aTaggedField")
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");

    let ExtendedType::Object(user) = &supergraph.types["User"] else {
        panic!("User should be an object type");
    };
    let name_tags = user.fields["name"]
        .directives
        .iter()
        .filter(|directive| directive.name == "tag")
        .join(" ");
    assert_eq!(name_tags, r#"@tag(name: "aTaggedField")"#);

    // The tag feature joins the @core preamble and its definition is emitted.
    let core_features: Vec<&str> = supergraph
        .schema_definition
        .directives
        .iter()
        .filter(|directive| directive.name == "core")
        .filter_map(|directive| {
            directive
                .specified_argument_by_name("feature")
                .and_then(|value| value.as_str())
        })
        .collect();
    assert!(core_features.contains(&"https://specs.apollo.dev/tag/v0.1"));
    assert!(supergraph.directive_definitions.contains_key("tag"));
}

#[test]
fn identical_tags_from_multiple_services_are_deduplicated() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query {
                    total: Money
                }

                type Money {
                    amount: Int! @tag(name: "finance")
                    currency: String!
                }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                type Money {
                    amount: Int! @tag(name: "finance")
                    currency: String!
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let amount = success
        .metadata
        .fields
        .iter()
        .find(|((type_name, field_name), _)| type_name == "Money" && field_name == "amount")
        .map(|(_, metadata)| metadata)
        .expect("Money.amount should have metadata");
    assert_eq!(amount.other_known_directive_usages.len(), 1);
}

#[test]
fn distinct_tags_are_kept_and_sorted_with_other_directives() {
    let result = compose_services(&[ServiceDefinition {
        name: "users",
        type_defs: r#"
            type Query {
                users: [User]
            }

            type User @key(fields: "id") {
                id: ID!
                name: String @tag(name: "internal") @tag(name: "public")
            }
        "#,
    }]);
    let success = result.expect("composition should succeed");
    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    let ExtendedType::Object(user) = &supergraph.types["User"] else {
        panic!("User should be an object type");
    };
    let tags = user.fields["name"]
        .directives
        .iter()
        .filter(|directive| directive.name == "tag")
        .join(" ");
    assert_eq!(tags, r#"@tag(name: "internal") @tag(name: "public")"#);
}

#[test]
fn non_canonical_tag_definition_is_rejected() {
    let result = compose_services(&[ServiceDefinition {
        name: "users",
        type_defs: r#"
            directive @tag(name: String) on FIELD_DEFINITION

            type Query {
                users: [String] @tag(name: "ops")
            }
        "#,
    }]);
    assert_composition_errors(
        &result,
        &[(
            ErrorCode::TagDirectiveDefinitionInvalid,
            "[users] Found @tag definition in service users, but the @tag directive definition \
             was invalid. Please ensure the directive definition in your schema's type \
             definitions matches the following:\n\tdirective @tag(name: String!) repeatable on \
             FIELD_DEFINITION",
        )],
    );
}

#[test]
fn interface_fields_do_not_carry_tag_usages() {
    let result = compose_services(&[ServiceDefinition {
        name: "library",
        type_defs: r#"
            type Query {
                item: Titled
            }

            interface Titled {
                title: String @tag(name: "public")
            }

            type Book implements Titled {
                title: String @tag(name: "public")
            }
        "#,
    }]);
    let success = result.expect("composition should succeed");
    let sdl = &success.supergraph_sdl;
    let parsed = Schema::parse(sdl, "supergraph.graphql").expect("emitted SDL should parse");
    let ExtendedType::Interface(titled) = &parsed.types["Titled"] else {
        panic!("Titled should be an interface");
    };
    assert!(titled.fields["title"].directives.is_empty(), "{sdl}");
    let ExtendedType::Object(book) = &parsed.types["Book"] else {
        panic!("Book should be an object type");
    };
    assert!(book.fields["title"].directives.has("tag"), "{sdl}");
}
