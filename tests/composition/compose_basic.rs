use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;

use super::compose_services;
use super::ServiceDefinition;

#[test]
fn composes_types_from_different_services() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "products",
            type_defs: r#"
                type Query {
                    products: [Product!]
                }

                type Product {
                    sku: String!
                    name: String!
                }
            "#,
        },
        ServiceDefinition {
            name: "users",
            type_defs: r#"
                type User {
                    name: String
                    email: String!
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");

    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert!(supergraph.types.contains_key("Product"));
    assert!(supergraph.types.contains_key("User"));
    assert!(supergraph.types.contains_key("join__FieldSet"));

    let ExtendedType::Enum(graphs) = &supergraph.types["join__Graph"] else {
        panic!("join__Graph should be an enum");
    };
    let values: Vec<&str> = graphs.values.keys().map(|name| name.as_str()).collect();
    assert_eq!(values, ["PRODUCTS", "USERS"]);
    let products = &graphs.values["PRODUCTS"];
    let join_graph = products
        .directives
        .get("join__graph")
        .expect("enum value should carry @join__graph");
    assert_eq!(
        join_graph
            .specified_argument_by_name("url")
            .and_then(|value| value.as_str()),
        Some("http://products")
    );

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
    assert_eq!(
        core_features,
        [
            "https://specs.apollo.dev/core/v0.1",
            "https://specs.apollo.dev/join/v0.1",
        ]
    );
}

#[test]
fn detects_value_types() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query {
                    total: Money
                }

                type Money {
                    amount: Int!
                    currency: String!
                }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                type Money {
                    currency: String!
                    amount: Int!
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let money = success
        .metadata
        .type_metadata("Money")
        .expect("Money should have metadata");
    assert!(money.is_value_type);
    assert!(money.service_name.is_none());
}

#[test]
fn diverging_value_types_are_owned_by_the_first_definer() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query {
                    total: Money
                }

                type Money {
                    amount: Int!
                }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                type Money {
                    amount: Int!
                    currency: String!
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let money = success
        .metadata
        .type_metadata("Money")
        .expect("Money should have metadata");
    assert!(!money.is_value_type);
    assert_eq!(money.service_name.as_deref(), Some("a"));
}

#[test]
fn synthesizes_an_empty_query_root_for_extensions() {
    let result = compose_services(&[ServiceDefinition {
        name: "accounts",
        type_defs: r#"
            extend type Query {
                me: String
            }
        "#,
    }]);
    let success = result.expect("composition should succeed");
    assert!(success.schema.types.contains_key("Query"));
    assert!(success.schema.schema_definition.query.is_some());
    assert!(success.schema.schema_definition.mutation.is_none());
}

#[test]
fn composes_executable_directives_defined_in_every_service() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                directive @audit(tier: Int) on QUERY

                type Query {
                    a: Int
                }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                directive @audit(tier: Int) on QUERY

                type User {
                    id: ID
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert!(supergraph.directive_definitions.contains_key("audit"));
}

#[test]
fn interface_implementations_are_unioned_across_definitions() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query {
                    media: Book
                }

                interface Titled {
                    title: String
                }

                type Book implements Titled {
                    title: String
                    pages: Int
                }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                interface Paged {
                    pages: Int
                }

                type Book implements Paged {
                    title: String
                    pages: Int
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let ExtendedType::Object(book) = &success.schema.types["Book"] else {
        panic!("Book should be an object type");
    };
    let interfaces: Vec<&str> = book
        .implements_interfaces
        .iter()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(interfaces, ["Titled", "Paged"]);
}

#[test]
fn value_type_keeps_its_status_when_a_later_service_diverges() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "a",
            type_defs: r#"
                type Query {
                    total: Money
                }

                type Money {
                    amount: Int!
                }
            "#,
        },
        ServiceDefinition {
            name: "b",
            type_defs: r#"
                type Money {
                    amount: Int!
                }
            "#,
        },
        ServiceDefinition {
            name: "c",
            type_defs: r#"
                type Money {
                    amount: Int!
                    currency: String!
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let money = success
        .metadata
        .type_metadata("Money")
        .expect("Money should have metadata");
    assert!(money.is_value_type, "Money lost value-type status");
    assert!(money.service_name.is_none());
}
