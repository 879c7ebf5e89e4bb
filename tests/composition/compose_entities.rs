use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;
use itertools::Itertools;

use super::compose_services;
use super::ServiceDefinition;

fn join_directives(schema: &Schema, type_name: &str) -> String {
    let ExtendedType::Object(object) = &schema.types[type_name] else {
        panic!("{type_name} should be an object type");
    };
    object
        .directives
        .iter()
        .map(|directive| directive.to_string())
        .join(" ")
}

fn field_directives(schema: &Schema, type_name: &str, field_name: &str) -> String {
    let ExtendedType::Object(object) = &schema.types[type_name] else {
        panic!("{type_name} should be an object type");
    };
    object.fields[field_name]
        .directives
        .iter()
        .map(|directive| directive.to_string())
        .join(" ")
}

#[test]
fn entity_extension_produces_join_annotations() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "products",
            type_defs: r#"
                type Query {
                    topProducts: [Product]
                }

                type Product @key(fields: "upc") {
                    upc: String!
                    name: String
                }
            "#,
        },
        ServiceDefinition {
            name: "reviews",
            type_defs: r#"
                extend type Product @key(fields: "upc") {
                    upc: String! @external
                    reviews: [String]
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");

    assert_eq!(
        join_directives(&supergraph, "Product"),
        "@join__owner(graph: PRODUCTS) \
         @join__type(graph: PRODUCTS, key: \"upc\") \
         @join__type(graph: REVIEWS, key: \"upc\")"
    );
    // Fields resolved by the owner carry no @join__field; the extension
    // field names its graph.
    assert_eq!(field_directives(&supergraph, "Product", "upc"), "");
    assert_eq!(field_directives(&supergraph, "Product", "name"), "");
    assert_eq!(
        field_directives(&supergraph, "Product", "reviews"),
        "@join__field(graph: REVIEWS)"
    );
}

#[test]
fn requires_is_recorded_and_emitted() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "inventory",
            type_defs: r#"
                type Query {
                    product(sku: String!): Product
                }

                type Product @key(fields: "sku") {
                    sku: String!
                    weight: Int
                }
            "#,
        },
        ServiceDefinition {
            name: "shipping",
            type_defs: r#"
                extend type Product @key(fields: "sku") {
                    sku: String! @external
                    weight: Int @external
                    shippingEstimate: Int @requires(fields: "weight")
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");

    let estimate = success
        .metadata
        .fields
        .iter()
        .find(|((_, field_name), _)| field_name == "shippingEstimate")
        .map(|(_, metadata)| metadata)
        .expect("shippingEstimate should have metadata");
    assert_eq!(estimate.service_name.as_deref(), Some("shipping"));
    assert_eq!(
        estimate.requires.as_ref().map(|fields| fields.to_string()),
        Some("weight".to_owned())
    );

    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert_eq!(
        field_directives(&supergraph, "Product", "shippingEstimate"),
        "@join__field(graph: SHIPPING, requires: \"weight\")"
    );
}

#[test]
fn provides_is_recorded_and_emitted() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "feed",
            type_defs: r#"
                type Query {
                    posts: [Post]
                }

                extend type Post @key(fields: "id") {
                    id: ID! @external
                    title: String @external
                }

                extend type Query {
                    topPost: Post @provides(fields: "title")
                }
            "#,
        },
        ServiceDefinition {
            name: "content",
            type_defs: r#"
                type Post @key(fields: "id") {
                    id: ID!
                    title: String
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");

    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert_eq!(
        field_directives(&supergraph, "Query", "topPost"),
        "@join__field(graph: FEED, provides: \"title\")"
    );
}

#[test]
fn multiple_keys_on_the_owner_are_all_emitted() {
    let result = compose_services(&[ServiceDefinition {
        name: "products",
        type_defs: r#"
            type Query {
                product: Product
            }

            type Product @key(fields: "upc") @key(fields: "sku") {
                upc: String!
                sku: String!
            }
        "#,
    }]);
    let success = result.expect("composition should succeed");
    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert_eq!(
        join_directives(&supergraph, "Product"),
        "@join__owner(graph: PRODUCTS) \
         @join__type(graph: PRODUCTS, key: \"upc\") \
         @join__type(graph: PRODUCTS, key: \"sku\")"
    );
}

#[test]
fn compound_keys_render_in_canonical_form() {
    let result = compose_services(&[ServiceDefinition {
        name: "accounts",
        type_defs: r#"
            type Query {
                user: User
            }

            type User @key(fields: "id   organization {  id }") {
                id: ID!
                organization: Organization
            }

            type Organization {
                id: ID!
            }
        "#,
    }]);
    let success = result.expect("composition should succeed");
    let supergraph = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert_eq!(
        join_directives(&supergraph, "User"),
        "@join__owner(graph: ACCOUNTS) \
         @join__type(graph: ACCOUNTS, key: \"id organization { id }\")"
    );
}

#[test]
fn extends_annotation_behaves_like_an_extension() {
    let result = compose_services(&[
        ServiceDefinition {
            name: "products",
            type_defs: r#"
                type Query {
                    topProducts: [Product]
                }
                type Product @key(fields: "upc") {
                    upc: String!
                    name: String
                }
            "#,
        },
        ServiceDefinition {
            name: "reviews",
            type_defs: r#"
                type Product @key(fields: "upc") @extends {
                    upc: String! @external
                    reviews: [String]
                }
            "#,
        },
    ]);
    let success = result.expect("composition should succeed");
    let sdl = &success.supergraph_sdl;
    assert!(sdl.contains("@join__owner(graph: PRODUCTS)"), "{sdl}");
    assert!(sdl.contains("@join__type(graph: REVIEWS, key: \"upc\")"), "{sdl}");
    assert!(
        sdl.contains("reviews: [String] @join__field(graph: REVIEWS)"),
        "{sdl}"
    );
    let product = success
        .metadata
        .type_metadata("Product")
        .expect("Product metadata");
    assert_eq!(product.service_name.as_deref(), Some("products"));
}
