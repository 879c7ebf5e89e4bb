use apollo_compiler::Schema;

use super::compose_services;
use super::ServiceDefinition;

const PRODUCTS: ServiceDefinition<'static> = ServiceDefinition {
    name: "products",
    type_defs: r#"
        type Query {
            topProducts: [Product]
        }

        type Product @key(fields: "upc") {
            upc: String!
            name: String
            price: Int @deprecated(reason: "use priceCents")
            priceCents: Int
        }
    "#,
};

const REVIEWS: ServiceDefinition<'static> = ServiceDefinition {
    name: "reviews",
    type_defs: r#"
        extend type Product @key(fields: "upc") {
            upc: String! @external
            reviews: [Review]
        }

        type Review {
            body: String
            rating: Int
        }
    "#,
};

#[test]
fn emitted_sdl_round_trips_through_the_serializer() {
    let success = compose_services(&[PRODUCTS, REVIEWS]).expect("composition should succeed");
    let reparsed = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");
    assert_eq!(reparsed.to_string(), success.supergraph_sdl);
}

#[test]
fn composition_is_deterministic() {
    let first = compose_services(&[PRODUCTS, REVIEWS]).expect("composition should succeed");
    let second = compose_services(&[PRODUCTS, REVIEWS]).expect("composition should succeed");
    assert_eq!(first.supergraph_sdl, second.supergraph_sdl);
}

#[test]
fn types_and_directive_definitions_are_emitted_in_lexicographic_order() {
    let success = compose_services(&[PRODUCTS, REVIEWS]).expect("composition should succeed");
    let reparsed = Schema::parse(&success.supergraph_sdl, "supergraph.graphql")
        .expect("emitted SDL should parse");

    let type_names: Vec<&str> = reparsed
        .types
        .iter()
        .filter(|(_, extended_type)| !extended_type.is_built_in())
        .map(|(name, _)| name.as_str())
        .collect();
    let mut sorted = type_names.clone();
    sorted.sort_unstable();
    assert_eq!(type_names, sorted);
}

#[test]
fn deprecated_survives_composition() {
    let success = compose_services(&[PRODUCTS, REVIEWS]).expect("composition should succeed");
    assert!(success
        .supergraph_sdl
        .contains(r#"price: Int @deprecated(reason: "use priceCents")"#));
}
