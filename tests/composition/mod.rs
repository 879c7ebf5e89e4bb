mod compose_basic;
mod compose_entities;
mod compose_tag;
mod supergraph_reversibility;

pub(crate) use test_helpers::assert_composition_errors;
pub(crate) use test_helpers::compose_services;
pub(crate) use test_helpers::ServiceDefinition;

pub(crate) mod test_helpers {
    use supergraph_composition::compose;
    use supergraph_composition::CompositionFailure;
    use supergraph_composition::CompositionSuccess;
    use supergraph_composition::ErrorCode;
    use supergraph_composition::Subgraph;
    use supergraph_composition::Subgraphs;

    pub(crate) struct ServiceDefinition<'a> {
        pub(crate) name: &'a str,
        pub(crate) type_defs: &'a str,
    }

    pub(crate) fn compose_services(
        service_list: &[ServiceDefinition<'_>],
    ) -> Result<CompositionSuccess, CompositionFailure> {
        let mut subgraphs = Subgraphs::new();
        for service in service_list {
            let subgraph = Subgraph::parse(
                service.name,
                &format!("http://{}", service.name),
                service.type_defs,
            )
            .expect("subgraph should parse");
            subgraphs.add(subgraph).expect("subgraph names are unique");
        }
        compose(&subgraphs)
    }

    /// Asserts the composition failed with exactly the expected errors, in
    /// order.
    pub(crate) fn assert_composition_errors(
        result: &Result<CompositionSuccess, CompositionFailure>,
        expected: &[(ErrorCode, &str)],
    ) {
        let Err(failure) = result else {
            panic!("expected composition to fail");
        };
        let actual: Vec<(ErrorCode, &str)> = failure
            .errors
            .iter()
            .map(|error| (error.code, error.message.as_str()))
            .collect();
        pretty_assertions::assert_eq!(actual, expected);
    }
}
