use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

use apollo_compiler::ast;
use itertools::Itertools;

use crate::error::SubgraphInputError;

/// One independently authored service: a name, a routing URL and the SDL
/// document it serves. The document is kept as a raw AST rather than a built
/// schema because composition needs to see definitions and extensions
/// separately, before any extension is applied.
#[derive(Clone)]
pub struct Subgraph {
    pub name: String,
    pub url: String,
    pub document: ast::Document,
}

impl Subgraph {
    pub fn new(name: impl Into<String>, url: impl Into<String>, document: ast::Document) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            document,
        }
    }

    /// Parses SDL source text into a subgraph. Unparseable documents are
    /// rejected here; cross-service problems are left to composition.
    pub fn parse(name: &str, url: &str, source_text: &str) -> Result<Self, SubgraphInputError> {
        let document = ast::Document::parse(source_text, name).map_err(|with_errors| {
            SubgraphInputError::InvalidDocument {
                subgraph: name.to_owned(),
                message: with_errors
                    .errors
                    .iter()
                    .map(crate::error::normalize_diagnostic_message)
                    .join("; "),
            }
        })?;
        Ok(Self::new(name, url, document))
    }
}

impl Debug for Subgraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "name: {}, url: {}", self.name, self.url)
    }
}

/// The ordered list of subgraphs to compose.
///
/// Order is significant: it decides type ownership, merge order and the order
/// of the `join__Graph` enum values, so composing the same list twice yields
/// byte-identical output.
#[derive(Clone, Debug, Default)]
pub struct Subgraphs {
    subgraphs: Vec<Subgraph>,
}

impl Subgraphs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate names violate the input contract, so they are rejected here
    /// rather than reported as a composition error.
    pub fn add(&mut self, subgraph: Subgraph) -> Result<(), SubgraphInputError> {
        if self.subgraphs.iter().any(|existing| existing.name == subgraph.name) {
            return Err(SubgraphInputError::DuplicateSubgraphName(subgraph.name));
        }
        self.subgraphs.push(subgraph);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subgraph> {
        self.subgraphs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Subgraph> {
        self.subgraphs.iter().find(|subgraph| subgraph.name == name)
    }

    pub fn len(&self) -> usize {
        self.subgraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgraphs.is_empty()
    }
}

impl TryFrom<Vec<Subgraph>> for Subgraphs {
    type Error = SubgraphInputError;

    fn try_from(subgraphs: Vec<Subgraph>) -> Result<Self, Self::Error> {
        let mut collection = Self::new();
        for subgraph in subgraphs {
            collection.add(subgraph)?;
        }
        Ok(collection)
    }
}
