//! Composition of federated subgraph schemas into a single supergraph.
//!
//! A set of [`Subgraph`] documents goes through a fixed pipeline: indexing
//! (per-service definitions, extensions, keys and `@external` fields),
//! merging into one [`Schema`], metadata annotation, a catalogue of
//! cross-service validation rules, and finally serialization to supergraph
//! SDL carrying `join__*` directives for a gateway to consume.
//!
//! The pipeline never stops early: every stage runs over whatever the
//! previous stage could produce, so a failed composition still reports the
//! complete set of errors alongside the best-effort merged schema.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

use apollo_compiler::Schema;
use tracing::debug;

mod directives;
mod emit;
pub mod error;
mod fieldset;
mod index;
mod merge;
pub mod metadata;
mod strip;
mod subgraph;
mod validate;

pub use crate::error::CompositionError;
pub use crate::error::ErrorCode;
pub use crate::error::SubgraphInputError;
pub use crate::fieldset::FieldSet;
pub use crate::metadata::DirectiveMetadata;
pub use crate::metadata::ExternalFieldRecord;
pub use crate::metadata::FieldMetadata;
pub use crate::metadata::SupergraphMetadata;
pub use crate::metadata::TypeMetadata;
pub use crate::subgraph::Subgraph;
pub use crate::subgraph::Subgraphs;

/// A successful composition: the merged schema, its federation metadata and
/// the serialized supergraph SDL.
#[derive(Debug)]
pub struct CompositionSuccess {
    pub schema: Schema,
    pub metadata: SupergraphMetadata,
    pub supergraph_sdl: String,
}

/// A failed composition. The merged schema and metadata are still included:
/// they are the best-effort result the errors were computed against, which
/// callers use for diagnostics and tooling.
pub struct CompositionFailure {
    pub schema: Schema,
    pub metadata: SupergraphMetadata,
    pub errors: Vec<CompositionError>,
}

impl Debug for CompositionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionFailure")
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

/// Composes subgraph schemas into a supergraph.
///
/// Subgraph order matters: the first service to define a type owns it, and
/// `join__Graph` enum values follow input order. Composing the same inputs in
/// the same order yields byte-identical SDL.
pub fn compose(subgraphs: &Subgraphs) -> Result<CompositionSuccess, CompositionFailure> {
    let mut errors = Vec::new();
    for subgraph in subgraphs.iter() {
        errors.extend(validate::pre_normalization(subgraph));
    }

    let index = index::build_index(subgraphs);
    errors.extend(index.errors.iter().cloned());

    let merge::MergedSchema {
        schema,
        errors: merge_errors,
    } = merge::build_schema_from_definitions_and_extensions(&index);
    errors.extend(merge_errors);

    let metadata = metadata::annotate(&schema, &index);

    let context = validate::CompositionContext {
        schema: &schema,
        metadata: &metadata,
        index: &index,
        subgraphs,
    };
    errors.extend(validate::run_post_composition(&context));

    if errors.is_empty() {
        let supergraph_sdl = emit::emit_supergraph_sdl(&schema, &metadata, &index, subgraphs);
        debug!(
            subgraphs = subgraphs.len(),
            types = schema.types.len(),
            "composition succeeded"
        );
        Ok(CompositionSuccess {
            schema,
            metadata,
            supergraph_sdl,
        })
    } else {
        debug!(
            subgraphs = subgraphs.len(),
            errors = errors.len(),
            "composition failed"
        );
        Err(CompositionFailure {
            schema,
            metadata,
            errors,
        })
    }
}
