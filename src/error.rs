use apollo_compiler::diagnostic::Diagnostic;
use apollo_compiler::validation::DiagnosticData;
use thiserror::Error;

/// Machine-readable code carried by every [`CompositionError`].
///
/// Codes render in `SCREAMING_SNAKE_CASE`, e.g.
/// [`ErrorCode::ExternalMissingOnBase`] displays as `EXTERNAL_MISSING_ON_BASE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Structural SDL problems reported by the underlying GraphQL validator.
    GraphqlValidationFailed,
    TagDirectiveDefinitionInvalid,
    ExternalMissingOnBase,
    ExternalTypeMismatch,
    ExternalUnused,
    KeyFieldsMissingOnBase,
    KeyFieldsSelectInvalidType,
    KeysMatchBaseService,
    RequiresFieldsMissingExternal,
    RequiresFieldsMissingOnBase,
    ProvidesNotOnEntity,
    ProvidesFieldsMissingExternal,
    ProvidesFieldsSelectInvalidType,
    ExecutableDirectivesInAllServices,
    ExecutableDirectivesIdentical,
}

/// One cross-service consistency or structural failure found during
/// composition. Errors are aggregated: no error stops the pipeline or
/// suppresses another rule's output.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CompositionError {
    pub code: ErrorCode,
    pub message: String,
    /// Names of the schema elements the error refers to, as `Type`,
    /// `Type.field` or `@directive` paths.
    pub related_nodes: Vec<String>,
}

impl CompositionError {
    pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            related_nodes: Vec::new(),
        }
    }

    pub(crate) fn with_nodes(
        code: ErrorCode,
        message: impl Into<String>,
        related_nodes: Vec<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            related_nodes,
        }
    }
}

/// Violations of the input contract. These are preconditions, not
/// composition errors: they are reported before the pipeline runs and never
/// appear in a [`CompositionError`] list.
#[derive(Clone, Debug, Error)]
pub enum SubgraphInputError {
    #[error("a subgraph named \"{0}\" was already provided")]
    DuplicateSubgraphName(String),
    #[error("[{subgraph}] invalid GraphQL document: {message}")]
    InvalidDocument { subgraph: String, message: String },
}

/// Using `diagnostic.error` strips the location info from the message; the
/// surrounding error already names the offending schema elements.
pub(crate) fn normalize_diagnostic_message(diagnostic: Diagnostic<'_, DiagnosticData>) -> String {
    diagnostic.error.to_string()
}
