use swc_core::common::Span;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransformError {
    #[error(
        "Unsupported interpolation ({kind}) in gql template: only identifiers and \
         property access chains like `a.b.c` may be embedded"
    )]
    UnsupportedInterpolation { span: Span, kind: &'static str },

    #[error("GraphQL syntax error: {message}\n{source_text}")]
    QuerySyntax {
        message: String,
        source_text: String,
    },

    #[error(
        "GraphQL documents with more than one definition must name every operation:\n{source_text}"
    )]
    UnnamedOperation { source_text: String },

    #[error(
        "gql template has {expected} interpolation(s) but only {consumed} sit between \
         top-level definitions where a document can be embedded"
    )]
    InterpolationMismatch { expected: usize, consumed: usize },
}

/// A [`TransformError`] located at the tagged template that produced it.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{error}")]
pub struct TemplateError {
    pub span: Span,
    pub error: TransformError,
}

impl TemplateError {
    pub fn new(span: Span, error: TransformError) -> Self {
        // Interpolation errors point at the offending expression rather than the whole template.
        let span = match &error {
            TransformError::UnsupportedInterpolation { span, .. } => *span,
            _ => span,
        };
        Self { span, error }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid `importSourcePattern`: {0}")]
    ImportSourcePattern(#[from] regex::Error),
}
