//! Error types for keyword classification

use thiserror::Error;

/// Fatal configuration problems with the keyword index. Not retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No category survived normalization
    #[error("keyword index is empty")]
    EmptyIndex,

    /// A category name was blank after trimming
    #[error("keyword category name must not be blank")]
    BlankCategory,

    /// The per-category matcher could not be compiled
    #[error("failed to compile matcher for category `{category}`: {reason}")]
    Automaton { category: String, reason: String },
}

/// Lookup of something the index does not know about.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}
