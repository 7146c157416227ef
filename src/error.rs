//! Typed errors of the selection core.

use thiserror::Error;

use crate::version::{SemPrecision, Version};

/// A tag string could not be turned into a version.
///
/// Never fatal: the selector recovers by dropping the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a recognizable version: {0:?}")]
pub struct Unparseable(pub String);

/// Run-level selection outcomes that callers report differently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    /// The fold completed without an accepted candidate. A normal,
    /// reportable outcome rather than a failure.
    #[error("no qualifying release was found")]
    NoQualifyingRelease,

    /// A newer version exists but accepting it would cross a semantic
    /// boundary the configuration disallows.
    #[error("latest version {latest} fails semantic {precision} constraint against current version {current}")]
    ConstraintViolation {
        current: Version,
        latest: Version,
        precision: SemPrecision,
    },
}
