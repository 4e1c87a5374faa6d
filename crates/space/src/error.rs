//! Error kinds raised while building a tuning space.

use thiserror::Error;

/// Fatal errors for the current tuning session.
///
/// Infeasible configurations reported by the kernel runner are data, not
/// errors, and never surface here.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("parameter `{name}` is already registered")]
    DuplicateParameter { name: String },

    #[error("unknown parameter `{name}`")]
    UnknownParameter { name: String },

    #[error("search space is empty after applying constraints")]
    EmptySearchSpace,

    #[error("invalid strategy options: {reason}")]
    InvalidStrategyOptions { reason: String },
}
