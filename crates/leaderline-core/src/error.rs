//! Error types shared by the engine.

use crate::events::ReferenceKind;
use thiserror::Error;

/// Configuration errors raised synchronously by mutating calls.
///
/// Soft failures (missing references, intersecting bounds, vetoed
/// notifications) are never reported here; they only hide the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderLineError {
    #[error("leader-line {kind} can't be the same element as its {}", .kind.opposite())]
    SameReference { kind: ReferenceKind },
    #[error("can't resolve child `{selector}`: its owner no longer exists")]
    OwnerGone { selector: String },
}

/// Result type for engine operations.
pub type LeaderLineResult<T> = Result<T, LeaderLineError>;
