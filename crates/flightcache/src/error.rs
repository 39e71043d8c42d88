use std::sync::Arc;

use thiserror::Error;

/// An error returned by the [`LockedCache`](crate::LockedCache) entry points.
///
/// The error is cheap to clone, which is what allows a single failed computation to be handed
/// out to every caller that was waiting for it.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache key was empty.
    ///
    /// This is raised before the cache or any in-flight computation is consulted.
    #[error("cache key must not be empty")]
    EmptyKey,
    /// The computation callback failed.
    ///
    /// The executing caller and all coalesced waiters receive the same shared error, so
    /// [`Arc::ptr_eq`] holds between the errors handed out for one computation.
    #[error("computation failed: {0:#}")]
    Computation(Arc<anyhow::Error>),
    /// The computation was dropped before it produced an outcome.
    ///
    /// This happens when the computation callback panics, or when the future driving an async
    /// computation is dropped before completion.
    #[error("computation for `{key}` was abandoned before completion")]
    Abandoned {
        /// The key of the abandoned computation.
        key: String,
    },
    /// The cached value is of a different type than the requested one.
    #[error("cached value for `{key}` is not a `{expected}`")]
    TypeMismatch {
        /// The key that was looked up.
        key: String,
        /// The name of the requested type.
        expected: &'static str,
    },
}

impl CacheError {
    /// Returns the error raised by the computation callback, if this is a computation failure.
    pub fn computation_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Computation(err) => Some(err),
            _ => None,
        }
    }

    /// Tells whether the error originates from the computation callback itself.
    pub fn is_computation(&self) -> bool {
        matches!(self, Self::Computation(_))
    }
}

impl From<anyhow::Error> for CacheError {
    fn from(err: anyhow::Error) -> Self {
        Self::Computation(Arc::new(err))
    }
}
