//! Remote gateway: one async call per entity and verb against the backend's
//! REST surface.
//!
//! Implementations issue exactly one request per call, never retry, never
//! cache, and surface every failure to the caller as a [`GatewayError`].

pub mod mock;
pub mod rest;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::model::{Author, AuthorDraft, AuthorId, Listing, Paper, PaperDraft, PaperId};

/// Message shown when the backend gives no usable error body.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal Error";

/// Boxed future returned by [`BlogBackend`] methods.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Failure of a single gateway call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("no backend URI configured")]
    NoBackend,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Human-readable message suitable for a form-level error or toast.
    pub fn message(&self) -> &str {
        match self {
            Self::Backend { message, .. } => message,
            Self::NoBackend => "No backend configured",
            Self::Transport(_) | Self::Decode(_) => GENERIC_ERROR_MESSAGE,
        }
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }
}

/// The backend collaborator.
///
/// `base` is the backend URI read from the store at call time, so a
/// `SET_BACKEND_URI` takes effect on the next call.
pub trait BlogBackend: Send + Sync {
    fn list_papers<'a>(&'a self, base: &'a str) -> GatewayFuture<'a, Listing<Paper>>;

    fn create_paper<'a>(&'a self, base: &'a str, draft: &'a PaperDraft)
    -> GatewayFuture<'a, Paper>;

    fn update_paper<'a>(
        &'a self,
        base: &'a str,
        id: &'a PaperId,
        patch: &'a PaperDraft,
    ) -> GatewayFuture<'a, Paper>;

    fn delete_paper<'a>(&'a self, base: &'a str, id: &'a PaperId) -> GatewayFuture<'a, Paper>;

    fn list_authors<'a>(&'a self, base: &'a str) -> GatewayFuture<'a, Listing<Author>>;

    fn create_author<'a>(
        &'a self,
        base: &'a str,
        draft: &'a AuthorDraft,
    ) -> GatewayFuture<'a, Author>;

    fn update_author<'a>(
        &'a self,
        base: &'a str,
        id: &'a AuthorId,
        patch: &'a AuthorDraft,
    ) -> GatewayFuture<'a, Author>;

    fn delete_author<'a>(&'a self, base: &'a str, id: &'a AuthorId)
    -> GatewayFuture<'a, Author>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_passed_through() {
        let err = GatewayError::Backend {
            status: 400,
            message: "Path `title` is shorter than the minimum allowed length (8).".into(),
        };
        assert!(err.message().starts_with("Path `title`"));
        assert!(err.is_validation());
    }

    #[test]
    fn transport_failures_use_generic_message() {
        let err = GatewayError::Transport("connection refused".into());
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.status(), None);
        assert!(!err.is_validation());
    }
}
