use thiserror::Error;

/// The error kinds of spec.md §7. Every boundary function in this crate
/// returns one of these rather than an ad-hoc string, so callers (the API
/// layer, the peer dispatcher) can map Validation to 4xx and
/// Resource/Internal to 5xx without re-deriving the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Resource,
    Consensus,
    Internal,
    NotFound,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {reason}")]
pub struct Error {
    pub kind: ErrorKind,
    pub reason: String,
}

impl Error {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, reason)
    }

    pub fn resource(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, reason)
    }

    pub fn consensus(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Consensus, reason)
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, reason)
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, reason)
    }
}
