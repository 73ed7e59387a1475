//! Error types for Trellis core.

use std::fmt;

/// Errors that can occur during markup tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The node ID is invalid or the node has been removed.
    InvalidNodeId,
    /// Attempted to make a node its own ancestor.
    CircularParentage,
    /// Attempted to link nodes that belong to different documents.
    ForeignDocument,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeId => write!(f, "Invalid or removed node ID"),
            Self::CircularParentage => {
                write!(f, "Cannot make a node its own parent or ancestor")
            }
            Self::ForeignDocument => write!(f, "Node belongs to a different document"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Errors raised while provisioning the process-wide environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// An environment (native or headless) is already in place.
    AlreadyProvisioned,
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyProvisioned => {
                write!(f, "Environment has already been provisioned")
            }
        }
    }
}

impl std::error::Error for EnvironmentError {}

/// Result type for markup tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;
