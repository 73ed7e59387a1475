//! Process-wide document environment.
//!
//! Widgets and the orchestrator operate on a [`Document`]. When the host
//! embeds Trellis it can [`install`] its own document up front; otherwise the
//! first call to [`ensure`] provisions a headless one
//! (`<html><body></body></html>`). Provisioning happens at most once per
//! process and the environment is never torn down.
//!
//! # Example
//!
//! ```
//! use trellis_core::environment;
//!
//! let env = environment::ensure();
//! let body = env.document().body();
//! assert_eq!(body.tag_name().unwrap(), "body");
//!
//! // Later calls return the same environment.
//! assert!(env.document().same_document(environment::ensure().document()));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::error::EnvironmentError;
use crate::tree::Document;

/// Global environment instance.
static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Number of times an environment was actually constructed.
static PROVISION_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Where the environment's document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    /// Supplied by the host through [`install`].
    Native,
    /// Created on demand by [`ensure`].
    Headless,
}

/// The process-wide document environment.
#[derive(Debug)]
pub struct Environment {
    kind: EnvironmentKind,
    document: Document,
}

impl Environment {
    fn provision(kind: EnvironmentKind, document: Document) -> Self {
        PROVISION_COUNT.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target: "trellis_core::environment", ?kind, "provisioned environment");
        Self { kind, document }
    }

    pub fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    pub fn is_headless(&self) -> bool {
        self.kind == EnvironmentKind::Headless
    }

    /// The global document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Install a host-provided document as the process environment.
///
/// Fails if an environment already exists, whether installed or provisioned
/// headless by an earlier [`ensure`].
pub fn install(document: Document) -> Result<&'static Environment, EnvironmentError> {
    let mut installed = false;
    let env = ENVIRONMENT.get_or_init(|| {
        installed = true;
        Environment::provision(EnvironmentKind::Native, document)
    });
    if installed {
        Ok(env)
    } else {
        Err(EnvironmentError::AlreadyProvisioned)
    }
}

/// Get the environment, provisioning a headless one on first use.
pub fn ensure() -> &'static Environment {
    ENVIRONMENT.get_or_init(|| Environment::provision(EnvironmentKind::Headless, Document::new()))
}

/// Get the environment if one has been provisioned.
pub fn get() -> Option<&'static Environment> {
    ENVIRONMENT.get()
}

/// How many environments were constructed in this process (0 or 1).
pub fn provision_count() -> usize {
    PROVISION_COUNT.load(Ordering::SeqCst)
}
