//! Behaviour switches for a [`RoleGraph`](crate::RoleGraph).

use serde::{Deserialize, Serialize};

/// Configuration of a role graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Reject parent links that would make a role its own ancestor through
    /// a chain of links. Direct self-parenting is always rejected.
    pub reject_cycles: bool,

    /// Emit `tracing` events for applied and rejected mutations.
    pub trace_mutations: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reject_cycles: true,
            trace_mutations: true,
        }
    }
}

impl GraphConfig {
    /// Configuration without mutation events (for hot paths and tests).
    pub fn quiet() -> Self {
        Self {
            trace_mutations: false,
            ..Self::default()
        }
    }
}
