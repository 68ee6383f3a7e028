//! # rolegraph-rbac: Role hierarchy engine
//!
//! In-memory role-based access control:
//! - **Roles** hold permission names and inherit from any number of parents
//! - **Resolution** unions permissions over every ancestor (diamonds included)
//! - **Cached roles** keep their ancestor closure and track direct children
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  RoleGraph (arena, owns every role)          │
//! │  ├─ Role        parents by name              │
//! │  └─ CachedRole  parents + closure + children │
//! └─────────────────┬───────────────────────────┘
//!                   │ RoleId handles
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Resolution                                  │
//! │  - ancestor walk with visited set            │
//! │  - closure rebuilt on every link change      │
//! │  - descendants refreshed parents-first       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Variants
//!
//! | Variant      | `all_parents`   | `has_ancestor` | Children | Parent may be |
//! |--------------|-----------------|----------------|----------|---------------|
//! | `Role`       | walks parents   | walks parents  | ✗        | any role      |
//! | `CachedRole` | maintained map  | O(1)           | ✓        | cached only   |
//!
//! ## Examples
//!
//! ### Inheritance
//!
//! ```
//! use rolegraph_rbac::RoleGraph;
//!
//! let mut graph = RoleGraph::new();
//! let general = graph.create_role("General");
//! let user = graph.create_role("User");
//! let admin = graph.create_role("Admin");
//!
//! graph.permit(general, "OpenSite")?;
//! graph.permit(user, "SendMsg")?;
//! graph.permit(admin, "EditMsg")?;
//! graph.set_parent(user, general)?;
//! graph.set_parent(admin, user)?;
//!
//! assert!(graph.is_allowed(admin, &["OpenSite", "SendMsg", "EditMsg"])?);
//! assert!(graph.has_parent(admin, "User")?);
//! assert!(!graph.has_parent(admin, "General")?);
//! assert!(graph.all_parents(admin)?.contains_key("General"));
//! # Ok::<(), rolegraph_rbac::RoleError>(())
//! ```
//!
//! ### Cached roles
//!
//! ```
//! use rolegraph_rbac::{CachedRoler, RoleGraph};
//!
//! let mut graph = RoleGraph::new();
//! let user = graph.create_cached_role("User");
//! let admin = graph.create_cached_role("Admin");
//! graph.set_child(user, admin)?;
//!
//! let children = graph.cached(user)?.children();
//! assert_eq!(children.get("Admin"), Some(&admin));
//! # Ok::<(), rolegraph_rbac::RoleError>(())
//! ```
//!
//! A cached role cannot be linked under a plain role, because the plain role
//! has nowhere to record its child:
//!
//! ```
//! use rolegraph_rbac::{RoleError, RoleGraph};
//!
//! let mut graph = RoleGraph::new();
//! let cached = graph.create_cached_role("General");
//! let plain = graph.create_role("SimpleRole");
//!
//! assert!(matches!(
//!     graph.set_parent(cached, plain),
//!     Err(RoleError::NoCachedRoler { .. })
//! ));
//! // The other direction needs no child link.
//! assert!(graph.set_parent(plain, cached).is_ok());
//! ```
//!
//! ## Concurrency
//!
//! The engine is single-threaded plain data. Callers that share a graph
//! between threads wrap it in their own lock.

pub mod config;
pub mod error;
pub mod graph;
pub mod permissions;
mod resolve;
pub mod roles;

// Re-export commonly used types
pub use config::GraphConfig;
pub use error::{Result, RoleError};
pub use graph::RoleGraph;
pub use permissions::PermissionSet;
pub use roles::{CachedRole, CachedRoleId, CachedRoler, ChildMap, ParentMap, Role, RoleId, Roler};


// Kani proofs for bounded model checking
#[cfg(kani)]
mod kani_proofs;
