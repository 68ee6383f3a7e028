//! Kani bounded model checking proofs for hierarchy correctness.
//!
//! - Permission pairing: permit/revoke succeed exactly once each
//! - Vacuous allowance: an empty permission list is always allowed
//! - No self-ancestry: a role never becomes its own parent

use crate::{GraphConfig, RoleError, RoleGraph};

//=============================================================================
// Permission pairing
//=============================================================================

/// Verifies that a second permit or revoke of the same name fails and
/// leaves the direct permission set unchanged.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_permit_revoke_pairing() {
    let mut graph = RoleGraph::with_config(GraphConfig::quiet());
    let cached: bool = kani::any();
    let role = if cached {
        graph.create_cached_role("Role").id()
    } else {
        graph.create_role("Role")
    };

    assert!(graph.permit(role, "Read").is_ok());
    assert!(matches!(
        graph.permit(role, "Read"),
        Err(RoleError::AlreadyPermitted { .. })
    ));
    assert_eq!(graph.permissions(role).map(|p| p.len()), Ok(1));

    assert!(graph.revoke(role, "Read").is_ok());
    assert!(matches!(
        graph.revoke(role, "Read"),
        Err(RoleError::NotPermitted { .. })
    ));
    assert_eq!(graph.permissions(role).map(|p| p.len()), Ok(0));
}

//=============================================================================
// Vacuous allowance
//=============================================================================

#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_empty_request_is_allowed() {
    let mut graph = RoleGraph::with_config(GraphConfig::quiet());
    let parent = graph.create_cached_role("Parent");
    let child = graph.create_cached_role("Child");

    if kani::any() {
        let _ = graph.set_parent(child, parent);
    }

    assert_eq!(graph.is_allowed(child, &[]), Ok(true));
    assert_eq!(graph.is_allowed(parent, &[]), Ok(true));
}

//=============================================================================
// No self-ancestry
//=============================================================================

#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_self_parent_rejected() {
    let reject_cycles: bool = kani::any();
    let mut graph = RoleGraph::with_config(GraphConfig {
        reject_cycles,
        trace_mutations: false,
    });
    let role = graph.create_cached_role("Loop");

    assert!(matches!(
        graph.set_parent(role, role),
        Err(RoleError::CircularInheritance { .. })
    ));
    assert_eq!(graph.has_parent(role, "Loop"), Ok(false));
}
