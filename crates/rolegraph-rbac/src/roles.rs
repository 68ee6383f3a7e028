//! Role definitions.
//!
//! Two variants share the [`Roler`] contract:
//! - [`Role`]: walks the live parent graph on every query
//! - [`CachedRole`]: keeps its ancestor closure and direct children, so
//!   ancestor checks are O(1) and the hierarchy can be navigated downwards
//!
//! Roles live inside a [`RoleGraph`] and reference each other through
//! [`RoleId`] handles. Mutating a shared parent is visible to every
//! descendant on its next query.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoleError};
use crate::graph::RoleGraph;
use crate::permissions::PermissionSet;
use crate::resolve;

/// Direct or transitive parents, keyed by role name.
pub type ParentMap = BTreeMap<String, RoleId>;

/// Direct children of a cached role, keyed by role name.
pub type ChildMap = BTreeMap<String, CachedRoleId>;

// ============================================================================
// Handles
// ============================================================================

/// Stable handle to a role stored in a [`RoleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(usize);

impl RoleId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a role that is known to be a [`CachedRole`].
///
/// Only [`RoleGraph::create_cached_role`] hands these out, so operations
/// that need child tracking take this type instead of checking at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CachedRoleId(RoleId);

impl CachedRoleId {
    pub(crate) fn new(id: RoleId) -> Self {
        Self(id)
    }

    /// Returns the untyped handle.
    pub fn id(self) -> RoleId {
        self.0
    }
}

impl Display for CachedRoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<CachedRoleId> for RoleId {
    fn from(id: CachedRoleId) -> Self {
        id.0
    }
}

// ============================================================================
// Contracts
// ============================================================================

/// Base contract shared by every role variant.
///
/// Queries that depend on ancestors take the owning graph, since parents
/// are handles rather than owned values. Linking and unlinking parents
/// touches more than one role and lives on [`RoleGraph`].
pub trait Roler: Debug {
    /// Handle of this role inside its graph.
    fn id(&self) -> RoleId;

    fn name(&self) -> &str;

    /// Whether this role maintains an ancestor cache and child links.
    fn is_cached(&self) -> bool;

    /// Grants a permission directly to this role.
    ///
    /// # Errors
    ///
    /// [`RoleError::AlreadyPermitted`] if the permission is already granted.
    fn permit(&mut self, permission: &str) -> Result<()>;

    /// Revokes a directly granted permission.
    ///
    /// # Errors
    ///
    /// [`RoleError::NotPermitted`] if the permission is not granted.
    fn revoke(&mut self, permission: &str) -> Result<()>;

    /// Permissions granted directly, ignoring parents.
    fn permissions(&self) -> &PermissionSet;

    /// Direct parents.
    fn parents(&self) -> &ParentMap;

    fn has_parent(&self, name: &str) -> bool {
        self.parents().contains_key(name)
    }

    fn get_parent(&self, name: &str) -> Option<RoleId> {
        self.parents().get(name).copied()
    }

    /// Every transitive ancestor, excluding this role.
    fn all_parents(&self, graph: &RoleGraph) -> ParentMap;

    /// Whether `name` is a transitive ancestor of this role.
    fn has_ancestor(&self, graph: &RoleGraph, name: &str) -> bool {
        self.all_parents(graph).contains_key(name)
    }

    /// Own permissions plus the permissions of every ancestor.
    fn all_permissions(&self, graph: &RoleGraph) -> PermissionSet;

    /// Returns whether every given permission is held directly or inherited.
    ///
    /// An empty list is always allowed.
    fn is_allowed(&self, graph: &RoleGraph, permissions: &[&str]) -> bool {
        if permissions.iter().all(|p| self.permissions().contains(p)) {
            return true;
        }
        self.all_permissions(graph).contains_all(permissions)
    }
}

/// Contract of roles that track their children.
pub trait CachedRoler: Roler {
    /// Typed handle of this role.
    fn cached_id(&self) -> CachedRoleId;

    /// Direct children. Grandchildren are reached through the children.
    fn children(&self) -> &ChildMap;
}

// ============================================================================
// Plain variant
// ============================================================================

/// Role that resolves ancestors by walking its parents on every query.
#[derive(Debug, Clone)]
pub struct Role {
    id: RoleId,
    name: String,
    permissions: PermissionSet,
    parents: ParentMap,
}

impl Role {
    pub(crate) fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: PermissionSet::empty(),
            parents: ParentMap::new(),
        }
    }

    pub(crate) fn link_parent(&mut self, name: String, parent: RoleId) {
        self.parents.insert(name, parent);
    }

    pub(crate) fn unlink_parent(&mut self, name: &str) -> Option<RoleId> {
        self.parents.remove(name)
    }
}

impl Roler for Role {
    fn id(&self) -> RoleId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_cached(&self) -> bool {
        false
    }

    fn permit(&mut self, permission: &str) -> Result<()> {
        if self.permissions.insert(permission) {
            Ok(())
        } else {
            Err(RoleError::AlreadyPermitted {
                role: self.name.clone(),
                permission: permission.to_string(),
            })
        }
    }

    fn revoke(&mut self, permission: &str) -> Result<()> {
        if self.permissions.remove(permission) {
            Ok(())
        } else {
            Err(RoleError::NotPermitted {
                role: self.name.clone(),
                permission: permission.to_string(),
            })
        }
    }

    fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    fn parents(&self) -> &ParentMap {
        &self.parents
    }

    fn all_parents(&self, graph: &RoleGraph) -> ParentMap {
        let ancestors = resolve::ancestor_ids(graph, &self.parents);
        resolve::named(graph, ancestors.into_iter().filter(|id| *id != self.id))
    }

    fn all_permissions(&self, graph: &RoleGraph) -> PermissionSet {
        let mut all = self.permissions.clone();
        for id in resolve::ancestor_ids(graph, &self.parents) {
            if let Some(ancestor) = graph.node(id) {
                all.union_with(ancestor.as_roler().permissions());
            }
        }
        all
    }
}

// ============================================================================
// Cached variant
// ============================================================================

/// Role that maintains its ancestor closure and its direct children.
///
/// The closure is rebuilt by [`RoleGraph`] whenever a parent link of this
/// role or of any of its ancestors changes. Both the closure and the child
/// links are held by handle; the by-name views are derived from them, so two
/// roles sharing a name are still tracked separately.
#[derive(Debug, Clone)]
pub struct CachedRole {
    role: Role,
    ancestor_ids: BTreeSet<RoleId>,
    all_parents: ParentMap,
    child_links: BTreeMap<CachedRoleId, String>,
    children: ChildMap,
}

impl CachedRole {
    pub(crate) fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            role: Role::new(id, name),
            ancestor_ids: BTreeSet::new(),
            all_parents: ParentMap::new(),
            child_links: BTreeMap::new(),
            children: ChildMap::new(),
        }
    }

    pub(crate) fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Maintained ancestor closure by name, without copying it.
    pub fn ancestors(&self) -> &ParentMap {
        &self.all_parents
    }

    /// Every ancestor handle, including roles whose name repeats.
    pub fn ancestor_ids(&self) -> &BTreeSet<RoleId> {
        &self.ancestor_ids
    }

    pub(crate) fn replace_ancestors(&mut self, ids: BTreeSet<RoleId>, named: ParentMap) {
        self.ancestor_ids = ids;
        self.all_parents = named;
    }

    pub(crate) fn children_ids(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.child_links.keys().map(|child| child.id())
    }

    pub(crate) fn add_child(&mut self, name: String, child: CachedRoleId) {
        self.child_links.insert(child, name);
        self.rebuild_children();
    }

    pub(crate) fn remove_child(&mut self, child: CachedRoleId) {
        if self.child_links.remove(&child).is_some() {
            self.rebuild_children();
        }
    }

    // The lowest handle wins a name, matching `resolve::named`.
    fn rebuild_children(&mut self) {
        self.children.clear();
        for (child, name) in &self.child_links {
            self.children.entry(name.clone()).or_insert(*child);
        }
    }
}

impl Roler for CachedRole {
    fn id(&self) -> RoleId {
        self.role.id
    }

    fn name(&self) -> &str {
        &self.role.name
    }

    fn is_cached(&self) -> bool {
        true
    }

    fn permit(&mut self, permission: &str) -> Result<()> {
        self.role.permit(permission)
    }

    fn revoke(&mut self, permission: &str) -> Result<()> {
        self.role.revoke(permission)
    }

    fn permissions(&self) -> &PermissionSet {
        &self.role.permissions
    }

    fn parents(&self) -> &ParentMap {
        &self.role.parents
    }

    fn all_parents(&self, _graph: &RoleGraph) -> ParentMap {
        self.all_parents.clone()
    }

    fn has_ancestor(&self, _graph: &RoleGraph, name: &str) -> bool {
        self.all_parents.contains_key(name)
    }

    fn all_permissions(&self, graph: &RoleGraph) -> PermissionSet {
        let mut all = self.role.permissions.clone();
        for id in &self.ancestor_ids {
            if let Some(ancestor) = graph.node(*id) {
                all.union_with(ancestor.as_roler().permissions());
            }
        }
        all
    }
}

impl CachedRoler for CachedRole {
    fn cached_id(&self) -> CachedRoleId {
        CachedRoleId::new(self.role.id)
    }

    fn children(&self) -> &ChildMap {
        &self.children
    }
}
