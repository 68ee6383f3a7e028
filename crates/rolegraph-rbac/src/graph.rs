//! Role arena.
//!
//! [`RoleGraph`] owns every role. Parent, ancestor and child links are
//! [`RoleId`] handles into the arena, so a parent shared by many children is
//! stored once and every change to it is seen by all of its descendants.

use tracing::{debug, trace, warn};

use crate::config::GraphConfig;
use crate::error::{Result, RoleError};
use crate::permissions::PermissionSet;
use crate::resolve;
use crate::roles::{
    CachedRole, CachedRoleId, CachedRoler, ChildMap, ParentMap, Role, RoleId, Roler,
};

/// Storage slot of one role.
#[derive(Debug, Clone)]
pub(crate) enum RoleNode {
    Plain(Role),
    Cached(CachedRole),
}

impl RoleNode {
    pub(crate) fn as_roler(&self) -> &dyn Roler {
        match self {
            RoleNode::Plain(role) => role,
            RoleNode::Cached(role) => role,
        }
    }

    fn as_roler_mut(&mut self) -> &mut dyn Roler {
        match self {
            RoleNode::Plain(role) => role,
            RoleNode::Cached(role) => role,
        }
    }

    fn base_mut(&mut self) -> &mut Role {
        match self {
            RoleNode::Plain(role) => role,
            RoleNode::Cached(role) => role.role_mut(),
        }
    }
}

/// In-memory role hierarchy.
///
/// # Example
///
/// ```
/// use rolegraph_rbac::RoleGraph;
///
/// let mut graph = RoleGraph::new();
/// let user = graph.create_role("User");
/// let admin = graph.create_role("Admin");
///
/// graph.permit(user, "SendMsg")?;
/// graph.permit(admin, "BanUser")?;
/// graph.set_parent(admin, user)?;
///
/// assert!(graph.is_allowed(admin, &["SendMsg", "BanUser"])?);
/// assert!(!graph.is_allowed(user, &["BanUser"])?);
/// # Ok::<(), rolegraph_rbac::RoleError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    nodes: Vec<RoleNode>,
    config: GraphConfig,
}

impl RoleGraph {
    /// Creates an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Creates a plain role with no permissions and no parents.
    pub fn create_role(&mut self, name: impl Into<String>) -> RoleId {
        let id = RoleId::new(self.nodes.len());
        let role = Role::new(id, name);
        if self.config.trace_mutations {
            debug!(role = %role.name(), id = %id, "role created");
        }
        self.nodes.push(RoleNode::Plain(role));
        id
    }

    /// Creates a cached role with no permissions, parents or children.
    pub fn create_cached_role(&mut self, name: impl Into<String>) -> CachedRoleId {
        let id = RoleId::new(self.nodes.len());
        let role = CachedRole::new(id, name);
        if self.config.trace_mutations {
            debug!(role = %role.name(), id = %id, "cached role created");
        }
        self.nodes.push(RoleNode::Cached(role));
        CachedRoleId::new(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the first role created with `name`.
    pub fn find(&self, name: &str) -> Option<RoleId> {
        self.roles().find(|role| role.name() == name).map(|role| role.id())
    }

    /// Iterates over every role in creation order.
    pub fn roles(&self) -> impl Iterator<Item = &dyn Roler> {
        self.nodes.iter().map(RoleNode::as_roler)
    }

    pub fn role(&self, id: impl Into<RoleId>) -> Result<&dyn Roler> {
        let id = id.into();
        self.node(id)
            .map(RoleNode::as_roler)
            .ok_or(RoleError::UnknownRole(id))
    }

    /// Mutable access to one role's own state.
    ///
    /// Mutations made here are not traced; prefer [`permit`](Self::permit)
    /// and [`revoke`](Self::revoke).
    pub fn role_mut(&mut self, id: impl Into<RoleId>) -> Result<&mut dyn Roler> {
        let id = id.into();
        self.nodes
            .get_mut(id.index())
            .map(RoleNode::as_roler_mut)
            .ok_or(RoleError::UnknownRole(id))
    }

    pub fn cached(&self, id: CachedRoleId) -> Result<&CachedRole> {
        match self.node(id.id()) {
            Some(RoleNode::Cached(role)) => Ok(role),
            _ => Err(RoleError::UnknownRole(id.id())),
        }
    }

    pub(crate) fn node(&self, id: RoleId) -> Option<&RoleNode> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: RoleId) -> Result<&mut RoleNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(RoleError::UnknownRole(id))
    }

    fn name_of(&self, id: RoleId) -> &str {
        self.node(id).map_or("<unknown>", |node| node.as_roler().name())
    }

    // ------------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------------

    /// Grants `permission` directly to a role.
    pub fn permit(&mut self, id: impl Into<RoleId>, permission: &str) -> Result<()> {
        let id = id.into();
        let result = self.role_mut(id).and_then(|role| role.permit(permission));
        self.observe("permit", id, permission, result)
    }

    /// Revokes a directly granted `permission`.
    pub fn revoke(&mut self, id: impl Into<RoleId>, permission: &str) -> Result<()> {
        let id = id.into();
        let result = self.role_mut(id).and_then(|role| role.revoke(permission));
        self.observe("revoke", id, permission, result)
    }

    pub fn permissions(&self, id: impl Into<RoleId>) -> Result<&PermissionSet> {
        Ok(self.role(id)?.permissions())
    }

    pub fn all_permissions(&self, id: impl Into<RoleId>) -> Result<PermissionSet> {
        Ok(self.role(id)?.all_permissions(self))
    }

    pub fn is_allowed(&self, id: impl Into<RoleId>, permissions: &[&str]) -> Result<bool> {
        Ok(self.role(id)?.is_allowed(self, permissions))
    }

    // ------------------------------------------------------------------------
    // Parents
    // ------------------------------------------------------------------------

    /// Links `parent` as a direct parent of `child`.
    ///
    /// When `child` is cached, `parent` must be cached too: the parent
    /// records the child, and the child's ancestor closure (and that of its
    /// cached descendants) is rebuilt.
    ///
    /// # Errors
    ///
    /// - [`RoleError::AlreadyParent`] if a parent with that name is linked
    /// - [`RoleError::NoCachedRoler`] if a cached child gets a plain parent
    /// - [`RoleError::CircularInheritance`] if `child` is `parent` or one of
    ///   its ancestors
    /// - [`RoleError::UnknownRole`] for a foreign handle
    pub fn set_parent(
        &mut self,
        child: impl Into<RoleId>,
        parent: impl Into<RoleId>,
    ) -> Result<()> {
        let (child, parent) = (child.into(), parent.into());
        let result = self.link(child, parent);
        self.observe("set_parent", child, self.name_of(parent), result)
    }

    /// Unlinks the direct parent called `name`.
    ///
    /// The ancestor closure of a cached role is recomputed from the
    /// remaining parents, so an ancestor still reachable through a sibling
    /// parent is kept.
    ///
    /// # Errors
    ///
    /// [`RoleError::NoParent`] if no direct parent has that name.
    pub fn remove_parent(&mut self, child: impl Into<RoleId>, name: &str) -> Result<()> {
        let child = child.into();
        let result = self.unlink(child, name);
        self.observe("remove_parent", child, name, result)
    }

    pub fn has_parent(&self, id: impl Into<RoleId>, name: &str) -> Result<bool> {
        Ok(self.role(id)?.has_parent(name))
    }

    pub fn get_parent(&self, id: impl Into<RoleId>, name: &str) -> Result<Option<RoleId>> {
        Ok(self.role(id)?.get_parent(name))
    }

    pub fn parents(&self, id: impl Into<RoleId>) -> Result<&ParentMap> {
        Ok(self.role(id)?.parents())
    }

    pub fn all_parents(&self, id: impl Into<RoleId>) -> Result<ParentMap> {
        Ok(self.role(id)?.all_parents(self))
    }

    pub fn has_ancestor(&self, id: impl Into<RoleId>, name: &str) -> Result<bool> {
        Ok(self.role(id)?.has_ancestor(self, name))
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    /// Links `child` under `parent`; same as `set_parent(child, parent)`.
    pub fn set_child(&mut self, parent: CachedRoleId, child: CachedRoleId) -> Result<()> {
        self.set_parent(child, parent)
    }

    pub fn children(&self, id: CachedRoleId) -> Result<&ChildMap> {
        Ok(self.cached(id)?.children())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn link(&mut self, child: RoleId, parent: RoleId) -> Result<()> {
        let child_role = self.role(child)?;
        let parent_role = self.role(parent)?;
        let child_name = child_role.name().to_string();
        let parent_name = parent_role.name().to_string();

        if child_role.has_parent(&parent_name) {
            return Err(RoleError::AlreadyParent {
                role: child_name,
                parent: parent_name,
            });
        }

        if child_role.is_cached() && !parent_role.is_cached() {
            return Err(RoleError::NoCachedRoler {
                role: child_name,
                parent: parent_name,
            });
        }

        if child == parent || (self.config.reject_cycles && resolve::reaches(self, parent, child))
        {
            return Err(RoleError::CircularInheritance {
                role: child_name,
                parent: parent_name,
            });
        }

        let child_handle = match self.node(child) {
            Some(RoleNode::Cached(cached)) => Some(cached.cached_id()),
            _ => None,
        };

        self.node_mut(child)?.base_mut().link_parent(parent_name, parent);

        if let Some(handle) = child_handle {
            if let RoleNode::Cached(cached_parent) = self.node_mut(parent)? {
                cached_parent.add_child(child_name, handle);
            }
            self.refresh_ancestors(child);
        }

        Ok(())
    }

    fn unlink(&mut self, child: RoleId, name: &str) -> Result<()> {
        let role = self.role(child)?;
        let child_name = role.name().to_string();
        let child_handle = match self.node(child) {
            Some(RoleNode::Cached(cached)) => Some(cached.cached_id()),
            _ => None,
        };

        let Some(former) = self.node_mut(child)?.base_mut().unlink_parent(name) else {
            return Err(RoleError::NoParent {
                role: child_name,
                parent: name.to_string(),
            });
        };

        if let Some(handle) = child_handle {
            if let Some(RoleNode::Cached(cached_parent)) = self.nodes.get_mut(former.index()) {
                cached_parent.remove_child(handle);
            }
            self.refresh_ancestors(child);
        }

        Ok(())
    }

    /// Rebuilds the ancestor closure of `root` and of every cached
    /// descendant, parents before children.
    fn refresh_ancestors(&mut self, root: RoleId) {
        for id in resolve::refresh_order(self, root) {
            let Some(node) = self.node(id) else { continue };
            let closure = resolve::closure_from_parents(self, id, node.as_roler().parents());
            let named = resolve::named(self, closure.iter().copied());

            if let Some(RoleNode::Cached(cached)) = self.nodes.get_mut(id.index()) {
                trace!(
                    role = %cached.name(),
                    ancestors = closure.len(),
                    "ancestor closure rebuilt"
                );
                cached.replace_ancestors(closure, named);
            }
        }
    }

    fn observe(
        &self,
        operation: &'static str,
        id: RoleId,
        subject: &str,
        result: Result<()>,
    ) -> Result<()> {
        if self.config.trace_mutations {
            match &result {
                Ok(()) => debug!(
                    operation,
                    role = %self.name_of(id),
                    subject = %subject,
                    "role mutation applied"
                ),
                Err(error) => warn!(
                    operation,
                    role = %self.name_of(id),
                    subject = %subject,
                    error = %error,
                    "role mutation rejected"
                ),
            }
        }
        result
    }
}
