//! Decision engine
//!
//! This module ties the registries and the permission store together. A
//! query expands the role and resource through their inheritance graphs,
//! collects the applicable rules, and evaluates them so that rules bound
//! to closer roles/resources — and rules registered later for the same
//! pair — take precedence. Absence of a matching rule is a deny.

use crate::resource::{ResourceRef, ResourceRegistry};
use crate::role::{RoleRef, RoleRegistry};
use crate::rules::{PermissionStore, RuleType};

/// Hierarchical RBAC decision engine.
///
/// Holds the role registry, the resource registry, and the permission
/// store. Resolution is a pure function of their current contents: no
/// state persists across queries, and the engine never mutates anything
/// during a query.
///
/// Broad defaults can be declared first and overridden narrowly later:
///
/// ```
/// use hrbac_core::Hrbac;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut hrbac = Hrbac::new();
/// hrbac.permission_store_mut().deny(None, None, None, None);
/// hrbac.permission_store_mut().allow(Some("admin"), None, None, None);
///
/// assert!(hrbac.is_allowed("admin", "settings", None).await);
/// assert!(hrbac.is_denied("other", "settings", None).await);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Hrbac {
    roles: RoleRegistry,
    resources: ResourceRegistry,
    permissions: PermissionStore,
}

impl Hrbac {
    /// Create an engine with empty registries and store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble an engine from existing components.
    pub fn from_parts(
        roles: RoleRegistry,
        resources: ResourceRegistry,
        permissions: PermissionStore,
    ) -> Self {
        Self {
            roles,
            resources,
            permissions,
        }
    }

    /// The role inheritance registry.
    pub fn role_registry(&self) -> &RoleRegistry {
        &self.roles
    }

    /// Mutable access to the role inheritance registry.
    pub fn role_registry_mut(&mut self) -> &mut RoleRegistry {
        &mut self.roles
    }

    /// The resource inheritance registry.
    pub fn resource_registry(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Mutable access to the resource inheritance registry.
    pub fn resource_registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.resources
    }

    /// The permission rule store.
    pub fn permission_store(&self) -> &PermissionStore {
        &self.permissions
    }

    /// Mutable access to the permission rule store.
    pub fn permission_store_mut(&mut self) -> &mut PermissionStore {
        &mut self.permissions
    }

    /// Resolve a query to its decision.
    ///
    /// One resolution per query: callers needing both the allowed and the
    /// denied view of the same query should call this once and compare,
    /// rather than invoking [`is_allowed`](Self::is_allowed) and
    /// [`is_denied`](Self::is_denied) separately (which would evaluate
    /// assertions twice).
    ///
    /// The role and resource closures are expanded closest-first, then
    /// reversed so the most ancestral candidates come first; the matched
    /// rule list is reversed as well, so the last-registered,
    /// most-specific-context rule is evaluated first. The first matching
    /// rule decides; no match is a deny.
    pub async fn resolve<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        resource: impl Into<ResourceRef<'a>>,
        privilege: Option<&str>,
    ) -> RuleType {
        let role = role.into().to_entity();
        let resource = resource.into().to_entity();

        let mut role_closure = self.roles.get_parents_recursive(&*role);
        role_closure.reverse();

        let mut resource_closure = self.resources.get_parents_recursive(&*resource);
        resource_closure.reverse();

        let rules = self.permissions.matching_rules(&role_closure, &resource_closure);

        for rule in rules.into_iter().rev() {
            if rule.matches(self, &role, &resource, privilege).await {
                return rule.rule_type();
            }
        }

        RuleType::Deny
    }

    /// Whether the role is allowed the privilege on the resource.
    pub async fn is_allowed<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        resource: impl Into<ResourceRef<'a>>,
        privilege: Option<&str>,
    ) -> bool {
        self.resolve(role, resource, privilege).await == RuleType::Allow
    }

    /// Whether the role is denied the privilege on the resource.
    pub async fn is_denied<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        resource: impl Into<ResourceRef<'a>>,
        privilege: Option<&str>,
    ) -> bool {
        self.resolve(role, resource, privilege).await == RuleType::Deny
    }
}
