//! Roles and the role registry
//!
//! A role is the acting subject in an access decision. The registry
//! specializes [`HierarchyGraph`] by normalizing "role or identifier"
//! arguments into canonical string ids.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HrbacResult;
use crate::hierarchy::HierarchyGraph;

/// The acting subject in an access decision.
///
/// A role is identified by an opaque, case-sensitive id. It may carry an
/// explicit ordered list of structural parent ids — local inheritance that
/// participates in closure expansion alongside registry-based parents,
/// without any registry mutation. The attribute bag holds application data
/// for assertion predicates (ownership checks and the like).
///
/// # Example
///
/// ```
/// use hrbac_core::Role;
/// use serde_json::json;
///
/// let role = Role::new("user").with_attributes(json!({ "id": "u" }));
/// assert_eq!(role.role_id, "user");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Canonical role id.
    pub role_id: String,

    /// Instance-level structural parent ids, honored ahead of
    /// registry-registered parents during closure expansion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Application data available to assertion predicates.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub attributes: Value,
}

impl Role {
    /// Create a role with no structural parents and no attributes.
    pub fn new(role_id: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            parents: Vec::new(),
            attributes: Value::Null,
        }
    }

    /// Attach instance-level structural parents.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Attach application attributes for assertion predicates.
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A role argument: either a bare id or a [`Role`] entity.
///
/// Normalization of the two forms happens once, at the API boundary; the
/// rest of the call chain works with the canonical id (and, for entities,
/// the instance-level parents).
#[derive(Debug, Clone, Copy)]
pub enum RoleRef<'a> {
    /// A bare role id.
    Id(&'a str),
    /// A role entity, possibly carrying instance parents and attributes.
    Entity(&'a Role),
}

impl RoleRef<'_> {
    /// The canonical role id.
    pub fn role_id(&self) -> &str {
        match self {
            RoleRef::Id(id) => id,
            RoleRef::Entity(role) => &role.role_id,
        }
    }

    /// Instance-level parents; empty for bare ids.
    pub(crate) fn instance_parents(&self) -> &[String] {
        match self {
            RoleRef::Id(_) => &[],
            RoleRef::Entity(role) => &role.parents,
        }
    }
}

impl<'a> RoleRef<'a> {
    /// Materialize the referenced entity; bare ids become roles with no
    /// extra structural parents.
    pub(crate) fn to_entity(self) -> Cow<'a, Role> {
        match self {
            RoleRef::Id(id) => Cow::Owned(Role::new(id)),
            RoleRef::Entity(role) => Cow::Borrowed(role),
        }
    }
}

impl<'a> From<&'a str> for RoleRef<'a> {
    fn from(id: &'a str) -> Self {
        RoleRef::Id(id)
    }
}

impl<'a> From<&'a String> for RoleRef<'a> {
    fn from(id: &'a String) -> Self {
        RoleRef::Id(id)
    }
}

impl<'a> From<&'a Role> for RoleRef<'a> {
    fn from(role: &'a Role) -> Self {
        RoleRef::Entity(role)
    }
}

/// Role inheritance registry.
///
/// Thin specialization of [`HierarchyGraph`]: every operation accepts
/// either a bare id or a [`Role`] entity and resolves it to the canonical
/// id. Entity arguments additionally contribute their instance-level
/// parents to queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleRegistry {
    graph: HierarchyGraph,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the role id has a recorded parent list.
    pub fn has_entry(&self, id: &str) -> bool {
        self.graph.has_entry(id)
    }

    /// Direct parents: instance-level parents (entity arguments only)
    /// followed by registry-registered parents.
    pub fn get_parents<'a>(&self, role: impl Into<RoleRef<'a>>) -> Vec<String> {
        let role = role.into();
        role.instance_parents()
            .iter()
            .cloned()
            .chain(self.graph.parents(role.role_id()).iter().cloned())
            .collect()
    }

    /// Replace the registered parent list wholesale.
    pub fn set_parents<'a, I, S>(&mut self, role: impl Into<RoleRef<'a>>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.graph.set_parents(role.into().role_id(), parents);
    }

    /// Append currently-absent parent ids, preserving first-appearance
    /// order.
    pub fn add_parents<'a, I, S>(&mut self, role: impl Into<RoleRef<'a>>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.graph.add_parents(role.into().role_id(), parents);
    }

    /// Full ancestor closure, starting with the role itself, closest
    /// first. Instance-level parents of an entity argument are expanded as
    /// additional direct parents.
    pub fn get_parents_recursive<'a>(&self, role: impl Into<RoleRef<'a>>) -> Vec<String> {
        let role = role.into();
        self.graph.closure(role.role_id(), role.instance_parents())
    }

    /// Export as ordered `(id, parents)` pairs.
    pub fn to_serializable(&self) -> Vec<(String, Vec<String>)> {
        self.graph.to_serializable()
    }

    /// Import serialized hierarchy data, merging entry by entry.
    pub fn import_serialized(&mut self, data: &Value) -> HrbacResult<()> {
        self.graph.import_serialized(data)
    }
}
