//! Resources and the resource registry
//!
//! A resource is the object being accessed. Symmetric to the role side:
//! the registry specializes [`HierarchyGraph`] by normalizing "resource or
//! identifier" arguments into canonical string ids.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HrbacResult;
use crate::hierarchy::HierarchyGraph;

/// The object or target of an access decision.
///
/// Identified by an opaque, case-sensitive id, with optional instance-level
/// structural parents and an attribute bag for assertion predicates.
///
/// # Example
///
/// ```
/// use hrbac_core::Resource;
/// use serde_json::json;
///
/// let doc = Resource::new("document").with_attributes(json!({ "author": "a" }));
/// assert_eq!(doc.resource_id, "document");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Canonical resource id.
    pub resource_id: String,

    /// Instance-level structural parent ids, honored ahead of
    /// registry-registered parents during closure expansion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Application data available to assertion predicates.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub attributes: Value,
}

impl Resource {
    /// Create a resource with no structural parents and no attributes.
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
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

/// A resource argument: either a bare id or a [`Resource`] entity.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    /// A bare resource id.
    Id(&'a str),
    /// A resource entity, possibly carrying instance parents and
    /// attributes.
    Entity(&'a Resource),
}

impl ResourceRef<'_> {
    /// The canonical resource id.
    pub fn resource_id(&self) -> &str {
        match self {
            ResourceRef::Id(id) => id,
            ResourceRef::Entity(resource) => &resource.resource_id,
        }
    }

    /// Instance-level parents; empty for bare ids.
    pub(crate) fn instance_parents(&self) -> &[String] {
        match self {
            ResourceRef::Id(_) => &[],
            ResourceRef::Entity(resource) => &resource.parents,
        }
    }
}

impl<'a> ResourceRef<'a> {
    /// Materialize the referenced entity; bare ids become resources with
    /// no extra structural parents.
    pub(crate) fn to_entity(self) -> Cow<'a, Resource> {
        match self {
            ResourceRef::Id(id) => Cow::Owned(Resource::new(id)),
            ResourceRef::Entity(resource) => Cow::Borrowed(resource),
        }
    }
}

impl<'a> From<&'a str> for ResourceRef<'a> {
    fn from(id: &'a str) -> Self {
        ResourceRef::Id(id)
    }
}

impl<'a> From<&'a String> for ResourceRef<'a> {
    fn from(id: &'a String) -> Self {
        ResourceRef::Id(id)
    }
}

impl<'a> From<&'a Resource> for ResourceRef<'a> {
    fn from(resource: &'a Resource) -> Self {
        ResourceRef::Entity(resource)
    }
}

/// Resource inheritance registry.
///
/// Thin specialization of [`HierarchyGraph`] over resource ids; no other
/// behavioral difference from the role side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceRegistry {
    graph: HierarchyGraph,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the resource id has a recorded parent list.
    pub fn has_entry(&self, id: &str) -> bool {
        self.graph.has_entry(id)
    }

    /// Direct parents: instance-level parents (entity arguments only)
    /// followed by registry-registered parents.
    pub fn get_parents<'a>(&self, resource: impl Into<ResourceRef<'a>>) -> Vec<String> {
        let resource = resource.into();
        resource
            .instance_parents()
            .iter()
            .cloned()
            .chain(self.graph.parents(resource.resource_id()).iter().cloned())
            .collect()
    }

    /// Replace the registered parent list wholesale.
    pub fn set_parents<'a, I, S>(&mut self, resource: impl Into<ResourceRef<'a>>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.graph.set_parents(resource.into().resource_id(), parents);
    }

    /// Append currently-absent parent ids, preserving first-appearance
    /// order.
    pub fn add_parents<'a, I, S>(&mut self, resource: impl Into<ResourceRef<'a>>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.graph.add_parents(resource.into().resource_id(), parents);
    }

    /// Full ancestor closure, starting with the resource itself, closest
    /// first. Instance-level parents of an entity argument are expanded as
    /// additional direct parents.
    pub fn get_parents_recursive<'a>(&self, resource: impl Into<ResourceRef<'a>>) -> Vec<String> {
        let resource = resource.into();
        self.graph
            .closure(resource.resource_id(), resource.instance_parents())
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
