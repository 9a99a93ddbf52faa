//! # HRBAC Core (Hierarchical Role-Based Access Control)
//!
//! This crate provides the permission resolution core for hierarchical
//! RBAC: given a role, a resource, and an optional privilege, it decides
//! allow or deny.
//!
//! ## Overview
//!
//! The hrbac-core crate handles:
//! - **Hierarchy graphs**: parent-pointer inheritance for roles and
//!   resources, cycle-tolerant ancestor expansion
//! - **Registries**: role/resource specializations that normalize
//!   "id or entity" arguments to canonical ids
//! - **Permission store**: ordered (role, resource) rule buckets with
//!   wildcard keys and append-only registration
//! - **Decision engine**: closure expansion, rule collection, and
//!   precedence-ordered evaluation
//!
//! ## Architecture
//!
//! ```text
//! caller ─→ Hrbac::resolve
//!             ├─ RoleRegistry ────→ role closure (closest first)
//!             ├─ ResourceRegistry ─→ resource closure
//!             └─ PermissionStore ──→ candidate rules
//!                   └─ Rule::matches (privileges, assertion) ─→ decision
//! ```
//!
//! Both closures and the matched rule list are reversed before
//! evaluation, so rules attached to more specific roles/resources — and
//! rules registered later for the same pair — take priority. Declare
//! broad defaults first, override narrowly later. No matching rule means
//! deny.
//!
//! ## Usage
//!
//! ```rust
//! use hrbac_core::Hrbac;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut hrbac = Hrbac::new();
//! hrbac.role_registry_mut().add_parents("user", ["guest"]);
//!
//! hrbac.permission_store_mut().deny(None, None, None, None);
//! hrbac
//!     .permission_store_mut()
//!     .allow(Some("guest"), Some("document"), Some(&["read"]), None);
//!
//! // "user" inherits the guest read permission.
//! assert!(hrbac.is_allowed("user", "document", Some("read")).await);
//! assert!(hrbac.is_denied("user", "document", Some("update")).await);
//! # });
//! ```
//!
//! ## Data-dependent rules
//!
//! Rules may carry an assertion predicate over the engine, the role, the
//! resource, and the privilege — ownership checks and the like, against
//! the entity attribute bags. Synchronous and asynchronous assertions are
//! evaluated through the same path. Assertions are never serialized;
//! exports report how many were dropped.
//!
//! ## Serialization
//!
//! Hierarchies export as ordered `[id, [parents...]]` pairs and the
//! permission store as flat `[role, resource, rule]` triples, both as
//! plain JSON values. Imports validate strictly and fail pinpointing the
//! malformed entry. Loading serialized data on demand (e.g. from a
//! backend) is the job of the `hrbac-service` crate.

pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod resource;
pub mod role;
pub mod rules;

// Re-export main types for convenience
pub use engine::Hrbac;
pub use error::{HrbacError, HrbacResult};
pub use hierarchy::HierarchyGraph;
pub use resource::{Resource, ResourceRef, ResourceRegistry};
pub use role::{Role, RoleRef, RoleRegistry};
pub use rules::{PermissionExport, PermissionStore, Rule, RuleAssertion, RuleData, RuleType};
