//! # HRBAC Service
//!
//! Async boundary around the `hrbac-core` resolution engine: a loader
//! collaborator for fetching serialized hierarchy and permission data on
//! demand, and a service wrapper that loads before resolving.
//!
//! ## Overview
//!
//! The hrbac-service crate handles:
//! - **Loader**: optional-capability trait for backends that serve
//!   hierarchy and permission payloads (`StaticLoader` ships as the
//!   in-memory implementation)
//! - **HrbacService**: the adapter-facing query API — `is_allowed` /
//!   `is_denied` with load-then-resolve semantics behind a read-write
//!   lock
//!
//! ## Architecture
//!
//! ```text
//! adapter ─→ HrbacService::is_allowed
//!              ├─ Loader::load_role / load_resource   (parallel)
//!              ├─ registries.import_serialized        (merge)
//!              ├─ Loader::load_permissions(closures)
//!              ├─ store.import_serialized
//!              └─ Hrbac::is_allowed
//! ```
//!
//! Loading is awaited to completion before resolution begins; resolution
//! itself never suspends except to await assertion predicates. Load
//! failures propagate as errors — they are never converted into an
//! authorization decision.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use hrbac_core::{Hrbac, RuleData, RuleType};
//! use hrbac_service::{HrbacService, StaticLoader};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let loader = StaticLoader::new()
//!     .with_role_hierarchy("user", [("user", vec!["guest"])])
//!     .with_permission(
//!         Some("guest"),
//!         Some("document"),
//!         RuleData { rule_type: RuleType::Allow, privileges: Some(vec!["read".into()]) },
//!     );
//!
//! let service = HrbacService::with_loader(Hrbac::new(), Arc::new(loader));
//! assert!(service.is_allowed("user", "document", Some("read")).await.unwrap());
//! # });
//! ```

pub mod error;
pub mod loader;
pub mod service;

// Re-export main types for convenience
pub use error::{ServiceError, ServiceResult};
pub use loader::{Loader, StaticLoader};
pub use service::HrbacService;
