//! Rule and hierarchy loading
//!
//! This module defines the loader collaborator: an external source of
//! serialized hierarchy and permission data fetched on demand before a
//! resolution runs. A backend implements whichever capabilities it has —
//! the default method bodies report the capability as absent — and the
//! service imports whatever comes back.

use async_trait::async_trait;
use hrbac_core::RuleData;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ServiceResult;

/// On-demand source of serialized hierarchy and permission data.
///
/// All three capabilities are optional; the default implementations
/// return `Ok(None)`, meaning "not provided". Payloads use the core wire
/// forms: hierarchies as `[id, [parents...]]` pairs, permissions as
/// `[roleIdOrNull, resourceIdOrNull, rule]` triples.
///
/// `load_permissions` receives the already-expanded role and resource
/// ancestor closures, so a backend can return exactly the rules relevant
/// to one query.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load hierarchy data for the queried role.
    async fn load_role(&self, _role_id: &str) -> ServiceResult<Option<Value>> {
        Ok(None)
    }

    /// Load hierarchy data for the queried resource.
    async fn load_resource(&self, _resource_id: &str) -> ServiceResult<Option<Value>> {
        Ok(None)
    }

    /// Load permission rules scoped to the expanded closures.
    async fn load_permissions(
        &self,
        _role_ids: &[String],
        _resource_ids: &[String],
    ) -> ServiceResult<Option<Value>> {
        Ok(None)
    }
}

/// In-memory [`Loader`] serving preloaded data.
///
/// Suitable for single-process applications and testing; backends with
/// real storage implement [`Loader`] directly. Hierarchy payloads are
/// registered per role/resource id; permission entries are registered
/// once and filtered per query against the expanded closures, the way a
/// storage-backed loader would scope its query.
///
/// # Example
///
/// ```
/// use hrbac_service::StaticLoader;
/// use hrbac_core::{RuleData, RuleType};
///
/// let loader = StaticLoader::new()
///     .with_role_hierarchy("user", [("user", vec!["guest"])])
///     .with_permission(
///         Some("guest"),
///         Some("document"),
///         RuleData { rule_type: RuleType::Allow, privileges: Some(vec!["read".into()]) },
///     );
/// # let _ = loader;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    roles: HashMap<String, Vec<(String, Vec<String>)>>,
    resources: HashMap<String, Vec<(String, Vec<String>)>>,
    permissions: Option<Vec<(Option<String>, Option<String>, RuleData)>>,
}

impl StaticLoader {
    /// Create a loader with no data; every capability reports absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hierarchy entries returned for a role id.
    pub fn with_role_hierarchy<I, S, P>(mut self, role_id: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<P>)>,
        S: Into<String>,
        P: Into<String>,
    {
        self.roles
            .insert(role_id.into(), collect_entries(entries));
        self
    }

    /// Register the hierarchy entries returned for a resource id.
    pub fn with_resource_hierarchy<I, S, P>(
        mut self,
        resource_id: impl Into<String>,
        entries: I,
    ) -> Self
    where
        I: IntoIterator<Item = (S, Vec<P>)>,
        S: Into<String>,
        P: Into<String>,
    {
        self.resources
            .insert(resource_id.into(), collect_entries(entries));
        self
    }

    /// Register a permission entry; `None` keys are wildcards.
    ///
    /// Registering any entry enables the permission capability.
    pub fn with_permission(
        mut self,
        role: Option<&str>,
        resource: Option<&str>,
        rule: RuleData,
    ) -> Self {
        self.permissions.get_or_insert_with(Vec::new).push((
            role.map(str::to_string),
            resource.map(str::to_string),
            rule,
        ));
        self
    }
}

fn collect_entries<I, S, P>(entries: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = (S, Vec<P>)>,
    S: Into<String>,
    P: Into<String>,
{
    entries
        .into_iter()
        .map(|(id, parents)| {
            (
                id.into(),
                parents.into_iter().map(Into::into).collect(),
            )
        })
        .collect()
}

#[async_trait]
impl Loader for StaticLoader {
    async fn load_role(&self, role_id: &str) -> ServiceResult<Option<Value>> {
        Ok(self
            .roles
            .get(role_id)
            .map(|entries| serde_json::json!(entries)))
    }

    async fn load_resource(&self, resource_id: &str) -> ServiceResult<Option<Value>> {
        Ok(self
            .resources
            .get(resource_id)
            .map(|entries| serde_json::json!(entries)))
    }

    async fn load_permissions(
        &self,
        role_ids: &[String],
        resource_ids: &[String],
    ) -> ServiceResult<Option<Value>> {
        let Some(permissions) = &self.permissions else {
            return Ok(None);
        };

        let scoped: Vec<_> = permissions
            .iter()
            .filter(|(role, resource, _)| {
                role.as_ref().map_or(true, |r| role_ids.contains(r))
                    && resource.as_ref().map_or(true, |r| resource_ids.contains(r))
            })
            .collect();

        Ok(Some(serde_json::json!(scoped)))
    }
}
