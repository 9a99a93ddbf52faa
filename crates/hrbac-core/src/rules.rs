//! Permission rules
//!
//! This module provides the rule value type, assertion predicates, and the
//! permission store: a two-level mapping from role id (or wildcard) and
//! resource id (or wildcard) to ordered rule lists.
//!
//! Bucket creation order and in-bucket insertion order are both preserved;
//! the decision engine relies on them for precedence (later registrations
//! override earlier ones once the matched list is reversed).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::Hrbac;
use crate::error::{HrbacError, HrbacResult};
use crate::resource::Resource;
use crate::role::Role;

/// The decision a rule contributes when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Grant access.
    Allow,
    /// Refuse access.
    Deny,
}

impl RuleType {
    /// Get the lowercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    /// Parse from the lowercase string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

type SyncAssertion = dyn Fn(&Hrbac, &Role, &Resource, Option<&str>) -> bool + Send + Sync;
type AsyncAssertion = dyn for<'a> Fn(&'a Hrbac, &'a Role, &'a Resource, Option<&'a str>) -> BoxFuture<'a, bool>
    + Send
    + Sync;

/// A side-effect-free predicate gating a rule on application data.
///
/// Assertions receive the engine, the (possibly materialized) role and
/// resource entities, and the queried privilege, and answer whether the
/// rule applies — typically an ownership check against the entity
/// attribute bags. Synchronous and asynchronous predicates go through the
/// same evaluation path; the engine awaits either form uniformly.
///
/// Assertions are never serialized.
///
/// # Example
///
/// ```
/// use hrbac_core::RuleAssertion;
///
/// let owner_check = RuleAssertion::from_fn(|_, role, resource, _| {
///     role.attributes["id"] == resource.attributes["owner"]
/// });
/// # let _ = owner_check;
/// ```
#[derive(Clone)]
pub struct RuleAssertion {
    kind: AssertionKind,
}

#[derive(Clone)]
enum AssertionKind {
    Sync(Arc<SyncAssertion>),
    Async(Arc<AsyncAssertion>),
}

impl RuleAssertion {
    /// Wrap a synchronous predicate.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Hrbac, &Role, &Resource, Option<&str>) -> bool + Send + Sync + 'static,
    {
        Self {
            kind: AssertionKind::Sync(Arc::new(f)),
        }
    }

    /// Wrap an asynchronous predicate returning a boxed future.
    ///
    /// # Example
    ///
    /// ```
    /// use hrbac_core::RuleAssertion;
    ///
    /// let owner_check = RuleAssertion::from_async_fn(|_, role, resource, _| {
    ///     let id = role.attributes["id"].clone();
    ///     let owner = resource.attributes["owner"].clone();
    ///     Box::pin(async move { id == owner })
    /// });
    /// # let _ = owner_check;
    /// ```
    pub fn from_async_fn<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a Hrbac, &'a Role, &'a Resource, Option<&'a str>) -> BoxFuture<'a, bool>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind: AssertionKind::Async(Arc::new(f)),
        }
    }

    /// Evaluate the predicate, awaiting asynchronous variants.
    pub async fn evaluate(
        &self,
        hrbac: &Hrbac,
        role: &Role,
        resource: &Resource,
        privilege: Option<&str>,
    ) -> bool {
        match &self.kind {
            AssertionKind::Sync(f) => f(hrbac, role, resource, privilege),
            AssertionKind::Async(f) => f(hrbac, role, resource, privilege).await,
        }
    }
}

impl fmt::Debug for RuleAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AssertionKind::Sync(_) => f.write_str("RuleAssertion::Sync"),
            AssertionKind::Async(_) => f.write_str("RuleAssertion::Async"),
        }
    }
}

/// Serializable form of a rule: decision type plus optional privilege
/// list. Assertions are omitted by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleData {
    /// The decision contributed on match.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// `None` matches any privilege, including the absence of one.
    pub privileges: Option<Vec<String>>,
}

impl RuleData {
    /// Validate a serialized rule value.
    ///
    /// Requires an object with a valid `type` and a `privileges` key that
    /// is either null or an array of strings.
    fn from_value(value: &Value) -> HrbacResult<Self> {
        let invalid = || HrbacError::InvalidRule(value.to_string());

        let obj = value.as_object().ok_or_else(invalid)?;

        let rule_type = obj
            .get("type")
            .and_then(Value::as_str)
            .and_then(RuleType::parse)
            .ok_or_else(invalid)?;

        let privileges = match obj.get("privileges").ok_or_else(invalid)? {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|p| p.as_str().map(str::to_string).ok_or_else(invalid))
                    .collect::<HrbacResult<Vec<String>>>()?,
            ),
            _ => return Err(invalid()),
        };

        Ok(Self {
            rule_type,
            privileges,
        })
    }
}

/// An immutable permission rule.
///
/// A rule carries a decision type, an optional privilege restriction, and
/// an optional assertion predicate. With `privileges` unset the rule
/// matches any privilege (including none); with a privilege list it
/// matches only queries naming a listed privilege.
#[derive(Debug, Clone)]
pub struct Rule {
    rule_type: RuleType,
    privileges: Option<Vec<String>>,
    assertion: Option<RuleAssertion>,
}

impl Rule {
    /// Create a rule.
    pub fn new(
        rule_type: RuleType,
        privileges: Option<Vec<String>>,
        assertion: Option<RuleAssertion>,
    ) -> Self {
        Self {
            rule_type,
            privileges,
            assertion,
        }
    }

    /// The decision this rule contributes when it matches.
    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    /// The privilege restriction, if any.
    pub fn privileges(&self) -> Option<&[String]> {
        self.privileges.as_deref()
    }

    /// Whether the rule carries an assertion predicate.
    pub fn has_assertion(&self) -> bool {
        self.assertion.is_some()
    }

    /// Check whether this rule applies to the query.
    ///
    /// A privilege-restricted rule never matches a query without a
    /// privilege, and only matches queries naming a listed privilege.
    /// Past the privilege gate, the assertion (if any) decides.
    pub async fn matches(
        &self,
        hrbac: &Hrbac,
        role: &Role,
        resource: &Resource,
        privilege: Option<&str>,
    ) -> bool {
        match (&self.privileges, privilege) {
            (Some(_), None) => return false,
            (Some(restricted), Some(p)) if !restricted.iter().any(|r| r == p) => return false,
            _ => {}
        }

        match &self.assertion {
            Some(assertion) => assertion.evaluate(hrbac, role, resource, privilege).await,
            None => true,
        }
    }

    /// Serializable snapshot; the assertion is dropped.
    pub fn to_serializable(&self) -> RuleData {
        RuleData {
            rule_type: self.rule_type,
            privileges: self.privileges.clone(),
        }
    }
}

impl From<RuleData> for Rule {
    fn from(data: RuleData) -> Self {
        Self::new(data.rule_type, data.privileges, None)
    }
}

/// Result of exporting a [`PermissionStore`].
///
/// `entries` is the wire payload (serialize it directly); assertions
/// cannot be serialized, so `dropped_assertions` counts the rules whose
/// predicate was omitted from the export.
#[derive(Debug, Clone)]
pub struct PermissionExport {
    /// Flat ordered `(role, resource, rule)` triples; `None` keys are
    /// wildcards.
    pub entries: Vec<(Option<String>, Option<String>, RuleData)>,
    /// Number of rules whose assertion was dropped.
    pub dropped_assertions: usize,
}

#[derive(Debug, Clone)]
struct ResourceBucket {
    resource: Option<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct RoleBucket {
    role: Option<String>,
    resources: Vec<ResourceBucket>,
}

/// Ordered two-level store of permission rules.
///
/// Rules are keyed by role id (or `None` for "any role") and resource id
/// (or `None` for "any resource"). Registration appends; nothing ever
/// replaces an existing rule. Enumeration follows bucket creation order on
/// both levels — the wildcard bucket participates at its creation
/// position — and insertion order within a bucket.
///
/// # Example
///
/// ```
/// use hrbac_core::PermissionStore;
///
/// let mut store = PermissionStore::new();
/// store.deny(None, None, None, None);
/// store.allow(Some("admin"), None, None, None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PermissionStore {
    buckets: Vec<RoleBucket>,
}

impl PermissionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an allow rule under the given role/resource bucket.
    ///
    /// `None` role or resource is the wildcard; `None` privileges match
    /// any privilege including the absence of one.
    pub fn allow(
        &mut self,
        role: Option<&str>,
        resource: Option<&str>,
        privileges: Option<&[&str]>,
        assertion: Option<RuleAssertion>,
    ) {
        self.add(RuleType::Allow, role, resource, privileges, assertion);
    }

    /// Append a deny rule under the given role/resource bucket.
    pub fn deny(
        &mut self,
        role: Option<&str>,
        resource: Option<&str>,
        privileges: Option<&[&str]>,
        assertion: Option<RuleAssertion>,
    ) {
        self.add(RuleType::Deny, role, resource, privileges, assertion);
    }

    fn add(
        &mut self,
        rule_type: RuleType,
        role: Option<&str>,
        resource: Option<&str>,
        privileges: Option<&[&str]>,
        assertion: Option<RuleAssertion>,
    ) {
        let privileges = privileges.map(|ps| ps.iter().map(|p| p.to_string()).collect());
        self.push_rule(
            role.map(str::to_string),
            resource.map(str::to_string),
            Rule::new(rule_type, privileges, assertion),
        );
    }

    fn push_rule(&mut self, role: Option<String>, resource: Option<String>, rule: Rule) {
        let role_idx = match self.buckets.iter().position(|b| b.role == role) {
            Some(idx) => idx,
            None => {
                self.buckets.push(RoleBucket {
                    role,
                    resources: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };

        let resources = &mut self.buckets[role_idx].resources;
        let resource_idx = match resources.iter().position(|b| b.resource == resource) {
            Some(idx) => idx,
            None => {
                resources.push(ResourceBucket {
                    resource,
                    rules: Vec::new(),
                });
                resources.len() - 1
            }
        };

        resources[resource_idx].rules.push(rule);
    }

    /// Collect all rules applicable to the candidate id sets, in canonical
    /// order.
    ///
    /// A bucket applies if its key is the wildcard or a member of the
    /// respective candidate set. The result follows role-bucket creation
    /// order, then resource-bucket creation order, then rule insertion
    /// order.
    pub fn matching_rules(&self, role_ids: &[String], resource_ids: &[String]) -> Vec<&Rule> {
        let roles: HashSet<&str> = role_ids.iter().map(String::as_str).collect();
        let resources: HashSet<&str> = resource_ids.iter().map(String::as_str).collect();

        let mut rules = Vec::new();
        for role_bucket in &self.buckets {
            if let Some(role) = &role_bucket.role {
                if !roles.contains(role.as_str()) {
                    continue;
                }
            }

            for resource_bucket in &role_bucket.resources {
                if let Some(resource) = &resource_bucket.resource {
                    if !resources.contains(resource.as_str()) {
                        continue;
                    }
                }

                rules.extend(resource_bucket.rules.iter());
            }
        }

        rules
    }

    /// Export as flat ordered `(role, resource, rule)` triples.
    ///
    /// Rules holding an assertion are exported without it; the export
    /// reports how many were affected and a warning is logged.
    pub fn to_serializable(&self) -> PermissionExport {
        let mut entries = Vec::new();
        let mut dropped_assertions = 0;

        for role_bucket in &self.buckets {
            for resource_bucket in &role_bucket.resources {
                for rule in &resource_bucket.rules {
                    if rule.has_assertion() {
                        dropped_assertions += 1;
                    }
                    entries.push((
                        role_bucket.role.clone(),
                        resource_bucket.resource.clone(),
                        rule.to_serializable(),
                    ));
                }
            }
        }

        if dropped_assertions > 0 {
            tracing::warn!(
                dropped_assertions,
                "rule assertions cannot be serialized and were dropped from the export"
            );
        }

        PermissionExport {
            entries,
            dropped_assertions,
        }
    }

    /// Import serialized permission data, replacing the store contents.
    ///
    /// Expects a JSON array of `[roleIdOrNull, resourceIdOrNull, rule]`
    /// triples. Validation is strict; a malformed entry fails with
    /// [`HrbacError::InvalidPermission`] naming the entry, and the store
    /// is left untouched on failure.
    pub fn import_serialized(&mut self, data: &Value) -> HrbacResult<()> {
        let entries = data
            .as_array()
            .ok_or_else(|| HrbacError::InvalidPermission(data.to_string()))?;

        let mut imported = PermissionStore::new();
        for entry in entries {
            let triple = entry
                .as_array()
                .filter(|triple| triple.len() == 3)
                .ok_or_else(|| HrbacError::InvalidPermission(entry.to_string()))?;

            let role = bucket_key(&triple[0], entry)?;
            let resource = bucket_key(&triple[1], entry)?;
            let rule = Rule::from(RuleData::from_value(&triple[2])?);

            imported.push_rule(role, resource, rule);
        }

        *self = imported;
        Ok(())
    }
}

fn bucket_key(value: &Value, entry: &Value) -> HrbacResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(id.clone())),
        _ => Err(HrbacError::InvalidPermission(entry.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rule_type_strings() {
        assert_eq!(RuleType::Allow.as_str(), "allow");
        assert_eq!(RuleType::parse("deny"), Some(RuleType::Deny));
        assert_eq!(RuleType::parse("grant"), None);
    }

    #[test]
    fn test_matching_rules_filters_by_candidate_sets() {
        let mut store = PermissionStore::new();
        store.allow(
            Some("roleA"),
            Some("resource"),
            Some(&["privilegeA"]),
            Some(RuleAssertion::from_fn(|_, _, _, _| true)),
        );
        store.deny(
            Some("roleB"),
            Some("resource"),
            Some(&["privilegeB"]),
            Some(RuleAssertion::from_fn(|_, _, _, _| true)),
        );
        store.allow(Some("roleC"), Some("resource"), None, None);
        store.allow(Some("roleD"), None, None, None);

        let rules = store.matching_rules(&ids(&["roleA", "roleB"]), &ids(&["resource"]));

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule_type(), RuleType::Allow);
        assert_eq!(rules[0].privileges(), Some(&ids(&["privilegeA"])[..]));
        assert_eq!(rules[1].rule_type(), RuleType::Deny);
        assert_eq!(rules[1].privileges(), Some(&ids(&["privilegeB"])[..]));
    }

    #[test]
    fn test_wildcard_bucket_keeps_creation_position() {
        let mut store = PermissionStore::new();
        store.deny(None, None, None, None);
        store.allow(Some("admin"), None, None, None);

        let rules = store.matching_rules(&ids(&["admin"]), &ids(&["anything"]));
        assert_eq!(rules.len(), 2);
        // The wildcard bucket was created first, so the deny enumerates
        // before the admin allow.
        assert_eq!(rules[0].rule_type(), RuleType::Deny);
        assert_eq!(rules[1].rule_type(), RuleType::Allow);
    }

    #[test]
    fn test_rules_append_within_bucket() {
        let mut store = PermissionStore::new();
        store.allow(Some("role"), Some("resource"), Some(&["read"]), None);
        store.deny(Some("role"), Some("resource"), Some(&["read"]), None);

        let rules = store.matching_rules(&ids(&["role"]), &ids(&["resource"]));
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule_type(), RuleType::Allow);
        assert_eq!(rules[1].rule_type(), RuleType::Deny);
    }

    #[test]
    fn test_export_flat_triples() {
        let mut store = PermissionStore::new();
        store.allow(Some("roleA"), Some("resource"), Some(&["privilegeA"]), None);
        store.deny(
            Some("roleB"),
            Some("resource"),
            Some(&["privilegeB", "privilegeC"]),
            None,
        );
        store.allow(Some("roleC"), Some("resource"), None, None);
        store.allow(Some("roleD"), None, None, None);

        let export = store.to_serializable();
        assert_eq!(export.dropped_assertions, 0);

        let value = serde_json::to_value(&export.entries).unwrap();
        assert_eq!(
            value,
            json!([
                ["roleA", "resource", { "type": "allow", "privileges": ["privilegeA"] }],
                ["roleB", "resource", { "type": "deny", "privileges": ["privilegeB", "privilegeC"] }],
                ["roleC", "resource", { "type": "allow", "privileges": null }],
                ["roleD", null, { "type": "allow", "privileges": null }]
            ])
        );
    }

    #[test]
    fn test_export_reports_dropped_assertions() {
        let mut store = PermissionStore::new();
        store.allow(
            Some("user"),
            Some("profile"),
            None,
            Some(RuleAssertion::from_fn(|_, _, _, _| true)),
        );
        store.allow(Some("user"), Some("ffa"), None, None);

        let export = store.to_serializable();
        assert_eq!(export.dropped_assertions, 1);
        assert_eq!(export.entries.len(), 2);
        assert_eq!(
            export.entries[0].2,
            RuleData {
                rule_type: RuleType::Allow,
                privileges: None
            }
        );
    }

    #[test]
    fn test_import_round_trip_preserves_matching() {
        let mut store = PermissionStore::new();
        store.deny(None, None, None, None);
        store.allow(Some("admin"), None, None, None);
        store.allow(Some("guest"), Some("document"), Some(&["read"]), None);

        let export = store.to_serializable();
        let data = serde_json::to_value(&export.entries).unwrap();

        let mut imported = PermissionStore::new();
        imported.import_serialized(&data).unwrap();

        for (role_ids, resource_ids) in [
            (ids(&["admin"]), ids(&["anything"])),
            (ids(&["guest"]), ids(&["document"])),
            (ids(&["other"]), ids(&["other"])),
        ] {
            let original: Vec<_> = store
                .matching_rules(&role_ids, &resource_ids)
                .iter()
                .map(|r| r.to_serializable())
                .collect();
            let reimported: Vec<_> = imported
                .matching_rules(&role_ids, &resource_ids)
                .iter()
                .map(|r| r.to_serializable())
                .collect();
            assert_eq!(original, reimported);
        }
    }

    #[test]
    fn test_import_replaces_store_contents() {
        let mut store = PermissionStore::new();
        store.allow(Some("stale"), None, None, None);

        store
            .import_serialized(&json!([
                ["fresh", null, { "type": "allow", "privileges": null }]
            ]))
            .unwrap();

        assert!(store.matching_rules(&ids(&["stale"]), &ids(&["x"])).is_empty());
        assert_eq!(store.matching_rules(&ids(&["fresh"]), &ids(&["x"])).len(), 1);
    }

    #[test]
    fn test_import_rejects_malformed_entries() {
        let mut store = PermissionStore::new();

        assert!(store.import_serialized(&json!({})).is_err());
        assert!(store
            .import_serialized(&json!([["role", "resource"]]))
            .is_err());
        assert!(store
            .import_serialized(&json!([[1, null, { "type": "allow", "privileges": null }]]))
            .is_err());
        assert!(store
            .import_serialized(&json!([[null, null, { "type": "grant", "privileges": null }]]))
            .is_err());
        assert!(store
            .import_serialized(&json!([[null, null, { "type": "allow" }]]))
            .is_err());
        assert!(store
            .import_serialized(&json!([[null, null, { "type": "allow", "privileges": [1] }]]))
            .is_err());
    }

    #[test]
    fn test_failed_import_leaves_store_untouched() {
        let mut store = PermissionStore::new();
        store.allow(Some("kept"), None, None, None);

        let result = store.import_serialized(&json!([
            ["fresh", null, { "type": "allow", "privileges": null }],
            ["bad"]
        ]));

        assert!(result.is_err());
        assert_eq!(store.matching_rules(&ids(&["kept"]), &ids(&["x"])).len(), 1);
        assert!(store.matching_rules(&ids(&["fresh"]), &ids(&["x"])).is_empty());
    }

    #[tokio::test]
    async fn test_privilege_restricted_rule_matching() {
        let hrbac = Hrbac::new();
        let role = Role::new("guest");
        let resource = Resource::new("document");
        let rule = Rule::new(RuleType::Allow, Some(ids(&["read"])), None);

        assert!(rule.matches(&hrbac, &role, &resource, Some("read")).await);
        assert!(!rule.matches(&hrbac, &role, &resource, Some("write")).await);
        // A privilege-restricted rule never matches a query without one.
        assert!(!rule.matches(&hrbac, &role, &resource, None).await);
    }

    #[tokio::test]
    async fn test_unrestricted_rule_matches_any_privilege() {
        let hrbac = Hrbac::new();
        let role = Role::new("guest");
        let resource = Resource::new("document");
        let rule = Rule::new(RuleType::Allow, None, None);

        assert!(rule.matches(&hrbac, &role, &resource, None).await);
        assert!(rule.matches(&hrbac, &role, &resource, Some("anything")).await);
    }

    #[tokio::test]
    async fn test_assertion_gates_the_match() {
        let hrbac = Hrbac::new();
        let role = Role::new("user").with_attributes(json!({ "id": "u" }));
        let owned = Resource::new("profile").with_attributes(json!({ "owner": "u" }));
        let foreign = Resource::new("profile").with_attributes(json!({ "owner": "v" }));

        let rule = Rule::new(
            RuleType::Allow,
            None,
            Some(RuleAssertion::from_fn(|_, role, resource, _| {
                role.attributes["id"] == resource.attributes["owner"]
            })),
        );

        assert!(rule.matches(&hrbac, &role, &owned, None).await);
        assert!(!rule.matches(&hrbac, &role, &foreign, None).await);
    }

    #[tokio::test]
    async fn test_async_assertion_evaluates_through_same_path() {
        let hrbac = Hrbac::new();
        let role = Role::new("user").with_attributes(json!({ "id": "u" }));
        let resource = Resource::new("profile").with_attributes(json!({ "owner": "u" }));

        let rule = Rule::new(
            RuleType::Allow,
            None,
            Some(RuleAssertion::from_async_fn(|_, role, resource, _| {
                let id = role.attributes["id"].clone();
                let owner = resource.attributes["owner"].clone();
                Box::pin(async move { id == owner })
            })),
        );

        assert!(rule.matches(&hrbac, &role, &resource, None).await);
    }
}
