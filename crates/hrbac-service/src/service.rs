//! Load-then-resolve service wrapper
//!
//! This module wraps an [`Hrbac`] engine behind a read-write lock and,
//! when a loader is configured, fetches and imports hierarchy and
//! permission data before every resolution. The lock serializes loader
//! imports (writes) against resolution (reads); the resolution core
//! itself stays synchronous-data.

use std::sync::Arc;

use hrbac_core::{Hrbac, ResourceRef, RoleRef};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ServiceResult;
use crate::loader::Loader;

/// Query service over an [`Hrbac`] engine with optional on-demand
/// loading.
///
/// Without a loader this is a thin, lock-guarded passthrough to the
/// engine. With a loader, each query first awaits the role and resource
/// hierarchy loads in parallel, merges them into the registries, then
/// fetches permission rules scoped to the expanded ancestor closures and
/// imports them, and only then resolves.
///
/// # Example
///
/// ```
/// use hrbac_core::Hrbac;
/// use hrbac_service::HrbacService;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut hrbac = Hrbac::new();
/// hrbac.permission_store_mut().allow(Some("admin"), None, None, None);
///
/// let service = HrbacService::new(hrbac);
/// assert!(service.is_allowed("admin", "settings", None).await.unwrap());
/// # });
/// ```
pub struct HrbacService {
    hrbac: RwLock<Hrbac>,
    loader: Option<Arc<dyn Loader>>,
}

impl std::fmt::Debug for HrbacService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HrbacService")
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}

impl HrbacService {
    /// Wrap an engine without a loader; queries resolve against the
    /// engine's current contents only.
    pub fn new(hrbac: Hrbac) -> Self {
        Self {
            hrbac: RwLock::new(hrbac),
            loader: None,
        }
    }

    /// Wrap an engine with a loader consulted before every query.
    pub fn with_loader(hrbac: Hrbac, loader: Arc<dyn Loader>) -> Self {
        Self {
            hrbac: RwLock::new(hrbac),
            loader: Some(loader),
        }
    }

    /// Read access to the wrapped engine.
    pub async fn hrbac(&self) -> RwLockReadGuard<'_, Hrbac> {
        self.hrbac.read().await
    }

    /// Write access to the wrapped engine, for configuration.
    pub async fn hrbac_mut(&self) -> RwLockWriteGuard<'_, Hrbac> {
        self.hrbac.write().await
    }

    /// Fetch and import loader data for one query.
    ///
    /// Role and resource hierarchies load in parallel and merge into the
    /// registries; permissions load afterwards, scoped to the closures
    /// expanded from the freshly merged graphs.
    async fn load(&self, role_id: &str, resource_id: &str) -> ServiceResult<()> {
        let Some(loader) = &self.loader else {
            return Ok(());
        };

        let (roles, resources) =
            tokio::join!(loader.load_role(role_id), loader.load_resource(resource_id));
        let (roles, resources) = (roles?, resources?);

        {
            let mut hrbac = self.hrbac.write().await;
            if let Some(data) = &roles {
                hrbac.role_registry_mut().import_serialized(data)?;
            }
            if let Some(data) = &resources {
                hrbac.resource_registry_mut().import_serialized(data)?;
            }
        }

        let (role_closure, resource_closure) = {
            let hrbac = self.hrbac.read().await;
            (
                hrbac.role_registry().get_parents_recursive(role_id),
                hrbac.resource_registry().get_parents_recursive(resource_id),
            )
        };

        if let Some(data) = loader
            .load_permissions(&role_closure, &resource_closure)
            .await?
        {
            tracing::debug!(role_id, resource_id, "importing loaded permissions");
            self.hrbac
                .write()
                .await
                .permission_store_mut()
                .import_serialized(&data)?;
        }

        Ok(())
    }

    /// Whether the role is allowed the privilege on the resource,
    /// loading on demand first.
    pub async fn is_allowed<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        resource: impl Into<ResourceRef<'a>>,
        privilege: Option<&str>,
    ) -> ServiceResult<bool> {
        let role = role.into();
        let resource = resource.into();

        self.load(role.role_id(), resource.resource_id()).await?;

        let hrbac = self.hrbac.read().await;
        Ok(hrbac.is_allowed(role, resource, privilege).await)
    }

    /// Whether the role is denied the privilege on the resource, loading
    /// on demand first.
    pub async fn is_denied<'a>(
        &self,
        role: impl Into<RoleRef<'a>>,
        resource: impl Into<ResourceRef<'a>>,
        privilege: Option<&str>,
    ) -> ServiceResult<bool> {
        let role = role.into();
        let resource = resource.into();

        self.load(role.role_id(), resource.resource_id()).await?;

        let hrbac = self.hrbac.read().await;
        Ok(hrbac.is_denied(role, resource, privilege).await)
    }
}
