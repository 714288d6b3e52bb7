//! The reader node: a replicated `AccessModel` kept current by the refresh
//! loop, guarded by the same trip-switch health signal the writer uses so
//! callers can tell a genuinely unhealthy reader from a merely
//! slightly-stale one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use access_cache::{ReaderRefreshError, ReaderRefreshLoop, TemporalEventCache};
use access_domain::{AccessModel, ComponentAccess, EntityType, UserId};
use access_providers::Persister;

pub struct ReaderNode {
    model: Arc<Mutex<AccessModel>>,
    refresh: Arc<ReaderRefreshLoop>,
}

impl ReaderNode {
    pub fn new<P: Persister + 'static>(cache: Arc<TemporalEventCache>, persister: Arc<P>) -> Self {
        let model = Arc::new(Mutex::new(AccessModel::new()));
        let refresh = ReaderRefreshLoop::new(model.clone(), cache, persister);
        Self { model, refresh }
    }

    pub fn spawn_refresh_loop(&self, period: Duration) {
        self.refresh.spawn(period);
    }

    pub fn shutdown(&self) {
        self.refresh.shutdown();
    }

    fn model(&self) -> Result<MutexGuard<'_, AccessModel>, ReaderRefreshError> {
        self.refresh.notify_query_method_called()?;
        Ok(self.model.lock().expect("reader model mutex poisoned"))
    }

    pub fn has_access_to_application_component(&self, user: &UserId, access: &ComponentAccess) -> Result<bool, QueryError> {
        let model = self.model()?;
        Ok(model.has_access_to_application_component(user, access)?)
    }

    pub fn application_components_accessible_by_user(
        &self,
        user: &UserId,
    ) -> Result<indexmap::IndexSet<ComponentAccess>, QueryError> {
        let model = self.model()?;
        Ok(model.application_components_accessible_by_user(user)?)
    }

    pub fn entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: &EntityType,
    ) -> Result<indexmap::IndexSet<access_domain::EntityRef>, QueryError> {
        let model = self.model()?;
        Ok(model.entities_accessible_by_user(user, entity_type)?)
    }
}

impl Drop for ReaderNode {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Refresh(#[from] ReaderRefreshError),
    #[error(transparent)]
    Domain(#[from] access_domain::DomainError),
}
