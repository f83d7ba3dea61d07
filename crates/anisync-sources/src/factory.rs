//! Factory pattern for creating tracking-service clients from configuration
//!
//! Concrete transports register a factory per service kind; the engine only
//! sees the resulting `TrackingService` trait objects.
use crate::paging::PageLimits;
use crate::traits::TrackingService;
use anisync_config::{Config, CredentialStore, ServiceKind, UserConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait TrackingServiceFactory: Send + Sync {
    fn kind(&self) -> ServiceKind;

    /// Build a client for `user`. Returns None if the service cannot be used
    /// for this user (e.g. missing application keys).
    async fn create_service(
        &self,
        user: &UserConfig,
        config: &Config,
        credentials: &CredentialStore,
    ) -> Result<Option<Arc<dyn TrackingService>>>;

    /// Results per search page on this service
    fn search_page_size(&self) -> usize {
        50
    }

    /// Limits a client built by this factory passes to `paginate_search`
    fn page_limits(&self, config: &Config) -> PageLimits {
        PageLimits::from_config(&config.search, self.search_page_size())
    }

    fn validate_config(&self, _config: &Config) -> Result<()> {
        Ok(())
    }
}

/// Registry of tracking-service factories keyed by service kind
#[derive(Default)]
pub struct ServiceFactoryRegistry {
    factories: HashMap<ServiceKind, Box<dyn TrackingServiceFactory>>,
}

impl ServiceFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn TrackingServiceFactory>) {
        self.factories.insert(factory.kind(), factory);
    }

    pub fn with(mut self, factory: Box<dyn TrackingServiceFactory>) -> Self {
        self.register(factory);
        self
    }

    /// Clients for every enabled, authenticated service of `user`, in the
    /// order the user listed them
    pub async fn create_services_for_user(
        &self,
        user: &UserConfig,
        config: &Config,
        credentials: &CredentialStore,
    ) -> Result<Vec<(ServiceKind, Arc<dyn TrackingService>)>> {
        let mut services = Vec::new();

        for kind in user.enabled_services() {
            if !credentials.is_authenticated(&user.user_id, kind) {
                warn!(user = %user.user_id, service = %kind, "Service enabled but not authenticated, skipping");
                continue;
            }
            let Some(factory) = self.factories.get(&kind) else {
                warn!(service = %kind, "No client registered for service, skipping");
                continue;
            };
            match factory.create_service(user, config, credentials).await? {
                Some(service) => services.push((kind, service)),
                None => debug!(service = %kind, "Factory declined to create client"),
            }
        }

        Ok(services)
    }

    pub fn validate_all_configs(&self, config: &Config) -> Result<()> {
        for factory in self.factories.values() {
            factory.validate_config(config)?;
        }
        Ok(())
    }

    pub fn registered_services(&self) -> Vec<ServiceKind> {
        let mut kinds: Vec<ServiceKind> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn is_registered(&self, kind: ServiceKind) -> bool {
        self.factories.contains_key(&kind)
    }
}
