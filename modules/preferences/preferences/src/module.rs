use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router, middleware};
use prefkit_auth::StaticTokenValidator;
use prefkit_auth::TokenValidator;
use prefkit_auth::axum_ext::{AuthState, authenticate};
use preferences_sdk::PreferencesClientV1;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::api::rest::routes::{self, OPENAPI_PATH};
use crate::config::{PreferencesConfig, StoreBackend};
use crate::domain::access::AccessGate;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{
    GraphPreferenceRepository, GraphStore, MemoryGraphStore, RetryPolicy, SeaOrmGraphStore,
};
use crate::local_client::LocalClient;

pub const HEALTH_PATH: &str = "/health";

/// The wired preferences module: store, service and HTTP surface.
pub struct PreferencesModule {
    service: Arc<Service>,
    validator: Arc<dyn TokenValidator>,
    public_paths: Vec<String>,
}

impl PreferencesModule {
    /// Open the configured store and build the service on top of it.
    ///
    /// # Errors
    /// Fails when the database cannot be reached or its migrations fail.
    pub async fn init(config: &PreferencesConfig) -> anyhow::Result<Self> {
        info!("Initializing preferences module");

        let store: Arc<dyn GraphStore> = match &config.store.backend {
            StoreBackend::Memory => {
                warn!("Using the in-memory preference store; data is lost on restart");
                Arc::new(MemoryGraphStore::new())
            }
            StoreBackend::Database(db) => {
                let store = SeaOrmGraphStore::connect(db)
                    .await
                    .with_context(|| format!("connecting to {}", db.redacted_dsn()))?;
                if db.run_migrations {
                    info!("Running preferences database migrations");
                    store.migrate().await.context("running preferences migrations")?;
                }
                Arc::new(store)
            }
        };

        let module = Self::with_store(config, store);
        info!("Preferences module initialized");
        Ok(module)
    }

    /// Build the module over an already opened store.
    #[must_use]
    pub fn with_store(config: &PreferencesConfig, store: Arc<dyn GraphStore>) -> Self {
        let max_name_length = config.name_length_limit();
        if max_name_length < config.max_name_length {
            warn!(
                configured = config.max_name_length,
                applied = max_name_length,
                "max_name_length exceeds what the store holds; clamping"
            );
        }
        let repo = GraphPreferenceRepository::new(store, RetryPolicy::from(&config.store.retry));
        let service = Service::new(
            Arc::new(repo),
            AccessGate::from_config(&config.access),
            ServiceConfig { max_name_length },
        );

        let validator = StaticTokenValidator::new(&config.auth.tokens);
        if validator.is_empty() {
            warn!("No bearer tokens configured; every protected route will answer 401");
        }

        let mut public_paths = config.auth.public_paths.clone();
        public_paths.push(OPENAPI_PATH.to_owned());

        Self {
            service: Arc::new(service),
            validator: Arc::new(validator),
            public_paths,
        }
    }

    /// Replace the token validator, e.g. with one backed by an identity provider.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn PreferencesClientV1> {
        Arc::new(LocalClient::new(self.service()))
    }

    /// Preference routes, the health check and the OpenAPI document behind
    /// bearer-token authentication.
    pub fn router(&self) -> Router {
        let auth = AuthState::new(Arc::clone(&self.validator), self.public_paths.clone());
        routes::router(self.service())
            .route(HEALTH_PATH, get(health))
            .layer(middleware::from_fn_with_state(auth, authenticate))
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
