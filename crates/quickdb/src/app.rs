//! Application facade: database configuration and model registration

use crate::bridge::Bridge;
use crate::config::{AppConfig, DatabaseConfig};
use crate::model::Model;
use crate::registry::RegistrationQueue;
use crate::response::BridgeResponse;
use quickdb_codec::{EncodeOptions, ModelMeta, DEFAULT_ALIAS};
use quickdb_common::{QuickDbError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Entry point tying models to a storage engine
///
/// Models can be registered immediately with [`register_model`](Self::register_model)
/// or deferred with [`model`](Self::model). Deferred models are submitted, in
/// definition order, the next time [`add_database`](Self::add_database)
/// succeeds. If one of them fails, the models behind it stay queued.
///
/// Models left on the `"default"` alias are bound to
/// [`AppConfig::default_alias`] when they reach the facade.
///
/// Registration and configuration failures are fatal
/// ([`QuickDbError::is_fatal`]): they indicate a startup-order bug, not a
/// recoverable runtime condition.
pub struct QuickDb<B: Bridge> {
    bridge: Arc<B>,
    pending: RegistrationQueue,
    models: BTreeMap<String, ModelMeta>,
    configured: BTreeSet<String>,
    default_alias: String,
    options: EncodeOptions,
    validate_before_submit: bool,
}

impl<B: Bridge> QuickDb<B> {
    pub fn new(bridge: B) -> Self {
        Self::with_config(bridge, &AppConfig::default())
    }

    /// Create the facade with encoder and validation settings from `config`
    ///
    /// Databases listed in `config` are not configured here; pass each to
    /// [`add_database`](Self::add_database).
    pub fn with_config(bridge: B, config: &AppConfig) -> Self {
        Self {
            bridge: Arc::new(bridge),
            pending: RegistrationQueue::new(),
            models: BTreeMap::new(),
            configured: BTreeSet::new(),
            default_alias: config.default_alias.clone(),
            options: config.encode,
            validate_before_submit: config.validate_before_submit,
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Queue a model until the next successful database configuration
    pub fn model(&mut self, mut meta: ModelMeta) {
        self.bind_default_alias(&mut meta);
        debug!(
            model = %meta.collection_name,
            alias = %meta.database_alias,
            "model queued for registration"
        );
        self.pending.push(meta);
    }

    /// Submit a model to the engine now
    pub fn register_model(&mut self, mut meta: ModelMeta) -> Result<()> {
        self.bind_default_alias(&mut meta);
        let fatal = |reason: String| QuickDbError::FatalRegistration {
            model: meta.collection_name.clone(),
            alias: meta.database_alias.clone(),
            reason,
        };

        let payload = meta.to_json().map_err(|e| fatal(e.to_string()))?;
        let response = self
            .bridge
            .register_model(&payload)
            .and_then(|text| BridgeResponse::parse(&text))
            .map_err(|e| fatal(e.to_string()))?;

        if !response.success {
            let err = fatal(response.error_message().to_string());
            error!(error = %err, "model registration failed");
            return Err(err);
        }

        info!(
            model = %meta.collection_name,
            alias = %meta.database_alias,
            "model registered"
        );
        self.models.insert(meta.collection_name.clone(), meta);
        Ok(())
    }

    /// Configure a database, then flush every pending registration
    pub fn add_database(&mut self, config: DatabaseConfig) -> Result<()> {
        let fatal = |reason: String| QuickDbError::FatalConfiguration {
            alias: config.alias.clone(),
            reason,
        };

        config.validate().map_err(|e| fatal(e.to_string()))?;
        let response = self
            .bridge
            .add_database(&config)
            .and_then(|text| BridgeResponse::parse(&text))
            .map_err(|e| fatal(e.to_string()))?;

        if !response.success {
            let err = fatal(response.error_message().to_string());
            error!(error = %err, "database configuration failed");
            return Err(err);
        }

        info!(
            alias = %config.alias,
            backend = config.backend.as_str(),
            "database configured"
        );
        self.configured.insert(config.alias);
        self.flush_pending()
    }

    fn flush_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        info!(count = self.pending.len(), "registering pending models");
        while let Some(meta) = self.pending.pop() {
            if let Err(err) = self.register_model(meta) {
                if !self.pending.is_empty() {
                    warn!(
                        remaining = ?self.pending.pending_names(),
                        "models left queued after a failed registration"
                    );
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn bind_default_alias(&self, meta: &mut ModelMeta) {
        if meta.database_alias == DEFAULT_ALIAS && self.default_alias != DEFAULT_ALIAS {
            meta.database_alias = self.default_alias.clone();
        }
    }

    /// Drop a table; engine failures come back as `success: false`
    pub fn drop_table(&self, table: &str, alias: &str) -> BridgeResponse {
        match self
            .bridge
            .drop_table(table, alias)
            .and_then(|text| BridgeResponse::parse(&text))
        {
            Ok(response) => response,
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }

    /// CRUD handle for a registered model
    pub fn handle(&self, collection_name: &str) -> Result<Model<B>> {
        let meta = self.models.get(collection_name).ok_or_else(|| {
            QuickDbError::Engine(format!("model '{}' is not registered", collection_name))
        })?;
        Ok(Model::new(
            Arc::clone(&self.bridge),
            meta.clone(),
            self.options,
            self.validate_before_submit,
        ))
    }

    /// Models waiting for a database, in definition order
    pub fn pending_models(&self) -> Vec<&str> {
        self.pending.pending_names()
    }

    pub fn registered_models(&self) -> impl Iterator<Item = &ModelMeta> {
        self.models.values()
    }

    pub fn is_configured(&self, alias: &str) -> bool {
        self.configured.contains(alias)
    }
}
