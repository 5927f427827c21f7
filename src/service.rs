//! Block monitor service
//!
//! [`BlockMonitor`] owns the watch list and the debounce pipeline and
//! exposes the start/stop lifecycle a host drives:
//!
//! 1. `new` resolves endpoints and loads the watch list.
//! 2. `start` logs the configuration, sends the startup batch and
//!    subscribes to change signals.
//! 3. `stop` detaches from change signals. Reports already dispatched are
//!    left to finish.

use std::sync::Arc;

use crate::command::{CommandHandler, SelectorResolver};
use crate::config::{Config, ConfigError};
use crate::debounce::ChangeDebouncer;
use crate::events::{EventAdapter, EventBus};
use crate::extract::AttributeExtractor;
use crate::registry::WatchRegistry;
use crate::report::{Endpoints, ReportSink};
use crate::scheduler::TickScheduler;
use crate::world::World;

/// Explicit service object wiring the monitor components
pub struct BlockMonitor {
    config: Config,
    endpoints: Endpoints,
    extractor: AttributeExtractor,
    debouncer: ChangeDebouncer,
    sink: Arc<dyn ReportSink>,
    adapter: Option<Arc<EventAdapter>>,
}

impl BlockMonitor {
    /// Resolve endpoints and load the watch list
    pub fn new(
        config: Config,
        world: Arc<dyn World>,
        scheduler: Arc<dyn TickScheduler>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, ConfigError> {
        let endpoints = config.endpoints()?;
        let registry = Arc::new(WatchRegistry::load(
            &config.monitored_blocks.locations,
            world.as_ref(),
            config.monitored_blocks.duplicates,
        ));

        let extractor = AttributeExtractor::new(world, registry);
        let debouncer = ChangeDebouncer::new(
            extractor.clone(),
            scheduler,
            Arc::clone(&sink),
            endpoints.update.clone(),
        );

        Ok(Self {
            config,
            endpoints,
            extractor,
            debouncer,
            sink,
            adapter: None,
        })
    }

    /// Send the startup batch and begin handling change signals
    pub fn start(&mut self, bus: &dyn EventBus) {
        if self.is_running() {
            tracing::warn!("Block monitor already started");
            return;
        }

        self.log_configuration();
        self.send_initial_snapshot();

        let adapter = EventAdapter::new(self.debouncer.clone());
        adapter.register(bus);
        self.adapter = Some(adapter);

        tracing::info!(watched = self.registry().len(), "Block monitor started");
    }

    /// Stop handling change signals
    pub fn stop(&mut self) {
        if let Some(adapter) = self.adapter.take() {
            adapter.stop();
            tracing::info!("Block monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.adapter.is_some()
    }

    /// Report every loaded watched cell to the batch endpoint as one array
    ///
    /// Returns the number of cells sent.
    pub fn send_initial_snapshot(&self) -> usize {
        let registry = self.registry();
        if registry.is_empty() {
            return 0;
        }

        let batch_endpoint = &self.endpoints.batch;
        tracing::info!(
            cells = registry.len(),
            endpoint = %batch_endpoint,
            "Sending initial data for monitored blocks"
        );

        let snapshots = self.extractor.extract_loaded(registry.cells());
        if snapshots.is_empty() {
            tracing::info!("No loaded blocks to send in initial batch");
            return 0;
        }

        match serde_json::to_string(&snapshots) {
            Ok(body) => {
                self.sink.submit(batch_endpoint, body);
                snapshots.len()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize initial batch");
                0
            }
        }
    }

    /// Command handler sharing this monitor's extractor and sink
    pub fn command_handler(&self, selector: Arc<dyn SelectorResolver>) -> CommandHandler {
        CommandHandler::new(
            self.extractor.clone(),
            selector,
            Arc::clone(&self.sink),
            self.endpoints.command.clone(),
        )
    }

    pub fn registry(&self) -> &WatchRegistry {
        self.extractor.registry()
    }

    pub fn debouncer(&self) -> &ChangeDebouncer {
        &self.debouncer
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn log_configuration(&self) {
        if !self.config.is_api_url_configured() {
            tracing::error!("!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
            tracing::error!("'api_url' is not configured! Reports will not reach a web service.");
            tracing::error!("Please set 'api_url' to your web service's base URL.");
            tracing::error!("!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
        } else if let Err(e) = self.config.validate() {
            tracing::error!(error = %e, "Configuration is invalid, reports may fail");
        }

        tracing::info!(api_url = %self.config.api_url, "Base API URL");
        tracing::info!(endpoint = %self.endpoints.command, "Command report endpoint");
        tracing::info!(endpoint = %self.endpoints.batch, "Monitor batch endpoint");
        tracing::info!(endpoint = %self.endpoints.update, "Monitor update endpoint");
    }
}

impl Drop for BlockMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
