//! services/practice/src/app/state.rs
//!
//! Defines the application's shared state: the store, fault policy and the
//! components built on them, wired once at startup and shared through `Arc`.

use crate::adapters::{FileStore, MemoryStore, SimulatedFaults};
use crate::app::records::RecordService;
use crate::app::session::LoginSession;
use crate::backend::{MockDatabase, WorkflowSimulator};
use crate::config::Config;
use dental_core::ports::{FaultPolicy, KeyValueStore};
use std::sync::Arc;
use tracing::{info, warn};

/// The shared application state, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub simulator: Arc<WorkflowSimulator>,
    pub db: Arc<MockDatabase>,
    pub records: Arc<RecordService>,
    pub session: Arc<LoginSession>,
}

impl AppState {
    /// Picks the store and fault policy the configuration asks for.
    pub fn from_config(config: Config) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.storage_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file-backed store.");
                if config.storage_quota_bytes.is_some() {
                    warn!("DENTAL_STORAGE_QUOTA_BYTES is ignored by the file-backed store.");
                }
                Arc::new(FileStore::new(dir.clone()))
            }
            None => {
                info!("Using in-memory store.");
                match config.storage_quota_bytes {
                    Some(quota) => Arc::new(MemoryStore::with_quota(quota)),
                    None => Arc::new(MemoryStore::new()),
                }
            }
        };
        let faults = Arc::new(SimulatedFaults::new(
            config.failure_rate,
            config.simulate_latency,
        ));
        Self::with_parts(config, store, faults)
    }

    /// Wires the components around an explicit store and fault policy.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        faults: Arc<dyn FaultPolicy>,
    ) -> Self {
        let db = Arc::new(
            MockDatabase::new(store, faults.clone())
                .with_latency(config.storage_latency, config.auth_latency),
        );
        let simulator = Arc::new(WorkflowSimulator::new(faults));
        let records = Arc::new(RecordService::new(db.clone(), simulator.clone()));
        let session = Arc::new(LoginSession::new(db.clone()));

        Self {
            config: Arc::new(config),
            simulator,
            db,
            records,
            session,
        }
    }
}
