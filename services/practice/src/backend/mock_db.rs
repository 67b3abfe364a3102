//! services/practice/src/backend/mock_db.rs
//!
//! The mock persistence store. It reads and writes whole patient and incident
//! collections through a `KeyValueStore`, checks credentials against a static
//! table, pads every call with latency from the `FaultPolicy`, and records
//! each call in an append-only operation history.

use chrono::Utc;
use dental_core::domain::{
    DatabaseOperation, Incident, OperationData, OperationType, Patient, Role, Table, User,
    INCIDENTS_KEY, PATIENTS_KEY,
};
use dental_core::ports::{FaultPolicy, KeyValueStore, LatencyRange, PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

//=========================================================================================
// Static Credential Table
//=========================================================================================

struct Credential {
    id: &'static str,
    role: Role,
    email: &'static str,
    password: &'static str,
    patient_id: Option<&'static str>,
}

impl Credential {
    fn to_user(&self) -> User {
        User {
            id: self.id.to_string(),
            role: self.role,
            email: self.email.to_string(),
            patient_id: self.patient_id.map(str::to_string),
        }
    }
}

const CREDENTIALS: [Credential; 4] = [
    Credential {
        id: "1",
        role: Role::Admin,
        email: "admin@entnt.in",
        password: "admin123",
        patient_id: None,
    },
    Credential {
        id: "2",
        role: Role::Patient,
        email: "john@entnt.in",
        password: "patient123",
        patient_id: Some("p1"),
    },
    Credential {
        id: "3",
        role: Role::Patient,
        email: "jane@entnt.in",
        password: "patient123",
        patient_id: Some("p2"),
    },
    Credential {
        id: "4",
        role: Role::Patient,
        email: "mike@entnt.in",
        password: "patient123",
        patient_id: Some("p3"),
    },
];

//=========================================================================================
// The Mock Database
//=========================================================================================

pub struct MockDatabase {
    store: Arc<dyn KeyValueStore>,
    faults: Arc<dyn FaultPolicy>,
    storage_latency: LatencyRange,
    auth_latency: LatencyRange,
    operations: Mutex<Vec<DatabaseOperation>>,
}

impl MockDatabase {
    pub fn new(store: Arc<dyn KeyValueStore>, faults: Arc<dyn FaultPolicy>) -> Self {
        Self {
            store,
            faults,
            storage_latency: LatencyRange::STORAGE,
            auth_latency: LatencyRange::AUTH,
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the latency ranges used for collection access and for logins.
    pub fn with_latency(mut self, storage: LatencyRange, auth: LatencyRange) -> Self {
        self.storage_latency = storage;
        self.auth_latency = auth;
        self
    }

    /// The backing store, for callers that manage keys outside the collections.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // --- Patients ---

    pub async fn get_patients(&self) -> Vec<Patient> {
        self.try_get_patients().await.unwrap_or_default()
    }

    /// Like `get_patients`, but an unreadable collection is an error instead
    /// of an empty list.
    pub async fn try_get_patients(&self) -> PortResult<Vec<Patient>> {
        self.read_collection(PATIENTS_KEY, Table::Patients).await
    }

    pub async fn save_patients(&self, patients: &[Patient]) -> bool {
        self.write_collection(PATIENTS_KEY, Table::Patients, patients)
            .await
    }

    // --- Incidents ---

    pub async fn get_incidents(&self) -> Vec<Incident> {
        self.try_get_incidents().await.unwrap_or_default()
    }

    pub async fn try_get_incidents(&self) -> PortResult<Vec<Incident>> {
        self.read_collection(INCIDENTS_KEY, Table::Incidents).await
    }

    pub async fn save_incidents(&self, incidents: &[Incident]) -> bool {
        self.write_collection(INCIDENTS_KEY, Table::Incidents, incidents)
            .await
    }

    // --- Authentication ---

    /// Exact, plaintext match against the static table. Unknown email and wrong
    /// password both yield `None`.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> Option<User> {
        self.simulate_latency(self.auth_latency).await;

        let user = CREDENTIALS
            .iter()
            .find(|c| c.email == email && c.password == password)
            .map(Credential::to_user);

        self.log_operation(
            OperationType::Read,
            Table::Users,
            user.is_some(),
            OperationData::Auth {
                email: email.to_string(),
                authenticated: user.is_some(),
            },
        )
        .await;

        user
    }

    // --- Operation history ---

    pub async fn get_operation_history(&self) -> Vec<DatabaseOperation> {
        self.operations.lock().await.clone()
    }

    pub async fn clear_operation_history(&self) {
        self.operations.lock().await.clear();
    }

    //=====================================================================================
    // Internal helpers
    //=====================================================================================

    async fn simulate_latency(&self, range: LatencyRange) {
        let delay = self.faults.latency(range);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn log_operation(
        &self,
        kind: OperationType,
        table: Table,
        success: bool,
        data: OperationData,
    ) {
        debug!(?kind, ?table, success, ?data, "Database operation.");
        self.operations.lock().await.push(DatabaseOperation {
            kind,
            table,
            timestamp: Utc::now(),
            success,
            data: Some(data),
        });
    }

    /// Absent or empty values read as an empty collection. Unreadable values
    /// are logged as a failed read and returned as the error.
    async fn read_collection<T: DeserializeOwned>(
        &self,
        key: &str,
        table: Table,
    ) -> PortResult<Vec<T>> {
        self.simulate_latency(self.storage_latency).await;

        let result: PortResult<Vec<T>> = match self.store.get(key).await {
            Ok(Some(raw)) if !raw.is_empty() => {
                serde_json::from_str(&raw).map_err(|e| PortError::Serialization(e.to_string()))
            }
            Ok(_) => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        match result {
            Ok(items) => {
                self.log_operation(
                    OperationType::Read,
                    table,
                    true,
                    OperationData::Count { count: items.len() },
                )
                .await;
                Ok(items)
            }
            Err(e) => {
                warn!(key, "Failed to read collection: {}", e);
                self.log_operation(
                    OperationType::Read,
                    table,
                    false,
                    OperationData::Error { error: e.to_string() },
                )
                .await;
                Err(e)
            }
        }
    }

    /// Overwrites the whole collection. Returns whether the write succeeded.
    async fn write_collection<T: Serialize>(&self, key: &str, table: Table, items: &[T]) -> bool {
        self.simulate_latency(self.storage_latency).await;

        let result = match serde_json::to_string(items) {
            Ok(raw) => self.store.set(key, &raw).await,
            Err(e) => Err(PortError::Serialization(e.to_string())),
        };

        match result {
            Ok(()) => {
                self.log_operation(
                    OperationType::Update,
                    table,
                    true,
                    OperationData::Count { count: items.len() },
                )
                .await;
                true
            }
            Err(e) => {
                warn!(key, "Failed to write collection: {}", e);
                self.log_operation(
                    OperationType::Update,
                    table,
                    false,
                    OperationData::Error { error: e.to_string() },
                )
                .await;
                false
            }
        }
    }
}
