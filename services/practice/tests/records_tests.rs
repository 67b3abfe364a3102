//! Integration tests for the record service: seeding, workflow-gated writes,
//! cascade deletion, attachments, backups and storage failures.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use dental_core::domain::{
    FileAttachment, IncidentStatus, IncidentUpdate, NewIncident, NewPatient, OperationType,
    PatientUpdate, Table, INCIDENTS_KEY, PATIENTS_KEY, USER_KEY,
};
use dental_core::ports::{FaultPolicy, KeyValueStore, PortError, PortResult};
use dental_core::workflow::WorkflowType;
use practice_lib::adapters::{FileStore, MemoryStore, NoFaults, ScriptedFaults};
use practice_lib::app::{AppState, TreatmentOutcome};
use practice_lib::config::Config;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn state_with(store: Arc<dyn KeyValueStore>, faults: impl FaultPolicy + 'static) -> AppState {
    AppState::with_parts(Config::default(), store, Arc::new(faults))
}

async fn seeded(faults: impl FaultPolicy + 'static) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = state_with(store.clone(), faults);
    state.records.initialize().await.expect("seeding succeeds");
    (state, store)
}

fn new_patient(name: &str) -> NewPatient {
    NewPatient {
        name: name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1970, 1, 2).unwrap(),
        contact: "5550001111".to_string(),
        email: Some("new@entnt.in".to_string()),
        health_info: "None reported".to_string(),
    }
}

fn appointment_at(patient_id: &str, date: NaiveDateTime) -> NewIncident {
    NewIncident {
        patient_id: patient_id.to_string(),
        title: "Consultation".to_string(),
        description: "First consultation".to_string(),
        comments: String::new(),
        appointment_date: date,
        cost: None,
        treatment: None,
        status: IncidentStatus::Scheduled,
        next_date: None,
        files: vec![],
    }
}

fn march_first() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// A store whose writes always fail, as if local storage were full.
#[derive(Default)]
struct FullStore {
    inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for FullStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, _value: &str) -> PortResult<()> {
        Err(PortError::QuotaExceeded {
            key: key.to_string(),
            needed: 1,
            limit: 0,
        })
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.inner.remove(key).await
    }

    async fn usage_bytes(&self) -> PortResult<usize> {
        self.inner.usage_bytes().await
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// An empty store is seeded with the demo records and they are persisted.
#[tokio::test]
async fn initialize_seeds_empty_store() {
    let (state, store) = seeded(NoFaults).await;

    assert_eq!(state.records.patients().await.len(), 5);
    assert_eq!(state.records.incidents().await.len(), 5);
    assert!(store.get(PATIENTS_KEY).await.unwrap().is_some());
    assert!(store.get(INCIDENTS_KEY).await.unwrap().is_some());
}

/// A stored collection that fails to parse is never overwritten by seed data.
#[tokio::test]
async fn initialize_leaves_unreadable_collection_in_place() {
    let store = Arc::new(MemoryStore::new());
    let stored = r#"[
      {"id":"p100","name":"Kept","dob":"1990-05-10","contact":"1","healthInfo":""},
      {"id":"p101","name":"Broken","dob":"10/05/1990","contact":"2","healthInfo":""}
    ]"#;
    store.set(PATIENTS_KEY, stored).await.unwrap();

    let state = state_with(store.clone(), NoFaults);
    state.records.initialize().await.unwrap();

    assert_eq!(store.get(PATIENTS_KEY).await.unwrap().as_deref(), Some(stored));
    assert_eq!(state.records.patients().await.len(), 5);
    // The absent incidents key is still seeded and saved.
    assert!(store.get(INCIDENTS_KEY).await.unwrap().is_some());

    let patient_writes = state
        .db
        .get_operation_history()
        .await
        .into_iter()
        .filter(|op| op.kind == OperationType::Update && op.table == Table::Patients)
        .count();
    assert_eq!(patient_writes, 0);
}

/// Existing data is loaded as-is instead of being replaced by seed data.
#[tokio::test]
async fn initialize_keeps_existing_data() {
    let (state, store) = seeded(NoFaults).await;
    assert!(state.records.delete_patient("p5").await);

    let reopened = state_with(store, NoFaults);
    reopened.records.initialize().await.unwrap();

    let ids: Vec<String> = reopened.records.patients().await.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4"]);
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

/// A successful registration assigns a `p`-prefixed id and persists it.
#[tokio::test]
async fn add_patient_persists_after_workflow() {
    let (state, _) = seeded(NoFaults).await;

    let patient = state.records.add_patient(new_patient("Ada Lovelace")).await.unwrap();
    assert!(patient.id.starts_with('p'));

    let stored = state.db.get_patients().await;
    assert_eq!(stored.len(), 6);
    assert_eq!(stored.last(), Some(&patient));
}

/// A failed registration workflow writes nothing.
#[tokio::test]
async fn failed_registration_writes_nothing() {
    let faults = ScriptedFaults::new().fail_at(WorkflowType::PatientRegistration, 3);
    let (state, _) = seeded(faults).await;
    state.db.clear_operation_history().await;

    assert!(state.records.add_patient(new_patient("Nobody")).await.is_none());
    assert_eq!(state.records.patients().await.len(), 5);
    assert!(state.db.get_operation_history().await.is_empty());
}

/// Partial updates touch only the given fields.
#[tokio::test]
async fn update_patient_merges_fields() {
    let (state, _) = seeded(NoFaults).await;

    let update = PatientUpdate {
        health_info: Some("Allergic to latex".to_string()),
        ..Default::default()
    };
    assert!(state.records.update_patient("p2", update).await);
    assert!(!state.records.update_patient("p404", PatientUpdate::default()).await);

    let jane = state.records.patient("p2").await.unwrap();
    assert_eq!(jane.name, "Jane Smith");
    assert_eq!(jane.health_info, "Allergic to latex");
}

/// Deleting a patient removes their incidents as well, in memory and in storage.
#[tokio::test]
async fn delete_patient_cascades_to_incidents() {
    let (state, _) = seeded(NoFaults).await;

    assert!(state.records.delete_patient("p1").await);

    assert!(state.records.patient("p1").await.is_none());
    assert!(state.records.patient_incidents("p1").await.is_empty());
    let stored = state.db.get_incidents().await;
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|i| i.patient_id != "p1"));
    assert!(!state.records.delete_patient("p1").await);
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

/// Booking for an unknown patient is rejected before any workflow runs.
#[tokio::test]
async fn booking_requires_existing_patient() {
    let (state, _) = seeded(NoFaults).await;

    assert!(state.records.add_incident(appointment_at("p404", march_first())).await.is_none());
    assert!(state.simulator.get_active_workflows().await.is_empty());
}

/// A successful booking appears in the patient's incident list.
#[tokio::test]
async fn booking_adds_incident_for_patient() {
    let (state, _) = seeded(NoFaults).await;

    let incident = state.records.add_incident(appointment_at("p4", march_first())).await.unwrap();
    assert!(incident.id.starts_with('i'));
    assert_eq!(state.records.patient_incidents("p4").await, vec![incident]);
}

/// A failed booking workflow leaves the incidents untouched.
#[tokio::test]
async fn failed_booking_writes_nothing() {
    let faults = ScriptedFaults::new().fail_at(WorkflowType::AppointmentBooking, 4);
    let (state, _) = seeded(faults).await;

    assert!(state.records.add_incident(appointment_at("p4", march_first())).await.is_none());
    assert_eq!(state.db.get_incidents().await.len(), 5);
}

#[tokio::test]
async fn update_and_delete_incident() {
    let (state, _) = seeded(NoFaults).await;

    let update = IncidentUpdate {
        status: Some(IncidentStatus::Cancelled),
        comments: Some("Patient called to cancel".to_string()),
        ..Default::default()
    };
    assert!(state.records.update_incident("i4", update).await);
    let stored = state.db.get_incidents().await;
    let i4 = stored.iter().find(|i| i.id == "i4").unwrap();
    assert_eq!(i4.status, IncidentStatus::Cancelled);

    assert!(state.records.delete_incident("i4").await);
    assert!(!state.records.delete_incident("i4").await);
    assert!(state.records.patient_incidents("p2").await.is_empty());
}

/// Files are attached only after the upload workflow, sized by file count.
#[tokio::test]
async fn attach_and_remove_files() {
    let (state, _) = seeded(NoFaults).await;
    let uploaded_at = Utc.with_ymd_and_hms(2025, 2, 10, 9, 45, 0).unwrap();
    let files = vec![
        FileAttachment::from_bytes("scan.png", "image/png", b"png-bytes", uploaded_at),
        FileAttachment::from_bytes("notes.pdf", "application/pdf", b"%PDF-1.4", uploaded_at),
    ];

    assert!(state.records.attach_files("i3", files).await);
    assert!(state.simulator.get_active_workflows().await.is_empty());

    assert!(state.records.remove_file("i3", "scan.png").await);
    assert!(!state.records.remove_file("i3", "scan.png").await);
    let incidents = state.records.patient_incidents("p1").await;
    let i3 = incidents.into_iter().find(|i| i.id == "i3").unwrap();
    assert_eq!(i3.files.len(), 1);
    assert_eq!(i3.files[0].decode().unwrap(), b"%PDF-1.4".to_vec());

    assert!(!state.records.attach_files("i404", vec![]).await);
}

/// Completing a treatment records cost, notes and status.
#[tokio::test]
async fn complete_treatment_marks_incident_completed() {
    let (state, _) = seeded(NoFaults).await;
    let outcome = TreatmentOutcome {
        cost: 150.0,
        treatment: "Composite filling".to_string(),
        next_date: Some(march_first()),
    };

    assert!(state.records.complete_treatment("i3", outcome).await);

    let stored = state.db.get_incidents().await;
    let i3 = stored.iter().find(|i| i.id == "i3").unwrap();
    assert_eq!(i3.status, IncidentStatus::Completed);
    assert_eq!(i3.cost, Some(150.0));
    assert_eq!(i3.treatment.as_deref(), Some("Composite filling"));
    assert_eq!(i3.next_date, Some(march_first()));
}

/// Only scheduled appointments can be completed; nothing runs or changes otherwise.
#[tokio::test]
async fn completing_requires_scheduled_appointment() {
    let (state, _) = seeded(NoFaults).await;
    let cancel = IncidentUpdate {
        status: Some(IncidentStatus::Cancelled),
        ..Default::default()
    };
    assert!(state.records.update_incident("i5", cancel).await);
    state.db.clear_operation_history().await;

    let outcome = TreatmentOutcome {
        cost: 60.0,
        treatment: "Polishing".to_string(),
        next_date: None,
    };
    assert!(!state.records.complete_treatment("i5", outcome.clone()).await);
    assert!(!state.records.complete_treatment("i1", outcome.clone()).await);
    assert!(!state.records.complete_treatment("i404", outcome).await);

    assert!(state.db.get_operation_history().await.is_empty());
    let i5 = state.records.patient_incidents("p3").await.remove(0);
    assert_eq!(i5.status, IncidentStatus::Cancelled);
    assert_eq!(i5.cost, None);
}

#[tokio::test]
async fn failed_treatment_workflow_keeps_appointment_scheduled() {
    let faults = ScriptedFaults::new().fail_at(WorkflowType::TreatmentCompletion, 0);
    let (state, _) = seeded(faults).await;
    let outcome = TreatmentOutcome {
        cost: 90.0,
        treatment: "Scaling".to_string(),
        next_date: None,
    };

    assert!(!state.records.complete_treatment("i5", outcome).await);
    let i5 = state.records.patient_incidents("p3").await.remove(0);
    assert_eq!(i5.status, IncidentStatus::Scheduled);
}

// ---------------------------------------------------------------------------
// Workflow bookkeeping
// ---------------------------------------------------------------------------

/// Finished workflows do not pile up in the simulator, whatever the outcome.
#[tokio::test]
async fn finished_workflows_are_discarded_after_each_action() {
    let (state, _) = seeded(NoFaults).await;
    for n in 0..50 {
        let name = format!("Patient {}", n);
        assert!(state.records.add_patient(new_patient(&name)).await.is_some());
    }
    assert_eq!(state.records.patients().await.len(), 55);
    assert!(state.simulator.get_active_workflows().await.is_empty());

    let faults = ScriptedFaults::new().fail_at(WorkflowType::AppointmentBooking, 1);
    let (failing, _) = seeded(faults).await;
    assert!(failing.records.add_incident(appointment_at("p2", march_first())).await.is_none());
    assert!(failing.simulator.get_active_workflows().await.is_empty());
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_finds_patients_and_appointments() {
    let (state, _) = seeded(NoFaults).await;

    let patients: Vec<String> = state
        .records
        .search_patients("SMITH")
        .await
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(patients, vec!["p2"]);

    let appointments: Vec<String> = state
        .records
        .search_incidents("mike")
        .await
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(appointments, vec!["i5"]);
}

/// The calendar view picks appointments by day, including ones just booked.
#[tokio::test]
async fn calendar_day_lists_its_appointments() {
    let (state, _) = seeded(NoFaults).await;
    let booked = state.records.add_incident(appointment_at("p4", march_first())).await.unwrap();

    let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    assert_eq!(state.records.incidents_on(day).await, vec![booked]);
    let quiet = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
    assert!(state.records.incidents_on(quiet).await.is_empty());
}

#[tokio::test]
async fn patient_overview_and_history() {
    let (state, _) = seeded(NoFaults).await;
    let now = NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let overview = state.records.patient_overview("p1", now).await.unwrap();
    let upcoming: Vec<&str> = overview.upcoming.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(upcoming, vec!["i3"]);
    assert_eq!(overview.completed.len(), 2);
    assert_eq!(overview.total_spent, 200.0);
    assert!(state.records.patient_overview("p404", now).await.is_none());

    let history: Vec<String> = state
        .records
        .patient_history("p1", "check")
        .await
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(history, vec!["i2"]);
}

// ---------------------------------------------------------------------------
// Storage failures
// ---------------------------------------------------------------------------

/// When the store rejects writes, operations report failure and the
/// in-memory collections keep matching what is stored.
#[tokio::test]
async fn write_failures_leave_collections_unchanged() {
    let state = state_with(Arc::new(FullStore::default()), NoFaults);
    state.records.initialize().await.unwrap();

    // Seeding could not be persisted, but the demo data is still served.
    assert_eq!(state.records.patients().await.len(), 5);

    assert!(state.records.add_patient(new_patient("Grace Hopper")).await.is_none());
    assert!(!state.records.delete_patient("p1").await);
    assert_eq!(state.records.patients().await.len(), 5);
    assert_eq!(state.records.patient_incidents("p1").await.len(), 3);

    let failed_updates = state
        .db
        .get_operation_history()
        .await
        .into_iter()
        .filter(|op| op.kind == OperationType::Update && !op.success)
        .count();
    assert_eq!(failed_updates, 4);
}

// ---------------------------------------------------------------------------
// Backup, stats and reset
// ---------------------------------------------------------------------------

#[tokio::test]
async fn backup_is_written_as_versioned_json() {
    let (state, _) = seeded(NoFaults).await;
    let dir = tempfile::tempdir().unwrap();

    let path = state.records.write_backup(dir.path()).await.unwrap();
    let file_name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(file_name.starts_with("dental-data-backup-") && file_name.ends_with(".json"));

    let raw = tokio::fs::read_to_string(&path).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["patients"].as_array().unwrap().len(), 5);
    assert_eq!(value["incidents"][0]["patientId"], "p1");
    assert!(value["exportDate"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn storage_stats_count_records_and_files() {
    let (state, _) = seeded(NoFaults).await;

    let stats = state.records.storage_stats().await.unwrap();
    assert_eq!(stats.patients, 5);
    assert_eq!(stats.incidents, 5);
    assert_eq!(stats.files, 2);
    assert!(stats.storage_kb > 0.0);
}

#[tokio::test]
async fn clear_all_data_removes_every_key() {
    let (state, store) = seeded(NoFaults).await;
    assert!(state.session.login("admin@entnt.in", "admin123").await.is_some());

    state.records.clear_all_data().await.unwrap();

    for key in [PATIENTS_KEY, INCIDENTS_KEY, USER_KEY] {
        assert_eq!(store.get(key).await.unwrap(), None);
    }
    assert!(state.records.patients().await.is_empty());
    assert_eq!(store.usage_bytes().await.unwrap(), 0);
}

/// Records written through a file-backed store are visible to a new process.
#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = state_with(Arc::new(FileStore::new(dir.path())), NoFaults);
    first.records.initialize().await.unwrap();
    let added = first.records.add_patient(new_patient("Alan Turing")).await.unwrap();

    let second = state_with(Arc::new(FileStore::new(dir.path())), NoFaults);
    second.records.initialize().await.unwrap();
    assert_eq!(second.records.patient(&added.id).await, Some(added));

    let history = second.db.get_operation_history().await;
    assert!(history.iter().all(|op| op.kind == OperationType::Read));
    assert!(history.iter().any(|op| op.table == Table::Patients));
}
