//! services/practice/src/app/records.rs
//!
//! The record service: the patient and incident operations the dashboard
//! performs. Each create-style action runs its workflow through the simulator
//! first and only writes when the workflow succeeds. Writes replace the whole
//! collection; the in-memory copy is updated only after the write succeeds, so
//! it always matches what the store holds.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use dental_core::domain::{
    BackupExport, FileAttachment, Incident, IncidentStatus, IncidentUpdate, NewIncident,
    NewPatient, Patient, PatientUpdate, User, INCIDENTS_KEY, PATIENTS_KEY, USER_KEY,
};
use dental_core::workflow::Workflow;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app::dashboard::{self, DashboardSummary, PatientOverview};
use crate::app::{queries, seed};
use crate::backend::{MockDatabase, WorkflowSimulator};
use crate::error::AppError;

//=========================================================================================
// Types
//=========================================================================================

/// What gets recorded when a scheduled appointment is completed.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentOutcome {
    pub cost: f64,
    pub treatment: String,
    pub next_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub patients: usize,
    pub incidents: usize,
    pub files: usize,
    pub storage_kb: f64,
}

#[derive(Default)]
struct Collections {
    patients: Vec<Patient>,
    incidents: Vec<Incident>,
}

//=========================================================================================
// RecordService
//=========================================================================================

pub struct RecordService {
    db: Arc<MockDatabase>,
    simulator: Arc<WorkflowSimulator>,
    // Held across writes so concurrent actions never save a stale collection.
    collections: Mutex<Collections>,
}

impl RecordService {
    pub fn new(db: Arc<MockDatabase>, simulator: Arc<WorkflowSimulator>) -> Self {
        Self {
            db,
            simulator,
            collections: Mutex::new(Collections::default()),
        }
    }

    /// Loads both collections, seeding demo data into any that is empty.
    ///
    /// A collection that cannot be read is served from the demo data in
    /// memory only; the stored value is left as it is.
    pub async fn initialize(&self) -> Result<(), AppError> {
        let patients = match self.db.try_get_patients().await {
            Ok(patients) if !patients.is_empty() => patients,
            Ok(_) => {
                let patients = seed::seed_patients()?;
                if !self.db.save_patients(&patients).await {
                    warn!("Seed patients could not be persisted.");
                }
                info!(count = patients.len(), "Seeded demo patients.");
                patients
            }
            Err(e) => {
                warn!("Stored patients are unreadable, using demo data: {}", e);
                seed::seed_patients()?
            }
        };
        let incidents = match self.db.try_get_incidents().await {
            Ok(incidents) if !incidents.is_empty() => incidents,
            Ok(_) => {
                let incidents = seed::seed_incidents()?;
                if !self.db.save_incidents(&incidents).await {
                    warn!("Seed incidents could not be persisted.");
                }
                info!(count = incidents.len(), "Seeded demo incidents.");
                incidents
            }
            Err(e) => {
                warn!("Stored incidents are unreadable, using demo data: {}", e);
                seed::seed_incidents()?
            }
        };

        let mut collections = self.collections.lock().await;
        collections.patients = patients;
        collections.incidents = incidents;
        Ok(())
    }

    // --- Queries ---

    pub async fn patients(&self) -> Vec<Patient> {
        self.collections.lock().await.patients.clone()
    }

    pub async fn incidents(&self) -> Vec<Incident> {
        self.collections.lock().await.incidents.clone()
    }

    pub async fn patient(&self, patient_id: &str) -> Option<Patient> {
        self.collections
            .lock()
            .await
            .patients
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
    }

    pub async fn patient_incidents(&self, patient_id: &str) -> Vec<Incident> {
        self.collections
            .lock()
            .await
            .incidents
            .iter()
            .filter(|i| i.patient_id == patient_id)
            .cloned()
            .collect()
    }

    /// Incidents the given user is allowed to see.
    pub async fn incidents_visible_to(&self, user: &User) -> Vec<Incident> {
        self.collections
            .lock()
            .await
            .incidents
            .iter()
            .filter(|i| user.can_view_patient(&i.patient_id))
            .cloned()
            .collect()
    }

    pub async fn dashboard(&self, now: NaiveDateTime) -> DashboardSummary {
        let collections = self.collections.lock().await;
        dashboard::summarize(&collections.patients, &collections.incidents, now)
    }

    /// The patient dashboard. `None` when the patient does not exist.
    pub async fn patient_overview(
        &self,
        patient_id: &str,
        now: NaiveDateTime,
    ) -> Option<PatientOverview> {
        let collections = self.collections.lock().await;
        if !collections.patients.iter().any(|p| p.id == patient_id) {
            return None;
        }
        Some(dashboard::patient_overview(&collections.incidents, patient_id, now))
    }

    pub async fn search_patients(&self, term: &str) -> Vec<Patient> {
        queries::search_patients(&self.collections.lock().await.patients, term)
    }

    pub async fn search_incidents(&self, term: &str) -> Vec<Incident> {
        let collections = self.collections.lock().await;
        queries::search_incidents(&collections.incidents, &collections.patients, term)
    }

    /// Appointments scheduled on the given calendar day.
    pub async fn incidents_on(&self, day: NaiveDate) -> Vec<Incident> {
        queries::incidents_on(&self.collections.lock().await.incidents, day)
    }

    pub async fn patient_history(&self, patient_id: &str, term: &str) -> Vec<Incident> {
        queries::patient_history(&self.collections.lock().await.incidents, patient_id, term)
    }

    // --- Patients ---

    /// Registers a patient. Returns `None` when the workflow or the write fails.
    pub async fn add_patient(&self, new: NewPatient) -> Option<Patient> {
        let workflow = self.simulator.create_patient_registration_workflow().await;
        if !self.run_workflow(workflow).await {
            return None;
        }

        let mut collections = self.collections.lock().await;
        let id = fresh_id('p', |candidate| {
            collections.patients.iter().any(|p| p.id == candidate)
        });
        let patient = Patient::from_new(id, new);

        let mut updated = collections.patients.clone();
        updated.push(patient.clone());
        if !self.db.save_patients(&updated).await {
            return None;
        }
        collections.patients = updated;
        info!(patient_id = %patient.id, "Patient registered.");
        Some(patient)
    }

    pub async fn update_patient(&self, patient_id: &str, update: PatientUpdate) -> bool {
        let mut collections = self.collections.lock().await;
        let mut updated = collections.patients.clone();
        let Some(patient) = updated.iter_mut().find(|p| p.id == patient_id) else {
            return false;
        };
        patient.apply(update);

        if !self.db.save_patients(&updated).await {
            return false;
        }
        collections.patients = updated;
        true
    }

    /// Deletes a patient together with all of their incidents.
    ///
    /// Incidents are written first, so a failed second write can leave a
    /// patient without incidents but never an incident without its patient.
    pub async fn delete_patient(&self, patient_id: &str) -> bool {
        let mut collections = self.collections.lock().await;
        if !collections.patients.iter().any(|p| p.id == patient_id) {
            return false;
        }

        let incidents: Vec<Incident> = collections
            .incidents
            .iter()
            .filter(|i| i.patient_id != patient_id)
            .cloned()
            .collect();
        if !self.db.save_incidents(&incidents).await {
            return false;
        }
        let removed_incidents = collections.incidents.len() - incidents.len();
        collections.incidents = incidents;

        let patients: Vec<Patient> = collections
            .patients
            .iter()
            .filter(|p| p.id != patient_id)
            .cloned()
            .collect();
        if !self.db.save_patients(&patients).await {
            return false;
        }
        collections.patients = patients;
        info!(patient_id, removed_incidents, "Patient deleted.");
        true
    }

    // --- Incidents ---

    /// Books an appointment. Returns `None` for an unknown patient or when the
    /// workflow or the write fails.
    pub async fn add_incident(&self, new: NewIncident) -> Option<Incident> {
        if self.patient(&new.patient_id).await.is_none() {
            warn!(
                patient_id = %new.patient_id,
                "Cannot book an appointment for an unknown patient."
            );
            return None;
        }

        let workflow = self.simulator.create_appointment_booking_workflow().await;
        if !self.run_workflow(workflow).await {
            return None;
        }

        let mut collections = self.collections.lock().await;
        // The patient may have been deleted while the workflow ran.
        if !collections.patients.iter().any(|p| p.id == new.patient_id) {
            return None;
        }
        let id = fresh_id('i', |candidate| {
            collections.incidents.iter().any(|i| i.id == candidate)
        });
        let incident = Incident::from_new(id, new);

        let mut updated = collections.incidents.clone();
        updated.push(incident.clone());
        if !self.db.save_incidents(&updated).await {
            return None;
        }
        collections.incidents = updated;
        info!(incident_id = %incident.id, "Appointment booked.");
        Some(incident)
    }

    pub async fn update_incident(&self, incident_id: &str, update: IncidentUpdate) -> bool {
        self.modify_incident(incident_id, |incident| {
            incident.apply(update);
            true
        })
        .await
    }

    pub async fn delete_incident(&self, incident_id: &str) -> bool {
        let mut collections = self.collections.lock().await;
        let updated: Vec<Incident> = collections
            .incidents
            .iter()
            .filter(|i| i.id != incident_id)
            .cloned()
            .collect();
        if updated.len() == collections.incidents.len() {
            return false;
        }
        if !self.db.save_incidents(&updated).await {
            return false;
        }
        collections.incidents = updated;
        true
    }

    /// Attaches files to an incident after the file-upload workflow succeeds.
    pub async fn attach_files(&self, incident_id: &str, files: Vec<FileAttachment>) -> bool {
        if self.incident_status(incident_id).await.is_none() {
            return false;
        }

        let workflow = self
            .simulator
            .create_file_upload_workflow(files.len() as u64)
            .await;
        if !self.run_workflow(workflow).await {
            return false;
        }

        self.modify_incident(incident_id, |incident| {
            incident.files.extend(files);
            true
        })
        .await
    }

    /// Removes an attachment by name. Returns `false` if nothing matched.
    pub async fn remove_file(&self, incident_id: &str, file_name: &str) -> bool {
        self.modify_incident(incident_id, |incident| {
            let before = incident.files.len();
            incident.files.retain(|f| f.name != file_name);
            incident.files.len() != before
        })
        .await
    }

    /// Marks a scheduled appointment completed after the treatment workflow
    /// succeeds. Completed and cancelled appointments are refused.
    pub async fn complete_treatment(&self, incident_id: &str, outcome: TreatmentOutcome) -> bool {
        if self.incident_status(incident_id).await != Some(IncidentStatus::Scheduled) {
            warn!(incident_id, "Only scheduled appointments can be completed.");
            return false;
        }

        let workflow = self.simulator.create_treatment_completion_workflow().await;
        if !self.run_workflow(workflow).await {
            return false;
        }

        // The appointment may have changed while the workflow ran.
        self.modify_incident(incident_id, |incident| {
            if incident.status != IncidentStatus::Scheduled {
                return false;
            }
            incident.status = IncidentStatus::Completed;
            incident.cost = Some(outcome.cost);
            incident.treatment = Some(outcome.treatment);
            incident.next_date = outcome.next_date;
            true
        })
        .await
    }

    // --- Backup and maintenance ---

    pub async fn storage_stats(&self) -> Result<StorageStats, AppError> {
        let usage = self.db.store().usage_bytes().await?;
        let collections = self.collections.lock().await;
        Ok(StorageStats {
            patients: collections.patients.len(),
            incidents: collections.incidents.len(),
            files: collections.incidents.iter().map(|i| i.files.len()).sum(),
            storage_kb: (usage as f64 / 1024.0 * 100.0).round() / 100.0,
        })
    }

    pub async fn export_backup(&self) -> BackupExport {
        let collections = self.collections.lock().await;
        BackupExport::new(
            collections.patients.clone(),
            collections.incidents.clone(),
            Utc::now(),
        )
    }

    /// Writes a pretty-printed backup into `dir` and returns the file path.
    pub async fn write_backup(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let export = self.export_backup().await;
        let json = serde_json::to_string_pretty(&export)?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(export.file_name());
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "Backup written.");
        Ok(path)
    }

    /// Removes every stored key and empties the in-memory collections.
    pub async fn clear_all_data(&self) -> Result<(), AppError> {
        let mut collections = self.collections.lock().await;
        let store = self.db.store();
        for key in [PATIENTS_KEY, INCIDENTS_KEY, USER_KEY] {
            store.remove(key).await?;
        }
        *collections = Collections::default();
        warn!("All practice data cleared.");
        Ok(())
    }

    //=====================================================================================
    // Internal helpers
    //=====================================================================================

    /// Executes the workflow, then drops it and any other finished workflow
    /// from the simulator.
    async fn run_workflow(&self, workflow: Workflow) -> bool {
        let completed = self.simulator.execute_workflow(&workflow.id, None).await;
        if !completed {
            info!(
                workflow_id = %workflow.id,
                workflow = %workflow.name,
                "Workflow did not complete."
            );
        }
        self.simulator.cleanup_completed_workflows().await;
        completed
    }

    async fn incident_status(&self, incident_id: &str) -> Option<IncidentStatus> {
        self.collections
            .lock()
            .await
            .incidents
            .iter()
            .find(|i| i.id == incident_id)
            .map(|i| i.status)
    }

    /// Applies `change` to a copy of the incident list and saves it. A change
    /// that returns `false` is discarded without writing.
    async fn modify_incident<F>(&self, incident_id: &str, change: F) -> bool
    where
        F: FnOnce(&mut Incident) -> bool,
    {
        let mut collections = self.collections.lock().await;
        let mut updated = collections.incidents.clone();
        let Some(incident) = updated.iter_mut().find(|i| i.id == incident_id) else {
            return false;
        };
        if !change(incident) {
            return false;
        }

        if !self.db.save_incidents(&updated).await {
            return false;
        }
        collections.incidents = updated;
        true
    }
}

/// `<prefix><millis>`, with a `-N` suffix if that id is already taken.
fn fresh_id(prefix: char, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{}{}", prefix, Utc::now().timestamp_millis());
    let mut id = base.clone();
    let mut suffix = 1;
    while taken(&id) {
        id = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_id_skips_taken_values() {
        let first = fresh_id('p', |_| false);
        assert!(first.starts_with('p'));
        assert!(!first.contains('-'));

        // The bare id and `-1` are taken, so `-2` is the first free one.
        let third = fresh_id('i', |candidate| !candidate.ends_with("-2"));
        assert!(third.starts_with('i'));
        assert!(third.ends_with("-2"));
    }
}
