//! services/practice/src/backend/simulator.rs
//!
//! The workflow simulator. It builds the step list for a user action, keeps
//! the workflow in an active map, and walks the steps one at a time. Each
//! step waits for its duration and then asks the `FaultPolicy` whether it
//! fails. A failed step ends the workflow; nothing is retried or undone.

use chrono::Utc;
use dental_core::ports::FaultPolicy;
use dental_core::workflow::{Workflow, WorkflowStatus, WorkflowStep, WorkflowType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::templates;

/// Called after each completed step with snapshots of the step and its workflow.
pub type StepCallback<'a> = &'a (dyn Fn(&WorkflowStep, &Workflow) + Send + Sync);

pub struct WorkflowSimulator {
    workflows: Mutex<HashMap<String, Workflow>>,
    faults: Arc<dyn FaultPolicy>,
}

impl WorkflowSimulator {
    pub fn new(faults: Arc<dyn FaultPolicy>) -> Self {
        Self {
            workflows: Mutex::new(HashMap::new()),
            faults,
        }
    }

    //=====================================================================================
    // Workflow Creation
    //=====================================================================================

    pub async fn create_patient_registration_workflow(&self) -> Workflow {
        self.register(WorkflowType::PatientRegistration, templates::patient_registration())
            .await
    }

    pub async fn create_appointment_booking_workflow(&self) -> Workflow {
        self.register(WorkflowType::AppointmentBooking, templates::appointment_booking())
            .await
    }

    pub async fn create_treatment_completion_workflow(&self) -> Workflow {
        self.register(WorkflowType::TreatmentCompletion, templates::treatment_completion())
            .await
    }

    pub async fn create_file_upload_workflow(&self, file_count: u64) -> Workflow {
        self.register(WorkflowType::FileUpload, templates::file_upload(file_count))
            .await
    }

    async fn register(&self, kind: WorkflowType, steps: Vec<WorkflowStep>) -> Workflow {
        let mut workflows = self.workflows.lock().await;

        // Ids come from the type and creation time; same-millisecond ids get a suffix.
        let base = format!("{}-{}", kind.id_prefix(), Utc::now().timestamp_millis());
        let mut id = base.clone();
        let mut suffix = 1;
        while workflows.contains_key(&id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        let workflow = Workflow::pending(id.clone(), kind, steps);
        workflows.insert(id, workflow.clone());
        debug!(workflow_id = %workflow.id, steps = workflow.steps.len(), "Workflow created.");
        workflow
    }

    //=====================================================================================
    // Execution
    //=====================================================================================

    /// Runs a pending workflow to completion or to its first failed step.
    ///
    /// Returns `false` without side effects when the id is unknown or the
    /// workflow has already been started.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        on_step_complete: Option<StepCallback<'_>>,
    ) -> bool {
        // --- 1. Claim the workflow ---
        let (kind, step_count) = {
            let mut workflows = self.workflows.lock().await;
            let Some(workflow) = workflows.get_mut(workflow_id) else {
                warn!(workflow_id, "Cannot execute unknown workflow.");
                return false;
            };
            if workflow.status != WorkflowStatus::Pending {
                warn!(workflow_id, status = ?workflow.status, "Workflow was already started.");
                return false;
            }
            workflow.status = WorkflowStatus::InProgress;
            workflow.start_time = Some(Utc::now());
            (workflow.kind, workflow.steps.len())
        };
        info!(workflow_id, ?kind, step_count, "Workflow started.");

        // --- 2. Walk the steps in order ---
        for index in 0..step_count {
            let planned = {
                let mut workflows = self.workflows.lock().await;
                let Some(workflow) = workflows.get_mut(workflow_id) else {
                    return false;
                };
                workflow.current_step = index;
                let step = &mut workflow.steps[index];
                step.status = WorkflowStatus::InProgress;
                step.timestamp = Some(Utc::now());
                step.planned_duration()
            };

            let delay = self.faults.step_duration(planned);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let failed = self.faults.fail_step(kind, index);

            let snapshot = {
                let mut workflows = self.workflows.lock().await;
                let Some(workflow) = workflows.get_mut(workflow_id) else {
                    return false;
                };
                if failed {
                    workflow.steps[index].status = WorkflowStatus::Failed;
                    workflow.status = WorkflowStatus::Failed;
                    workflow.end_time = Some(Utc::now());
                    warn!(
                        workflow_id,
                        step = %workflow.steps[index].id,
                        "Workflow step failed."
                    );
                    return false;
                }
                workflow.steps[index].status = WorkflowStatus::Completed;
                debug!(workflow_id, step = %workflow.steps[index].id, "Workflow step completed.");
                on_step_complete.map(|_| (workflow.steps[index].clone(), workflow.clone()))
            };

            // The callback runs without the map locked.
            if let (Some(callback), Some((step, workflow))) = (on_step_complete, snapshot) {
                callback(&step, &workflow);
            }
        }

        // --- 3. Finish ---
        let mut workflows = self.workflows.lock().await;
        let Some(workflow) = workflows.get_mut(workflow_id) else {
            return false;
        };
        workflow.status = WorkflowStatus::Completed;
        workflow.end_time = Some(Utc::now());
        info!(workflow_id, "Workflow completed.");
        true
    }

    //=====================================================================================
    // Accessors
    //=====================================================================================

    pub async fn get_workflow(&self, workflow_id: &str) -> Option<Workflow> {
        self.workflows.lock().await.get(workflow_id).cloned()
    }

    /// Every workflow still in the map, ordered by id.
    pub async fn get_active_workflows(&self) -> Vec<Workflow> {
        let mut active: Vec<Workflow> = self.workflows.lock().await.values().cloned().collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        active
    }

    /// Drops completed and failed workflows. Returns how many were removed.
    pub async fn cleanup_completed_workflows(&self) -> usize {
        let mut workflows = self.workflows.lock().await;
        let before = workflows.len();
        workflows.retain(|_, w| !w.status.is_finished());
        let removed = before - workflows.len();
        if removed > 0 {
            debug!(removed, "Cleaned up finished workflows.");
        }
        removed
    }
}
