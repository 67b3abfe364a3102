//! crates/dental_core/src/workflow.rs
//!
//! Data structures for simulated multi-step workflows. A workflow is created
//! per user action, walked step by step by the simulator, then discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowType {
    PatientRegistration,
    AppointmentBooking,
    TreatmentCompletion,
    FileUpload,
}

impl WorkflowType {
    /// Prefix used when generating workflow ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            WorkflowType::PatientRegistration => "patient-reg",
            WorkflowType::AppointmentBooking => "appointment",
            WorkflowType::TreatmentCompletion => "treatment",
            WorkflowType::FileUpload => "file-upload",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WorkflowType::PatientRegistration => "Patient Registration",
            WorkflowType::AppointmentBooking => "Appointment Booking",
            WorkflowType::TreatmentCompletion => "Treatment Completion",
            WorkflowType::FileUpload => "File Upload",
        }
    }
}

/// Status shared by workflows and their steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Planned duration in milliseconds.
    #[serde(rename = "duration")]
    pub planned_duration_ms: u64,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn pending(
        id: &str,
        name: &str,
        description: impl Into<String>,
        planned_duration_ms: u64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.into(),
            planned_duration_ms,
            status: WorkflowStatus::Pending,
            timestamp: None,
        }
    }

    pub fn planned_duration(&self) -> Duration {
        Duration::from_millis(self.planned_duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkflowType,
    pub steps: Vec<WorkflowStep>,
    pub current_step: usize,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Builds a pending workflow from an ordered step template.
    pub fn pending(id: String, kind: WorkflowType, steps: Vec<WorkflowStep>) -> Self {
        Self {
            id,
            name: kind.display_name().to_string(),
            kind,
            steps,
            current_step: 0,
            status: WorkflowStatus::Pending,
            start_time: None,
            end_time: None,
        }
    }

    /// Sum of every step's planned duration.
    pub fn planned_duration(&self) -> Duration {
        self.steps.iter().map(WorkflowStep::planned_duration).sum()
    }

    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == WorkflowStatus::Completed)
            .count()
    }
}
