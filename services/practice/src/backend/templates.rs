//! services/practice/src/backend/templates.rs
//!
//! Hardcoded step lists for each workflow type.

use dental_core::workflow::WorkflowStep;

pub fn patient_registration() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::pending(
            "validate-data",
            "Validate Patient Data",
            "Checking patient information for completeness and accuracy",
            800,
        ),
        WorkflowStep::pending(
            "check-duplicates",
            "Check for Duplicates",
            "Searching existing records for duplicate patients",
            1200,
        ),
        WorkflowStep::pending(
            "generate-id",
            "Generate Patient ID",
            "Creating unique patient identifier",
            300,
        ),
        WorkflowStep::pending(
            "save-record",
            "Save Patient Record",
            "Storing patient information in database",
            600,
        ),
        WorkflowStep::pending(
            "send-confirmation",
            "Send Confirmation",
            "Sending welcome message to patient",
            400,
        ),
    ]
}

pub fn appointment_booking() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::pending(
            "validate-appointment",
            "Validate Appointment Data",
            "Checking appointment details and patient information",
            600,
        ),
        WorkflowStep::pending(
            "check-availability",
            "Check Schedule Availability",
            "Verifying time slot availability",
            900,
        ),
        WorkflowStep::pending(
            "reserve-slot",
            "Reserve Time Slot",
            "Blocking the selected time slot",
            400,
        ),
        WorkflowStep::pending(
            "save-appointment",
            "Save Appointment",
            "Storing appointment in database",
            700,
        ),
        WorkflowStep::pending(
            "send-reminder",
            "Schedule Reminder",
            "Setting up appointment reminder notifications",
            300,
        ),
    ]
}

pub fn treatment_completion() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::pending(
            "verify-treatment",
            "Verify Treatment Details",
            "Confirming treatment notes and cost for the appointment",
            500,
        ),
        WorkflowStep::pending(
            "update-status",
            "Update Appointment Status",
            "Marking the appointment as completed",
            400,
        ),
        WorkflowStep::pending(
            "generate-invoice",
            "Generate Invoice",
            "Preparing the invoice for the completed treatment",
            700,
        ),
        WorkflowStep::pending(
            "save-treatment",
            "Save Treatment Record",
            "Storing treatment details in database",
            600,
        ),
        WorkflowStep::pending(
            "schedule-follow-up",
            "Schedule Follow-up",
            "Recording the next appointment date",
            300,
        ),
    ]
}

/// Durations of the first four steps scale with the number of files.
pub fn file_upload(file_count: u64) -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::pending(
            "validate-files",
            "Validate Files",
            format!("Checking {} file(s) for size and format compliance", file_count),
            500 * file_count,
        ),
        WorkflowStep::pending(
            "scan-security",
            "Security Scan",
            "Scanning files for security threats",
            800 * file_count,
        ),
        WorkflowStep::pending(
            "convert-format",
            "Convert to Base64",
            "Converting files to base64 format for storage",
            1000 * file_count,
        ),
        WorkflowStep::pending(
            "save-files",
            "Save Files",
            "Storing files in local database",
            600 * file_count,
        ),
        WorkflowStep::pending(
            "update-record",
            "Update Record",
            "Linking files to appointment record",
            300,
        ),
    ]
}
