//! crates/dental_core/src/domain.rs
//!
//! Defines the practice records (patients, incidents, attachments, users) and
//! the audit entries the persistence layer produces.
//! Field names serialize in camelCase so stored JSON matches what the
//! dashboard has always written under the `dental_*` keys.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key holding the serialized patient collection.
pub const PATIENTS_KEY: &str = "dental_patients";
/// Key holding the serialized incident collection.
pub const INCIDENTS_KEY: &str = "dental_incidents";
/// Key holding the logged-in user.
pub const USER_KEY: &str = "dental_user";

/// Version tag written into every backup export.
pub const BACKUP_VERSION: &str = "1.0";

//=========================================================================================
// Patients
//=========================================================================================

/// A registered patient. Identity is the `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(rename = "dob")]
    pub date_of_birth: NaiveDate,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub health_info: String,
}

/// Patient data as submitted by the registration form, before an id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub contact: String,
    pub email: Option<String>,
    pub health_info: String,
}

/// A partial patient edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub contact: Option<String>,
    pub email: Option<Option<String>>,
    pub health_info: Option<String>,
}

impl Patient {
    pub fn from_new(id: String, new: NewPatient) -> Self {
        Self {
            id,
            name: new.name,
            date_of_birth: new.date_of_birth,
            contact: new.contact,
            email: new.email,
            health_info: new.health_info,
        }
    }

    /// Merges a partial update into this record.
    pub fn apply(&mut self, update: PatientUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(date_of_birth) = update.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
        if let Some(contact) = update.contact {
            self.contact = contact;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(health_info) = update.health_info {
            self.health_info = health_info;
        }
    }
}

//=========================================================================================
// Incidents (appointments and treatments)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// An appointment or treatment record belonging to one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub comments: String,
    #[serde(with = "local_datetime")]
    pub appointment_date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    pub status: IncidentStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "local_datetime::option"
    )]
    pub next_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

/// Incident data as submitted by the booking form, before an id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncident {
    pub patient_id: String,
    pub title: String,
    pub description: String,
    pub comments: String,
    pub appointment_date: NaiveDateTime,
    pub cost: Option<f64>,
    pub treatment: Option<String>,
    pub status: IncidentStatus,
    pub next_date: Option<NaiveDateTime>,
    pub files: Vec<FileAttachment>,
}

/// A partial incident edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub appointment_date: Option<NaiveDateTime>,
    pub cost: Option<Option<f64>>,
    pub treatment: Option<Option<String>>,
    pub status: Option<IncidentStatus>,
    pub next_date: Option<Option<NaiveDateTime>>,
    pub files: Option<Vec<FileAttachment>>,
}

impl Incident {
    pub fn from_new(id: String, new: NewIncident) -> Self {
        Self {
            id,
            patient_id: new.patient_id,
            title: new.title,
            description: new.description,
            comments: new.comments,
            appointment_date: new.appointment_date,
            cost: new.cost,
            treatment: new.treatment,
            status: new.status,
            next_date: new.next_date,
            files: new.files,
        }
    }

    pub fn apply(&mut self, update: IncidentUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(comments) = update.comments {
            self.comments = comments;
        }
        if let Some(appointment_date) = update.appointment_date {
            self.appointment_date = appointment_date;
        }
        if let Some(cost) = update.cost {
            self.cost = cost;
        }
        if let Some(treatment) = update.treatment {
            self.treatment = treatment;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(next_date) = update.next_date {
            self.next_date = next_date;
        }
        if let Some(files) = update.files {
            self.files = files;
        }
    }
}

//=========================================================================================
// File attachments
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Attachment content is not a base64 data URI")]
    NotADataUri,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A file stored inline in its incident as a base64 data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    #[serde(rename = "url")]
    pub content: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
}

impl FileAttachment {
    /// Encodes raw file bytes into an attachment.
    pub fn from_bytes(
        name: &str,
        mime_type: &str,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.to_string(),
            content: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
            mime_type: Some(mime_type.to_string()),
            size: Some(bytes.len() as u64),
            upload_date: Some(uploaded_at),
        }
    }

    /// Decodes the inline payload back into the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>, AttachmentError> {
        let (header, payload) = self
            .content
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or(AttachmentError::NotADataUri)?;
        if !header.ends_with(";base64") {
            return Err(AttachmentError::NotADataUri);
        }
        Ok(STANDARD.decode(payload)?)
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Patient,
}

// Represents an authenticated user. Never carries a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: Role,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

impl User {
    /// Admins see every patient; a patient only sees their own record.
    pub fn can_view_patient(&self, patient_id: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Patient => self.patient_id.as_deref() == Some(patient_id),
        }
    }
}

//=========================================================================================
// Audit log
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Patients,
    Incidents,
    Users,
}

/// Payload summary attached to an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationData {
    Count { count: usize },
    Error { error: String },
    Auth { email: String, authenticated: bool },
}

/// One entry of the append-only operation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseOperation {
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub table: Table,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OperationData>,
}

//=========================================================================================
// Backup export
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupExport {
    pub patients: Vec<Patient>,
    pub incidents: Vec<Incident>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl BackupExport {
    pub fn new(
        patients: Vec<Patient>,
        incidents: Vec<Incident>,
        export_date: DateTime<Utc>,
    ) -> Self {
        Self {
            patients,
            incidents,
            export_date,
            version: BACKUP_VERSION.to_string(),
        }
    }

    /// `dental-data-backup-YYYY-MM-DD.json`, dated by the export timestamp.
    pub fn file_name(&self) -> String {
        format!("dental-data-backup-{}.json", self.export_date.format("%Y-%m-%d"))
    }
}

/// Appointment times are local wall-clock values without an offset. Browser
/// inputs may omit the seconds, so both forms are accepted when reading.
mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    const READ_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        READ_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(WRITE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid local date-time '{}'", raw)))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid local date-time '{}'", raw))),
            }
        }
    }
}
