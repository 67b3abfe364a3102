pub mod domain;
pub mod ports;
pub mod workflow;

pub use domain::{
    AttachmentError, BackupExport, DatabaseOperation, FileAttachment, Incident, IncidentStatus,
    IncidentUpdate, NewIncident, NewPatient, OperationData, OperationType, Patient, PatientUpdate,
    Role, Table, User,
};
pub use ports::{FaultPolicy, KeyValueStore, LatencyRange, PortError, PortResult};
pub use workflow::{Workflow, WorkflowStatus, WorkflowStep, WorkflowType};
