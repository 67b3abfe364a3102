pub mod dashboard;
pub mod queries;
pub mod records;
pub mod seed;
pub mod session;
pub mod state;

pub use dashboard::{DashboardSummary, PatientOverview};
pub use records::{RecordService, StorageStats, TreatmentOutcome};
pub use session::LoginSession;
pub use state::AppState;
