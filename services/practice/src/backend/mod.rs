pub mod mock_db;
pub mod simulator;
pub mod templates;

pub use mock_db::MockDatabase;
pub use simulator::{StepCallback, WorkflowSimulator};
