pub mod faults;
pub mod file_store;
pub mod memory_store;

pub use faults::{NoFaults, ScriptedFaults, SimulatedFaults};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
