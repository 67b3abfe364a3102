//! services/practice/src/adapters/faults.rs
//!
//! Implementations of the `FaultPolicy` port.
//!
//! `SimulatedFaults` reproduces the dashboard's behaviour: real delays and an
//! unseeded random failure draw per step. `NoFaults` and `ScriptedFaults` run
//! with zero delay so callers can exercise every outcome deterministically.

use dental_core::ports::{FaultPolicy, LatencyRange};
use dental_core::workflow::WorkflowType;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;

//=========================================================================================
// SimulatedFaults
//=========================================================================================

/// Uniform random latency and a fixed per-step failure probability.
#[derive(Debug, Clone)]
pub struct SimulatedFaults {
    failure_rate: f64,
    simulate_latency: bool,
}

impl SimulatedFaults {
    pub fn new(failure_rate: f64, simulate_latency: bool) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            simulate_latency,
        }
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

impl FaultPolicy for SimulatedFaults {
    fn latency(&self, range: LatencyRange) -> Duration {
        if !self.simulate_latency {
            return Duration::ZERO;
        }
        if range.min >= range.max {
            return range.min;
        }
        rand::thread_rng().gen_range(range.min..=range.max)
    }

    fn step_duration(&self, planned: Duration) -> Duration {
        if self.simulate_latency {
            planned
        } else {
            Duration::ZERO
        }
    }

    fn fail_step(&self, _kind: WorkflowType, _step_index: usize) -> bool {
        rand::thread_rng().gen::<f64>() < self.failure_rate
    }
}

//=========================================================================================
// NoFaults
//=========================================================================================

/// Zero delay everywhere, and no step ever fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultPolicy for NoFaults {
    fn latency(&self, _range: LatencyRange) -> Duration {
        Duration::ZERO
    }

    fn step_duration(&self, _planned: Duration) -> Duration {
        Duration::ZERO
    }

    fn fail_step(&self, _kind: WorkflowType, _step_index: usize) -> bool {
        false
    }
}

//=========================================================================================
// ScriptedFaults
//=========================================================================================

/// Zero delay, failing exactly the listed steps of the listed workflow types.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFaults {
    failures: HashSet<(WorkflowType, usize)>,
}

impl ScriptedFaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails step `step_index` of every `kind` workflow.
    pub fn fail_at(mut self, kind: WorkflowType, step_index: usize) -> Self {
        self.failures.insert((kind, step_index));
        self
    }
}

impl FaultPolicy for ScriptedFaults {
    fn latency(&self, _range: LatencyRange) -> Duration {
        Duration::ZERO
    }

    fn step_duration(&self, _planned: Duration) -> Duration {
        Duration::ZERO
    }

    fn fail_step(&self, kind: WorkflowType, step_index: usize) -> bool {
        self.failures.contains(&(kind, step_index))
    }
}
