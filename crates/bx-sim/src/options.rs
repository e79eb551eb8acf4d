//! Time stepping and Newton options.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Newton iteration settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonOptions {
    pub max_iterations: usize,
    /// Converged once the weighted update norm drops below this value and
    /// no primary variable switch happened in the iteration.
    pub tolerance: f64,
    /// Relative step of the finite-difference Jacobian.
    pub epsilon: f64,
    /// The time step grows after steps that need at most this many
    /// iterations.
    pub target_iterations: usize,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-7,
            epsilon: 1e-8,
            target_iterations: 6,
        }
    }
}

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Initial time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Smallest time step before giving up (seconds)
    pub min_dt: f64,
    /// Largest time step (seconds)
    pub max_dt: f64,
    /// Retries of a failed step
    pub max_retries: usize,
    /// Time step factor after a failed step
    pub cutback_factor: f64,
    /// Time step factor after an easy step
    pub grow_factor: f64,
    pub newton: NewtonOptions,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1.0,
            t_end: 100.0,
            max_steps: 100_000,
            record_every: 1,
            min_dt: 1e-6,
            max_dt: 1e4,
            max_retries: 8,
            cutback_factor: 0.5,
            grow_factor: 1.5,
            newton: NewtonOptions::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        let checks: [(bool, &'static str); 9] = [
            (self.dt > 0.0, "dt must be positive"),
            (self.t_end >= 0.0, "t_end must be non-negative"),
            (self.max_steps > 0, "max_steps must be positive"),
            (self.record_every > 0, "record_every must be positive"),
            (
                self.min_dt > 0.0 && self.min_dt <= self.dt,
                "min_dt must be in (0, dt]",
            ),
            (self.max_dt >= self.dt, "max_dt must not be below dt"),
            (
                self.cutback_factor > 0.0 && self.cutback_factor < 1.0,
                "cutback_factor must be in (0, 1)",
            ),
            (self.grow_factor >= 1.0, "grow_factor must be at least 1"),
            (
                self.newton.max_iterations > 0 && self.newton.tolerance > 0.0 && self.newton.epsilon > 0.0,
                "newton settings must be positive",
            ),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some(&(_, what)) => Err(SimError::InvalidArg { what }),
            None => Ok(()),
        }
    }
}
