//! The kernel-runner abstraction consumed by the tuning session.

use gridtune_space::{Configuration, WorkDims};
use serde::{Deserialize, Serialize};

/// Why a configuration failed to produce a measurement.
///
/// The session does not distinguish between the kinds beyond logging; all
/// of them map to the infeasibility sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfeasibilityKind {
    CompileFailed,
    ResourceExceeded,
    LaunchFailed,
    ValidationFailed,
}

/// Outcome of evaluating one configuration on the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// The kernel compiled, ran, and validated; runtime in seconds.
    Completed { seconds: f64 },
    /// The configuration did not produce a valid run.
    Infeasible(InfeasibilityKind),
}

/// Compiles and executes one configuration against the reference output.
///
/// Implementations own the whole device interaction (context, program,
/// buffers, validation); the session only sees the outcome.
pub trait KernelRunner {
    fn evaluate(&mut self, config: &Configuration, dims: &WorkDims) -> RunOutcome;
}

/// Adapter turning a closure into a [`KernelRunner`].
pub struct FnRunner<F>(pub F);

impl<F> KernelRunner for FnRunner<F>
where
    F: FnMut(&Configuration, &WorkDims) -> RunOutcome,
{
    fn evaluate(&mut self, config: &Configuration, dims: &WorkDims) -> RunOutcome {
        (self.0)(config, dims)
    }
}

/// Deterministic in-process runner for tests and demos.
///
/// Models runtime as a quadratic bowl over the parameter values: the
/// further a configuration sits from the target values, the slower the
/// simulated kernel. Configurations whose local work size exceeds
/// `max_local_threads` report `ResourceExceeded`, mimicking a device limit.
#[derive(Debug, Clone)]
pub struct SimulatedRunner {
    targets: Vec<(String, f64)>,
    base_seconds: f64,
    max_local_threads: usize,
}

impl SimulatedRunner {
    pub fn new(targets: Vec<(String, f64)>) -> Self {
        Self {
            targets,
            base_seconds: 1e-3,
            max_local_threads: usize::MAX,
        }
    }

    /// Cap on `local[0] * local[1] * local[2]` before the runner reports
    /// `ResourceExceeded`.
    pub fn with_max_local_threads(mut self, limit: usize) -> Self {
        self.max_local_threads = limit;
        self
    }
}

impl KernelRunner for SimulatedRunner {
    fn evaluate(&mut self, config: &Configuration, dims: &WorkDims) -> RunOutcome {
        let local_threads: usize = dims.local.iter().product();
        if local_threads > self.max_local_threads {
            return RunOutcome::Infeasible(InfeasibilityKind::ResourceExceeded);
        }

        let mut seconds = self.base_seconds;
        for (name, target) in &self.targets {
            if let Some(value) = config.value(name) {
                let distance = value as f64 - target;
                seconds += 1e-4 * distance * distance;
            }
        }
        RunOutcome::Completed { seconds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridtune_space::{ConstraintSet, ParameterRegistry, Space};
    use std::sync::Arc;

    fn space() -> Space {
        let mut registry = ParameterRegistry::new();
        registry.add("TS", vec![8, 16, 32]).unwrap();
        Space::build(Arc::new(registry), &ConstraintSet::new()).unwrap()
    }

    fn unit_dims() -> WorkDims {
        WorkDims {
            global: [64, 1, 1],
            local: [8, 1, 1],
        }
    }

    #[test]
    fn test_simulated_runner_prefers_target() {
        let space = space();
        let mut runner = SimulatedRunner::new(vec![("TS".into(), 16.0)]);

        let at_target = runner.evaluate(space.configuration(1), &unit_dims());
        let off_target = runner.evaluate(space.configuration(2), &unit_dims());
        let (RunOutcome::Completed { seconds: fast }, RunOutcome::Completed { seconds: slow }) =
            (at_target, off_target)
        else {
            panic!("simulated runs must complete");
        };
        assert!(fast < slow);
    }

    #[test]
    fn test_simulated_runner_enforces_local_limit() {
        let space = space();
        let mut runner =
            SimulatedRunner::new(vec![("TS".into(), 16.0)]).with_max_local_threads(4);
        let outcome = runner.evaluate(space.configuration(0), &unit_dims());
        assert_eq!(
            outcome,
            RunOutcome::Infeasible(InfeasibilityKind::ResourceExceeded)
        );
    }

    #[test]
    fn test_closures_adapt_into_runners() {
        let space = space();
        let mut calls = 0usize;
        let mut runner = FnRunner(|_: &Configuration, _: &WorkDims| {
            calls += 1;
            RunOutcome::Completed { seconds: 1.0 }
        });
        let outcome = runner.evaluate(space.configuration(0), &unit_dims());
        assert!(matches!(outcome, RunOutcome::Completed { .. }));
        drop(runner);
        assert_eq!(calls, 1);
    }
}
