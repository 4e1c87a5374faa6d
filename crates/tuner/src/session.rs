//! Tuning session: space construction plus the searcher driver loop.

use crate::report::{TunedPoint, TuningReport};
use crate::runner::{KernelRunner, RunOutcome};
use gridtune_search::{build_searcher, Cost, Strategy};
use gridtune_space::{
    ConstraintSet, ModifierOp, ModifierTarget, ParameterRegistry, Space, ThreadGeometry,
    ThreadModifier, TuneError,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the parameter registry, constraints, and thread geometry for one
/// kernel, and drives a searcher over the enumerated space.
///
/// Parameters, constraints, and modifiers are declared up front; the space
/// is built once per `tune` call and shared with the searcher by reference.
#[derive(Debug, Default)]
pub struct TuningSession {
    registry: ParameterRegistry,
    constraints: ConstraintSet,
    geometry: ThreadGeometry,
}

impl TuningSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        values: Vec<usize>,
    ) -> Result<(), TuneError> {
        self.registry.add(name, values)
    }

    pub fn add_constraint<F>(&mut self, parameters: &[&str], predicate: F) -> Result<(), TuneError>
    where
        F: Fn(&[usize]) -> bool + Send + Sync + 'static,
    {
        self.constraints.add(&self.registry, parameters, predicate)
    }

    pub fn set_global_size(&mut self, dims: &[usize]) {
        self.geometry.set_global_size(dims);
    }

    pub fn set_local_size(&mut self, dims: &[usize]) {
        self.geometry.set_local_size(dims);
    }

    pub fn mul_global_size(&mut self, axis: usize, parameter: &str) -> Result<(), TuneError> {
        self.add_modifier(ModifierTarget::Global, axis, parameter, ModifierOp::Multiply)
    }

    pub fn div_global_size(&mut self, axis: usize, parameter: &str) -> Result<(), TuneError> {
        self.add_modifier(ModifierTarget::Global, axis, parameter, ModifierOp::Divide)
    }

    pub fn mul_local_size(&mut self, axis: usize, parameter: &str) -> Result<(), TuneError> {
        self.add_modifier(ModifierTarget::Local, axis, parameter, ModifierOp::Multiply)
    }

    pub fn div_local_size(&mut self, axis: usize, parameter: &str) -> Result<(), TuneError> {
        self.add_modifier(ModifierTarget::Local, axis, parameter, ModifierOp::Divide)
    }

    fn add_modifier(
        &mut self,
        target: ModifierTarget,
        axis: usize,
        parameter: &str,
        op: ModifierOp,
    ) -> Result<(), TuneError> {
        self.geometry.add_modifier(
            &self.registry,
            ThreadModifier {
                target,
                axis,
                parameter: parameter.to_string(),
                op,
            },
        )
    }

    /// Enumerate the feasible space. Exposed for tests and diagnostics;
    /// `tune` builds its own.
    pub fn build_space(&self) -> Result<Space, TuneError> {
        Space::build(Arc::new(self.registry.clone()), &self.constraints)
    }

    /// Run one tuning session with the given strategy against a runner.
    ///
    /// Configurations whose effective local size does not divide the
    /// global size are marked infeasible here, without touching the
    /// runner. Runner infeasibility is data and never aborts the session.
    pub fn tune(
        &self,
        strategy: &Strategy,
        runner: &mut dyn KernelRunner,
    ) -> anyhow::Result<TuningReport> {
        let space = Arc::new(self.build_space()?);
        let mut searcher = build_searcher(Arc::clone(&space), strategy)?;
        info!(
            strategy = strategy.name(),
            space_size = space.len(),
            budget = searcher.budget(),
            "starting tuning session"
        );

        let mut points = Vec::with_capacity(searcher.budget());
        while !searcher.done() {
            let index = searcher.index();
            let config = searcher.configuration().clone();
            let dims = self.geometry.apply(&config);

            let cost = if !dims.aligned() {
                warn!(index, ?dims, "local size does not divide global size");
                Cost::Infeasible
            } else {
                match runner.evaluate(&config, &dims) {
                    RunOutcome::Completed { seconds } => {
                        debug!(index, seconds, "configuration measured");
                        Cost::Seconds(seconds)
                    }
                    RunOutcome::Infeasible(kind) => {
                        warn!(index, ?kind, "configuration infeasible");
                        Cost::Infeasible
                    }
                }
            };

            searcher.report(cost);
            points.push(TunedPoint {
                index,
                parameters: config.entries(),
                cost,
            });
            searcher.next();
        }

        let report = TuningReport::new(strategy.name().to_string(), space.len(), points);
        match report.best() {
            Some(best) => info!(
                index = best.index,
                seconds = best.cost.energy(),
                evaluations = report.evaluations,
                "tuning session finished"
            ),
            None => warn!(
                evaluations = report.evaluations,
                "tuning session finished without a feasible configuration"
            ),
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{FnRunner, InfeasibilityKind, SimulatedRunner};
    use gridtune_space::{Configuration, WorkDims};

    fn matmul_session() -> TuningSession {
        let mut session = TuningSession::new();
        session.add_parameter("TS", vec![8, 16, 32]).unwrap();
        session.add_parameter("WPT", vec![1, 2]).unwrap();
        session
            .add_constraint(&["TS", "WPT"], |v| v[0] % v[1] == 0)
            .unwrap();
        session.set_global_size(&[1024, 1024]);
        session.set_local_size(&[1, 1]);
        session.mul_local_size(0, "TS").unwrap();
        session.div_global_size(1, "WPT").unwrap();
        session
    }

    #[test]
    fn test_full_session_finds_simulated_optimum() {
        let session = matmul_session();
        let mut runner = SimulatedRunner::new(vec![("TS".into(), 16.0), ("WPT".into(), 2.0)]);
        let report = session.tune(&Strategy::Full, &mut runner).unwrap();

        assert_eq!(report.space_size, 6);
        assert_eq!(report.evaluations, 6);
        let best = report.best().unwrap();
        assert_eq!(best.parameters, vec![("TS".into(), 16), ("WPT".into(), 2)]);
    }

    #[test]
    fn test_driver_marks_misaligned_geometry_infeasible() {
        let mut session = TuningSession::new();
        session.add_parameter("TS", vec![7, 16]).unwrap();
        session.set_global_size(&[64]);
        session.set_local_size(&[1]);
        session.mul_local_size(0, "TS").unwrap();

        // The runner must never see the misaligned TS=7 configuration.
        let mut seen = Vec::new();
        let mut runner = FnRunner(|config: &Configuration, _: &WorkDims| {
            seen.push(config.value("TS").unwrap());
            RunOutcome::Completed { seconds: 1.0 }
        });
        let report = session.tune(&Strategy::Full, &mut runner).unwrap();
        drop(runner);

        assert_eq!(seen, vec![16]);
        assert_eq!(report.infeasible_count(), 1);
        assert_eq!(report.best().unwrap().parameters[0].1, 16);
    }

    #[test]
    fn test_runner_infeasibility_is_data_not_error() {
        let session = matmul_session();
        let mut runner = FnRunner(|_: &Configuration, _: &WorkDims| {
            RunOutcome::Infeasible(InfeasibilityKind::CompileFailed)
        });
        let report = session.tune(&Strategy::Full, &mut runner).unwrap();
        assert_eq!(report.infeasible_count(), report.evaluations);
        assert!(report.best().is_none());
    }

    #[test]
    fn test_empty_space_fails_session() {
        let mut session = TuningSession::new();
        session.add_parameter("TS", vec![8, 16]).unwrap();
        session.add_constraint(&["TS"], |_| false).unwrap();
        let mut runner = SimulatedRunner::new(vec![]);
        let err = session.tune(&Strategy::Full, &mut runner).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TuneError>(),
            Some(TuneError::EmptySearchSpace)
        ));
    }
}
