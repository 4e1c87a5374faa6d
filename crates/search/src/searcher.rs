//! The common searcher contract and the strategy factory.

use crate::annealing::AnnealingSearcher;
use crate::cost::{Cost, History};
use crate::full::FullSearcher;
use crate::pso::PsoSearcher;
use crate::random::RandomSearcher;
use gridtune_space::{Configuration, Space, TuneError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A search strategy over an enumerated space.
///
/// The driver loop is: `configuration()` → evaluate externally →
/// `report(cost)` → `next()`. A strategy may update internal state between
/// `report` and `next`; it emits indices into the space and never owns the
/// evaluation itself.
pub trait Searcher {
    /// Index of the configuration to evaluate next.
    fn index(&self) -> usize;

    /// The configuration to evaluate next.
    fn configuration(&self) -> &Configuration;

    /// Record the measured cost of the last emitted configuration.
    fn report(&mut self, cost: Cost);

    /// Advance internal state. Must be called after `report`.
    fn next(&mut self);

    /// True when the searcher will emit no new indices.
    fn done(&self) -> bool;

    /// Total number of configurations this searcher intends to visit.
    fn budget(&self) -> usize;

    /// Everything reported so far.
    fn history(&self) -> &History;
}

pub type DynSearcher = Box<dyn Searcher>;

/// Strategy selection plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// Deterministic walk over every configuration.
    Full,
    /// Uniform sample of a fraction of the space, without replacement.
    Random { fraction: f64, seed: u64 },
    /// Simulated annealing with Metropolis acceptance.
    Annealing {
        fraction: f64,
        max_temperature: f64,
        seed: u64,
    },
    /// Particle swarm over per-parameter positions.
    Pso {
        fraction: f64,
        swarms: usize,
        w: f64,
        c1: f64,
        c2: f64,
        seed: u64,
    },
}

fn invalid(reason: impl Into<String>) -> TuneError {
    TuneError::InvalidStrategyOptions {
        reason: reason.into(),
    }
}

fn check_fraction(fraction: f64) -> Result<(), TuneError> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(invalid(format!("fraction {fraction} not in (0, 1]")));
    }
    Ok(())
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Full => "full",
            Strategy::Random { .. } => "random",
            Strategy::Annealing { .. } => "annealing",
            Strategy::Pso { .. } => "pso",
        }
    }

    pub fn validate(&self) -> Result<(), TuneError> {
        match *self {
            Strategy::Full => Ok(()),
            Strategy::Random { fraction, .. } => check_fraction(fraction),
            Strategy::Annealing {
                fraction,
                max_temperature,
                ..
            } => {
                check_fraction(fraction)?;
                if !(max_temperature > 0.0) {
                    return Err(invalid(format!(
                        "max_temperature {max_temperature} must be positive"
                    )));
                }
                Ok(())
            }
            Strategy::Pso {
                fraction,
                swarms,
                w,
                c1,
                c2,
                ..
            } => {
                check_fraction(fraction)?;
                if swarms == 0 {
                    return Err(invalid("swarms must be at least 1"));
                }
                if !(0.0..=1.0).contains(&w) {
                    return Err(invalid(format!("inertia w {w} not in [0, 1]")));
                }
                if !(c1 > 0.0) || !(c2 > 0.0) {
                    return Err(invalid(format!("weights c1 {c1} and c2 {c2} must be positive")));
                }
                if c1 + c2 > 4.0 {
                    return Err(invalid(format!("c1 + c2 = {} exceeds 4", c1 + c2)));
                }
                Ok(())
            }
        }
    }
}

/// `ceil(fraction * n)`, clamped into `[1, n]`.
pub(crate) fn fraction_budget(fraction: f64, n: usize) -> usize {
    ((fraction * n as f64).ceil() as usize).clamp(1, n.max(1))
}

/// Build a searcher over `space` from validated strategy options.
pub fn build_searcher(space: Arc<Space>, strategy: &Strategy) -> Result<DynSearcher, TuneError> {
    strategy.validate()?;
    Ok(match *strategy {
        Strategy::Full => Box::new(FullSearcher::new(space)),
        Strategy::Random { fraction, seed } => Box::new(RandomSearcher::new(space, fraction, seed)),
        Strategy::Annealing {
            fraction,
            max_temperature,
            seed,
        } => Box::new(AnnealingSearcher::new(space, fraction, max_temperature, seed)),
        Strategy::Pso {
            fraction,
            swarms,
            w,
            c1,
            c2,
            seed,
        } => Box::new(PsoSearcher::new(space, fraction, swarms, w, c1, c2, seed)),
    })
}
