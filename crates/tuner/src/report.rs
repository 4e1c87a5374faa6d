//! Results of a finished tuning run.

use gridtune_search::Cost;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One evaluated configuration with its measured cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunedPoint {
    /// Index into the enumerated space.
    pub index: usize,
    /// `(name, value)` pairs in parameter declaration order.
    pub parameters: Vec<(String, usize)>,
    pub cost: Cost,
}

/// In-memory record of a tuning session, in evaluation order.
///
/// Nothing is persisted automatically; `save` writes a JSON snapshot of
/// this run only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningReport {
    pub strategy: String,
    pub space_size: usize,
    pub evaluations: usize,
    pub points: Vec<TunedPoint>,
}

impl TuningReport {
    pub fn new(strategy: String, space_size: usize, points: Vec<TunedPoint>) -> Self {
        Self {
            strategy,
            space_size,
            evaluations: points.len(),
            points,
        }
    }

    /// Fastest feasible point, if any configuration ran at all.
    pub fn best(&self) -> Option<&TunedPoint> {
        self.points
            .iter()
            .filter(|p| p.cost.is_feasible())
            .min_by(|a, b| a.cost.energy().total_cmp(&b.cost.energy()))
    }

    /// Feasible points sorted fastest-first.
    pub fn ranked(&self) -> Vec<&TunedPoint> {
        let mut feasible: Vec<&TunedPoint> =
            self.points.iter().filter(|p| p.cost.is_feasible()).collect();
        feasible.sort_by(|a, b| a.cost.energy().total_cmp(&b.cost.energy()));
        feasible
    }

    pub fn infeasible_count(&self) -> usize {
        self.points.iter().filter(|p| !p.cost.is_feasible()).count()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }
}
