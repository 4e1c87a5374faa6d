//! Simulated annealing over the configuration space.
//!
//! A Markov walk whose neighbourhood is the set of configurations differing
//! from the current one in exactly one parameter. Worse moves are accepted
//! with the Metropolis probability `exp(-dE / T)` under a linearly cooling
//! temperature.

use crate::cost::{Cost, History};
use crate::searcher::{fraction_budget, Searcher};
use gridtune_space::{Configuration, Space};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

/// Metropolis acceptance probability.
///
/// The sentinel (infinite candidate energy) is short-circuited before the
/// formula, so infeasible candidates are always rejected.
fn acceptance_probability(current_energy: f64, candidate_energy: f64, temperature: f64) -> f64 {
    if candidate_energy.is_infinite() {
        return 0.0;
    }
    if candidate_energy < current_energy {
        return 1.0;
    }
    (-(candidate_energy - current_energy) / temperature).exp()
}

#[derive(Debug)]
pub struct AnnealingSearcher {
    space: Arc<Space>,
    rng: StdRng,
    budget: usize,
    temperature: f64,
    /// Accepted state of the walk.
    current: usize,
    current_energy: f64,
    /// Index emitted for the next evaluation (the candidate, once the
    /// initial state has been reported).
    pending: usize,
    awaiting_initial: bool,
    visited: HashSet<usize>,
    stuck: usize,
    emitted: usize,
    finished: bool,
    history: History,
}

impl AnnealingSearcher {
    /// Streak of already-visited draws tolerated before the walk
    /// terminates. Also caps candidate redraws within a single step.
    pub const MAX_ALREADY_VISITED: usize = 10;

    /// Temperature floor for the cooling schedule.
    pub const MIN_TEMPERATURE: f64 = 1e-9;

    pub fn new(space: Arc<Space>, fraction: f64, max_temperature: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let budget = fraction_budget(fraction, space.len());
        let start = rng.gen_range(0..space.len());
        let mut visited = HashSet::new();
        visited.insert(start);
        Self {
            space,
            rng,
            budget,
            temperature: max_temperature,
            current: start,
            current_energy: f64::INFINITY,
            pending: start,
            awaiting_initial: true,
            visited,
            stuck: 0,
            emitted: 1,
            finished: false,
            history: History::new(),
        }
    }

    fn cool(&mut self) {
        let factor = 1.0 - 1.0 / self.budget as f64;
        self.temperature = (self.temperature * factor).max(Self::MIN_TEMPERATURE);
    }
}

impl Searcher for AnnealingSearcher {
    fn index(&self) -> usize {
        self.pending
    }

    fn configuration(&self) -> &Configuration {
        self.space.configuration(self.pending)
    }

    fn report(&mut self, cost: Cost) {
        self.history.record(self.pending, cost);
        let energy = cost.energy();

        if self.awaiting_initial {
            self.current_energy = energy;
            self.awaiting_initial = false;
            return;
        }

        let probability = acceptance_probability(self.current_energy, energy, self.temperature);
        if self.rng.gen::<f64>() < probability {
            self.current = self.pending;
            self.current_energy = energy;
            self.stuck = 0;
        }
        self.cool();
    }

    fn next(&mut self) {
        if self.finished {
            return;
        }
        if self.emitted >= self.budget {
            self.finished = true;
            return;
        }

        let neighbours = self.space.neighbours_of(self.current);
        if neighbours.is_empty() {
            self.finished = true;
            return;
        }

        // Redraw already-visited candidates, up to a per-step cap. The
        // visited-draw streak carries across steps and only resets on an
        // accepted move.
        let mut candidate = neighbours[self.rng.gen_range(0..neighbours.len())];
        let mut run_length = 0;
        while self.visited.contains(&candidate) && run_length < Self::MAX_ALREADY_VISITED {
            run_length += 1;
            candidate = neighbours[self.rng.gen_range(0..neighbours.len())];
        }
        if run_length > 0 {
            self.stuck += run_length;
            if self.stuck >= Self::MAX_ALREADY_VISITED {
                self.finished = true;
                return;
            }
        }

        self.visited.insert(candidate);
        self.pending = candidate;
        self.emitted += 1;
    }

    fn done(&self) -> bool {
        self.finished
    }

    fn budget(&self) -> usize {
        self.budget
    }

    fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridtune_space::{ConstraintSet, ParameterRegistry};

    fn grid_space(rows: usize, cols: usize) -> Arc<Space> {
        let mut registry = ParameterRegistry::new();
        registry.add("R", (0..rows).collect()).unwrap();
        registry.add("C", (0..cols).collect()).unwrap();
        Arc::new(Space::build(Arc::new(registry), &ConstraintSet::new()).unwrap())
    }

    // Drive the searcher against `cost(index)`, returning emitted indices.
    fn drive(searcher: &mut AnnealingSearcher, cost: impl Fn(usize) -> Cost) -> Vec<usize> {
        let mut emitted = Vec::new();
        while !searcher.done() {
            let index = searcher.index();
            emitted.push(index);
            searcher.report(cost(index));
            searcher.next();
        }
        emitted
    }

    #[test]
    fn test_acceptance_probability_sign_rules() {
        assert_eq!(acceptance_probability(2.0, 1.0, 0.5), 1.0);
        let p = acceptance_probability(1.0, 2.0, 0.5);
        assert!((p - (-2.0f64).exp()).abs() < 1e-12);
        // Infeasible candidates are always rejected, even from an
        // infeasible current state.
        assert_eq!(acceptance_probability(f64::INFINITY, f64::INFINITY, 0.5), 0.0);
        assert_eq!(acceptance_probability(1.0, f64::INFINITY, 0.5), 0.0);
        // Anything beats an unmeasured (infinite) current state.
        assert_eq!(acceptance_probability(f64::INFINITY, 3.0, 0.5), 1.0);
    }

    #[test]
    fn test_acceptance_rate_matches_metropolis() {
        // dE = 1, T = 1: acceptance should hover around exp(-1) = 0.368.
        let mut rng = StdRng::seed_from_u64(9);
        let probability = acceptance_probability(1.0, 2.0, 1.0);
        let trials = 20_000;
        let accepted = (0..trials)
            .filter(|_| rng.gen::<f64>() < probability)
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!((rate - (-1.0f64).exp()).abs() < 0.02, "rate {rate}");
    }

    #[test]
    fn test_emitted_indices_stay_in_space() {
        let space = grid_space(8, 8);
        let mut searcher = AnnealingSearcher::new(Arc::clone(&space), 0.5, 2.0, 11);
        let emitted = drive(&mut searcher, |i| Cost::Seconds(1.0 + i as f64));
        assert!(!emitted.is_empty());
        assert!(emitted.iter().all(|&i| i < space.len()));
        assert!(emitted.len() <= searcher.budget());
    }

    #[test]
    fn test_fixed_seed_reproduces_walk() {
        let space = grid_space(8, 8);
        let cost = |i: usize| Cost::Seconds((i % 7) as f64 + 0.5);
        let a = drive(
            &mut AnnealingSearcher::new(Arc::clone(&space), 0.5, 2.0, 21),
            cost,
        );
        let b = drive(
            &mut AnnealingSearcher::new(Arc::clone(&space), 0.5, 2.0, 21),
            cost,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_descent_reaches_minimum() {
        // cost(index) = index over a 3x3x3 grid: the walk should find
        // index 0 in the large majority of trials.
        let mut registry = ParameterRegistry::new();
        registry.add("A", vec![0, 1, 2]).unwrap();
        registry.add("B", vec![0, 1, 2]).unwrap();
        registry.add("C", vec![0, 1, 2]).unwrap();
        let space =
            Arc::new(Space::build(Arc::new(registry), &ConstraintSet::new()).unwrap());

        let mut reached = 0;
        for seed in 0..100 {
            let mut searcher = AnnealingSearcher::new(Arc::clone(&space), 1.0, 1.0, seed);
            let mut best = f64::INFINITY;
            let mut best_trace = Vec::new();
            while !searcher.done() {
                let index = searcher.index();
                let cost = Cost::Seconds(index as f64);
                if cost.energy() < best {
                    best = cost.energy();
                }
                best_trace.push(best);
                searcher.report(cost);
                searcher.next();
            }
            assert!(best_trace.windows(2).all(|w| w[1] <= w[0]));
            if best == 0.0 {
                reached += 1;
            }
        }
        assert!(reached >= 80, "reached minimum in {reached}/100 trials");
    }

    #[test]
    fn test_two_node_island_terminates_quickly() {
        // Feasible tuples: (0,0), (1,0), (2,1), (3,1). The walk starts in
        // a two-node island and can never leave it; the stuck rule must
        // end the search.
        let mut registry = ParameterRegistry::new();
        registry.add("X", vec![0, 1, 2, 3]).unwrap();
        registry.add("Y", vec![0, 1]).unwrap();
        let mut constraints = ConstraintSet::new();
        constraints
            .add(&registry, &["X", "Y"], |v| (v[0] < 2) == (v[1] == 0))
            .unwrap();
        let space = Arc::new(Space::build(Arc::new(registry), &constraints).unwrap());
        assert_eq!(space.len(), 4);
        for index in 0..space.len() {
            assert_eq!(space.neighbours_of(index).len(), 1);
        }

        let mut searcher = AnnealingSearcher::new(Arc::clone(&space), 1.0, 1.0, 3);
        let emitted = drive(&mut searcher, |i| Cost::Seconds(i as f64 + 1.0));
        assert!(searcher.done());
        assert!(
            emitted.len() <= AnnealingSearcher::MAX_ALREADY_VISITED + 1,
            "took {} steps",
            emitted.len()
        );
    }

    #[test]
    fn test_infeasible_reports_never_accepted() {
        let space = grid_space(6, 6);
        let mut searcher = AnnealingSearcher::new(Arc::clone(&space), 0.5, 1.0, 5);

        // Feasible initial state, everything after infeasible: the walk
        // must keep its current state pinned to the start.
        let start = searcher.index();
        searcher.report(Cost::Seconds(1.0));
        searcher.next();
        while !searcher.done() {
            searcher.report(Cost::Infeasible);
            assert_eq!(searcher.current, start);
            searcher.next();
        }
        assert_eq!(searcher.history().best().unwrap().index, start);
    }

    #[test]
    fn test_budget_bounds_walk_length() {
        let space = grid_space(10, 10);
        let mut searcher = AnnealingSearcher::new(Arc::clone(&space), 0.3, 1.0, 17);
        assert_eq!(searcher.budget(), 30);
        let emitted = drive(&mut searcher, |_| Cost::Seconds(1.0));
        assert!(emitted.len() <= 30);
    }
}
