//! Uniform random sampling without replacement.

use crate::cost::{Cost, History};
use crate::searcher::{fraction_budget, Searcher};
use gridtune_space::{Configuration, Space};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// Visits `ceil(fraction * N)` distinct indices drawn uniformly.
///
/// The whole index range is shuffled once with the seeded generator and the
/// prefix is emitted, so a fixed seed reproduces the exact sample.
#[derive(Debug)]
pub struct RandomSearcher {
    space: Arc<Space>,
    order: Vec<usize>,
    cursor: usize,
    budget: usize,
    history: History,
}

impl RandomSearcher {
    pub fn new(space: Arc<Space>, fraction: f64, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..space.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        let budget = fraction_budget(fraction, space.len());
        Self {
            space,
            order,
            cursor: 0,
            budget,
            history: History::new(),
        }
    }
}

impl Searcher for RandomSearcher {
    fn index(&self) -> usize {
        self.order[self.cursor]
    }

    fn configuration(&self) -> &Configuration {
        self.space.configuration(self.index())
    }

    fn report(&mut self, cost: Cost) {
        let index = self.index();
        self.history.record(index, cost);
    }

    fn next(&mut self) {
        self.cursor += 1;
    }

    fn done(&self) -> bool {
        self.cursor >= self.budget
    }

    fn budget(&self) -> usize {
        self.budget
    }

    fn history(&self) -> &History {
        &self.history
    }
}
