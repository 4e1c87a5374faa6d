//! Exhaustive walk over the whole space.

use crate::cost::{Cost, History};
use crate::searcher::Searcher;
use gridtune_space::{Configuration, Space};
use std::sync::Arc;

/// Emits indices 0..N-1 in enumeration order.
#[derive(Debug)]
pub struct FullSearcher {
    space: Arc<Space>,
    cursor: usize,
    history: History,
}

impl FullSearcher {
    pub fn new(space: Arc<Space>) -> Self {
        Self {
            space,
            cursor: 0,
            history: History::new(),
        }
    }
}

impl Searcher for FullSearcher {
    fn index(&self) -> usize {
        self.cursor
    }

    fn configuration(&self) -> &Configuration {
        self.space.configuration(self.cursor)
    }

    fn report(&mut self, cost: Cost) {
        self.history.record(self.cursor, cost);
    }

    fn next(&mut self) {
        self.cursor += 1;
    }

    fn done(&self) -> bool {
        self.cursor >= self.space.len()
    }

    fn budget(&self) -> usize {
        self.space.len()
    }

    fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridtune_space::{ConstraintSet, ParameterRegistry};

    #[test]
    fn test_full_searcher_emits_each_index_once_in_order() {
        let mut registry = ParameterRegistry::new();
        registry.add("TS", vec![8, 16, 32]).unwrap();
        registry.add("WPT", vec![1, 2]).unwrap();
        let space = Arc::new(Space::build(Arc::new(registry), &ConstraintSet::new()).unwrap());

        let mut searcher = FullSearcher::new(Arc::clone(&space));
        assert_eq!(searcher.budget(), 6);

        let mut emitted = Vec::new();
        while !searcher.done() {
            emitted.push(searcher.index());
            searcher.report(Cost::Seconds(1.0));
            searcher.next();
        }
        assert_eq!(emitted, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(searcher.history().len(), 6);
    }
}
