//! Enumeration of the feasible configuration space.

use crate::constraints::ConstraintSet;
use crate::error::TuneError;
use crate::params::ParameterRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// One concrete choice of a value for every registered parameter.
///
/// Stored as per-parameter positions (indices into each parameter's value
/// list) aligned with declaration order. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    params: Arc<ParameterRegistry>,
    positions: Vec<usize>,
}

impl Configuration {
    fn new(params: Arc<ParameterRegistry>, positions: Vec<usize>) -> Self {
        Self { params, positions }
    }

    /// Value of the named parameter, if registered.
    pub fn value(&self, name: &str) -> Option<usize> {
        let dim = self.params.index_of(name)?;
        Some(self.params.parameters()[dim].values()[self.positions[dim]])
    }

    /// Values in declaration order.
    pub fn values(&self) -> Vec<usize> {
        self.params
            .parameters()
            .iter()
            .zip(self.positions.iter())
            .map(|(p, &pos)| p.values()[pos])
            .collect()
    }

    /// `(name, value)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(String, usize)> {
        self.params
            .parameters()
            .iter()
            .zip(self.positions.iter())
            .map(|(p, &pos)| (p.name().to_string(), p.values()[pos]))
            .collect()
    }

    /// Per-parameter positions into each value list.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

/// The ordered sequence of feasible configurations.
///
/// Order is lexicographic over parameter declaration order (the last
/// declared parameter varies fastest) and deterministic for identical
/// inputs. Every entry satisfies all constraints; entries are distinct.
#[derive(Debug)]
pub struct Space {
    params: Arc<ParameterRegistry>,
    configs: Vec<Configuration>,
    // Position tuple -> configuration index, for feasibility lookups.
    membership: HashMap<Vec<usize>, usize>,
}

impl Space {
    /// Enumerate the Cartesian product of all parameters, filtered by the
    /// constraint set.
    pub fn build(
        params: Arc<ParameterRegistry>,
        constraints: &ConstraintSet,
    ) -> Result<Self, TuneError> {
        let dims: Vec<usize> = params
            .parameters()
            .iter()
            .map(|p| p.values().len())
            .collect();
        if params.is_empty() || dims.iter().any(|&d| d == 0) {
            return Err(TuneError::EmptySearchSpace);
        }

        let mut configs = Vec::new();
        let mut membership = HashMap::new();
        let mut positions = vec![0usize; dims.len()];

        loop {
            let values: Vec<usize> = params
                .parameters()
                .iter()
                .zip(positions.iter())
                .map(|(p, &pos)| p.values()[pos])
                .collect();
            if constraints.check(&values) && !membership.contains_key(&positions) {
                membership.insert(positions.clone(), configs.len());
                configs.push(Configuration::new(Arc::clone(&params), positions.clone()));
            }

            // Odometer increment, last dimension fastest.
            let mut axis = dims.len();
            loop {
                if axis == 0 {
                    break;
                }
                axis -= 1;
                positions[axis] += 1;
                if positions[axis] < dims[axis] {
                    break;
                }
                positions[axis] = 0;
            }
            if positions.iter().all(|&p| p == 0) {
                break;
            }
        }

        if configs.is_empty() {
            return Err(TuneError::EmptySearchSpace);
        }
        Ok(Self {
            params,
            configs,
            membership,
        })
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn params(&self) -> &Arc<ParameterRegistry> {
        &self.params
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configs
    }

    pub fn configuration(&self, index: usize) -> &Configuration {
        &self.configs[index]
    }

    /// Positions of the configuration at `index`.
    pub fn decode(&self, index: usize) -> &[usize] {
        self.configs[index].positions()
    }

    /// Index of the configuration with the given position tuple, if feasible.
    pub fn index_of_positions(&self, positions: &[usize]) -> Option<usize> {
        self.membership.get(positions).copied()
    }

    /// Indices of all configurations differing from `index` in exactly one
    /// parameter. Computed per query; the neighbour graph is never
    /// materialized.
    pub fn neighbours_of(&self, index: usize) -> Vec<usize> {
        let reference = self.configs[index].positions();
        let mut neighbours = Vec::new();
        let mut candidate = reference.to_vec();
        for (dim, param) in self.params.parameters().iter().enumerate() {
            for alt in 0..param.values().len() {
                if alt == reference[dim] {
                    continue;
                }
                candidate[dim] = alt;
                if let Some(&neighbour) = self.membership.get(&candidate) {
                    neighbours.push(neighbour);
                }
            }
            candidate[dim] = reference[dim];
        }
        neighbours
    }
}
