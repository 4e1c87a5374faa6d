//! User-supplied feasibility predicates over parameter tuples.

use crate::error::TuneError;
use crate::params::ParameterRegistry;

/// Predicate over the values of a declared subset of parameters.
///
/// Evaluation receives the current values in the same order the parameter
/// names were declared with.
pub type ConstraintFn = Box<dyn Fn(&[usize]) -> bool + Send + Sync>;

struct Constraint {
    predicate: ConstraintFn,
    // Declaration indices of the parameters the predicate reads.
    param_indices: Vec<usize>,
}

/// Set of constraints resolved against a parameter registry.
#[derive(Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl std::fmt::Debug for ConstraintSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintSet")
            .field("len", &self.constraints.len())
            .finish()
    }
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint reading `parameters` in the given order.
    ///
    /// Unknown parameter names are rejected here, at add time, rather than
    /// during enumeration.
    pub fn add<F>(
        &mut self,
        registry: &ParameterRegistry,
        parameters: &[&str],
        predicate: F,
    ) -> Result<(), TuneError>
    where
        F: Fn(&[usize]) -> bool + Send + Sync + 'static,
    {
        let mut param_indices = Vec::with_capacity(parameters.len());
        for name in parameters {
            let index = registry
                .index_of(name)
                .ok_or_else(|| TuneError::UnknownParameter {
                    name: (*name).to_string(),
                })?;
            param_indices.push(index);
        }
        self.constraints.push(Constraint {
            predicate: Box::new(predicate),
            param_indices,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Evaluate all constraints against a candidate value tuple given in
    /// declaration order. Short-circuits on the first failing predicate.
    pub fn check(&self, values: &[usize]) -> bool {
        let mut scratch = Vec::new();
        for constraint in &self.constraints {
            scratch.clear();
            scratch.extend(constraint.param_indices.iter().map(|&i| values[i]));
            if !(constraint.predicate)(&scratch) {
                return false;
            }
        }
        true
    }
}
