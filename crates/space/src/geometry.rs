//! Thread-geometry model: deriving work dimensions from a configuration.

use crate::error::TuneError;
use crate::params::ParameterRegistry;
use crate::space::Configuration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierTarget {
    Global,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierOp {
    Multiply,
    Divide,
}

/// Directive scaling one axis of the global or local work size by the
/// current value of a named parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadModifier {
    pub target: ModifierTarget,
    /// Axis index, 0..=2.
    pub axis: usize,
    pub parameter: String,
    pub op: ModifierOp,
}

/// Effective work dimensions after applying all modifiers.
///
/// Dimensions are padded to three axes with 1s, the usual device convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDims {
    pub global: [usize; 3],
    pub local: [usize; 3],
}

impl WorkDims {
    /// True when every local axis is non-zero and divides its global axis.
    pub fn aligned(&self) -> bool {
        self.global
            .iter()
            .zip(self.local.iter())
            .all(|(&g, &l)| l > 0 && g % l == 0)
    }
}

/// Base global/local work sizes plus the modifier list.
///
/// Modifiers are applied in declaration order on top of the base geometry.
/// Whether the result is actually runnable on the device is decided by the
/// driver, not here.
#[derive(Debug, Clone)]
pub struct ThreadGeometry {
    base_global: [usize; 3],
    base_local: [usize; 3],
    modifiers: Vec<ThreadModifier>,
}

impl Default for ThreadGeometry {
    fn default() -> Self {
        Self::new(&[1], &[1])
    }
}

fn pad_dims(dims: &[usize]) -> [usize; 3] {
    let mut padded = [1usize; 3];
    for (axis, &d) in dims.iter().take(3).enumerate() {
        padded[axis] = d;
    }
    padded
}

impl ThreadGeometry {
    pub fn new(global: &[usize], local: &[usize]) -> Self {
        Self {
            base_global: pad_dims(global),
            base_local: pad_dims(local),
            modifiers: Vec::new(),
        }
    }

    pub fn set_global_size(&mut self, dims: &[usize]) {
        self.base_global = pad_dims(dims);
    }

    pub fn set_local_size(&mut self, dims: &[usize]) {
        self.base_local = pad_dims(dims);
    }

    /// Add a modifier. The named parameter must already be registered.
    pub fn add_modifier(
        &mut self,
        registry: &ParameterRegistry,
        modifier: ThreadModifier,
    ) -> Result<(), TuneError> {
        if !registry.contains(&modifier.parameter) {
            return Err(TuneError::UnknownParameter {
                name: modifier.parameter,
            });
        }
        self.modifiers.push(modifier);
        Ok(())
    }

    pub fn modifiers(&self) -> &[ThreadModifier] {
        &self.modifiers
    }

    /// Compute the effective work dimensions for a configuration.
    pub fn apply(&self, config: &Configuration) -> WorkDims {
        let mut dims = WorkDims {
            global: self.base_global,
            local: self.base_local,
        };
        for modifier in &self.modifiers {
            let Some(value) = config.value(&modifier.parameter) else {
                continue;
            };
            let axis = modifier.axis.min(2);
            let target = match modifier.target {
                ModifierTarget::Global => &mut dims.global[axis],
                ModifierTarget::Local => &mut dims.local[axis],
            };
            match modifier.op {
                ModifierOp::Multiply => *target *= value,
                // Zero-valued parameters leave the axis untouched.
                ModifierOp::Divide => *target /= value.max(1),
            }
        }
        dims
    }
}
