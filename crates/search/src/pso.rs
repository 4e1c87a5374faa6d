//! Particle-swarm search over per-parameter positions.
//!
//! Each particle is a point in position space (one index per parameter's
//! value list) with a real-valued velocity. Particles are emitted
//! round-robin; after every report the evaluated particle moves under the
//! usual inertia/cognitive/social update, with positions rounded and
//! clamped back onto the grid. Particles that land outside the feasible
//! space are resampled uniformly with their velocity reset.

use crate::cost::{Cost, History};
use crate::searcher::{fraction_budget, Searcher};
use gridtune_space::{Configuration, Space};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

#[derive(Debug)]
struct Particle {
    position: Vec<usize>,
    velocity: Vec<f64>,
    best_position: Vec<usize>,
    best_energy: f64,
}

#[derive(Debug)]
pub struct PsoSearcher {
    space: Arc<Space>,
    rng: StdRng,
    budget: usize,
    inertia: f64,
    cognitive: f64,
    social: f64,
    particles: Vec<Particle>,
    /// Round-robin pointer to the particle being evaluated.
    active: usize,
    global_best_position: Vec<usize>,
    global_best_energy: f64,
    // Value-list length per parameter, for clamping.
    dim_sizes: Vec<usize>,
    emitted: usize,
    finished: bool,
    history: History,
}

impl PsoSearcher {
    pub fn new(
        space: Arc<Space>,
        fraction: f64,
        swarms: usize,
        w: f64,
        c1: f64,
        c2: f64,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let budget = fraction_budget(fraction, space.len());
        let dims = space.params().len();
        let dim_sizes: Vec<usize> = space
            .params()
            .parameters()
            .iter()
            .map(|p| p.values().len())
            .collect();

        let particles: Vec<Particle> = (0..swarms)
            .map(|_| {
                let index = rng.gen_range(0..space.len());
                let position = space.decode(index).to_vec();
                Particle {
                    best_position: position.clone(),
                    position,
                    velocity: vec![0.0; dims],
                    best_energy: f64::INFINITY,
                }
            })
            .collect();
        let global_best_position = particles[0].position.clone();

        Self {
            space,
            rng,
            budget,
            inertia: w,
            cognitive: c1,
            social: c2,
            particles,
            active: 0,
            global_best_position,
            global_best_energy: f64::INFINITY,
            dim_sizes,
            emitted: 1,
            finished: false,
            history: History::new(),
        }
    }

    /// Move the just-evaluated particle; resample it if it leaves the
    /// feasible space.
    fn advance_particle(&mut self) {
        let global_best = self.global_best_position.clone();
        let particle = &mut self.particles[self.active];

        for dim in 0..particle.position.len() {
            let r1 = self.rng.gen::<f64>();
            let r2 = self.rng.gen::<f64>();
            let x = particle.position[dim] as f64;
            particle.velocity[dim] = self.inertia * particle.velocity[dim]
                + self.cognitive * r1 * (particle.best_position[dim] as f64 - x)
                + self.social * r2 * (global_best[dim] as f64 - x);
            let moved = (x + particle.velocity[dim]).round();
            let max = (self.dim_sizes[dim] - 1) as f64;
            particle.position[dim] = moved.clamp(0.0, max) as usize;
        }

        if self.space.index_of_positions(&particle.position).is_none() {
            let index = self.rng.gen_range(0..self.space.len());
            particle.position = self.space.decode(index).to_vec();
            particle.velocity.iter_mut().for_each(|v| *v = 0.0);
        }
    }
}

impl Searcher for PsoSearcher {
    fn index(&self) -> usize {
        self.space
            .index_of_positions(&self.particles[self.active].position)
            .expect("particle position outside the feasible space")
    }

    fn configuration(&self) -> &Configuration {
        self.space.configuration(self.index())
    }

    fn report(&mut self, cost: Cost) {
        let index = self.index();
        self.history.record(index, cost);

        let energy = cost.energy();
        let particle = &mut self.particles[self.active];
        if energy < particle.best_energy {
            particle.best_energy = energy;
            particle.best_position = particle.position.clone();
        }
        if energy < self.global_best_energy {
            self.global_best_energy = energy;
            self.global_best_position = particle.position.clone();
        }
    }

    fn next(&mut self) {
        if self.finished {
            return;
        }
        if self.emitted >= self.budget {
            self.finished = true;
            return;
        }
        self.advance_particle();
        self.active = (self.active + 1) % self.particles.len();
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
