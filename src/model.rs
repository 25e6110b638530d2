//! The HMM being decoded: states, the observation sequence and three sparse
//! probability tables.
//!
//! States and observations live in dense vectors in registration order. The
//! tables are keyed by identities only, so a probability can be registered
//! before or after the values it refers to.
//!
//! Every setter is last-write-wins:
//! - re-adding a state whose identity is already registered replaces the
//!   stored value in place; the state keeps its original position in the
//!   registration order (and therefore in tie-breaks);
//! - putting a probability for an existing key overwrites it.
//!
//! Observations are a sequence, not a set. Adding the same observation twice
//! adds two time steps.

use std::collections::HashMap;

use crate::traits::Identified;

/// States, observations and probability tables of one HMM.
#[derive(Debug, Clone)]
pub struct Model<S, O> {
    states: Vec<S>,
    /// identity -> position in `states`
    state_index: HashMap<u64, usize>,
    observations: Vec<O>,
    start: HashMap<u64, f64>,
    /// (state, observation) -> p
    emission: HashMap<(u64, u64), f64>,
    /// (from, to) -> p
    transition: HashMap<(u64, u64), f64>,
}

impl<S, O> Default for Model<S, O> {
    fn default() -> Self {
        Self {
            states: Vec::new(),
            state_index: HashMap::new(),
            observations: Vec::new(),
            start: HashMap::new(),
            emission: HashMap::new(),
            transition: HashMap::new(),
        }
    }
}

impl<S: Identified, O: Identified> Model<S, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state. Returns its registration index.
    pub fn add_state(&mut self, state: S) -> usize {
        let id = state.id();
        match self.state_index.get(&id) {
            Some(&idx) => {
                self.states[idx] = state;
                idx
            }
            None => {
                let idx = self.states.len();
                self.states.push(state);
                self.state_index.insert(id, idx);
                idx
            }
        }
    }

    /// Append an observation as the next time step. Returns its step index.
    pub fn add_observation(&mut self, observation: O) -> usize {
        self.observations.push(observation);
        self.observations.len() - 1
    }

    pub fn put_start_probability(&mut self, state: &S, p: f64) {
        self.start.insert(state.id(), p);
    }

    pub fn put_emission_probability(&mut self, state: &S, observation: &O, p: f64) {
        self.emission.insert((state.id(), observation.id()), p);
    }

    pub fn put_transition_probability(&mut self, from: &S, to: &S, p: f64) {
        self.transition.insert((from.id(), to.id()), p);
    }

    /// Registration index of the state with identity `id`.
    pub fn state_index(&self, id: u64) -> Option<usize> {
        self.state_index.get(&id).copied()
    }
}

impl<S, O> Model<S, O> {
    /// States in registration order.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// Observation sequence; index is the time step.
    pub fn observations(&self) -> &[O] {
        &self.observations
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    // Lookups by identity.

    pub fn start_probability(&self, state: u64) -> Option<f64> {
        self.tables().start(state)
    }

    pub fn emission_probability(&self, state: u64, observation: u64) -> Option<f64> {
        self.tables().emission(state, observation)
    }

    pub fn transition_probability(&self, from: u64, to: u64) -> Option<f64> {
        self.tables().transition(from, to)
    }

    pub(crate) fn tables(&self) -> Tables<'_> {
        Tables {
            start: &self.start,
            emission: &self.emission,
            transition: &self.transition,
        }
    }
}

/// Borrowed view of the probability tables, independent of the caller's
/// state and observation types.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tables<'m> {
    start: &'m HashMap<u64, f64>,
    emission: &'m HashMap<(u64, u64), f64>,
    transition: &'m HashMap<(u64, u64), f64>,
}

impl<'m> Tables<'m> {
    #[inline]
    pub(crate) fn start(&self, state: u64) -> Option<f64> {
        self.start.get(&state).copied()
    }

    #[inline]
    pub(crate) fn emission(&self, state: u64, observation: u64) -> Option<f64> {
        self.emission.get(&(state, observation)).copied()
    }

    #[inline]
    pub(crate) fn transition(&self, from: u64, to: u64) -> Option<f64> {
        self.transition.get(&(from, to)).copied()
    }
}
