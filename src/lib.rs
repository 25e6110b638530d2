//! Viterbi decoding for hidden Markov models.
//!
//! This crate recovers the most probable sequence of hidden states behind an
//! observed sequence, given fixed start, transition and emission tables.
//!
//! ## Core idea
//! 1. Register states, observations and probabilities on a [`Model`].
//!    Every table is sparse: an absent entry means "impossible".
//! 2. Run [`eval_path`] (probabilities in `[0, 1]`, combined by product) or
//!    [`eval_path_log_probabilities`] (log-probabilities `<= 0`, combined by
//!    sum) to fill a [`Trellis`] left to right.
//! 3. The decoder backtracks from the best terminal state and returns a
//!    [`ViterbiPath`]: the joint probability and one state per observation.
//!
//! States and observations are caller types implementing [`Identified`]; the
//! integer identity is the only thing used as a table key.
//!
//! ## Quick start
//! ```
//! use hmm_viterbi::{eval_path, Model};
//!
//! // states and observations identified by plain integers
//! let mut model: Model<u64, u64> = Model::new();
//! model.add_state(1); // healthy
//! model.add_state(2); // fever
//! for obs in [10, 20, 30] {
//!     model.add_observation(obs); // normal, cold, dizzy
//! }
//! model.put_start_probability(&1, 0.6);
//! model.put_start_probability(&2, 0.4);
//! for (state, probs) in [(1, [0.5, 0.4, 0.1]), (2, [0.1, 0.3, 0.6])] {
//!     for (obs, p) in [10, 20, 30].iter().zip(probs) {
//!         model.put_emission_probability(&state, obs, p);
//!     }
//! }
//! model.put_transition_probability(&1, &1, 0.7);
//! model.put_transition_probability(&1, &2, 0.3);
//! model.put_transition_probability(&2, &1, 0.4);
//! model.put_transition_probability(&2, &2, 0.6);
//!
//! let best = eval_path(&model).unwrap();
//! assert_eq!(best.path, vec![1, 1, 2]);
//! assert_eq!(best.probability, 0.01512);
//! ```
//!
//! ## Cargo features
//! - `parallel`: spread the per-state work of each time step over the rayon
//!   pool when [`DecoderBuilder::parallel`] is set.
//! - `tracing`: emit spans and events through the `tracing` crate.

pub mod builder;
pub mod decoder;
pub mod error;
pub mod inspect;
pub mod model;
pub mod space;
pub mod traits;
pub mod trellis;

pub use crate::builder::{DecoderBuilder, DecoderConfig};
pub use crate::decoder::{
    eval_path, eval_path_log_probabilities, score_path, Decoder, ViterbiPath,
};
pub use crate::error::{DecodeError, ProbabilityEntry, Result};
pub use crate::model::Model;
pub use crate::space::{Linear, LogSpace, ProbabilitySpace};
pub use crate::traits::Identified;
pub use crate::trellis::Trellis;
