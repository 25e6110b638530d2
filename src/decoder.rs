//! Forward-max recurrence and backtracking.
//!
//! The decoder runs in two phases:
//! 1. A forward pass that fills a [`Trellis`] one time step at a time. Each
//!    state present at step `t` records its best chained score and the state
//!    at `t - 1` that produced it.
//! 2. A backward walk from the best state of the last layer that follows the
//!    recorded predecessors to step 0.
//!
//! Both phases iterate states in registration order, and a candidate only
//! replaces the current best when strictly greater, so the first maximum seen
//! wins every tie. The decoder never mutates the model; any number of decodes
//! may share one `&Model`.

use std::marker::PhantomData;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::builder::{DecoderBuilder, DecoderConfig};
use crate::error::{DecodeError, ProbabilityEntry, Result};
use crate::model::{Model, Tables};
use crate::space::{Linear, LogSpace, ProbabilitySpace};
use crate::traits::Identified;
use crate::trellis::{Cell, Layer, Trellis};

/// Most probable state sequence for a model's observations.
#[derive(Debug, Clone, PartialEq)]
pub struct ViterbiPath<S> {
    /// Joint probability of `path` and the observations, in the arithmetic
    /// the decode ran in.
    pub probability: f64,
    /// One state per observation, in time order.
    pub path: Vec<S>,
    /// The filled trellis, when the decoder was configured to keep it.
    pub trellis: Option<Trellis>,
}

impl<S> ViterbiPath<S> {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn trellis(&self) -> Option<&Trellis> {
        self.trellis.as_ref()
    }
}

/// Viterbi decoder over a populated [`Model`].
///
/// ```
/// use hmm_viterbi::{Decoder, Model};
///
/// let mut model: Model<u64, u64> = Model::new();
/// model.add_state(0);
/// model.add_observation(0);
/// model.put_start_probability(&0, 0.0);
/// model.put_emission_probability(&0, &0, -0.5);
///
/// let decoder = Decoder::builder().retain_trellis(true).build();
/// let best = decoder.eval_path_log_probabilities(&model).unwrap();
/// assert_eq!(best.probability, -0.5);
/// assert_eq!(best.trellis().map(|t| t.len()), Some(1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::new()
    }

    pub fn config(&self) -> DecoderConfig {
        self.config
    }

    /// Decode with probabilities in `[0, 1]`, chained by product.
    pub fn eval_path<S, O>(&self, model: &Model<S, O>) -> Result<ViterbiPath<S>>
    where
        S: Identified + Clone,
        O: Identified,
    {
        self.decode::<Linear, S, O>(model)
    }

    /// Decode with log-probabilities `<= 0`, chained by sum.
    pub fn eval_path_log_probabilities<S, O>(&self, model: &Model<S, O>) -> Result<ViterbiPath<S>>
    where
        S: Identified + Clone,
        O: Identified,
    {
        self.decode::<LogSpace, S, O>(model)
    }

    /// Decode in the arithmetic `P`.
    ///
    /// # Errors
    /// See [`DecodeError`]. No partial path is ever returned.
    pub fn decode<P, S, O>(&self, model: &Model<S, O>) -> Result<ViterbiPath<S>>
    where
        P: ProbabilitySpace,
        S: Identified + Clone,
        O: Identified,
    {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "viterbi_decode",
            space = P::NAME,
            states = model.num_states(),
            steps = model.num_observations()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        if model.num_observations() == 0 {
            return Err(DecodeError::NoObservations);
        }
        if model.num_states() == 0 {
            return Err(DecodeError::NoStates);
        }

        let forward = Forward::<P>::new(model);
        let steps = forward.obs_ids.len();
        let mut trellis = Trellis::with_capacity(steps);

        let first = forward.init_layer()?;
        #[cfg(feature = "tracing")]
        tracing::trace!(step = 0, reachable = first.len(), "initial layer");
        trellis.push(first);

        for t in 1..steps {
            let layer = self.step_layer(&forward, &trellis.layers()[t - 1], t)?;
            #[cfg(feature = "tracing")]
            tracing::trace!(step = t, reachable = layer.len(), "layer filled");
            if layer.is_empty() {
                #[cfg(feature = "tracing")]
                tracing::debug!(step = t, "no state reachable");
                return Err(if t == steps - 1 {
                    DecodeError::NoValidPath
                } else {
                    DecodeError::PathBroken { step: t }
                });
            }
            trellis.push(layer);
        }

        let terminal = trellis
            .last()
            .and_then(Layer::best)
            .copied()
            .ok_or(DecodeError::NoValidPath)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            state = forward.state_ids[terminal.state],
            score = terminal.score,
            "terminal state selected"
        );

        let indices = trellis.backtrack(terminal.state).map_err(|gap| {
            #[cfg(feature = "tracing")]
            tracing::error!(step = gap.step, state = gap.state, "backtrack lost its predecessor");
            DecodeError::BrokenBacktrack {
                step: gap.step,
                state: forward.state_ids.get(gap.state).copied().unwrap_or(gap.state as u64),
            }
        })?;

        let states = model.states();
        Ok(ViterbiPath {
            probability: terminal.score,
            path: indices.into_iter().map(|i| states[i].clone()).collect(),
            trellis: self.config.retain_trellis.then_some(trellis),
        })
    }

    #[cfg(feature = "parallel")]
    fn step_layer<P: ProbabilitySpace>(
        &self,
        forward: &Forward<'_, P>,
        prev: &Layer,
        t: usize,
    ) -> Result<Layer> {
        if !self.config.parallel {
            return forward.step_layer(prev, t);
        }
        // Collect in registration order, then surface the first error in
        // that order so the outcome matches the serial pass.
        let cells: Vec<Result<Option<Cell>>> = (0..forward.state_ids.len())
            .into_par_iter()
            .map(|s| forward.step_cell(prev, t, s))
            .collect();
        let mut layer = Layer::with_capacity(prev.len());
        for cell in cells {
            if let Some(cell) = cell? {
                layer.push(cell);
            }
        }
        Ok(layer)
    }

    #[cfg(not(feature = "parallel"))]
    fn step_layer<P: ProbabilitySpace>(
        &self,
        forward: &Forward<'_, P>,
        prev: &Layer,
        t: usize,
    ) -> Result<Layer> {
        forward.step_layer(prev, t)
    }
}

/// Identities resolved once per decode, plus the model's tables.
struct Forward<'m, P> {
    tables: Tables<'m>,
    state_ids: Vec<u64>,
    obs_ids: Vec<u64>,
    _space: PhantomData<P>,
}

impl<'m, P: ProbabilitySpace> Forward<'m, P> {
    fn new<S: Identified, O: Identified>(model: &'m Model<S, O>) -> Self {
        Self {
            tables: model.tables(),
            state_ids: model.states().iter().map(Identified::id).collect(),
            obs_ids: model.observations().iter().map(Identified::id).collect(),
            _space: PhantomData,
        }
    }

    /// Step 0: start combined with the first emission.
    fn init_layer(&self) -> Result<Layer> {
        let o0 = self.obs_ids[0];
        let mut layer = Layer::with_capacity(self.state_ids.len());
        for (s, &sid) in self.state_ids.iter().enumerate() {
            let (Some(start), Some(emit)) = (self.tables.start(sid), self.tables.emission(sid, o0))
            else {
                continue;
            };
            let start = checked::<P>(ProbabilityEntry::Start { state: sid }, start)?;
            let emit = checked::<P>(
                ProbabilityEntry::Emission {
                    state: sid,
                    observation: o0,
                },
                emit,
            )?;
            let score = P::combine(start, emit);
            if P::is_unreachable(score) {
                continue;
            }
            layer.push(Cell {
                state: s,
                score,
                predecessor: None,
            });
        }
        if layer.is_empty() {
            return Err(DecodeError::NoValidInitStates);
        }
        Ok(layer)
    }

    fn step_layer(&self, prev: &Layer, t: usize) -> Result<Layer> {
        let mut layer = Layer::with_capacity(prev.len());
        for s in 0..self.state_ids.len() {
            if let Some(cell) = self.step_cell(prev, t, s)? {
                layer.push(cell);
            }
        }
        Ok(layer)
    }

    /// Best way into state `s` at step `t`, or `None` if `s` is unreachable.
    fn step_cell(&self, prev: &Layer, t: usize, s: usize) -> Result<Option<Cell>> {
        let sid = self.state_ids[s];
        let obs = self.obs_ids[t];
        let Some(emit) = self.tables.emission(sid, obs) else {
            return Ok(None);
        };
        let emit = checked::<P>(
            ProbabilityEntry::Emission {
                state: sid,
                observation: obs,
            },
            emit,
        )?;

        let mut best: Option<(f64, usize)> = None;
        for from in prev {
            let fid = self.state_ids[from.state];
            let Some(trans) = self.tables.transition(fid, sid) else {
                continue;
            };
            let trans = checked::<P>(ProbabilityEntry::Transition { from: fid, to: sid }, trans)?;
            let cand = P::combine(P::combine(from.score, trans), emit);
            if P::is_unreachable(cand) {
                continue;
            }
            if best.map_or(true, |(score, _)| cand > score) {
                best = Some((cand, from.state));
            }
        }

        Ok(best.map(|(score, predecessor)| Cell {
            state: s,
            score,
            predecessor: Some(predecessor),
        }))
    }
}

#[inline]
fn checked<P: ProbabilitySpace>(entry: ProbabilityEntry, value: f64) -> Result<f64> {
    if P::is_valid(value) {
        Ok(value)
    } else {
        Err(DecodeError::InvalidProbability {
            entry,
            value,
            space: P::NAME,
        })
    }
}

/// Decode `model` in linear arithmetic with a default [`Decoder`].
pub fn eval_path<S, O>(model: &Model<S, O>) -> Result<ViterbiPath<S>>
where
    S: Identified + Clone,
    O: Identified,
{
    Decoder::default().eval_path(model)
}

/// Decode `model` in log arithmetic with a default [`Decoder`].
pub fn eval_path_log_probabilities<S, O>(model: &Model<S, O>) -> Result<ViterbiPath<S>>
where
    S: Identified + Clone,
    O: Identified,
{
    Decoder::default().eval_path_log_probabilities(model)
}

/// Joint score of `path` against the model's observations in arithmetic `P`.
///
/// Factors are chained in the same order as the decoder, so scoring a decoded
/// path reproduces its probability bit for bit.
pub fn score_path<P, S, O>(model: &Model<S, O>, path: &[S]) -> Result<f64>
where
    P: ProbabilitySpace,
    S: Identified,
    O: Identified,
{
    let observations = model.observations();
    if observations.is_empty() {
        return Err(DecodeError::NoObservations);
    }
    if path.len() != observations.len() {
        return Err(DecodeError::PathLengthMismatch {
            expected: observations.len(),
            actual: path.len(),
        });
    }

    let tables = model.tables();
    let lookup = |entry: ProbabilityEntry, value: Option<f64>| -> Result<f64> {
        let value = value.ok_or(DecodeError::MissingProbability(entry))?;
        checked::<P>(entry, value)
    };

    let (s0, o0) = (path[0].id(), observations[0].id());
    let start = lookup(ProbabilityEntry::Start { state: s0 }, tables.start(s0))?;
    let emit = lookup(
        ProbabilityEntry::Emission {
            state: s0,
            observation: o0,
        },
        tables.emission(s0, o0),
    )?;
    let mut score = P::combine(start, emit);

    for (t, pair) in path.windows(2).enumerate() {
        let (from, to) = (pair[0].id(), pair[1].id());
        let obs = observations[t + 1].id();
        let trans = lookup(
            ProbabilityEntry::Transition { from, to },
            tables.transition(from, to),
        )?;
        let emit = lookup(
            ProbabilityEntry::Emission {
                state: to,
                observation: obs,
            },
            tables.emission(to, obs),
        )?;
        score = P::combine(P::combine(score, trans), emit);
    }
    Ok(score)
}
