//! Example: decode the classic healthy/fever model in both arithmetics.
//!
//! Run with:
//! `cargo run --example weather`

use hmm_viterbi::{inspect::TrellisTable, DecodeError, Decoder, Identified, Model};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Condition {
    Healthy,
    Fever,
}

impl Identified for Condition {
    fn id(&self) -> u64 {
        *self as u64
    }
}

#[derive(Debug, Clone, Copy)]
enum Symptom {
    Normal,
    Cold,
    Dizzy,
}

impl Identified for Symptom {
    fn id(&self) -> u64 {
        *self as u64
    }
}

fn build(map: impl Fn(f64) -> f64) -> Model<Condition, Symptom> {
    use Condition::*;
    use Symptom::*;

    let mut model = Model::new();
    model.add_state(Healthy);
    model.add_state(Fever);
    for obs in [Normal, Cold, Dizzy] {
        model.add_observation(obs);
    }

    model.put_start_probability(&Healthy, map(0.6));
    model.put_start_probability(&Fever, map(0.4));

    model.put_transition_probability(&Healthy, &Healthy, map(0.7));
    model.put_transition_probability(&Healthy, &Fever, map(0.3));
    model.put_transition_probability(&Fever, &Healthy, map(0.4));
    model.put_transition_probability(&Fever, &Fever, map(0.6));

    for (obs, p) in [(Normal, 0.5), (Cold, 0.4), (Dizzy, 0.1)] {
        model.put_emission_probability(&Healthy, &obs, map(p));
    }
    for (obs, p) in [(Normal, 0.1), (Cold, 0.3), (Dizzy, 0.6)] {
        model.put_emission_probability(&Fever, &obs, map(p));
    }
    model
}

fn main() -> Result<(), DecodeError> {
    let decoder = Decoder::builder().retain_trellis(true).build();

    let linear = build(|p| p);
    let best = decoder.eval_path(&linear)?;
    println!("Linear probability: {}", best.probability);
    println!("Path: {:?}", best.path);
    if let Some(trellis) = best.trellis() {
        println!("{}", TrellisTable::new(&linear, trellis).with_precision(5));
    }

    let log = build(f64::ln);
    let best = decoder.eval_path_log_probabilities(&log)?;
    println!(
        "Log probability: {:.6} (exp = {:.5})",
        best.probability,
        best.probability.exp()
    );
    println!("Path: {:?}", best.path);

    // A forbidden transition everywhere leaves nothing reachable after t = 0.
    let mut broken = build(|p| p);
    for from in [Condition::Healthy, Condition::Fever] {
        for to in [Condition::Healthy, Condition::Fever] {
            broken.put_transition_probability(&from, &to, 0.0);
        }
    }
    match decoder.eval_path(&broken) {
        Ok(best) => println!("Unexpected path: {:?}", best.path),
        Err(err) => println!("Broken model: {err}"),
    }
    Ok(())
}
