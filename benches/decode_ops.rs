use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hmm_viterbi::{score_path, Decoder, DecoderBuilder, Linear, LogSpace, Model};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Fully connected model of `n_states` with `steps` observations over 8 symbols.
fn dense_model(rng: &mut StdRng, n_states: u64, steps: usize, log: bool) -> Model<u64, u64> {
    let mut m = Model::new();
    let p = |rng: &mut StdRng| {
        let v: f64 = rng.gen_range(0.05..1.0);
        if log {
            v.ln()
        } else {
            v
        }
    };
    for s in 0..n_states {
        m.add_state(s);
    }
    for s in 0..n_states {
        let v = p(rng);
        m.put_start_probability(&s, v);
        for to in 0..n_states {
            let v = p(rng);
            m.put_transition_probability(&s, &to, v);
        }
        for sym in 0..8u64 {
            let v = p(rng);
            m.put_emission_probability(&s, &sym, v);
        }
    }
    for _ in 0..steps {
        m.add_observation(rng.gen_range(0..8u64));
    }
    m
}

fn bench_state_width(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5155AA55);
    let mut group = c.benchmark_group("decode_state_width");
    for &n in &[4u64, 16, 64] {
        let model = dense_model(&mut rng, n, 256, true);
        group.bench_with_input(BenchmarkId::new("serial", n), &model, |b, model| {
            b.iter(|| black_box(Decoder::new().eval_path_log_probabilities(model)));
        });
        let parallel = DecoderBuilder::new().parallel(true).build();
        group.bench_with_input(BenchmarkId::new("parallel", n), &model, |b, model| {
            b.iter(|| black_box(parallel.eval_path_log_probabilities(model)));
        });
    }
    group.finish();
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let linear = dense_model(&mut rng, 16, 64, false);
    let log = dense_model(&mut rng, 16, 64, true);

    let mut group = c.benchmark_group("decode_arithmetic");
    group.bench_function("linear", |b| {
        b.iter(|| black_box(Decoder::new().eval_path(black_box(&linear))));
    });
    group.bench_function("log", |b| {
        b.iter(|| black_box(Decoder::new().eval_path_log_probabilities(black_box(&log))));
    });
    group.finish();

    let path = Decoder::new()
        .eval_path_log_probabilities(&log)
        .map(|best| best.path)
        .unwrap_or_default();
    let linear_path = Decoder::new()
        .eval_path(&linear)
        .map(|best| best.path)
        .unwrap_or_default();
    let mut group = c.benchmark_group("score_path");
    group.bench_function("log", |b| {
        b.iter(|| black_box(score_path::<LogSpace, _, _>(&log, black_box(&path))));
    });
    group.bench_function("linear", |b| {
        b.iter(|| black_box(score_path::<Linear, _, _>(&linear, black_box(&linear_path))));
    });
    group.finish();
}

criterion_group!(benches, bench_state_width, bench_arithmetic);
criterion_main!(benches);
