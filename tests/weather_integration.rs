use hmm_viterbi::{
    eval_path, eval_path_log_probabilities, score_path, DecodeError, Decoder, Identified,
    Linear, LogSpace, Model, ProbabilityEntry,
};

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    name: &'static str,
    id: u64,
}

impl Identified for Condition {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Symptom {
    name: &'static str,
    id: u64,
}

impl Identified for Symptom {
    fn id(&self) -> u64 {
        self.id
    }
}

const HEALTHY: Condition = Condition {
    name: "Healthy",
    id: 1,
};
const FEVER: Condition = Condition { name: "Fever", id: 2 };

fn symptoms() -> [Symptom; 3] {
    [
        Symptom {
            name: "normal",
            id: 1,
        },
        Symptom { name: "cold", id: 2 },
        Symptom { name: "dizzy", id: 3 },
    ]
}

fn weather_model(map: impl Fn(f64) -> f64) -> Model<Condition, Symptom> {
    let obs = symptoms();
    let mut m = Model::new();
    m.add_state(HEALTHY);
    m.add_state(FEVER);
    for o in &obs {
        m.add_observation(o.clone());
    }

    m.put_start_probability(&HEALTHY, map(0.6));
    m.put_start_probability(&FEVER, map(0.4));

    for (o, p) in obs.iter().zip([0.5, 0.4, 0.1]) {
        m.put_emission_probability(&HEALTHY, o, map(p));
    }
    for (o, p) in obs.iter().zip([0.1, 0.3, 0.6]) {
        m.put_emission_probability(&FEVER, o, map(p));
    }

    m.put_transition_probability(&HEALTHY, &HEALTHY, map(0.7));
    m.put_transition_probability(&HEALTHY, &FEVER, map(0.3));
    m.put_transition_probability(&FEVER, &HEALTHY, map(0.4));
    m.put_transition_probability(&FEVER, &FEVER, map(0.6));
    m
}

#[test]
fn weather_linear() {
    let m = weather_model(|p| p);
    let best = eval_path(&m).unwrap();
    assert_eq!(best.len(), 3);
    assert_eq!(best.probability, 0.01512);
    assert_eq!(best.path, vec![HEALTHY, HEALTHY, FEVER]);
    assert_eq!(best.path[2].name, "Fever");
    assert_eq!(m.observations()[2].name, "dizzy");
}

#[test]
fn weather_log_agrees_with_linear() {
    let m = weather_model(f64::ln);
    let best = eval_path_log_probabilities(&m).unwrap();
    assert_eq!(best.path, vec![HEALTHY, HEALTHY, FEVER]);
    assert!((best.probability.exp() - 0.01512).abs() < 1e-12);
}

#[test]
fn probability_matches_recomputed_chain() {
    let m = weather_model(|p| p);
    let best = eval_path(&m).unwrap();
    let by_hand = 0.6 * 0.5 * 0.7 * 0.4 * 0.3 * 0.6;
    assert!((best.probability - by_hand).abs() < 1e-15);
    assert_eq!(
        score_path::<Linear, _, _>(&m, &best.path).unwrap(),
        best.probability
    );

    let m = weather_model(f64::ln);
    let best = eval_path_log_probabilities(&m).unwrap();
    assert_eq!(
        score_path::<LogSpace, _, _>(&m, &best.path).unwrap(),
        best.probability
    );
}

#[test]
fn repeated_decodes_are_identical() {
    let m = weather_model(|p| p);
    let first = eval_path(&m).unwrap();
    for _ in 0..5 {
        let again = eval_path(&m).unwrap();
        assert_eq!(again.probability.to_bits(), first.probability.to_bits());
        assert_eq!(again.path, first.path);
    }
}

#[test]
fn concurrent_decodes_share_one_model() {
    let m = weather_model(|p| p);
    let expected = eval_path(&m).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| eval_path(&m).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn retained_trellis_has_one_layer_per_observation() {
    let m = weather_model(|p| p);
    let best = Decoder::builder()
        .retain_trellis(true)
        .build()
        .eval_path(&m)
        .unwrap();
    let trellis = best.trellis().unwrap();
    assert_eq!(trellis.len(), 3);
    let first = trellis.layer(0).unwrap();
    assert_eq!(first.get(0).map(|c| c.score), Some(0.6 * 0.5));
    assert_eq!(first.get(1).map(|c| c.score), Some(0.4 * 0.1));
}

/// Road-point chain with a branching middle section; only the states named
/// below carry probabilities and most pairs are forbidden.
#[test]
fn sparse_chain() {
    let names = [
        "0", "1", "3", "4", "6", "7", "9", "12", "13", "14", "15", "16", "18", "19", "20",
    ];
    let id = |name: &str| names.iter().position(|n| *n == name).unwrap() as u64;

    let mut m: Model<u64, u64> = Model::new();
    for name in names {
        m.add_state(id(name));
    }
    for p in 0..6u64 {
        m.add_observation(p);
    }

    m.put_start_probability(&id("0"), 0.498948);
    m.put_start_probability(&id("1"), 0.501052);

    let emissions = [
        ("13", 4, 0.200848),
        ("14", 4, 0.201200),
        ("15", 4, 0.196290),
        ("16", 4, 0.198854),
        ("18", 5, 0.332632),
        ("19", 5, 0.271434),
        ("20", 5, 0.395933),
        ("0", 0, 0.498948),
        ("1", 0, 0.501052),
        ("3", 1, 0.502071),
        ("4", 1, 0.497929),
        ("6", 2, 0.516182),
        ("7", 2, 0.483818),
        ("9", 3, 1.0),
        ("12", 4, 0.202807),
    ];
    for (state, obs, p) in emissions {
        m.put_emission_probability(&id(state), &obs, p);
    }

    let transitions = [
        ("0", "3", 0.680289),
        ("0", "4", 0.319711),
        ("1", "3", 0.319711),
        ("1", "4", 0.680289),
        ("3", "6", 0.934306),
        ("3", "7", 0.065694),
        ("4", "6", 0.882777),
        ("4", "7", 0.117223),
        ("7", "9", 1.0),
        ("6", "9", 1.0),
        ("14", "19", 0.000101),
        ("14", "20", 0.999722),
        ("15", "18", 0.000177),
        ("15", "19", 0.000101),
        ("15", "20", 0.999722),
        ("9", "13", 0.309430),
        ("9", "15", 0.381140),
        ("9", "16", 0.309430),
        ("12", "18", 0.000177),
        ("12", "19", 0.000101),
        ("12", "20", 0.999722),
        ("13", "20", 0.999722),
        ("14", "18", 0.000177),
        ("16", "18", 0.000177),
        ("16", "19", 0.000101),
        ("16", "20", 0.999722),
        ("13", "18", 0.000177),
        ("13", "19", 0.000101),
    ];
    for (from, to, p) in transitions {
        m.put_transition_probability(&id(from), &id(to), p);
    }

    let best = eval_path(&m).unwrap();
    let expected: Vec<u64> = ["0", "3", "6", "9", "15", "20"]
        .iter()
        .map(|&n| id(n))
        .collect();
    assert_eq!(best.path, expected);
    assert_eq!(best.probability, 0.0012143525979397374);
}

fn map_matching_model(positive_gain: bool) -> (Model<u64, u64>, Vec<u64>) {
    // rp11 rp12 | rp21 rp22 | rp31 rp32 rp33 | rp41 rp42
    let rp: Vec<u64> = (1..=9).collect();
    let mut m = Model::new();
    for &s in &rp {
        m.add_state(s);
    }
    for gps in 1..=4u64 {
        m.add_observation(gps);
    }
    let near = -5.341012069517231;
    let mid = -29.488456364381666;
    let far = -77.78334495411055;
    let gain = if positive_gain {
        4.646573599499615
    } else {
        -4.646573599499615
    };

    m.put_start_probability(&rp[0], near);
    m.put_start_probability(&rp[1], far);

    for (state, gps, p) in [
        (0, 1, near),
        (1, 1, far),
        (2, 2, near),
        (3, 2, mid),
        (4, 3, near),
        (5, 3, near),
        (6, 3, mid),
        (7, 4, near),
        (8, 4, far),
    ] {
        m.put_emission_probability(&rp[state], &gps, p);
    }

    for (from, to, p) in [
        (0, 2, -1283.6730720901721),
        (0, 3, -9129.758656211383),
        (1, 2, -9129.758656211383),
        (1, 3, -1283.6730720901721),
        (2, 4, gain),
        (2, 5, -2079.898401500611),
        (2, 6, -6248.988351700831),
        (3, 4, -6248.988351700831),
        (3, 5, -4164.443376600721),
        (3, 6, gain),
        (4, 7, -626.5028606174612),
        (4, 8, -3533.29394238376),
        (5, 7, -626.5028606174612),
        (5, 8, -1448.74896728365),
        (6, 7, -3533.29394238376),
        (6, 8, -626.5028606174612),
    ] {
        m.put_transition_probability(&rp[from], &rp[to], p);
    }
    (m, rp)
}

#[test]
fn map_matching_log_scores() {
    let (m, rp) = map_matching_model(false);
    let best = eval_path_log_probabilities(&m).unwrap();
    assert_eq!(best.path, vec![rp[0], rp[2], rp[4], rp[7]]);
    assert_eq!(best.probability, -1941.5275666547193);
    assert_eq!(
        score_path::<LogSpace, _, _>(&m, &best.path).unwrap(),
        best.probability
    );
}

#[test]
fn map_matching_rejects_positive_log_values() {
    let (m, rp) = map_matching_model(true);
    assert_eq!(
        eval_path_log_probabilities(&m),
        Err(DecodeError::InvalidProbability {
            entry: ProbabilityEntry::Transition {
                from: rp[2],
                to: rp[4],
            },
            value: 4.646573599499615,
            space: "log",
        })
    );
}
