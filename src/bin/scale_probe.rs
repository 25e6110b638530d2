use std::env;
use std::time::Instant;

use hmm_viterbi::{score_path, DecodeError, Decoder, LogSpace, Model, ViterbiPath};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("scale_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    eprintln!("\n{}", "=".repeat(80));
    eprintln!("HMM Viterbi Scaling Probe");
    eprintln!("{}", "=".repeat(80));
    eprintln!();
    eprintln!("Decodes deterministic models of growing length and width and checks them");
    eprintln!(
        "against a dense full-table Viterbi baseline (up to {} observations).",
        options.verify_limit
    );
    eprintln!();
    eprintln!("Metrics:");
    eprintln!("  wall_s         wall-clock time of the decode in seconds");
    eprintln!("  rss_delta_kib  resident set growth across the decode");
    eprintln!("  status         'passed' = matches baseline, 'not_checked' = above the limit");
    eprintln!();
    eprintln!("{}", "=".repeat(80));
    eprintln!();

    let mut sys = System::new();
    let mut measurements = Vec::new();

    eprintln!("[1/3] Two-state model, growing observation length...");
    measurements.extend(run_length_sweep(&options, &mut sys));
    eprintln!();

    eprintln!("[2/3] Banded model, growing state count...");
    measurements.extend(run_width_sweep(&options, &mut sys));
    eprintln!();

    eprintln!(
        "[3/3] Banded model, {} decoder...",
        if options.parallel { "parallel" } else { "serial" }
    );
    measurements.extend(run_decoder_mode(&options, &mut sys));
    eprintln!();

    print_summary(&measurements, &options);

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("scale_probe output error: {err}");
        std::process::exit(1);
    }
}

struct Options {
    format: OutputFormat,
    verify_limit: usize,
    parallel: bool,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut format = OutputFormat::Csv;
        let mut verify_limit = 4096usize;
        let mut parallel = false;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                std::process::exit(0);
            } else if arg == "--parallel" {
                parallel = true;
            } else if let Some(value) = arg.strip_prefix("--format=") {
                format = OutputFormat::from_str(value)?;
            } else if arg == "--format" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --format".to_string())?
                    .into();
                format = OutputFormat::from_str(&value)?;
            } else if let Some(value) = arg.strip_prefix("--verify-limit=") {
                verify_limit = parse_limit(value)?;
            } else if arg == "--verify-limit" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --verify-limit".to_string())?
                    .into();
                verify_limit = parse_limit(&value)?;
            } else {
                return Err(format!("unrecognized argument '{arg}'"));
            }
        }

        Ok(Self {
            format,
            verify_limit,
            parallel,
        })
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin scale_probe [-- <options>]

Options:
  --format <csv|table|json>     Output format (default: csv)
  --verify-limit <N>            Longest observation sequence checked against the baseline (default: 4096)
  --parallel                    Use the parallel decoder for the last scenario (needs the `parallel` feature)
  -h, --help                    Print this help message

Examples:
  cargo run --bin scale_probe
  cargo run --release --features parallel --bin scale_probe -- --format table --parallel
"
        );
    }
}

fn parse_limit(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .map_err(|_| "verify limit must be a positive integer".to_string())
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => write_csv(measurements),
            OutputFormat::Table => write_table(measurements),
            OutputFormat::Json => write_json(measurements),
        }
    }
}

#[derive(Clone)]
struct Measurement {
    scenario: &'static str,
    size_desc: String,
    wall_s: f64,
    rss_delta_kib: u64,
    verification_status: VerificationStatus,
    verification_detail: Option<String>,
}

#[derive(Clone, Copy)]
enum VerificationStatus {
    NotChecked,
    Passed,
    Failed,
}

impl VerificationStatus {
    fn label(&self) -> &'static str {
        match self {
            VerificationStatus::NotChecked => "not_checked",
            VerificationStatus::Passed => "passed",
            VerificationStatus::Failed => "failed",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            VerificationStatus::Passed => "✓",
            VerificationStatus::Failed => "✗",
            VerificationStatus::NotChecked => "○",
        }
    }
}

fn run_length_sweep(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const LENGTHS: &[usize] = &[64, 256, 1024, 4096, 16384, 65536, 262144];
    let total = LENGTHS.len();
    LENGTHS
        .iter()
        .enumerate()
        .map(|(idx, &len)| {
            eprint!("      [{}/{}] obs_len {}... ", idx + 1, total, len);
            let model = two_state_model(len);
            run_one("two_state_log", format!("obs_len={len}"), &model, Decoder::new(), options, sys)
        })
        .collect()
}

fn run_width_sweep(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const WIDTHS: &[u64] = &[4, 16, 64, 256, 1024];
    const LEN: usize = 512;
    let total = WIDTHS.len();
    WIDTHS
        .iter()
        .enumerate()
        .map(|(idx, &width)| {
            eprint!("      [{}/{}] states {}... ", idx + 1, total, width);
            let model = banded_model(width, LEN);
            run_one(
                "banded_log",
                format!("states={width},obs_len={LEN}"),
                &model,
                Decoder::new(),
                options,
                sys,
            )
        })
        .collect()
}

fn run_decoder_mode(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const CONFIGS: &[(u64, usize)] = &[(64, 4096), (256, 4096), (512, 8192)];
    let decoder = Decoder::builder().parallel(options.parallel).build();
    let scenario = if options.parallel {
        "banded_log_parallel"
    } else {
        "banded_log_serial"
    };
    let total = CONFIGS.len();
    CONFIGS
        .iter()
        .enumerate()
        .map(|(idx, &(width, len))| {
            eprint!("      [{}/{}] states {}, obs_len {}... ", idx + 1, total, width, len);
            let model = banded_model(width, len);
            run_one(
                scenario,
                format!("states={width},obs_len={len}"),
                &model,
                decoder,
                options,
                sys,
            )
        })
        .collect()
}

fn run_one(
    scenario: &'static str,
    size_desc: String,
    model: &Model<u64, u64>,
    decoder: Decoder,
    options: &Options,
    sys: &mut System,
) -> Measurement {
    let mut decoded = Err(DecodeError::NoObservations);
    let mut m = measure(scenario, size_desc, sys, || {
        decoded = decoder.eval_path_log_probabilities(model);
    });

    let (status, detail) = match &decoded {
        Err(err) => (VerificationStatus::Failed, Some(format!("decode failed: {err}"))),
        Ok(_) if model.num_observations() > options.verify_limit => {
            (VerificationStatus::NotChecked, None)
        }
        Ok(best) => verify(model, best),
    };
    m.verification_status = status;
    m.verification_detail = detail;

    match &decoded {
        Ok(best) => eprintln!(
            "{} logp={:.3}, path_len={}, time={:.3}s, status={}",
            status.icon(),
            best.probability,
            best.len(),
            m.wall_s,
            status.label()
        ),
        Err(err) => eprintln!("{} {err}", status.icon()),
    }
    m
}

fn verify(model: &Model<u64, u64>, best: &ViterbiPath<u64>) -> (VerificationStatus, Option<String>) {
    let Some(baseline) = dense_baseline(model) else {
        return (
            VerificationStatus::Failed,
            Some("baseline found no path".to_string()),
        );
    };
    if (best.probability - baseline).abs() > 1e-6 {
        return (
            VerificationStatus::Failed,
            Some(format!(
                "baseline logp={baseline:.6}, got={:.6}",
                best.probability
            )),
        );
    }
    match score_path::<LogSpace, _, _>(model, &best.path) {
        Ok(score) if score == best.probability => (VerificationStatus::Passed, None),
        Ok(score) => (
            VerificationStatus::Failed,
            Some(format!("path rescored to {score:.6}, reported {:.6}", best.probability)),
        ),
        Err(err) => (VerificationStatus::Failed, Some(format!("path rescoring: {err}"))),
    }
}

fn measure<F>(scenario: &'static str, size_desc: String, sys: &mut System, compute: F) -> Measurement
where
    F: FnOnce(),
{
    let before = rss_kib(sys);
    let start = Instant::now();
    compute();
    let duration = start.elapsed();
    let after = rss_kib(sys);

    Measurement {
        scenario,
        size_desc,
        wall_s: duration.as_secs_f64(),
        rss_delta_kib: after.saturating_sub(before),
        verification_status: VerificationStatus::NotChecked,
        verification_detail: None,
    }
}

fn print_summary(measurements: &[Measurement], options: &Options) {
    eprintln!("\n{}", "=".repeat(80));
    eprintln!("Summary");
    eprintln!("{}", "=".repeat(80));
    eprintln!();

    let mut passed = 0;
    let mut failed = 0;
    let mut not_checked = 0;
    for m in measurements {
        match m.verification_status {
            VerificationStatus::Passed => passed += 1,
            VerificationStatus::Failed => failed += 1,
            VerificationStatus::NotChecked => not_checked += 1,
        }
    }

    let total = measurements.len().max(1) as f64;
    eprintln!("Verification Results:");
    eprintln!("  Total runs: {}", measurements.len());
    eprintln!("  ✓ Passed: {} ({:.1}%)", passed, 100.0 * passed as f64 / total);
    eprintln!("  ✗ Failed: {} ({:.1}%)", failed, 100.0 * failed as f64 / total);
    eprintln!(
        "  ○ Not checked (obs_len > {}): {} ({:.1}%)",
        options.verify_limit,
        not_checked,
        100.0 * not_checked as f64 / total
    );
    eprintln!();

    if failed > 0 {
        eprintln!("Failed Runs:");
        for m in measurements {
            if matches!(m.verification_status, VerificationStatus::Failed) {
                eprintln!("  ✗ {} ({})", m.scenario, m.size_desc);
                if let Some(ref detail) = m.verification_detail {
                    eprintln!("     Error: {}", detail);
                }
            }
        }
        eprintln!();
    }

    let mut scenarios: Vec<&'static str> = measurements.iter().map(|m| m.scenario).collect();
    scenarios.dedup();
    for scenario in scenarios {
        let ms: Vec<&Measurement> = measurements.iter().filter(|m| m.scenario == scenario).collect();
        let min_time = ms.iter().map(|m| m.wall_s).fold(f64::INFINITY, f64::min);
        let max_time = ms.iter().map(|m| m.wall_s).fold(0.0, f64::max);
        let max_mem = ms.iter().map(|m| m.rss_delta_kib).max().unwrap_or(0);
        eprintln!("  {}:", scenario);
        eprintln!("    Runs: {}", ms.len());
        eprintln!("    Time: min={:.3}s, max={:.3}s", min_time, max_time);
        eprintln!("    Memory: max_delta={} KiB", max_mem);
        eprintln!();
    }

    eprintln!("{}", "=".repeat(80));
    if failed == 0 {
        eprintln!("✓ All verified runs passed.");
    } else {
        eprintln!("✗ {} run(s) failed. Please review the errors above.", failed);
    }
    eprintln!("{}", "=".repeat(80));
    eprintln!();
}

fn write_csv(measurements: &[Measurement]) -> Result<(), String> {
    println!("scenario,size_desc,wall_s,rss_delta_kib,verification_status,verification_detail");
    for m in measurements {
        let detail = m
            .verification_detail
            .as_ref()
            .map(|s| s.replace('"', "'"))
            .unwrap_or_default();
        println!(
            "{},\"{}\",{:.3},{},{},\"{}\"",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            detail
        );
    }
    Ok(())
}

fn write_table(measurements: &[Measurement]) -> Result<(), String> {
    let col1 = measurements
        .iter()
        .map(|m| m.scenario.len())
        .fold("scenario".len(), usize::max);
    let col2 = measurements
        .iter()
        .map(|m| m.size_desc.len())
        .fold("size".len(), usize::max);

    println!(
        "{:<col1$}  {:<col2$}  {:>10}  {:>14}  {:>12}  {}",
        "scenario", "size", "wall_s", "rss_delta_kib", "status", "detail"
    );
    println!(
        "{:-<col1$}  {:-<col2$}  {:-<10}  {:-<14}  {:-<12}  {:-<12}",
        "", "", "", "", "", ""
    );
    for m in measurements {
        println!(
            "{:<col1$}  {:<col2$}  {:>10.3}  {:>14}  {:>12}  {}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            m.verification_detail.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn write_json(measurements: &[Measurement]) -> Result<(), String> {
    println!("[");
    for (idx, m) in measurements.iter().enumerate() {
        let detail = m.verification_detail.as_ref().map(|s| s.replace('"', "'"));
        println!(
            "  {{\"scenario\":\"{}\",\"size\":\"{}\",\"wall_s\":{:.3},\"rss_delta_kib\":{},\"verification\":{{\"status\":\"{}\",\"detail\":{}}}}}{}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            match detail {
                Some(ref d) => format!("\"{d}\""),
                None => "null".to_string(),
            },
            if idx + 1 == measurements.len() { "" } else { "," }
        );
    }
    println!("]");
    Ok(())
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    match get_current_pid().ok().and_then(|pid| sys.process(pid)) {
        Some(process) => process.memory() / 1024,
        None => 0,
    }
}

/// Sticky two-state chain; observations alternate in runs of three.
fn two_state_model(len: usize) -> Model<u64, u64> {
    let mut m = Model::new();
    m.add_state(0);
    m.add_state(1);
    for i in 0..len {
        m.add_observation(((i / 3) % 2) as u64);
    }
    m.put_start_probability(&0, 0.5f64.ln());
    m.put_start_probability(&1, 0.5f64.ln());
    m.put_transition_probability(&0, &0, 0.9f64.ln());
    m.put_transition_probability(&0, &1, 0.1f64.ln());
    m.put_transition_probability(&1, &0, 0.2f64.ln());
    m.put_transition_probability(&1, &1, 0.8f64.ln());
    m.put_emission_probability(&0, &0, 0.8f64.ln());
    m.put_emission_probability(&0, &1, 0.2f64.ln());
    m.put_emission_probability(&1, &0, 0.3f64.ln());
    m.put_emission_probability(&1, &1, 0.7f64.ln());
    m
}

/// Each state moves to itself or one of its next two neighbours (cyclic) and
/// emits four of the eight symbols.
fn banded_model(width: u64, len: usize) -> Model<u64, u64> {
    const SYMBOLS: u64 = 8;
    let mut m = Model::new();
    for s in 0..width {
        m.add_state(s);
    }
    for i in 0..len as u64 {
        m.add_observation((i * 5 + i / 7) % SYMBOLS);
    }
    for s in 0..width {
        if s % 4 == 0 {
            m.put_start_probability(&s, (4.0 / width as f64).min(1.0).ln());
        }
        for (step, p) in [(0, 0.6f64), (1, 0.3), (2, 0.1)] {
            m.put_transition_probability(&s, &((s + step) % width), p.ln());
        }
        for k in 0..4 {
            let sym = (s + 2 * k) % SYMBOLS;
            let p = 0.1 + 0.1 * k as f64;
            m.put_emission_probability(&s, &sym, p.ln());
        }
    }
    m
}

/// Full-table log-space Viterbi over every state pair at every step.
fn dense_baseline(model: &Model<u64, u64>) -> Option<f64> {
    let states = model.states();
    let obs = model.observations();
    let first = obs.first()?;
    let mut prev: Vec<f64> = states
        .iter()
        .map(|&s| {
            match (
                model.start_probability(s),
                model.emission_probability(s, *first),
            ) {
                (Some(a), Some(b)) => a + b,
                _ => f64::NEG_INFINITY,
            }
        })
        .collect();
    for &o in &obs[1..] {
        let next: Vec<f64> = states
            .iter()
            .map(|&to| {
                let Some(emit) = model.emission_probability(to, o) else {
                    return f64::NEG_INFINITY;
                };
                states
                    .iter()
                    .zip(&prev)
                    .filter_map(|(&from, &score)| {
                        model.transition_probability(from, to).map(|t| score + t + emit)
                    })
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .collect();
        prev = next;
    }
    let best = prev.into_iter().fold(f64::NEG_INFINITY, f64::max);
    best.is_finite().then_some(best)
}
