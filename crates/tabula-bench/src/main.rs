mod scenarios;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tabula_core::{NameMode, WriteOptions};
use tabula_tools::{MeasurementRecorder, StageMeasurement, capture_rss_bytes, rss_delta};

use crate::scenarios::{FacilityData, FacilityModel, diet_model, facility_model};

const DEFAULT_CASES: [usize; 4] = [10, 50, 100, 250];
const SCHEMA_VERSION: u32 = 1;
const SCENARIO: &str = "facility";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Tabula benchmark runner and reference model writer"
)]
struct Cli {
    /// Log filter (overrides TABULA_TRACE)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build facility models at several sizes and save JSONL artifacts
    Run(RunArgs),
    /// Render a benchmark artifact summary
    Report(ReportArgs),
    /// Write a reference model as an LP file
    Write(WriteArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Comma-separated list of facility counts
    #[arg(long, value_delimiter = ',')]
    cases: Option<Vec<usize>>,

    /// Customers generated per facility
    #[arg(long, default_value_t = 2)]
    customers_per_facility: usize,

    /// Number of repetitions per case
    #[arg(long, default_value_t = 1)]
    repetitions: u32,

    /// Serialize with short base-62 names
    #[arg(long)]
    short_names: bool,

    /// JSONL output artifact path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Input JSONL benchmark artifact
    #[arg(long)]
    input: PathBuf,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct WriteArgs {
    /// Reference model to write
    #[arg(value_enum)]
    model: ModelKind,

    /// Destination path (must end in .lp)
    #[arg(long)]
    output: PathBuf,

    /// Use short base-62 names
    #[arg(long)]
    short_names: bool,

    /// Label printed before the objective terms
    #[arg(long, default_value = "obj")]
    objective_label: String,

    /// Facility count for the facility model
    #[arg(long, default_value_t = 5)]
    facilities: usize,

    /// Customer count for the facility model
    #[arg(long, default_value_t = 4)]
    customers: usize,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum ModelKind {
    Diet,
    Facility,
}

#[derive(Debug, Clone)]
struct CaseConfig {
    name: String,
    facilities: usize,
    customers: usize,
}

#[derive(Debug, Clone)]
struct CaseExecution {
    variables: usize,
    constraints: usize,
    coefficients: usize,
    lp_bytes: usize,
    stage_measurements: Vec<StageMeasurement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BenchRecord {
    schema_version: u32,
    run_id: String,
    scenario: String,
    case_name: String,
    repetition: u32,
    variables: usize,
    constraints: usize,
    coefficients: usize,
    lp_bytes: usize,
    stage: String,
    duration_ms: f64,
    rss_before_bytes: Option<u64>,
    rss_after_bytes: Option<u64>,
    rss_delta_bytes: Option<i64>,
}

#[derive(Debug, Clone, Eq, Ord, PartialEq, PartialOrd)]
struct SummaryKey {
    case_name: String,
    stage: String,
}

#[derive(Debug, Clone, Serialize)]
struct SummaryRow {
    case_name: String,
    stage: String,
    samples: usize,
    mean_duration_ms: f64,
    max_duration_ms: f64,
    mean_rss_delta_bytes: Option<f64>,
    max_rss_after_bytes: Option<u64>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    tabula_tools::enable_logging(cli.log_level.as_deref())?;
    match cli.command {
        Command::Run(args) => run_command(args),
        Command::Report(args) => report_command(args),
        Command::Write(args) => write_command(args),
    }
}

fn write_options(short_names: bool) -> WriteOptions {
    if short_names {
        WriteOptions::new().with_names(NameMode::Short)
    } else {
        WriteOptions::new()
    }
}

fn run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.repetitions == 0 {
        return Err(boxed_input_error("repetitions must be greater than zero"));
    }
    if args.customers_per_facility == 0 {
        return Err(boxed_input_error(
            "customers-per-facility must be greater than zero",
        ));
    }

    let run_id = build_run_id()?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("artifacts/bench/{run_id}.jsonl")));
    let options = write_options(args.short_names);

    let mut records = Vec::new();
    for case in resolve_cases(&args) {
        for rep_idx in 0..args.repetitions {
            let execution = execute_case(&case, &options)?;
            tracing::debug!(
                component = "bench",
                operation = "case",
                status = "success",
                case_name = %case.name,
                repetition = rep_idx + 1,
                variables = execution.variables,
                constraints = execution.constraints,
                lp_bytes = execution.lp_bytes,
                "facility case executed"
            );
            records.extend(case_records(&run_id, &case.name, rep_idx + 1, &execution));
        }
    }

    write_records_jsonl(&output_path, &records)?;
    render_output(args.format, &records)?;
    println!("artifact: {}", output_path.display());
    Ok(())
}

fn report_command(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records_jsonl(&args.input)?;
    render_output(args.format, &records)?;
    Ok(())
}

fn write_command(args: WriteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let model = match args.model {
        ModelKind::Diet => diet_model()?,
        ModelKind::Facility => {
            if args.facilities == 0 || args.customers == 0 {
                return Err(boxed_input_error(
                    "facilities and customers must be greater than zero",
                ));
            }
            facility_model(&FacilityData::generate(args.facilities, args.customers))?
        }
    };
    let options = write_options(args.short_names).with_objective_label(args.objective_label);
    model.write_lp(&args.output, &options)?;
    println!(
        "wrote {} variables, {} constraints to {}",
        model.num_variables(),
        model.num_constraints(),
        args.output.display()
    );
    Ok(())
}

fn resolve_cases(args: &RunArgs) -> Vec<CaseConfig> {
    args.cases
        .clone()
        .unwrap_or_else(|| DEFAULT_CASES.to_vec())
        .into_iter()
        .map(|facilities| {
            let customers = facilities * args.customers_per_facility;
            CaseConfig {
                name: format!("fac{facilities}_cust{customers}"),
                facilities,
                customers,
            }
        })
        .collect()
}

fn execute_case(
    case: &CaseConfig,
    options: &WriteOptions,
) -> Result<CaseExecution, Box<dyn std::error::Error>> {
    let data = FacilityData::generate(case.facilities, case.customers);
    let mut recorder = MeasurementRecorder::new();

    let total_started = Instant::now();
    let total_rss_before = capture_rss_bytes("bench_total");

    let stage_start = recorder.begin_stage("declare");
    let mut build = FacilityModel::declare(&data)?;
    recorder.end_stage(stage_start);

    let stage_start = recorder.begin_stage("constraints");
    build.add_constraints()?;
    recorder.end_stage(stage_start);

    let stage_start = recorder.begin_stage("objective");
    build.set_objective()?;
    recorder.end_stage(stage_start);

    let stage_start = recorder.begin_stage("finalize");
    build.model_mut().finalize()?;
    recorder.end_stage(stage_start);

    let stage_start = recorder.begin_stage("serialize");
    let text = build.model().to_lp_string(options)?;
    recorder.end_stage(stage_start);

    let total_duration = total_started.elapsed();
    let total_rss_after = capture_rss_bytes("bench_total");

    let mut stages = recorder.into_stages();
    stages.push(StageMeasurement {
        stage: "total".to_string(),
        duration: total_duration,
        rss_before_bytes: total_rss_before,
        rss_after_bytes: total_rss_after,
        rss_delta_bytes: rss_delta(total_rss_before, total_rss_after),
    });

    let model = build.model();
    Ok(CaseExecution {
        variables: model.num_variables(),
        constraints: model.num_constraints(),
        coefficients: model.num_coefficients(),
        lp_bytes: text.len(),
        stage_measurements: stages,
    })
}

fn case_records(
    run_id: &str,
    case_name: &str,
    repetition: u32,
    execution: &CaseExecution,
) -> Vec<BenchRecord> {
    execution
        .stage_measurements
        .iter()
        .map(|measurement| BenchRecord {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.to_string(),
            scenario: SCENARIO.to_string(),
            case_name: case_name.to_string(),
            repetition,
            variables: execution.variables,
            constraints: execution.constraints,
            coefficients: execution.coefficients,
            lp_bytes: execution.lp_bytes,
            stage: measurement.stage.clone(),
            duration_ms: measurement.duration.as_secs_f64() * 1000.0,
            rss_before_bytes: measurement.rss_before_bytes,
            rss_after_bytes: measurement.rss_after_bytes,
            rss_delta_bytes: measurement.rss_delta_bytes,
        })
        .collect()
}

fn render_output(
    format: OutputFormat,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => print_summary_table(&summarize_records(records)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Ndjson => {
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}

fn summarize_records(records: &[BenchRecord]) -> Vec<SummaryRow> {
    #[derive(Default)]
    struct Acc {
        samples: usize,
        duration_sum: f64,
        duration_max: f64,
        rss_delta_sum: f64,
        rss_delta_count: usize,
        rss_after_max: Option<u64>,
    }

    let mut groups: BTreeMap<SummaryKey, Acc> = BTreeMap::new();
    for record in records {
        let key = SummaryKey {
            case_name: record.case_name.clone(),
            stage: record.stage.clone(),
        };
        let entry = groups.entry(key).or_default();
        entry.samples += 1;
        entry.duration_sum += record.duration_ms;
        entry.duration_max = entry.duration_max.max(record.duration_ms);
        if let Some(delta) = record.rss_delta_bytes {
            entry.rss_delta_sum += delta as f64;
            entry.rss_delta_count += 1;
        }
        entry.rss_after_max = entry.rss_after_max.max(record.rss_after_bytes);
    }

    groups
        .into_iter()
        .map(|(key, acc)| SummaryRow {
            case_name: key.case_name,
            stage: key.stage,
            samples: acc.samples,
            mean_duration_ms: acc.duration_sum / acc.samples.max(1) as f64,
            max_duration_ms: acc.duration_max,
            mean_rss_delta_bytes: (acc.rss_delta_count > 0)
                .then(|| acc.rss_delta_sum / acc.rss_delta_count as f64),
            max_rss_after_bytes: acc.rss_after_max,
        })
        .collect()
}

fn print_summary_table(rows: &[SummaryRow]) {
    println!(
        "{:<20} {:<12} {:>7} {:>12} {:>12} {:>14} {:>14}",
        "case", "stage", "samples", "mean_ms", "max_ms", "mean_rss_mb", "max_rss_mb"
    );
    for row in rows {
        println!(
            "{:<20} {:<12} {:>7} {:>12.3} {:>12.3} {:>14} {:>14}",
            row.case_name,
            row.stage,
            row.samples,
            row.mean_duration_ms,
            row.max_duration_ms,
            format_option_mb(row.mean_rss_delta_bytes),
            format_option_mb(row.max_rss_after_bytes.map(|bytes| bytes as f64)),
        );
    }
}

fn format_option_mb(value: Option<f64>) -> String {
    value.map_or_else(
        || "-".to_string(),
        |bytes| format!("{:.3}", bytes / (1024.0 * 1024.0)),
    )
}

fn write_records_jsonl(
    path: &Path,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn load_records_jsonl(path: &Path) -> Result<Vec<BenchRecord>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<BenchRecord>(&line)?);
    }
    Ok(records)
}

fn build_run_id() -> Result<String, Box<dyn std::error::Error>> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| std::io::Error::other(err.to_string()))?
        .as_millis();
    Ok(format!("bench_{millis}"))
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        BenchRecord, CaseConfig, OutputFormat, RunArgs, execute_case, load_records_jsonl,
        resolve_cases, summarize_records, write_options, write_records_jsonl,
    };

    fn approx_eq(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "left={left}, right={right}");
    }

    fn record(repetition: u32, duration_ms: f64, rss_delta_bytes: Option<i64>) -> BenchRecord {
        BenchRecord {
            schema_version: 1,
            run_id: "run".to_string(),
            scenario: "facility".to_string(),
            case_name: "fac10_cust20".to_string(),
            repetition,
            variables: 210,
            constraints: 30,
            coefficients: 610,
            lp_bytes: 4_096,
            stage: "total".to_string(),
            duration_ms,
            rss_before_bytes: Some(1_000),
            rss_after_bytes: Some(1_000 + 1_000 * u64::from(repetition)),
            rss_delta_bytes,
        }
    }

    #[test]
    fn summarize_records_groups_and_averages() {
        let records = vec![
            record(1, 10.0, Some(1_000)),
            record(2, 30.0, Some(1_500)),
            record(3, 20.0, None),
        ];

        let summary = summarize_records(&records);
        assert_eq!(summary.len(), 1);
        let row = &summary[0];
        assert_eq!(row.samples, 3);
        approx_eq(row.mean_duration_ms, 20.0);
        approx_eq(row.max_duration_ms, 30.0);
        match row.mean_rss_delta_bytes {
            Some(mean) => approx_eq(mean, 1_250.0),
            None => panic!("mean RSS delta should be present"),
        }
        assert_eq!(row.max_rss_after_bytes, Some(4_000));
    }

    #[test]
    fn resolve_cases_scales_customers() {
        let args = RunArgs {
            cases: Some(vec![3, 7]),
            customers_per_facility: 2,
            repetitions: 1,
            short_names: false,
            output: None,
            format: OutputFormat::Table,
        };
        let cases = resolve_cases(&args);
        let names: Vec<&str> = cases.iter().map(|case| case.name.as_str()).collect();
        assert_eq!(names, vec!["fac3_cust6", "fac7_cust14"]);
        assert_eq!(cases[1].customers, 14);
    }

    #[test]
    fn execute_case_records_every_stage() {
        let case = CaseConfig {
            name: "fac2_cust3".to_string(),
            facilities: 2,
            customers: 3,
        };
        let execution = execute_case(&case, &write_options(true)).unwrap();
        assert_eq!(execution.variables, 2 + 6);
        assert_eq!(execution.constraints, 2 + 3);
        assert!(execution.lp_bytes > 0);
        let stages: Vec<&str> = execution
            .stage_measurements
            .iter()
            .map(|m| m.stage.as_str())
            .collect();
        assert_eq!(
            stages,
            vec!["declare", "constraints", "objective", "finalize", "serialize", "total"]
        );
    }

    #[test]
    fn jsonl_artifacts_round_trip() {
        let path = std::env::temp_dir().join(format!("tabula-bench-{}.jsonl", std::process::id()));
        let records = vec![record(1, 12.5, Some(64)), record(2, 13.5, None)];
        write_records_jsonl(&path, &records).unwrap();
        let loaded = load_records_jsonl(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].repetition, 2);
        assert_eq!(loaded[1].rss_delta_bytes, None);
        approx_eq(loaded[0].duration_ms, 12.5);
    }
}
