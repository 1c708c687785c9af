//! executable part of this library. reads an input document and either
//! runs the full scheduling pipeline or just the preflight validators

use std::error::Error;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oncall_scheduler::calendar::Calendar;
use oncall_scheduler::io::{seed_schedule, InputDocument, OutputDocument};
use oncall_scheduler::orchestrator;
use oncall_scheduler::validators;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// on-call duty scheduler: assign doctors to duty positions across a month
#[derive(Parser, Debug)]
#[command(version, about = "Assign on-call duty positions to doctors across a calendar month", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the full pipeline and write the filled schedule as JSON
    Run {
        /// path to an input document (see the crate's README for the shape)
        #[arg(short, long)]
        input: PathBuf,

        /// where to write the output document; prints to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// RNG seed; same seed + same input always produces the same output
        #[arg(short, long, default_value = "0")]
        seed: String,
    },
    /// run only the preflight validators and print their errors, if any
    Validate {
        /// path to an input document
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oncall_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Run { input, output, seed } => run(&input, output.as_ref(), &seed),
        Command::Validate { input } => validate(&input),
    }
}

fn load(path: &PathBuf) -> Result<InputDocument, Box<dyn Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// hashes an arbitrary seed string into the `u64` `ChaCha8Rng::seed_from_u64`
/// expects; same string always hashes to the same value
fn seed_from_str(seed: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    seed.hash(&mut hasher);
    hasher.finish()
}

fn write_output(output: &OutputDocument, path: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(output)?;
    match path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run(path: &PathBuf, output: Option<&PathBuf>, seed: &str) -> Result<(), Box<dyn Error>> {
    let document = load(path)?;
    let domain = match document.into_domain() {
        Ok(domain) => domain,
        Err(errors) => {
            let output_document = OutputDocument {
                were_any_duties_set: false,
                were_all_duties_set: false,
                errors,
                duties: Vec::new(),
            };
            return write_output(&output_document, output);
        }
    };

    let mut rng = ChaCha8Rng::seed_from_u64(seed_from_str(seed));
    let duties = domain.duties;
    let doctors = domain.doctors;

    let result = orchestrator::set_duties(
        domain.year,
        domain.month,
        domain.positions,
        &doctors,
        |schedule| seed_schedule(schedule, &duties, &doctors),
        &mut rng,
    )?;

    let output_document: OutputDocument = result.into();
    write_output(&output_document, output)
}

fn validate(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let document = load(path)?;
    let domain = match document.into_domain() {
        Ok(domain) => domain,
        Err(errors) => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "errors": errors }))?);
            return Ok(());
        }
    };

    let calendar = Calendar::new(domain.year, domain.month);
    let mut schedule = oncall_scheduler::duty_schedule::DutySchedule::new(domain.year, domain.month, domain.positions);
    seed_schedule(&mut schedule, &domain.duties, &domain.doctors);

    let errors = validators::validate(&domain.doctors, &schedule, &calendar);
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "errors": errors }))?);
    Ok(())
}
