//! Headway: Concussion recovery companion
//!
//! Command-line entry point. Results are printed to stdout as JSON; logs go
//! to stderr or a log file.

use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use headway::adapters::rules::RuleBasedAnalyzer;
use headway::adapters::sanitize::SanitizingMakeWriter;
use headway::adapters::sqlite::SqliteProfileStore;
use headway::application::{AnalysisService, ProgressService};
use headway::config::AppConfig;
use headway::domain::strategy::RECOVERY_STRATEGIES;
use headway::domain::{AnalysisSource, NewFeedback, NewSymptom, SymptomCategory, Taxonomy};
use headway::ports::{ProfileStore, SymptomAnalyzer};

const USAGE: &str = "\
Usage: headway <command> [args]

Commands:
  analyze [--document] [--save | --onboard] [--notes <text>] [<text>...]
                          Analyze a description (stdin when no text is given)
  log <name> <severity 1-5> [notes...]
                          Record a symptom by hand
  demographics [--age a] [--gender g] [--injury-date YYYY-MM-DD] [--cause c] [--previous p]
                          Update the onboarding answers
  profile                 Show everything stored locally
  history [--offset n] [--limit n]
                          Show the symptom log, newest first
  summary                 Recovery dashboard
  taxonomy [--category <c>] [--red-flags]
                          List known symptoms
  strategies              List recovery strategies
  feedback <strategy-id> <yes|no> [notes...]
                          Rate a recovery strategy
  reset                   Delete all stored data";

fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    // stdout carries command output, so logs go to a file or stderr.
    let (writer, guard) = match config.log_destination() {
        Some(log_file) => {
            if let Some(parent) = log_file.parent() {
                // Best-effort: the open below reports the real failure.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("Failed to open log file {:?}", log_file))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::with_limit(writer, config.sanitize_max_bytes)),
        )
        .init();

    Ok(guard)
}

fn load_taxonomy(config: &AppConfig) -> Result<Arc<Taxonomy>> {
    let taxonomy = match &config.taxonomy_path {
        Some(path) => Taxonomy::load(path)
            .with_context(|| format!("Failed to load taxonomy from {:?}", path))?,
        None => Taxonomy::builtin().clone(),
    };
    Ok(Arc::new(taxonomy))
}

fn open_store(config: &AppConfig) -> Result<Arc<SqliteProfileStore>> {
    let store = SqliteProfileStore::new(&config.db_path)
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;
    Ok(Arc::new(store))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_count(flag: &str, value: Option<String>) -> Result<usize> {
    let value = value.with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("{flag} must be a non-negative integer"))
}

fn analyze(config: &AppConfig, args: Vec<String>) -> Result<()> {
    let mut document = false;
    let mut save = false;
    let mut onboard = false;
    let mut notes: Option<String> = None;
    let mut words = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--document" => document = true,
            "--save" => save = true,
            "--onboard" => onboard = true,
            "--notes" => notes = Some(args.next().context("--notes needs a value")?),
            _ => words.push(arg),
        }
    }
    if document && onboard {
        bail!("--onboard takes a symptom description, not a document");
    }

    let text = if words.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read symptom text from stdin")?;
        buf
    } else {
        words.join(" ")
    };

    let taxonomy = load_taxonomy(config)?;
    let analyzer = match config.severity_seed {
        Some(seed) => RuleBasedAnalyzer::with_seed(taxonomy, seed),
        None => RuleBasedAnalyzer::new(taxonomy),
    };
    tracing::info!("Using {} analyzer", analyzer.backend_name());

    let store = open_store(config)?;
    let service = AnalysisService::new(Arc::new(analyzer), store);

    let (analysis, result, source) = if document {
        let doc = service
            .spawn_document(text, config.analysis_latency)?
            .wait()?;
        (serde_json::to_value(&doc)?, doc.result, AnalysisSource::Document)
    } else {
        let result = service.spawn_text(text, config.analysis_latency).wait()?;
        (serde_json::to_value(&result)?, result, AnalysisSource::Description)
    };
    tracing::info!(
        "Analysis finished: {} symptom(s), {} red flag(s)",
        result.extracted_symptoms.len(),
        result.red_flags.len()
    );

    let saved = if onboard {
        service.complete_onboarding(&result)?
    } else if save {
        service.save_to_profile(&result, source, notes.as_deref())?
    } else {
        Vec::new()
    };

    print_json(&json!({
        "analysis": analysis,
        "byCategory": result
            .symptoms_by_category()
            .into_iter()
            .map(|(category, symptoms)| json!({ "category": category, "symptoms": symptoms }))
            .collect::<Vec<_>>(),
        "saved": saved,
    }))
}

fn log_symptom(config: &AppConfig, args: Vec<String>) -> Result<()> {
    let mut args = args.into_iter();
    let name = args.next().context("log needs a symptom name")?;
    let severity: u8 = args
        .next()
        .context("log needs a severity")?
        .parse()
        .context("Severity must be a number from 1 to 5")?;
    let notes = args.collect::<Vec<_>>().join(" ");

    let progress = ProgressService::new(open_store(config)?);
    let entry = progress.log_symptom(&NewSymptom::new(name, severity, notes))?;
    print_json(&entry)
}

fn demographics(config: &AppConfig, args: Vec<String>) -> Result<()> {
    let progress = ProgressService::new(open_store(config)?);
    let mut demographics = progress.profile()?.demographics;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let field = match arg.as_str() {
            "--age" => &mut demographics.age,
            "--gender" => &mut demographics.gender,
            "--injury-date" => &mut demographics.injury_date,
            "--cause" => &mut demographics.injury_cause,
            "--previous" => &mut demographics.previous_concussions,
            _ => bail!("Unknown arg: {arg}\n{USAGE}"),
        };
        *field = args.next().with_context(|| format!("{arg} needs a value"))?;
    }

    progress.save_demographics(&demographics)?;
    print_json(&demographics)
}

fn history(config: &AppConfig, args: Vec<String>) -> Result<()> {
    let mut offset = 0;
    let mut limit = 20;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--offset" => offset = parse_count("--offset", args.next())?,
            "--limit" => limit = parse_count("--limit", args.next())?,
            _ => bail!("Unknown arg: {arg}\n{USAGE}"),
        }
    }
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let store = open_store(config)?;
    let page = store.load_symptoms_paginated(offset, limit)?;
    print_json(&json!({
        "items": page.items,
        "totalCount": page.total_count,
        "offset": page.offset,
        "limit": page.limit,
        "hasMore": page.has_more,
        "nextOffset": page.next_offset(),
        "prevOffset": page.prev_offset(),
    }))
}

fn taxonomy(config: &AppConfig, args: Vec<String>) -> Result<()> {
    let mut category: Option<SymptomCategory> = None;
    let mut red_flags_only = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--category" => {
                let value = args.next().context("--category needs a value")?;
                category = Some(value.parse()?);
            }
            "--red-flags" => red_flags_only = true,
            _ => bail!("Unknown arg: {arg}\n{USAGE}"),
        }
    }

    let taxonomy = load_taxonomy(config)?;
    let definitions = match category {
        Some(category) => taxonomy.list_by_category(category),
        None => taxonomy.iter().collect(),
    };
    let definitions: Vec<_> = definitions
        .into_iter()
        .filter(|d| !red_flags_only || d.is_red_flag)
        .map(|d| json!({ "displayName": d.format_display_name(), "definition": d }))
        .collect();

    print_json(&json!({ "version": taxonomy.version(), "symptoms": definitions }))
}

fn feedback(config: &AppConfig, args: Vec<String>) -> Result<()> {
    let mut args = args.into_iter();
    let strategy_id = args.next().context("feedback needs a strategy id")?;
    let helpful = match args.next().as_deref() {
        Some("yes" | "y") => true,
        Some("no" | "n") => false,
        _ => bail!("feedback needs yes or no\n{USAGE}"),
    };
    let notes = args.collect::<Vec<_>>().join(" ");

    let progress = ProgressService::new(open_store(config)?);
    let stored = progress.record_feedback(&NewFeedback {
        strategy_id,
        helpful,
        notes,
    })?;
    print_json(&stored)
}

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    let _guard = init_logging(&config)?;

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let rest: Vec<String> = args.collect();

    tracing::debug!("Running command {command}");

    match command.as_str() {
        "analyze" => analyze(&config, rest),
        "log" => log_symptom(&config, rest),
        "demographics" => demographics(&config, rest),
        "profile" => print_json(&ProgressService::new(open_store(&config)?).profile()?),
        "history" => history(&config, rest),
        "summary" => print_json(&ProgressService::new(open_store(&config)?).dashboard()?),
        "taxonomy" => taxonomy(&config, rest),
        "strategies" => print_json(RECOVERY_STRATEGIES),
        "feedback" => feedback(&config, rest),
        "reset" => {
            open_store(&config)?.clear_all()?;
            print_json(&json!({ "reset": true }))
        }
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}\n{USAGE}");
            std::process::exit(2);
        }
    }
}
