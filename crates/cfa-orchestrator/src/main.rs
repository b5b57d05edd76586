//! `cfa`: command-line driver for counterfactual searches

use anyhow::{bail, Context, Result};
use cfa_model::{validate_range, AnalysisState, CounterfactualStatus, Observation};
use cfa_orchestrator::{AnalysisSession, CfaConfig, ExecutionId, HttpCounterfactualApi};
use cfa_reducer::{blockers, AnalysisStore};
use clap::{value_parser, Arg, ArgMatches, Command};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Analysis input: either a prepared state or raw execution observations
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisFile {
    Execution {
        outcomes: Vec<Observation>,
        inputs: Vec<Observation>,
    },
    State(AnalysisState),
}

impl AnalysisFile {
    fn load(path: &Path) -> Result<AnalysisState> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis {}", path.display()))?;
        let file: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse analysis {}", path.display()))?;
        Ok(match file {
            Self::Execution { outcomes, inputs } => AnalysisState::from_execution(&outcomes, &inputs),
            Self::State(state) => state,
        })
    }
}

fn analysis_arg() -> Arg {
    Arg::new("analysis")
        .long("analysis")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Analysis JSON (goals and searchConstraints, or outcomes and inputs)")
}

fn cli() -> Command {
    Command::new("cfa")
        .version(cfa_orchestrator::VERSION)
        .about("Counterfactual analysis driver")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("submit")
                .about("Submit a search and follow it to completion")
                .arg(
                    Arg::new("execution")
                        .long("execution")
                        .required(true)
                        .help("Decision execution id"),
                )
                .arg(analysis_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("base-url")
                        .long("base-url")
                        .help("Override the service root"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Report whether the analysis can be submitted")
                .arg(analysis_arg()),
        )
        .subcommand(
            Command::new("validate-range")
                .about("Validate numeric bounds")
                .arg(
                    Arg::new("min")
                        .long("min")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64))
                        .help("Lower bound"),
                )
                .arg(
                    Arg::new("max")
                        .long("max")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64))
                        .help("Upper bound"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("submit", args)) => submit(args).await,
        Some(("check", args)) => check(args),
        Some(("validate-range", args)) => {
            let min = args.get_one::<f64>("min").copied();
            let max = args.get_one::<f64>("max").copied();
            match validate_range(min, max) {
                Ok(domain) => {
                    println!("{}", serde_json::to_string_pretty(&domain)?);
                    Ok(())
                }
                Err(e) => bail!("{e}"),
            }
        }
        _ => unreachable!("subcommand_required"),
    }
}

fn check(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("analysis")
        .context("--analysis is required")?;
    let store = AnalysisStore::new(AnalysisFile::load(path)?);
    let reasons = blockers(&store.snapshot());

    if reasons.is_empty() {
        println!("Submission allowed");
        return Ok(());
    }
    println!("Submission blocked:");
    for reason in &reasons {
        println!("  - {reason}");
    }
    bail!("submission blocked");
}

async fn submit(args: &ArgMatches) -> Result<()> {
    let execution = args
        .get_one::<String>("execution")
        .context("--execution is required")?;
    let path = args
        .get_one::<PathBuf>("analysis")
        .context("--analysis is required")?;

    let mut config = match args.get_one::<PathBuf>("config") {
        Some(file) => CfaConfig::from_file(file)?,
        None => CfaConfig::new(),
    };
    if let Some(base_url) = args.get_one::<String>("base-url") {
        config = config.with_base_url(base_url);
        config.validate()?;
    }

    let api = Arc::new(HttpCounterfactualApi::new(&config)?);
    let session = AnalysisSession::with_state(
        api,
        config,
        ExecutionId::new(execution.as_str()),
        AnalysisFile::load(path)?,
    );

    let mut updates = session.subscribe();
    let job = session.submit().await?;
    tracing::info!("Following job {}", job);

    let state = loop {
        if updates.borrow_and_update().status.execution_status.is_terminal() {
            break session.snapshot();
        }
        tokio::select! {
            changed = updates.changed() => changed.context("analysis store closed")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted; abandoning job {}", job);
                session.orchestrator().shutdown();
                bail!("interrupted");
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&state.results)?);

    if state.status.execution_status == CounterfactualStatus::Failed {
        bail!(
            "search failed: {}",
            state.status.error.as_deref().unwrap_or("unknown error")
        );
    }
    tracing::info!(
        "Search completed with {} valid solution(s)",
        state.valid_solution_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn check_file(contents: &str) -> Result<()> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let matches = cli()
            .try_get_matches_from(["cfa", "check", "--analysis", file.path().to_str().unwrap()])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        check(args)
    }

    #[test]
    fn blocked_check_returns_error() {
        let err = check_file(
            r#"{
                "outcomes": [{"id": "o-1", "name": "Approved", "value": false}],
                "inputs": [{"name": "Score", "value": 620}]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "submission blocked");
    }

    #[test]
    fn unreadable_analysis_is_reported() {
        let err = check_file("not json").unwrap_err();
        assert!(err.to_string().contains("failed to parse analysis"));
    }
}
