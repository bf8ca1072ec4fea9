//! CLI command execution.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::agent::client::create_provider;
use crate::agent::collect::StdinInput;
use crate::agent::{Orchestrator, OrchestratorConfig, QueryReport};
use crate::audit::{AuditSink, JsonlAudit, NoopAudit};
use crate::cli::parser::{Cli, Commands};
use crate::core::DomainName;
use crate::error::OrchestratorError;
use crate::storage::{DataStore, SqliteStore};

/// Executes the parsed CLI command.
///
/// # Errors
///
/// Returns an error for configuration problems (missing API key,
/// unknown domain, unreadable database); query-level failures are
/// reported inside the response instead.
pub async fn execute(cli: Cli) -> Result<(), anyhow::Error> {
    match &cli.command {
        Commands::Ask { query } => {
            let (orchestrator, audit) = build_orchestrator(&cli)?;
            let report = orchestrator.process_query(query).await;
            print_report(&cli, &report);
            audit.flush();
            Ok(())
        }
        Commands::Repl => {
            let (orchestrator, audit) = build_orchestrator(&cli)?;
            let result = repl(&cli, &orchestrator).await;
            audit.flush();
            result
        }
        Commands::Schema { domain } => {
            let domain = DomainName::parse(domain).ok_or_else(|| {
                OrchestratorError::Orchestration {
                    message: format!(
                        "Unknown domain '{domain}'. Expected one of: ShopCore, ShipStream, \
                         PayGuard, CareDesk."
                    ),
                }
            })?;
            let config = build_config(&cli)?;
            let store = open_store(&config, domain)?;
            println!("{}", store.schema_text()?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> Result<OrchestratorConfig, OrchestratorError> {
    let mut builder = OrchestratorConfig::builder().from_env();
    if let Some(ref db_dir) = cli.db_dir {
        builder = builder.db_dir(db_dir.clone());
    }
    if let Some(ref log_dir) = cli.log_dir {
        builder = builder.log_dir(log_dir.clone());
    }
    if let Some(ref models) = cli.models {
        builder = builder.models(models.clone());
    }
    builder.build()
}

fn open_store(
    config: &OrchestratorConfig,
    domain: DomainName,
) -> Result<Arc<SqliteStore>, OrchestratorError> {
    let path = config.db_dir.join(domain.db_file());
    Ok(Arc::new(SqliteStore::open(path)?))
}

fn build_orchestrator(cli: &Cli) -> Result<(Orchestrator, Arc<dyn AuditSink>), anyhow::Error> {
    let config = build_config(cli)?;
    let provider: Arc<dyn crate::agent::LlmProvider> = Arc::from(create_provider(&config)?);

    let mut stores: BTreeMap<DomainName, Arc<dyn DataStore>> = BTreeMap::new();
    for domain in DomainName::ALL {
        stores.insert(domain, open_store(&config, domain)?);
    }

    let audit: Arc<dyn AuditSink> = match config.log_dir {
        Some(ref dir) => {
            let audit = JsonlAudit::open(dir)?;
            tracing::info!(path = %audit.path().display(), "audit log opened");
            Arc::new(audit)
        }
        None => Arc::new(NoopAudit),
    };

    let orchestrator = Orchestrator::new(
        provider,
        stores,
        &config,
        Box::new(StdinInput),
        Arc::clone(&audit),
    );
    Ok((orchestrator, audit))
}

async fn repl(cli: &Cli, orchestrator: &Orchestrator) -> Result<(), anyhow::Error> {
    println!("Omniroute interactive mode. Type a query, or 'exit' to quit.");
    let stdin = std::io::stdin();
    loop {
        print!("\nquery> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        let report = orchestrator.process_query(query).await;
        print_report(cli, &report);
    }
    Ok(())
}

fn print_report(cli: &Cli, report: &QueryReport) {
    if cli.format == "json" {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize report: {e}"),
        }
        return;
    }

    println!("\n{}", report.response);

    if cli.verbose {
        if let Some(ref outcome) = report.execution_results {
            println!("\n--- execution log ---");
            for record in &outcome.execution_log {
                let status = record
                    .error
                    .as_deref()
                    .map_or_else(|| format!("{} rows", record.row_count), |e| format!("error: {e}"));
                println!(
                    "  step {} [{}] {:.2}ms  {}  sql: {}",
                    record.step, record.agent, record.execution_time_ms, status, record.query
                );
            }
            println!("total: {:.2}ms", report.total_execution_time_ms);
        }
    }
}
