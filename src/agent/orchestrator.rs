//! Orchestrator for the multi-domain query pipeline.
//!
//! Coordinates the full flow: parse → detect missing info →
//! (conditionally) collect from the user → re-parse → plan → execute →
//! synthesize. All state is owned by the caller-constructed
//! orchestrator and lives only for the duration of one
//! [`Orchestrator::process_query`] call.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::collect::{UserInput, collect};
use super::config::OrchestratorConfig;
use super::engine::ExecutionEngine;
use super::missing;
use super::parser::IntentParser;
use super::provider::LlmProvider;
use super::query_agent::QueryAgent;
use super::report::{CollectedInfo, QueryReport};
use super::synthesizer::ResponseSynthesizer;
use crate::audit::{AuditRecord, AuditSink};
use crate::core::DomainName;
use crate::storage::DataStore;

/// Fixed reply for empty or whitespace-only input.
const INVALID_QUERY_RESPONSE: &str = "Please provide a valid query.";

/// Coordinates the four query agents behind one conversational entry
/// point.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    parser: IntentParser,
    engine: ExecutionEngine,
    synthesizer: ResponseSynthesizer,
    input: Box<dyn UserInput>,
    audit: Arc<dyn AuditSink>,
    collect_attempts: u32,
}

impl Orchestrator {
    /// Creates an orchestrator over the given provider, per-domain
    /// stores, user-input channel, and audit sink.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        stores: BTreeMap<DomainName, Arc<dyn DataStore>>,
        config: &OrchestratorConfig,
        input: Box<dyn UserInput>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let agents: BTreeMap<DomainName, QueryAgent> = stores
            .into_iter()
            .map(|(domain, store)| (domain, QueryAgent::new(domain, store, config)))
            .collect();

        Self {
            provider,
            parser: IntentParser::new(config),
            engine: ExecutionEngine::new(agents),
            synthesizer: ResponseSynthesizer::new(config),
            input,
            audit,
            collect_attempts: config.collect_attempts,
        }
    }

    /// Processes one query end to end.
    ///
    /// Never fails: invalid input short-circuits with a fixed message,
    /// and every downstream error is folded into the report.
    pub async fn process_query(&self, query: &str) -> QueryReport {
        let start = Instant::now();
        let query = query.trim();

        self.audit.emit(&AuditRecord::UserQuery { query });
        tracing::info!(query, "processing query");

        if query.is_empty() {
            return QueryReport {
                query: query.to_string(),
                parsed_query: None,
                missing_info_collected: None,
                execution_plan: Vec::new(),
                execution_results: None,
                response: INVALID_QUERY_RESPONSE.to_string(),
                total_execution_time_ms: 0.0,
            };
        }

        // Step 1: initial parse.
        let mut parsed = self.parser.parse(&*self.provider, query, None).await;
        self.audit.emit(&AuditRecord::ParsedQuery {
            data: serde_json::to_value(&parsed).unwrap_or_default(),
        });

        // Step 2: detect missing identifiers.
        let report = missing::detect(query, &parsed);
        self.audit.emit(&AuditRecord::MissingInfo {
            data: serde_json::to_value(&report).unwrap_or_default(),
        });

        // Step 3: collect interactively, then re-parse with the
        // collected values taking precedence.
        let mut collected: Option<CollectedInfo> = None;
        if !report.can_proceed {
            tracing::info!(
                required = ?report.required_fields,
                "collecting missing information"
            );
            let info = collect(&report.questions, &*self.input, self.collect_attempts);
            parsed = self
                .parser
                .parse(&*self.provider, query, Some(&info))
                .await;
            self.audit.emit(&AuditRecord::ParsedQuery {
                data: serde_json::to_value(&parsed).unwrap_or_default(),
            });
            collected = Some(info);
        }

        // Step 4: plan.
        let plan = super::planner::plan(&parsed);
        self.audit.emit(&AuditRecord::ExecutionPlan {
            plan: serde_json::to_value(&plan).unwrap_or_default(),
        });
        tracing::info!(steps = plan.len(), "execution plan ready");

        // Step 5: execute.
        let outcome = self
            .engine
            .execute(&*self.provider, &plan, query, &*self.audit)
            .await;

        // Step 6: synthesize.
        let response = self
            .synthesizer
            .synthesize(&*self.provider, &outcome.results, query)
            .await;

        let total_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.audit.emit(&AuditRecord::FinalResponse {
            response: &response,
            total_execution_time_ms: total_ms,
        });
        tracing::info!(elapsed_ms = total_ms, "query complete");

        QueryReport {
            query: query.to_string(),
            parsed_query: Some(parsed),
            missing_info_collected: collected,
            execution_plan: plan,
            execution_results: Some(outcome),
            response,
            total_execution_time_ms: total_ms,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}
