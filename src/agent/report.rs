//! Data types flowing through the orchestration pipeline.
//!
//! One query's lifetime produces, in order: a [`ParsedQuery`], a
//! [`MissingInfoReport`], optionally a [`CollectedInfo`], a plan of
//! [`ExecutionStep`]s, per-domain [`AgentResult`]s with a step-by-step
//! execution log, and finally a [`QueryReport`]. All of it is
//! transient; nothing persists past the top-level call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{DomainName, FilterMap, Row};

/// Structured values extracted from free-text user input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    /// Product name mentioned in the query.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Order ID, from the model or from collected info.
    #[serde(default)]
    pub order_id: Option<i64>,
    /// User ID mentioned in the query.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Email address, from the model or from collected info.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the user claims a premium account.
    #[serde(default)]
    pub premium_status: bool,
}

/// A declared cross-domain data dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The domain that needs upstream data.
    pub agent: DomainName,
    /// Requirement in `"Agent.Field"` form, possibly with
    /// `" or "`-separated alternatives. An empty or dot-less string is
    /// treated as immediately satisfiable.
    #[serde(default)]
    pub requires: String,
    /// Human-readable description of the dependency.
    #[serde(default)]
    pub description: String,
}

/// Result of intent parsing: which domains to involve, what the user
/// wants, which entities are known, and how the domains depend on each
/// other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Domains required to answer the query, in model order.
    pub agents: Vec<DomainName>,
    /// Human-readable intent.
    pub intent: String,
    /// Extracted entities; previously collected info is authoritative.
    pub entities: Entities,
    /// Declared cross-domain dependencies.
    pub dependencies: Vec<Dependency>,
}

/// A field the user must supply before the query can proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredField {
    /// An order identifier.
    #[serde(rename = "OrderID")]
    OrderId,
    /// An account email address.
    Email,
    /// Any other free-form field, collected verbatim.
    Other(String),
}

impl RequiredField {
    /// User-facing field label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::OrderId => "OrderID",
            Self::Email => "Email",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clarifying question for the user. Lower priority asks first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Field this question resolves.
    pub field: RequiredField,
    /// Question text shown to the user.
    pub question: String,
    /// Why the field is required.
    pub reason: String,
    /// Ask order; lower number asks first.
    pub priority: u8,
}

/// Result of missing-information detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingInfoReport {
    /// Fields that must be resolved, in detection order.
    pub required_fields: Vec<RequiredField>,
    /// Clarifying questions, sorted ascending by priority.
    pub questions: Vec<Question>,
    /// False iff any question was added.
    pub can_proceed: bool,
}

/// Values collected interactively from the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedInfo {
    /// Collected order ID.
    #[serde(default)]
    pub order_id: Option<i64>,
    /// Collected email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Any other collected fields, keyed by lower-cased field name.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl CollectedInfo {
    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() && self.email.is_none() && self.extra.is_empty()
    }
}

/// One domain invocation within an execution plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Domain to invoke.
    pub agent: DomainName,
    /// Natural-language goal for the query agent.
    pub goal: String,
    /// Dependency reference (`"Agent.Field"`), when this step consumes
    /// upstream output.
    pub depends_on: Option<String>,
    /// 1-based position; assignment order is execution order.
    pub step_id: usize,
    /// Initial filters derived from entities at planning time.
    pub filters: FilterMap,
}

/// Metadata accompanying every agent result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultMeta {
    /// Number of rows returned.
    pub row_count: usize,
    /// Elapsed time for the agent call.
    pub execution_time_ms: f64,
}

/// Result of one query-agent invocation.
///
/// Exactly one of a populated `rows`/`query_executed` pair or `error`
/// is meaningful, but every field is always present with a safe
/// default so downstream consumers never distinguish absence from
/// error by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Domain that produced this result.
    pub agent: DomainName,
    /// SQL actually executed, when execution was reached.
    pub query_executed: Option<String>,
    /// Result rows; empty on error.
    #[serde(default)]
    pub rows: Vec<Row>,
    /// Row count and timing.
    #[serde(default)]
    pub metadata: ResultMeta,
    /// Error message, when the call failed.
    pub error: Option<String>,
}

impl AgentResult {
    /// Builds a successful result.
    #[must_use]
    pub fn success(
        agent: DomainName,
        query: String,
        rows: Vec<Row>,
        execution_time_ms: f64,
    ) -> Self {
        let row_count = rows.len();
        Self {
            agent,
            query_executed: Some(query),
            rows,
            metadata: ResultMeta {
                row_count,
                execution_time_ms,
            },
            error: None,
        }
    }

    /// Builds a failed result with zero rows.
    #[must_use]
    pub fn failure(agent: DomainName, error: String, execution_time_ms: f64) -> Self {
        Self {
            agent,
            query_executed: None,
            rows: Vec::new(),
            metadata: ResultMeta {
                row_count: 0,
                execution_time_ms,
            },
            error: Some(error),
        }
    }

    /// Whether the call failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Log entry for one executed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step ID from the plan.
    pub step: usize,
    /// Domain invoked.
    pub agent: DomainName,
    /// Goal passed to the agent.
    pub goal: String,
    /// Dependency reference carried by the step.
    pub depends_on: Option<String>,
    /// Filters after dependency resolution.
    pub filters: FilterMap,
    /// SQL actually run, or `"N/A"`.
    pub query: String,
    /// Rows returned.
    pub row_count: usize,
    /// Elapsed time for the step.
    pub execution_time_ms: f64,
    /// Error, if the step failed.
    pub error: Option<String>,
}

/// Aggregated results of running an execution plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionOutcome {
    /// Per-domain results, keyed deterministically.
    pub results: BTreeMap<DomainName, AgentResult>,
    /// One record per executed step, in execution order.
    pub execution_log: Vec<StepRecord>,
    /// The original user query.
    pub original_query: String,
}

/// Complete response from the top-level entry point.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    /// The raw user query.
    pub query: String,
    /// Parsed query, when parsing was reached.
    pub parsed_query: Option<ParsedQuery>,
    /// Information collected interactively, when any was requested.
    pub missing_info_collected: Option<CollectedInfo>,
    /// The execution plan that ran.
    pub execution_plan: Vec<ExecutionStep>,
    /// Execution results and log.
    pub execution_results: Option<ExecutionOutcome>,
    /// Final natural-language response. Never empty.
    pub response: String,
    /// Total pipeline time.
    pub total_execution_time_ms: f64,
}
