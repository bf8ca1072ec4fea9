//! Query agent: natural-language goal to executed SQL for one domain.
//!
//! One parameterized implementation serves all four domains; the
//! differences (prompt rules, rewrites, repairs) come from the
//! [`DomainProfile`]. Errors never escape [`QueryAgent::process`] —
//! every failure mode is folded into [`AgentResult::failure`] so the
//! execution engine can keep going.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::config::OrchestratorConfig;
use super::domains::{ColumnRepair, DomainProfile};
use super::prompt::{build_sql_system_prompt, build_sql_user_prompt};
use super::provider::LlmProvider;
use super::report::AgentResult;
use super::sql;
use super::traits::Agent;
use crate::core::{DomainName, FilterMap, Row};
use crate::error::OrchestratorError;
use crate::storage::DataStore;

/// Generation-backed agent for one domain's SQL.
struct SqlAgent {
    domain: DomainName,
    models: Vec<String>,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[async_trait]
impl Agent for SqlAgent {
    fn name(&self) -> &'static str {
        self.domain.as_str()
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Translates a goal plus an optional filter set into SQL against one
/// domain's store, executes it, and returns rows or an error result.
pub struct QueryAgent {
    profile: DomainProfile,
    store: Arc<dyn DataStore>,
    agent: SqlAgent,
}

impl QueryAgent {
    /// Creates a query agent for `domain` over the given store.
    #[must_use]
    pub fn new(
        domain: DomainName,
        store: Arc<dyn DataStore>,
        config: &OrchestratorConfig,
    ) -> Self {
        let profile = DomainProfile::for_domain(domain);
        let agent = SqlAgent {
            domain,
            models: config.models.clone(),
            system_prompt: build_sql_system_prompt(&profile),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        };
        Self {
            profile,
            store,
            agent,
        }
    }

    /// The domain this agent serves.
    #[must_use]
    pub const fn domain(&self) -> DomainName {
        self.profile.domain
    }

    /// Processes one goal: generate SQL, sanitize, validate, merge
    /// filters, execute with one deterministic repair, and package the
    /// outcome. Never returns an error; failures are data.
    pub async fn process(
        &self,
        provider: &dyn LlmProvider,
        goal: &str,
        filters: Option<&FilterMap>,
    ) -> AgentResult {
        let start = Instant::now();
        match self.run(provider, goal, filters).await {
            Ok((executed_sql, rows)) => AgentResult::success(
                self.domain(),
                executed_sql,
                rows,
                elapsed_ms(start),
            ),
            Err(message) => AgentResult::failure(self.domain(), message, elapsed_ms(start)),
        }
    }

    async fn run(
        &self,
        provider: &dyn LlmProvider,
        goal: &str,
        filters: Option<&FilterMap>,
    ) -> Result<(String, Vec<Row>), String> {
        let schema = self
            .store
            .schema_text()
            .map_err(|e| format!("Schema introspection failed: {e}"))?;

        let user_msg = build_sql_user_prompt(&self.profile, &schema, goal, filters);
        let response = self
            .agent
            .execute(provider, &user_msg)
            .await
            .map_err(|e| format!("SQL generation failed: {e}"))?;

        let mut statement = sql::strip_markup(&response.content);
        statement = self.profile.normalize(&statement);

        // Placeholders are a hard validation failure, never executed.
        if sql::has_placeholder(&statement) {
            return Err(
                "Invalid SQL query: Parameterized queries (with ?) are not supported. \
                 Please use direct values in WHERE clauses."
                    .to_string(),
            );
        }

        if let Some(error) = self.profile.validate(&statement) {
            return Err(error);
        }

        if let Some(filters) = filters {
            statement = sql::merge_filters(&statement, filters);
        }

        let empty_filters = FilterMap::new();
        let effective_filters = filters.unwrap_or(&empty_filters);
        if let Some(condition) = self
            .profile
            .inject_condition(goal, &statement, effective_filters)
        {
            statement = sql::append_condition(&statement, &condition);
        }

        let mut rows = self.execute_with_repair(&mut statement, goal)?;

        // One retry when an enum-cased literal likely emptied the result.
        if rows.is_empty() {
            if let Some(fixed) = self.profile.empty_result_retry(goal, &statement) {
                if let Ok(retried) = self.store.select(&fixed) {
                    statement = fixed;
                    rows = retried;
                }
            }
        }

        Ok((statement, rows))
    }

    /// Executes the statement; on a "no such column" failure applies
    /// the profile's single deterministic repair and retries once.
    fn execute_with_repair(
        &self,
        statement: &mut String,
        goal: &str,
    ) -> Result<Vec<Row>, String> {
        match self.store.select(statement) {
            Ok(rows) => Ok(rows),
            Err(OrchestratorError::Store { message })
                if message.to_lowercase().contains("no such column") =>
            {
                match self.profile.repair_missing_column(statement, goal, &message) {
                    ColumnRepair::Retry(fixed) => match self.store.select(&fixed) {
                        Ok(rows) => {
                            *statement = fixed;
                            Ok(rows)
                        }
                        Err(retry_err) => Err(format!(
                            "SQL error after fix attempt: {message}. Original query: {fixed}; \
                             retry failed: {retry_err}"
                        )),
                    },
                    ColumnRepair::Fail(remediation) => Err(remediation),
                }
            }
            Err(e) => Err(format!("SQL execution error: {e}")),
        }
    }
}

impl std::fmt::Debug for QueryAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryAgent")
            .field("domain", &self.domain())
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
