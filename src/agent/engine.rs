//! Plan execution: sequential domain invocations with dependency
//! propagation.
//!
//! Steps run strictly in plan order because later steps frequently
//! consume earlier results. Each step resolves its declared dependency
//! from prior rows (fanning out to a list when multiple upstream rows
//! carry the identifier), invokes its query agent, and appends one
//! record to the execution log. Failures are isolated per step: an
//! erroring agent never aborts the remainder of the plan.

use std::collections::BTreeMap;
use std::time::Instant;

use super::provider::LlmProvider;
use super::query_agent::QueryAgent;
use super::report::{AgentResult, ExecutionOutcome, ExecutionStep, StepRecord};
use crate::audit::{AuditRecord, AuditSink};
use crate::core::{DomainName, FilterMap, FilterValue, Scalar};

/// Runs execution plans against the per-domain query agents.
pub struct ExecutionEngine {
    agents: BTreeMap<DomainName, QueryAgent>,
}

impl ExecutionEngine {
    /// Creates an engine over the given query agents.
    #[must_use]
    pub fn new(agents: BTreeMap<DomainName, QueryAgent>) -> Self {
        Self { agents }
    }

    /// Executes every step of the plan in order, returning per-domain
    /// results and the step-by-step log. Never fails: step errors are
    /// captured into the corresponding [`AgentResult`].
    pub async fn execute(
        &self,
        provider: &dyn LlmProvider,
        plan: &[ExecutionStep],
        original_query: &str,
        audit: &dyn AuditSink,
    ) -> ExecutionOutcome {
        let mut results: BTreeMap<DomainName, AgentResult> = BTreeMap::new();
        let mut execution_log: Vec<StepRecord> = Vec::new();

        for step in plan {
            let mut filters = step.filters.clone();

            if step.agent == DomainName::ShopCore {
                self.resolve_email_filter(provider, &mut filters).await;
            }

            if let Some(ref depends_on) = step.depends_on {
                resolve_dependency(step.agent, depends_on, &mut filters, &results);
            }

            let step_start = Instant::now();
            let result = match self.agents.get(&step.agent) {
                Some(agent) => {
                    let effective = (!filters.is_empty()).then_some(&filters);
                    agent.process(provider, &step.goal, effective).await
                }
                None => AgentResult::failure(
                    step.agent,
                    format!("Agent {} not found", step.agent),
                    0.0,
                ),
            };
            let step_ms = step_start.elapsed().as_secs_f64() * 1000.0;

            let query = result
                .query_executed
                .clone()
                .unwrap_or_else(|| "N/A".to_string());

            audit.emit(&AuditRecord::AgentCall {
                agent: step.agent.as_str(),
                goal: &step.goal,
                filters: serde_json::to_value(&filters).unwrap_or_default(),
                query: &query,
                row_count: result.metadata.row_count,
                execution_time_ms: step_ms,
                error: result.error.as_deref(),
            });

            if let Some(ref error) = result.error {
                tracing::warn!(agent = %step.agent, error = %error, "step failed");
            } else {
                tracing::info!(
                    agent = %step.agent,
                    rows = result.metadata.row_count,
                    elapsed_ms = step_ms,
                    sql = %query,
                    "step completed"
                );
            }

            execution_log.push(StepRecord {
                step: step.step_id,
                agent: step.agent,
                goal: step.goal.clone(),
                depends_on: step.depends_on.clone(),
                filters,
                query,
                row_count: result.metadata.row_count,
                execution_time_ms: step_ms,
                error: result.error.clone(),
            });

            results.insert(step.agent, result);
        }

        ExecutionOutcome {
            results,
            execution_log,
            original_query: original_query.to_string(),
        }
    }

    /// Resolves an `Email` filter into a `UserID` via a side query
    /// before the main ShopCore invocation. On any failure the Email
    /// filter is restored rather than dropped silently.
    async fn resolve_email_filter(&self, provider: &dyn LlmProvider, filters: &mut FilterMap) {
        if filters.contains_key("UserID") {
            return;
        }
        let Some(FilterValue::One(Scalar::Text(email))) = filters.remove("Email") else {
            return;
        };

        let Some(agent) = self.agents.get(&DomainName::ShopCore) else {
            filters.insert("Email".to_string(), FilterValue::text(email));
            return;
        };

        let goal = format!("Find user with email {email}");
        let side = agent.process(provider, &goal, None).await;

        if side.error.is_none() {
            if let Some(user_id) = side
                .rows
                .first()
                .and_then(|row| row.get("UserID"))
                .and_then(serde_json::Value::as_i64)
            {
                tracing::info!(user_id, email = %email, "resolved UserID from email");
                filters.insert("UserID".to_string(), FilterValue::int(user_id));
                return;
            }
            tracing::warn!(email = %email, "email lookup returned no usable UserID");
        } else {
            tracing::warn!(
                email = %email,
                error = side.error.as_deref().unwrap_or(""),
                "email lookup failed"
            );
        }
        filters.insert("Email".to_string(), FilterValue::text(email));
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolves a `depends_on` reference into a concrete filter.
///
/// `"A.F or B.F"` tries each alternative in order and takes the first
/// that yields a usable upstream result. A reference without a dot is
/// ignored: it names no upstream agent, and failing here would be
/// noisier than the silent skip the rest of the system expects.
fn resolve_dependency(
    target: DomainName,
    depends_on: &str,
    filters: &mut FilterMap,
    results: &BTreeMap<DomainName, AgentResult>,
) {
    if depends_on.contains(" or ") {
        for alternative in depends_on.split(" or ").map(str::trim) {
            if alternative.contains('.') && resolve_single(target, alternative, filters, results) {
                return;
            }
        }
    } else if depends_on.contains('.') {
        resolve_single(target, depends_on, filters, results);
    }
}

/// Resolves one `"Agent.Field"` reference. Returns whether a filter
/// was set.
fn resolve_single(
    target: DomainName,
    reference: &str,
    filters: &mut FilterMap,
    results: &BTreeMap<DomainName, AgentResult>,
) -> bool {
    let Some((source_name, field)) = reference.split_once('.') else {
        return false;
    };
    let Some(source) = DomainName::parse(source_name) else {
        tracing::warn!(reference, "dependency names an unknown agent");
        return false;
    };
    let Some(source_result) = results.get(&source) else {
        return false;
    };
    if let Some(ref error) = source_result.error {
        // Proceed without the resolved filter rather than aborting.
        tracing::warn!(source = %source, error = %error, "dependency source failed");
        return false;
    }
    if source_result.rows.is_empty() {
        return false;
    }

    // Identifiers that can appear in multiple upstream rows fan out to
    // a list; everything else takes the first row.
    if field == "OrderID" {
        let values: Vec<Scalar> = source_result
            .rows
            .iter()
            .filter_map(|row| row.get(field))
            .filter_map(Scalar::from_json)
            .collect();

        let key = if target == DomainName::CareDesk {
            "ReferenceID"
        } else {
            "OrderID"
        };

        let all_same = values.windows(2).all(|pair| pair[0] == pair[1]);
        let value = if all_same {
            values.first().cloned().map(FilterValue::One)
        } else {
            Some(FilterValue::Many(values))
        };

        if let Some(value) = value {
            filters.insert(key.to_string(), value);
            return true;
        }
        return false;
    }

    let Some(value) = source_result
        .rows
        .first()
        .and_then(|row| row.get(field))
        .and_then(Scalar::from_json)
    else {
        return false;
    };
    filters.insert(field.to_string(), FilterValue::One(value));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Row;

    fn rows_with_order_ids(ids: &[i64]) -> Vec<Row> {
        ids.iter()
            .map(|id| {
                let mut row = Row::new();
                row.insert("OrderID".to_string(), serde_json::json!(id));
                row
            })
            .collect()
    }

    fn results_with(
        domain: DomainName,
        result: AgentResult,
    ) -> BTreeMap<DomainName, AgentResult> {
        let mut results = BTreeMap::new();
        results.insert(domain, result);
        results
    }

    #[test]
    fn test_fan_out_multiple_order_ids_become_list() {
        let results = results_with(
            DomainName::ShopCore,
            AgentResult::success(
                DomainName::ShopCore,
                "SELECT".to_string(),
                rows_with_order_ids(&[4, 7]),
                1.0,
            ),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::ShipStream,
            "ShopCore.OrderID",
            &mut filters,
            &results,
        );
        assert_eq!(
            filters.get("OrderID"),
            Some(&FilterValue::Many(vec![Scalar::Int(4), Scalar::Int(7)]))
        );
    }

    #[test]
    fn test_single_order_id_stays_scalar() {
        let results = results_with(
            DomainName::ShopCore,
            AgentResult::success(
                DomainName::ShopCore,
                "SELECT".to_string(),
                rows_with_order_ids(&[4]),
                1.0,
            ),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::PayGuard,
            "ShopCore.OrderID",
            &mut filters,
            &results,
        );
        assert_eq!(filters.get("OrderID"), Some(&FilterValue::int(4)));
    }

    #[test]
    fn test_caredesk_order_id_fans_out_to_reference_id() {
        let results = results_with(
            DomainName::ShopCore,
            AgentResult::success(
                DomainName::ShopCore,
                "SELECT".to_string(),
                rows_with_order_ids(&[4, 7]),
                1.0,
            ),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::CareDesk,
            "ShopCore.OrderID",
            &mut filters,
            &results,
        );
        assert_eq!(
            filters.get("ReferenceID"),
            Some(&FilterValue::Many(vec![Scalar::Int(4), Scalar::Int(7)]))
        );
        assert!(!filters.contains_key("OrderID"));
    }

    #[test]
    fn test_failed_source_leaves_filters_untouched() {
        let results = results_with(
            DomainName::ShopCore,
            AgentResult::failure(DomainName::ShopCore, "boom".to_string(), 1.0),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::ShipStream,
            "ShopCore.OrderID",
            &mut filters,
            &results,
        );
        assert!(filters.is_empty());
    }

    #[test]
    fn test_or_alternatives_take_first_usable() {
        // PayGuard produced nothing; ShopCore did.
        let mut results = results_with(
            DomainName::PayGuard,
            AgentResult::success(DomainName::PayGuard, "SELECT".to_string(), Vec::new(), 1.0),
        );
        results.insert(
            DomainName::ShopCore,
            AgentResult::success(
                DomainName::ShopCore,
                "SELECT".to_string(),
                rows_with_order_ids(&[9]),
                1.0,
            ),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::ShipStream,
            "PayGuard.OrderID or ShopCore.OrderID",
            &mut filters,
            &results,
        );
        assert_eq!(filters.get("OrderID"), Some(&FilterValue::int(9)));
    }

    #[test]
    fn test_user_id_dependency_takes_first_row() {
        let mut row_a = Row::new();
        row_a.insert("UserID".to_string(), serde_json::json!(1));
        let mut row_b = Row::new();
        row_b.insert("UserID".to_string(), serde_json::json!(2));

        let results = results_with(
            DomainName::ShopCore,
            AgentResult::success(
                DomainName::ShopCore,
                "SELECT".to_string(),
                vec![row_a, row_b],
                1.0,
            ),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::CareDesk,
            "ShopCore.UserID",
            &mut filters,
            &results,
        );
        assert_eq!(filters.get("UserID"), Some(&FilterValue::int(1)));
    }

    #[test]
    fn test_dotless_reference_is_ignored() {
        let results = BTreeMap::new();
        let mut filters = FilterMap::new();
        resolve_dependency(DomainName::ShipStream, "OrderID", &mut filters, &results);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_repeated_order_id_collapses_to_scalar() {
        let results = results_with(
            DomainName::ShopCore,
            AgentResult::success(
                DomainName::ShopCore,
                "SELECT".to_string(),
                rows_with_order_ids(&[4, 4]),
                1.0,
            ),
        );
        let mut filters = FilterMap::new();
        resolve_dependency(
            DomainName::ShipStream,
            "ShopCore.OrderID",
            &mut filters,
            &results,
        );
        assert_eq!(filters.get("OrderID"), Some(&FilterValue::int(4)));
    }
}
