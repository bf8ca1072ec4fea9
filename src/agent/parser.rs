//! Intent parsing: raw query text to a structured [`ParsedQuery`].
//!
//! One generation request asks the model for a JSON object naming the
//! required domains, the intent, extracted entities, and cross-domain
//! dependencies. The decode step is strict-with-defaults: any shape
//! violation falls back to deterministic keyword matching, so parsing
//! never fails the pipeline. Previously collected values always
//! overwrite whatever the model extracted.

use std::time::Duration;

use async_trait::async_trait;

use super::config::OrchestratorConfig;
use super::prompt::{INTENT_SYSTEM_PROMPT, build_parse_prompt};
use super::provider::LlmProvider;
use super::report::{CollectedInfo, Dependency, Entities, ParsedQuery};
use super::sql;
use super::traits::Agent;
use crate::core::DomainName;

/// Keyword fallback for domain routing, mirroring the heuristics
/// embedded in the parse prompt. Defaults to ShopCore when nothing
/// matches.
#[must_use]
pub fn fallback_agents(query: &str) -> Vec<DomainName> {
    let query_lower = query.to_lowercase();
    let mut agents = Vec::new();

    let matches_any =
        |words: &[&str]| words.iter().any(|word| query_lower.contains(word));

    if matches_any(&["order", "product", "user", "premium"]) {
        agents.push(DomainName::ShopCore);
    }
    if matches_any(&["ship", "track", "package", "deliver", "arrival"]) {
        agents.push(DomainName::ShipStream);
    }
    if matches_any(&["pay", "refund", "transaction", "wallet", "payment"]) {
        agents.push(DomainName::PayGuard);
    }
    if matches_any(&["ticket", "support", "satisfaction", "rating", "issue"]) {
        agents.push(DomainName::CareDesk);
    }

    if agents.is_empty() {
        agents.push(DomainName::ShopCore);
    }
    agents
}

/// Wire shape of the model's JSON. Every field is defaulted so a
/// partially well-formed response still decodes.
#[derive(Debug, Default, serde::Deserialize)]
struct ParsedWire {
    #[serde(default)]
    agents: Vec<String>,
    #[serde(default)]
    intent: String,
    #[serde(default)]
    entities: EntitiesWire,
    #[serde(default)]
    dependencies: Vec<DependencyWire>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct EntitiesWire {
    #[serde(default)]
    product_name: serde_json::Value,
    #[serde(default)]
    order_id: serde_json::Value,
    #[serde(default)]
    user_id: serde_json::Value,
    #[serde(default)]
    email: serde_json::Value,
    #[serde(default)]
    premium_status: serde_json::Value,
}

#[derive(Debug, Default, serde::Deserialize)]
struct DependencyWire {
    #[serde(default)]
    agent: String,
    #[serde(default)]
    requires: Option<String>,
    #[serde(default)]
    description: String,
}

/// Models sometimes emit IDs as strings; accept both.
fn coerce_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn coerce_bool(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Generation-backed intent-parsing agent.
struct ParseAgent {
    models: Vec<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[async_trait]
impl Agent for ParseAgent {
    fn name(&self) -> &'static str {
        "parser"
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn system_prompt(&self) -> &str {
        INTENT_SYSTEM_PROMPT
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

/// Extracts required domains, intent, entities, and dependencies from
/// a raw query.
pub struct IntentParser {
    agent: ParseAgent,
}

impl IntentParser {
    /// Creates a parser from orchestrator configuration.
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            agent: ParseAgent {
                models: config.models.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                timeout: config.timeout,
            },
        }
    }

    /// Parses a query, merging previously collected info
    /// authoritatively over model-extracted entities.
    ///
    /// Never fails: generation or decode errors degrade to keyword
    /// routing with collected-info entities.
    pub async fn parse(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        collected: Option<&CollectedInfo>,
    ) -> ParsedQuery {
        let user_msg = build_parse_prompt(query, collected);
        match self.agent.execute(provider, &user_msg).await {
            Ok(response) => decode_parsed(&response.content, query, collected),
            Err(e) => {
                tracing::warn!(error = %e, "intent parsing failed, using keyword fallback");
                keyword_fallback(query, collected)
            }
        }
    }
}

impl std::fmt::Debug for IntentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentParser").finish_non_exhaustive()
    }
}

/// Decodes the model's JSON into a validated [`ParsedQuery`].
///
/// Shape violations (unparseable JSON, unknown agents, empty lists)
/// degrade field-by-field rather than failing the whole decode.
#[must_use]
pub fn decode_parsed(
    content: &str,
    query: &str,
    collected: Option<&CollectedInfo>,
) -> ParsedQuery {
    let json_str = sql::strip_markup(content);

    let Ok(wire) = serde_json::from_str::<ParsedWire>(&json_str) else {
        tracing::warn!("failed to decode parsed-query JSON, using keyword fallback");
        return keyword_fallback(query, collected);
    };

    let mut agents: Vec<DomainName> = wire
        .agents
        .iter()
        .filter_map(|name| DomainName::parse(name))
        .collect();
    if agents.is_empty() {
        agents = fallback_agents(query);
    }

    let mut entities = Entities {
        product_name: coerce_string(&wire.entities.product_name),
        order_id: coerce_id(&wire.entities.order_id),
        user_id: coerce_id(&wire.entities.user_id),
        email: coerce_string(&wire.entities.email),
        premium_status: coerce_bool(&wire.entities.premium_status),
    };
    merge_collected(&mut entities, collected);

    let dependencies: Vec<Dependency> = wire
        .dependencies
        .into_iter()
        .filter_map(|dep| {
            DomainName::parse(&dep.agent).map(|agent| Dependency {
                agent,
                requires: dep.requires.unwrap_or_default(),
                description: dep.description,
            })
        })
        .collect();

    let intent = if wire.intent.trim().is_empty() {
        query.to_string()
    } else {
        wire.intent
    };

    ParsedQuery {
        agents,
        intent,
        entities,
        dependencies,
    }
}

fn keyword_fallback(query: &str, collected: Option<&CollectedInfo>) -> ParsedQuery {
    let mut entities = Entities::default();
    merge_collected(&mut entities, collected);
    ParsedQuery {
        agents: fallback_agents(query),
        intent: query.to_string(),
        entities,
        dependencies: Vec::new(),
    }
}

/// Collected info is authoritative over model-guessed entities.
fn merge_collected(entities: &mut Entities, collected: Option<&CollectedInfo>) {
    if let Some(info) = collected {
        if let Some(order_id) = info.order_id {
            entities.order_id = Some(order_id);
        }
        if let Some(ref email) = info.email {
            entities.email = Some(email.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_agents_keywords() {
        assert_eq!(
            fallback_agents("track my package"),
            vec![DomainName::ShipStream]
        );
        assert_eq!(
            fallback_agents("refund for my order"),
            vec![DomainName::ShopCore, DomainName::PayGuard]
        );
        assert_eq!(
            fallback_agents("open a support ticket"),
            vec![DomainName::CareDesk]
        );
        assert_eq!(fallback_agents("hello there"), vec![DomainName::ShopCore]);
    }

    #[test]
    fn test_decode_valid_json() {
        let content = r#"{
            "agents": ["ShopCore", "ShipStream"],
            "intent": "Find order status and tracking",
            "entities": {"product_name": "Gaming Monitor", "order_id": null, "user_id": null, "email": null, "premium_status": false},
            "dependencies": [{"agent": "ShipStream", "requires": "ShopCore.OrderID", "description": "Need OrderID"}]
        }"#;
        let parsed = decode_parsed(content, "where is my monitor", None);
        assert_eq!(
            parsed.agents,
            vec![DomainName::ShopCore, DomainName::ShipStream]
        );
        assert_eq!(parsed.intent, "Find order status and tracking");
        assert_eq!(parsed.entities.product_name.as_deref(), Some("Gaming Monitor"));
        assert_eq!(parsed.dependencies.len(), 1);
        assert_eq!(parsed.dependencies[0].requires, "ShopCore.OrderID");
    }

    #[test]
    fn test_decode_fenced_json() {
        let content = "```json\n{\"agents\": [\"PayGuard\"], \"intent\": \"refunds\"}\n```";
        let parsed = decode_parsed(content, "refund", None);
        assert_eq!(parsed.agents, vec![DomainName::PayGuard]);
    }

    #[test]
    fn test_decode_invalid_json_falls_back_to_keywords() {
        let parsed = decode_parsed("not json at all", "track my package", None);
        assert_eq!(parsed.agents, vec![DomainName::ShipStream]);
        assert_eq!(parsed.intent, "track my package");
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn test_decode_unknown_agents_filtered_then_fallback() {
        let content = r#"{"agents": ["Mystery", "Unknown"], "intent": "x"}"#;
        let parsed = decode_parsed(content, "refund please", None);
        assert_eq!(parsed.agents, vec![DomainName::PayGuard]);
    }

    #[test]
    fn test_decode_string_order_id_coerced() {
        let content = r#"{"agents": ["ShopCore"], "entities": {"order_id": "42"}}"#;
        let parsed = decode_parsed(content, "order", None);
        assert_eq!(parsed.entities.order_id, Some(42));
    }

    #[test]
    fn test_collected_info_overrides_model_entities() {
        let content = r#"{"agents": ["ShopCore"], "entities": {"order_id": 9, "email": "model@example.com"}}"#;
        let collected = CollectedInfo {
            order_id: Some(4),
            email: Some("alice@example.com".to_string()),
            extra: std::collections::BTreeMap::new(),
        };
        let parsed = decode_parsed(content, "order", Some(&collected));
        assert_eq!(parsed.entities.order_id, Some(4));
        assert_eq!(parsed.entities.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_collected_info_authoritative_across_reparses() {
        let collected = CollectedInfo {
            order_id: Some(4),
            email: None,
            extra: std::collections::BTreeMap::new(),
        };
        let first = decode_parsed(r#"{"agents": ["ShopCore"]}"#, "q", Some(&collected));
        let second = decode_parsed(
            r#"{"agents": ["ShopCore"], "entities": {"order_id": 77}}"#,
            "q",
            Some(&collected),
        );
        assert_eq!(first.entities.order_id, Some(4));
        assert_eq!(second.entities.order_id, Some(4));
    }

    #[test]
    fn test_decode_missing_intent_uses_query() {
        let content = r#"{"agents": ["CareDesk"]}"#;
        let parsed = decode_parsed(content, "any open tickets?", None);
        assert_eq!(parsed.intent, "any open tickets?");
    }

    #[test]
    fn test_decode_dependency_without_requires() {
        let content =
            r#"{"agents": ["ShipStream"], "dependencies": [{"agent": "ShipStream"}]}"#;
        let parsed = decode_parsed(content, "track order", None);
        assert_eq!(parsed.dependencies.len(), 1);
        assert_eq!(parsed.dependencies[0].requires, "");
    }
}
