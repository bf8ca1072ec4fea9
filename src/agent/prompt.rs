//! System prompts and template builders for agents.
//!
//! Prompts are the core instructions that define each agent's behavior.
//! Template builders format user messages with query context, schema
//! text, and filter sets. All generated output is treated as untrusted
//! text: code fences are stripped before interpretation.

use std::fmt::Write;

use super::domains::DomainProfile;
use super::report::{AgentResult, CollectedInfo};
use crate::core::{DomainName, FilterMap};

/// System prompt for the intent-parsing agent.
///
/// The keyword-to-domain heuristics embedded here are duplicated in
/// the deterministic fallback
/// ([`fallback_agents`](super::parser::fallback_agents)) so a failed
/// generation degrades to the same routing behavior.
pub const INTENT_SYSTEM_PROMPT: &str = r#"Analyze the customer query and identify which database agents are needed.

Available agents:
- ShopCore: Users, Products, Orders
- ShipStream: Shipments, Tracking, Warehouses (use for tracking, delivery status, return shipments)
- PayGuard: Wallets, Transactions, Payment Methods (use for payments, refunds, transactions, payment methods)
- CareDesk: Tickets, Messages, Satisfaction Surveys (use for support tickets, customer service)

IMPORTANT:
- If query mentions "refund", "payment", "transaction", "paid", "charge", "billing" -> include PayGuard
- If query mentions "tracking", "shipment", "delivery", "package", "shipping" -> include ShipStream
- If query mentions "ticket", "support", "complaint", "satisfaction", "rating" -> include CareDesk
- If query mentions "order", "product", "user", "premium" -> include ShopCore

Extract entities from the query:
- product_name: Product names mentioned (e.g., "Gaming Monitor", "headphones")
- order_id: Order IDs mentioned (numbers)
- user_id: User IDs mentioned
- email: Email addresses mentioned
- premium_status: Whether user mentions being premium

Respond in JSON format:
{
    "agents": ["ShopCore", "ShipStream", "PayGuard"],
    "intent": "Find order status, tracking, and refund information",
    "entities": {
        "product_name": "Gaming Monitor",
        "order_id": null,
        "user_id": null,
        "email": null,
        "premium_status": false
    },
    "dependencies": [
        {
            "agent": "ShipStream",
            "requires": "ShopCore.OrderID",
            "description": "Need OrderID from ShopCore to query shipments"
        },
        {
            "agent": "PayGuard",
            "requires": "ShopCore.OrderID",
            "description": "Need OrderID from ShopCore to query refund transactions"
        }
    ]
}

Only return the JSON, nothing else."#;

/// System prompt for the response synthesizer.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a customer service assistant. \
Based on the provided query and database results, provide a clear, helpful response \
to the customer.\n\n\
Provide a natural, conversational response that directly answers the customer's \
question. Be specific with details from the results. If there are errors or missing \
data, mention that politely. Use markdown formatting for emphasis (e.g., **bold** \
for important information).";

/// Builds the system prompt for one domain's SQL-generation agent.
#[must_use]
pub fn build_sql_system_prompt(profile: &DomainProfile) -> String {
    format!(
        "You are a SQL expert for the {} database.\n\n{}\n\n{}",
        profile.domain,
        profile.rules(),
        profile.guidelines()
    )
}

/// Builds the user message for one domain's SQL-generation agent.
///
/// The filters line uses an imperative directive for domains whose
/// models tend to drop provided filters.
#[must_use]
pub fn build_sql_user_prompt(
    profile: &DomainProfile,
    schema: &str,
    goal: &str,
    filters: Option<&FilterMap>,
) -> String {
    let mut prompt = format!("Database Schema:\n{schema}\n\nTask: {goal}\n");

    if let Some(filters) = filters.filter(|f| !f.is_empty()) {
        let rendered = serde_json::to_string(filters).unwrap_or_else(|_| "{}".to_string());
        if profile.filters_are_mandatory() {
            let _ = write!(
                prompt,
                "\nCRITICAL - You MUST use these filters in your WHERE clause: {rendered}\n"
            );
        } else {
            let _ = write!(prompt, "\nAdditional filters: {rendered}\n");
        }
    }

    prompt.push_str("\nSQL Query:");
    prompt
}

/// Builds the user message for the intent-parsing agent.
#[must_use]
pub fn build_parse_prompt(query: &str, collected: Option<&CollectedInfo>) -> String {
    let mut prompt = format!("Query: \"{query}\"\n");

    if let Some(info) = collected.filter(|c| !c.is_empty()) {
        prompt.push_str("\nAdditional info:\n");
        if let Some(order_id) = info.order_id {
            let _ = writeln!(prompt, "OrderID: {order_id}");
        }
        if let Some(ref email) = info.email {
            let _ = writeln!(prompt, "Email: {email}");
        }
        for (field, value) in &info.extra {
            let _ = writeln!(prompt, "{field}: {value}");
        }
    }

    prompt
}

/// Maximum sample rows rendered per domain in the synthesis context.
const MAX_SAMPLE_ROWS: usize = 5;

/// Builds the user message for the synthesizer from per-domain results.
///
/// Each domain contributes either its error or its row count plus up to
/// [`MAX_SAMPLE_ROWS`] sample rows rendered as JSON.
#[must_use]
pub fn build_synthesis_prompt<'a>(
    query: &str,
    results: impl IntoIterator<Item = (&'a DomainName, &'a AgentResult)>,
) -> String {
    let mut context = format!("User Query: {query}\n\nAgent Results:\n");

    for (domain, result) in results {
        if let Some(ref error) = result.error {
            let _ = writeln!(context, "{domain}: Error - {error}");
        } else if result.rows.is_empty() {
            let _ = writeln!(context, "{domain}: No results found");
        } else {
            let _ = writeln!(context, "{domain}: Found {} result(s)", result.metadata.row_count);
            for (i, row) in result.rows.iter().take(MAX_SAMPLE_ROWS).enumerate() {
                let rendered = serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string());
                let _ = writeln!(context, "  Result {}: {rendered}", i + 1);
            }
        }
    }

    context.push_str("\nResponse:");
    context
}
