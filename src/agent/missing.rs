//! Missing-information detection.
//!
//! Inspects the parsed query against domain-specific rules to decide
//! whether required identifiers are absent, and produces a prioritized
//! list of clarifying questions. Email questions always outrank
//! OrderID questions: an OrderID alone cannot disambiguate a premium
//! account, while an email can.

use regex::Regex;

use super::report::{MissingInfoReport, ParsedQuery, Question, RequiredField};
use crate::core::DomainName;

const PRODUCT_KEYWORDS: [&str; 7] = [
    "product",
    "item",
    "monitor",
    "headphone",
    "keyboard",
    "mouse",
    "ordered",
];

const PREMIUM_KEYWORDS: [&str; 4] = [
    "premium",
    "premium user",
    "premium member",
    "premium status",
];

/// Phrases marking a multi-item request that can be served without a
/// single OrderID.
const MULTI_ITEM_PHRASES: [&str; 8] = [
    "all my",
    "all orders",
    "all products",
    "show me all",
    "list all",
    "what products",
    "available products",
    "products in",
];

/// Detects missing required identifiers and builds clarifying
/// questions, sorted ascending by priority.
#[must_use]
pub fn detect(query: &str, parsed: &ParsedQuery) -> MissingInfoReport {
    let mut report = MissingInfoReport {
        can_proceed: true,
        ..MissingInfoReport::default()
    };

    let entities = &parsed.entities;
    let query_lower = query.to_lowercase();

    let has_product = entities.product_name.is_some()
        || PRODUCT_KEYWORDS.iter().any(|word| query_lower.contains(word));

    let is_premium_query = PREMIUM_KEYWORDS.iter().any(|word| query_lower.contains(word));

    // OrderID and email stated directly in the text satisfy the
    // requirement without asking.
    let has_order_id_in_query = regex_matches(r"order[_\s]*id[:\s]*(\d+)", &query_lower);
    let has_email_in_query = regex_matches(r"[\w.\-]+@[\w.\-]+\.\w+", query);

    // Rule 1: premium lookups need an account identifier, and email is
    // the one that disambiguates; ask for it first.
    if is_premium_query
        && entities.email.is_none()
        && entities.user_id.is_none()
        && !has_email_in_query
    {
        report.required_fields.push(RequiredField::Email);
        report.questions.push(Question {
            field: RequiredField::Email,
            question: "To look up your premium account information, could you please \
                       provide your email address?"
                .to_string(),
            reason: "Premium user queries require email to identify the account".to_string(),
            priority: 1,
        });
        report.can_proceed = false;
    }

    let is_multi_item_query = MULTI_ITEM_PHRASES
        .iter()
        .any(|phrase| query_lower.contains(phrase))
        || query_lower.contains("category");

    let has_user_id = entities.user_id.is_some()
        || regex_matches(r"user[_\s]*id[:\s]*(\d+)", &query_lower);

    // Multi-item requests, and known-user "all" requests, can be
    // served without a single OrderID.
    let skip_order_id = is_multi_item_query || (has_user_id && query_lower.contains("all"));

    let mut needs_order_id = false;
    let mut order_id_reason = String::new();
    let order_id_known = entities.order_id.is_some() || has_order_id_in_query;

    if !skip_order_id {
        if has_product && !order_id_known {
            needs_order_id = true;
            order_id_reason =
                "Product queries require OrderID to track shipments and payments".to_string();
        }

        if parsed.agents.contains(&DomainName::ShipStream) && !order_id_known && !has_user_id {
            needs_order_id = true;
            if order_id_reason.is_empty() {
                order_id_reason = "Tracking queries require OrderID".to_string();
            }
        }

        if parsed.agents.contains(&DomainName::PayGuard) && !order_id_known && !has_user_id {
            needs_order_id = true;
            if order_id_reason.is_empty() {
                order_id_reason = "Payment queries require OrderID".to_string();
            }
        }
    }

    if needs_order_id && !report.required_fields.contains(&RequiredField::OrderId) {
        // For premium flows the email question must come first; the
        // OrderID question is only added alongside it.
        let email_pending = report.required_fields.contains(&RequiredField::Email);
        if !is_premium_query || email_pending {
            report.required_fields.push(RequiredField::OrderId);
            report.questions.push(Question {
                field: RequiredField::OrderId,
                question: "To help you with your inquiry, could you please provide your \
                           Order ID?"
                    .to_string(),
                reason: if order_id_reason.is_empty() {
                    "This query requires OrderID".to_string()
                } else {
                    order_id_reason
                },
                priority: if is_premium_query { 2 } else { 1 },
            });
            report.can_proceed = false;
        }
    }

    report.questions.sort_by_key(|q| q.priority);
    report
}

fn regex_matches(pattern: &str, text: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(text))
}
