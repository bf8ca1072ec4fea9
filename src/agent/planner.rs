//! Execution planning: dependency-aware ordering of domain invocations.
//!
//! Domains with no declared dependency run first, in their listed
//! order. Declared dependencies are then resolved iteratively, bounded
//! by a fixed pass ceiling so a dependency cycle cannot loop forever;
//! anything still unscheduled after that is appended unconditionally
//! with no dependency. Filters and goals are derived once, at planning
//! time, from the extracted entities.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::report::{Entities, ExecutionStep, ParsedQuery};
use crate::core::{DomainName, FilterMap, FilterValue};

/// Pass ceiling for iterative dependency resolution.
const MAX_RESOLUTION_PASSES: usize = 10;

/// Builds an execution plan from a parsed query.
///
/// `step_id` values form a gap-free increasing sequence starting at 1;
/// a step's dependency source, when declared, is always scheduled
/// earlier than the step itself (or the dependency is dropped and the
/// domain appended at the end).
#[must_use]
pub fn plan(parsed: &ParsedQuery) -> Vec<ExecutionStep> {
    let mut steps: Vec<ExecutionStep> = Vec::new();
    let mut completed: BTreeSet<DomainName> = BTreeSet::new();

    let dependents: BTreeSet<DomainName> =
        parsed.dependencies.iter().map(|dep| dep.agent).collect();

    // Independents first, in listed order.
    for &agent in &parsed.agents {
        if !dependents.contains(&agent) {
            push_step(&mut steps, agent, None, parsed);
            completed.insert(agent);
        }
    }

    // Iteratively schedule dependents whose upstream domain is done.
    // A requirement with no dot (or an empty one) is treated as
    // immediately satisfiable.
    let mut remaining: Vec<_> = parsed.dependencies.clone();
    for _ in 0..MAX_RESOLUTION_PASSES {
        if remaining.is_empty() {
            break;
        }
        remaining.retain(|dep| {
            let satisfiable = if dep.requires.contains('.') {
                // An upstream that never completes (including a name
                // that is not a known domain) keeps the dependency
                // unscheduled; the final sweep picks the domain up.
                dep.requires
                    .split('.')
                    .next()
                    .and_then(DomainName::parse)
                    .is_some_and(|upstream| completed.contains(&upstream))
            } else {
                true
            };
            if satisfiable {
                push_step(&mut steps, dep.agent, Some(dep.requires.clone()), parsed);
                completed.insert(dep.agent);
            }
            !satisfiable
        });
    }

    // Anything requested but never scheduled (cyclic or unresolvable
    // dependency) runs last with no dependency.
    for &agent in &parsed.agents {
        if !completed.contains(&agent) && !steps.iter().any(|s| s.agent == agent) {
            push_step(&mut steps, agent, None, parsed);
        }
    }

    steps
}

fn push_step(
    steps: &mut Vec<ExecutionStep>,
    agent: DomainName,
    depends_on: Option<String>,
    parsed: &ParsedQuery,
) {
    let step_id = steps.len() + 1;
    steps.push(ExecutionStep {
        agent,
        goal: generate_goal(agent, parsed),
        depends_on,
        step_id,
        filters: filters_for_agent(agent, &parsed.entities),
    });
}

/// Derives the initial filter set for one domain from the extracted
/// entities. The ticket domain maps a known OrderID into its
/// ReferenceID key, since ticket references use a different field name
/// than orders.
#[must_use]
pub fn filters_for_agent(agent: DomainName, entities: &Entities) -> FilterMap {
    let mut filters = FilterMap::new();

    match agent {
        DomainName::ShopCore => {
            if let Some(order_id) = entities.order_id {
                filters.insert("OrderID".to_string(), FilterValue::int(order_id));
            }
            if let Some(user_id) = entities.user_id {
                filters.insert("UserID".to_string(), FilterValue::int(user_id));
            }
            if let Some(ref email) = entities.email {
                // Resolved to a UserID by the engine before the main query.
                filters.insert("Email".to_string(), FilterValue::text(email.clone()));
            }
        }
        DomainName::ShipStream => {
            if let Some(order_id) = entities.order_id {
                filters.insert("OrderID".to_string(), FilterValue::int(order_id));
            }
        }
        DomainName::PayGuard => {
            if let Some(order_id) = entities.order_id {
                filters.insert("OrderID".to_string(), FilterValue::int(order_id));
            }
            if let Some(user_id) = entities.user_id {
                filters.insert("UserID".to_string(), FilterValue::int(user_id));
            }
        }
        DomainName::CareDesk => {
            if let Some(user_id) = entities.user_id {
                filters.insert("UserID".to_string(), FilterValue::int(user_id));
            }
            if let Some(order_id) = entities.order_id {
                filters.insert("ReferenceID".to_string(), FilterValue::int(order_id));
            }
        }
    }

    filters
}

/// Synthesizes the goal phrase for one domain: the overall intent plus
/// qualifier phrases for whichever entities are present.
#[must_use]
pub fn generate_goal(agent: DomainName, parsed: &ParsedQuery) -> String {
    let entities = &parsed.entities;
    let mut goal = if parsed.intent.is_empty() {
        "Process query".to_string()
    } else {
        parsed.intent.clone()
    };

    match agent {
        DomainName::ShopCore => {
            if let Some(ref product) = entities.product_name {
                let _ = write!(goal, " for product {product}");
            }
            if let Some(order_id) = entities.order_id {
                let _ = write!(goal, " for order {order_id}");
            }
            if let Some(user_id) = entities.user_id {
                let _ = write!(goal, " for user {user_id}");
            }
            if let Some(ref email) = entities.email {
                let _ = write!(goal, " for email {email}");
            }
            if entities.premium_status {
                goal.push_str(" with premium status");
            }
        }
        DomainName::ShipStream => {
            goal.push_str(" tracking information");
            if let Some(order_id) = entities.order_id {
                let _ = write!(goal, " for order {order_id}");
            }
        }
        DomainName::PayGuard => {
            goal.push_str(" payment and transaction information");
            if let Some(order_id) = entities.order_id {
                let _ = write!(goal, " for order {order_id}");
            }
        }
        DomainName::CareDesk => {
            goal.push_str(" support ticket information");
            if let Some(order_id) = entities.order_id {
                let _ = write!(goal, " for order {order_id}");
            }
        }
    }

    goal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::report::Dependency;

    fn parsed_with(
        agents: Vec<DomainName>,
        dependencies: Vec<Dependency>,
        entities: Entities,
    ) -> ParsedQuery {
        ParsedQuery {
            agents,
            intent: "Find order status".to_string(),
            entities,
            dependencies,
        }
    }

    fn dep(agent: DomainName, requires: &str) -> Dependency {
        Dependency {
            agent,
            requires: requires.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_step_ids_are_gap_free_from_one() {
        let parsed = parsed_with(
            vec![
                DomainName::ShopCore,
                DomainName::ShipStream,
                DomainName::PayGuard,
            ],
            vec![
                dep(DomainName::ShipStream, "ShopCore.OrderID"),
                dep(DomainName::PayGuard, "ShopCore.OrderID"),
            ],
            Entities::default(),
        );
        let steps = plan(&parsed);
        assert_eq!(steps.len(), 3);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.step_id, i + 1);
        }
    }

    #[test]
    fn test_dependency_source_scheduled_before_dependent() {
        let parsed = parsed_with(
            vec![DomainName::ShipStream, DomainName::ShopCore],
            vec![dep(DomainName::ShipStream, "ShopCore.OrderID")],
            Entities::default(),
        );
        let steps = plan(&parsed);
        let shopcore_pos = steps
            .iter()
            .position(|s| s.agent == DomainName::ShopCore)
            .unwrap_or(usize::MAX);
        let shipstream_pos = steps
            .iter()
            .position(|s| s.agent == DomainName::ShipStream)
            .unwrap_or(usize::MIN);
        assert!(shopcore_pos < shipstream_pos);
        assert_eq!(
            steps[shipstream_pos].depends_on.as_deref(),
            Some("ShopCore.OrderID")
        );
    }

    #[test]
    fn test_dotless_requirement_is_immediately_satisfiable() {
        let parsed = parsed_with(
            vec![DomainName::ShipStream],
            vec![dep(DomainName::ShipStream, "OrderID")],
            Entities::default(),
        );
        let steps = plan(&parsed);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].agent, DomainName::ShipStream);
        assert_eq!(steps[0].depends_on.as_deref(), Some("OrderID"));
    }

    #[test]
    fn test_unresolvable_dependency_appended_without_one() {
        // CareDesk requires PayGuard, which was never requested and
        // never completes.
        let parsed = parsed_with(
            vec![DomainName::CareDesk],
            vec![dep(DomainName::CareDesk, "PayGuard.UserID")],
            Entities::default(),
        );
        let steps = plan(&parsed);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].agent, DomainName::CareDesk);
        assert!(steps[0].depends_on.is_none());
    }

    #[test]
    fn test_caredesk_maps_order_id_to_reference_id() {
        let entities = Entities {
            order_id: Some(3),
            user_id: Some(1),
            ..Entities::default()
        };
        let filters = filters_for_agent(DomainName::CareDesk, &entities);
        assert_eq!(filters.get("ReferenceID"), Some(&FilterValue::int(3)));
        assert_eq!(filters.get("UserID"), Some(&FilterValue::int(1)));
        assert!(!filters.contains_key("OrderID"));
    }

    #[test]
    fn test_shopcore_filters_include_email() {
        let entities = Entities {
            email: Some("alice@example.com".to_string()),
            ..Entities::default()
        };
        let filters = filters_for_agent(DomainName::ShopCore, &entities);
        assert_eq!(
            filters.get("Email"),
            Some(&FilterValue::text("alice@example.com"))
        );
    }

    #[test]
    fn test_user_only_query_plans_single_caredesk_step() {
        let entities = Entities {
            user_id: Some(1),
            ..Entities::default()
        };
        let parsed = ParsedQuery {
            agents: vec![DomainName::CareDesk],
            intent: "Show me all open support tickets for user 1".to_string(),
            entities,
            dependencies: Vec::new(),
        };
        let steps = plan(&parsed);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].agent, DomainName::CareDesk);
        assert_eq!(steps[0].filters.get("UserID"), Some(&FilterValue::int(1)));
        assert!(steps[0].goal.contains("support ticket information"));
    }

    #[test]
    fn test_goal_includes_entity_qualifiers() {
        let entities = Entities {
            product_name: Some("Gaming Monitor".to_string()),
            order_id: Some(4),
            ..Entities::default()
        };
        let parsed = parsed_with(vec![DomainName::ShopCore], Vec::new(), entities);
        let goal = generate_goal(DomainName::ShopCore, &parsed);
        assert!(goal.starts_with("Find order status"));
        assert!(goal.contains("for product Gaming Monitor"));
        assert!(goal.contains("for order 4"));
    }
}
