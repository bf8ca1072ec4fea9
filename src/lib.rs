//! Omniroute: multi-domain customer-service query orchestration.
//!
//! Routes natural-language queries across four independent retail
//! databases (orders/users, shipments, payments, support tickets). A
//! language model decides which domains are relevant and translates
//! the query into per-domain SQL; a dependency-aware execution planner
//! orders the domain invocations, propagates identifiers between
//! steps, and a synthesizer stitches the per-domain results into one
//! conversational answer. Missing required identifiers are resolved
//! interactively through an injectable input channel before planning.

pub mod agent;
pub mod audit;
pub mod cli;
pub mod core;
pub mod error;
pub mod storage;

pub use crate::agent::{Orchestrator, OrchestratorConfig, QueryReport};
pub use crate::core::DomainName;
pub use crate::error::OrchestratorError;
pub use crate::storage::{DataStore, SqliteStore};
