//! Multi-domain query orchestration.
//!
//! Routes a natural-language customer-service query across four
//! independent domain databases, using a language model both to decide
//! which databases are relevant and to translate the query into
//! per-database SQL, then stitches per-database results into one
//! natural-language answer.
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator
//!   ├── IntentParser (domains, intent, entities, dependencies)
//!   ├── missing::detect (required identifiers → questions)
//!   ├── collect (interactive, via injectable UserInput) → re-parse
//!   ├── planner::plan (dependency-aware execution steps)
//!   ├── ExecutionEngine → sequential QueryAgent invocations
//!   │   └── each: prompt → SQL → sanitize → merge filters → execute
//!   └── ResponseSynthesizer → final conversational response
//! ```

pub mod client;
pub mod collect;
pub mod config;
pub mod domains;
pub mod engine;
pub mod message;
pub mod missing;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod query_agent;
pub mod report;
pub mod sql;
pub mod synthesizer;
pub mod traits;

// Re-export key types
pub use collect::{StdinInput, UserInput};
pub use config::OrchestratorConfig;
pub use orchestrator::Orchestrator;
pub use parser::IntentParser;
pub use provider::LlmProvider;
pub use query_agent::QueryAgent;
pub use report::{
    AgentResult, CollectedInfo, Entities, ExecutionOutcome, ExecutionStep, MissingInfoReport,
    ParsedQuery, QueryReport, Question,
};
pub use synthesizer::ResponseSynthesizer;
pub use traits::{Agent, AgentResponse};
