//! Shared fixtures for pipeline tests: a scripted provider double and
//! seeded in-memory domain stores.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use omniroute::agent::message::{ChatRequest, ChatResponse, TokenUsage};
use omniroute::agent::{LlmProvider, Orchestrator, OrchestratorConfig};
use omniroute::audit::NoopAudit;
use omniroute::core::DomainName;
use omniroute::error::OrchestratorError;
use omniroute::storage::{DataStore, SqliteStore};

/// Provider double that replays a fixed queue of responses in order.
pub struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: &[&str]) -> Self {
        let mut queued: Vec<String> = responses.iter().map(ToString::to_string).collect();
        queued.reverse();
        Self {
            responses: Mutex::new(queued),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, OrchestratorError> {
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let content = responses.pop().ok_or(OrchestratorError::ApiRequest {
            message: "script exhausted".to_string(),
            status: None,
        })?;
        Ok(ChatResponse {
            content,
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }
}

fn seeded(batch: &str) -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().unwrap_or_else(|_| unreachable!());
    store.execute_batch(batch).unwrap_or_else(|_| unreachable!());
    Arc::new(store)
}

pub fn shopcore_store() -> Arc<SqliteStore> {
    seeded(
        "CREATE TABLE Users (
             UserID INTEGER PRIMARY KEY,
             Name TEXT NOT NULL,
             Email TEXT NOT NULL,
             PremiumStatus INTEGER
         );
         CREATE TABLE Products (
             ProductID INTEGER PRIMARY KEY,
             Name TEXT NOT NULL,
             Category TEXT,
             Price REAL
         );
         CREATE TABLE Orders (
             OrderID INTEGER PRIMARY KEY,
             UserID INTEGER NOT NULL,
             ProductID INTEGER NOT NULL,
             OrderDate TEXT,
             Status TEXT
         );
         INSERT INTO Users VALUES (1, 'Alice', 'alice@example.com', 1);
         INSERT INTO Users VALUES (2, 'Bob', 'bob@example.com', 0);
         INSERT INTO Products VALUES (2, 'Gaming Monitor', 'Electronics', 349.99);
         INSERT INTO Products VALUES (3, 'Wireless Mouse', 'Electronics', 29.99);
         INSERT INTO Orders VALUES (4, 1, 2, '2025-06-01', 'In Transit');
         INSERT INTO Orders VALUES (7, 1, 3, '2025-06-10', 'Processing');
         INSERT INTO Orders VALUES (9, 2, 3, '2025-05-20', 'Delivered');",
    )
}

pub fn shipstream_store() -> Arc<SqliteStore> {
    seeded(
        "CREATE TABLE Shipments (
             ShipmentID INTEGER PRIMARY KEY,
             OrderID INTEGER NOT NULL,
             TrackingNumber TEXT,
             EstimatedArrival TEXT,
             Status TEXT
         );
         CREATE TABLE Warehouses (
             WarehouseID INTEGER PRIMARY KEY,
             Location TEXT,
             ManagerName TEXT
         );
         CREATE TABLE TrackingEvents (
             EventID INTEGER PRIMARY KEY,
             ShipmentID INTEGER NOT NULL,
             WarehouseID INTEGER,
             Timestamp TEXT,
             StatusUpdate TEXT
         );
         INSERT INTO Shipments VALUES (1, 4, 'TRK-0004', '2025-06-15', 'In Transit');
         INSERT INTO Shipments VALUES (2, 7, 'TRK-0007', '2025-06-20', 'Processing');
         INSERT INTO Shipments VALUES (3, 9, 'TRK-0009', '2025-05-25', 'Delivered');",
    )
}

pub fn payguard_store() -> Arc<SqliteStore> {
    seeded(
        "CREATE TABLE Wallets (
             WalletID INTEGER PRIMARY KEY,
             UserID INTEGER NOT NULL,
             Balance REAL,
             Currency TEXT
         );
         CREATE TABLE Transactions (
             TransactionID INTEGER PRIMARY KEY,
             WalletID INTEGER NOT NULL,
             OrderID INTEGER,
             Amount REAL,
             Type TEXT,
             Timestamp TEXT
         );
         CREATE TABLE PaymentMethods (
             MethodID INTEGER PRIMARY KEY,
             WalletID INTEGER NOT NULL,
             Provider TEXT,
             ExpiryDate TEXT
         );
         INSERT INTO Wallets VALUES (1, 1, 120.50, 'USD');
         INSERT INTO Transactions VALUES (1, 1, 4, 349.99, 'Purchase', '2025-06-01');
         INSERT INTO Transactions VALUES (2, 1, 4, 349.99, 'Refund', '2025-06-05');",
    )
}

pub fn caredesk_store() -> Arc<SqliteStore> {
    seeded(
        "CREATE TABLE Tickets (
             TicketID INTEGER PRIMARY KEY,
             UserID INTEGER NOT NULL,
             ReferenceID INTEGER,
             IssueType TEXT,
             Status TEXT,
             CreatedDate TEXT
         );
         CREATE TABLE TicketMessages (
             MessageID INTEGER PRIMARY KEY,
             TicketID INTEGER NOT NULL,
             Sender TEXT,
             Content TEXT,
             Timestamp TEXT
         );
         CREATE TABLE SatisfactionSurveys (
             SurveyID INTEGER PRIMARY KEY,
             TicketID INTEGER NOT NULL,
             Rating INTEGER,
             Comments TEXT
         );
         INSERT INTO Tickets VALUES (1, 1, 4, 'Delivery Delay', 'Open', '2025-06-12');
         INSERT INTO Tickets VALUES (2, 1, 9, 'Refund Request', 'Closed', '2025-05-28');
         INSERT INTO Tickets VALUES (3, 2, 9, 'Damaged Item', 'Open', '2025-05-26');",
    )
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig::builder()
        .api_key("test-key")
        .models(vec!["test/model".to_string()])
        .build()
        .unwrap_or_else(|_| unreachable!())
}

/// Builds an orchestrator over seeded in-memory stores, the given
/// scripted provider, and the given input channel.
pub fn orchestrator(
    provider: ScriptedProvider,
    input: impl Fn(&str) -> String + Send + Sync + 'static,
) -> Orchestrator {
    let mut stores: BTreeMap<DomainName, Arc<dyn DataStore>> = BTreeMap::new();
    stores.insert(DomainName::ShopCore, shopcore_store());
    stores.insert(DomainName::ShipStream, shipstream_store());
    stores.insert(DomainName::PayGuard, payguard_store());
    stores.insert(DomainName::CareDesk, caredesk_store());

    Orchestrator::new(
        Arc::new(provider),
        stores,
        &test_config(),
        Box::new(input),
        Arc::new(NoopAudit),
    )
}
