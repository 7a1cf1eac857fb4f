//! # OCPP Central System
//!
//! An OCPP 1.6-J central system: a WebSocket server that speaks the
//! OCPP-J message layer to connected charge points, persists their
//! telemetry, and lets an operator drive RemoteStartTransaction,
//! RemoteStopTransaction, and ChangeAvailability against a live session.
//!
//! ## Layout
//!
//! - **support**: cross-cutting utilities (wire framing, time, shutdown)
//! - **domain**: core entities, the authorize predicate, the repository trait (C2)
//! - **application**: dispatch, connection registry, handlers, operator commands
//! - **infrastructure**: the SeaORM-backed repository implementation
//! - **interfaces**: the WebSocket transport
//! - **config**: process configuration (C9)

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod support;

pub use config::Config;
pub use infrastructure::{init_database, SeaOrmRepositories};

/// End-to-end scenarios from the specification's testable-properties list,
/// run against the real registry, dispatch table, command sender, and a
/// SQLite-backed repository. The WebSocket boundary is replaced by the
/// `mpsc` channel `Connection` already wraps, per the spec's test-tooling
/// guidance.
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};
    use tokio::sync::mpsc;

    use crate::application::commands::{remote_start_transaction, remote_stop_transaction, CommandSender};
    use crate::application::registry::{Connection, Lookup, SessionRegistry};
    use crate::application::{dispatch, ProtocolError};
    use crate::config::PoolConfig;
    use crate::domain::{ChargePointRepository, RepositoryProvider, SessionRepository};
    use crate::infrastructure::database::entities::id_tag;
    use crate::{init_database, SeaOrmRepositories};

    async fn test_db() -> sea_orm::DatabaseConnection {
        let pool = PoolConfig {
            max_connections: 1,
            max_overflow: 0,
            connect_timeout: Duration::from_secs(5),
            idle_recycle: Duration::from_secs(60),
        };
        init_database("sqlite::memory:", &pool)
            .await
            .expect("in-memory schema migrates cleanly")
    }

    async fn seed_tag(db: &sea_orm::DatabaseConnection, tag: &str, status: &str, expiry: Option<chrono::DateTime<Utc>>) {
        let now = Utc::now();
        id_tag::ActiveModel {
            id: Default::default(),
            tag: Set(tag.to_string()),
            status: Set(status.to_string()),
            user_name: Set(None),
            user_email: Set(None),
            expiry_date: Set(expiry),
            parent_id_tag: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed tag inserts");
    }

    fn repo(db: sea_orm::DatabaseConnection) -> Arc<dyn RepositoryProvider> {
        Arc::new(SeaOrmRepositories::new(db))
    }

    #[tokio::test]
    async fn boot_and_heartbeat_marks_charge_point_online() {
        let db = test_db().await;
        let repo = repo(db);

        let boot = dispatch(
            &*repo,
            "CP001",
            "BootNotification",
            serde_json::json!({"chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .expect("BootNotification is accepted");
        assert_eq!(boot["status"], "Accepted");

        let row = ChargePointRepository::get(&*repo, "CP001").await.unwrap().expect("row created by boot");
        assert!(row.is_online);
        assert_eq!(row.boot_status.to_string(), "Accepted");

        let heartbeat = dispatch(&*repo, "CP001", "Heartbeat", serde_json::json!({}))
            .await
            .expect("Heartbeat is accepted");
        assert!(heartbeat["currentTime"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn authorize_matrix_matches_seeded_tags() {
        let db = test_db().await;
        let past = Utc::now() - chrono::Duration::days(1);
        seed_tag(&db, "VALID001", "Accepted", None).await;
        seed_tag(&db, "BLOCKED001", "Blocked", None).await;
        seed_tag(&db, "EXPIRED001", "Accepted", Some(past)).await;
        let repo = repo(db);

        async fn authorize_status(repo: &dyn RepositoryProvider, tag: &str) -> String {
            let response = dispatch(repo, "CP001", "Authorize", serde_json::json!({"idTag": tag}))
                .await
                .unwrap();
            response["idTagInfo"]["status"].as_str().unwrap().to_string()
        }

        assert_eq!(authorize_status(&*repo, "VALID001").await, "Accepted");
        assert_eq!(authorize_status(&*repo, "BLOCKED001").await, "Blocked");
        assert_eq!(authorize_status(&*repo, "EXPIRED001").await, "Expired");
        assert_eq!(authorize_status(&*repo, "UNKNOWN").await, "Invalid");
    }

    #[tokio::test]
    async fn full_transaction_computes_energy_consumed() {
        let db = test_db().await;
        seed_tag(&db, "VALID001", "Accepted", None).await;
        let repo = repo(db);

        let start = dispatch(
            &*repo,
            "CP001",
            "StartTransaction",
            serde_json::json!({
                "connectorId": 1,
                "idTag": "VALID001",
                "meterStart": 1000,
                "timestamp": "2024-01-01T10:00:00Z",
            }),
        )
        .await
        .unwrap();
        assert_eq!(start["idTagInfo"]["status"], "Accepted");
        let transaction_id = start["transactionId"].as_i64().unwrap() as i32;

        let stop = dispatch(
            &*repo,
            "CP001",
            "StopTransaction",
            serde_json::json!({
                "transactionId": transaction_id,
                "meterStop": 16000,
                "timestamp": "2024-01-01T11:00:00Z",
                "reason": "Local",
            }),
        )
        .await
        .unwrap();
        // No idTag was supplied, so the response carries no idTagInfo (§4.4).
        assert!(stop["idTagInfo"].is_null());

        let session = repo
            .get_by_transaction_id(transaction_id)
            .await
            .unwrap()
            .expect("session row persisted");
        assert_eq!(session.status.to_string(), "Completed");
        assert_eq!(session.energy_consumed, Some(15.0));
        assert_eq!(session.meter_start, 1000);
        assert_eq!(session.meter_stop, Some(16000));
    }

    #[tokio::test]
    async fn stop_transaction_with_id_tag_resolves_it() {
        let db = test_db().await;
        seed_tag(&db, "VALID001", "Accepted", None).await;
        let repo = repo(db);

        let start = dispatch(
            &*repo,
            "CP001",
            "StartTransaction",
            serde_json::json!({
                "connectorId": 1,
                "idTag": "VALID001",
                "meterStart": 0,
                "timestamp": "2024-01-01T10:00:00Z",
            }),
        )
        .await
        .unwrap();
        let transaction_id = start["transactionId"].as_i64().unwrap() as i32;

        let stop = dispatch(
            &*repo,
            "CP001",
            "StopTransaction",
            serde_json::json!({
                "transactionId": transaction_id,
                "idTag": "VALID001",
                "meterStop": 1000,
                "timestamp": "2024-01-01T11:00:00Z",
            }),
        )
        .await
        .unwrap();
        assert_eq!(stop["idTagInfo"]["status"], "Accepted");
    }

    #[tokio::test]
    async fn unregistered_action_yields_not_implemented() {
        let db = test_db().await;
        let repo = repo(db);
        let err = dispatch(&*repo, "CP001", "GetDiagnostics", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::NotImplemented));
        assert_eq!(err.error_code(), "NotImplemented");
    }

    /// Spins up a fake charge point: a registered connection whose outbound
    /// frames are captured on an mpsc channel and whose next inbound reply is
    /// injected by the test via `command_sender.handle_response`.
    async fn connect_fake_charge_point(
        registry: &Arc<SessionRegistry>,
        cp_id: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(Connection::new(cp_id, tx)).await;
        rx
    }

    #[tokio::test]
    async fn remote_start_happy_path_sends_a_call_and_resolves() {
        let db = test_db().await;
        seed_tag(&db, "VALID001", "Accepted", None).await;
        let repo = repo(db);

        let registry = Arc::new(SessionRegistry::new(repo.clone()));
        let command_sender = Arc::new(CommandSender::new(registry.clone()));
        let mut outbound = connect_fake_charge_point(&registry, "CP001").await;

        let call_future = remote_start_transaction(
            &*repo,
            &*repo,
            &registry,
            &command_sender,
            "CP001",
            "VALID001",
            Some(1),
        );

        let responder = {
            let command_sender = command_sender.clone();
            async move {
                let frame = outbound.recv().await.expect("RemoteStartTransaction Call sent");
                let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
                assert_eq!(parsed[2], "RemoteStartTransaction");
                let unique_id = parsed[1].as_str().unwrap().to_string();
                command_sender.handle_response("CP001", &unique_id, serde_json::json!({"status": "Accepted"}));
            }
        };

        let (result, _) = tokio::join!(call_future, responder);
        assert!(result.success);
        assert_eq!(result.status, "Accepted");
    }

    #[tokio::test]
    async fn remote_stop_across_charge_points_is_rejected_without_a_call() {
        let db = test_db().await;
        seed_tag(&db, "VALID001", "Accepted", None).await;
        let repo = repo(db);

        let started = dispatch(
            &*repo,
            "CP001",
            "StartTransaction",
            serde_json::json!({
                "connectorId": 1,
                "idTag": "VALID001",
                "meterStart": 0,
                "timestamp": "2024-01-01T10:00:00Z",
            }),
        )
        .await
        .unwrap();
        let transaction_id = started["transactionId"].as_i64().unwrap() as i32;

        let registry = Arc::new(SessionRegistry::new(repo.clone()));
        let command_sender = Arc::new(CommandSender::new(registry.clone()));
        let mut cp001_outbound = connect_fake_charge_point(&registry, "CP001").await;
        let mut cp002_outbound = connect_fake_charge_point(&registry, "CP002").await;

        let result = remote_stop_transaction(&*repo, &*repo, &registry, &command_sender, "CP002", transaction_id).await;

        assert!(!result.success);
        assert_eq!(result.status, "Rejected");
        assert!(cp001_outbound.try_recv().is_err());
        assert!(cp002_outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn reconnect_replaces_the_prior_session() {
        let db = test_db().await;
        let repo = repo(db);
        let registry = Arc::new(SessionRegistry::new(repo.clone()));

        let _first = connect_fake_charge_point(&registry, "CP001").await;
        assert_eq!(registry.connected_count(), 1);

        let mut second = connect_fake_charge_point(&registry, "CP001").await;
        assert_eq!(registry.connected_count(), 1, "reconnect replaces, not duplicates");

        let row = ChargePointRepository::get(&*repo, "CP001").await.unwrap().expect("row seeded on register");
        assert!(row.is_online);

        if let Lookup::Connected(conn) = registry.lookup("CP001") {
            conn.send("probe".to_string()).unwrap();
        } else {
            panic!("expected CP001 to be connected");
        }
        assert_eq!(second.recv().await.unwrap(), "probe");
    }
}
