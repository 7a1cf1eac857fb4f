//! Connection registry (C5): the process-local map from charge-point id to
//! its live WebSocket session.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::ChargePointRepository;

/// A handle to a connected charge point's write path. Cloning is cheap;
/// every clone shares the same underlying channel.
#[derive(Clone)]
pub struct Connection {
    charge_point_id: String,
    sender: mpsc::UnboundedSender<String>,
    connected_at: NaiveDateTime,
}

impl Connection {
    pub fn new(charge_point_id: impl Into<String>, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            charge_point_id: charge_point_id.into(),
            sender,
            connected_at: Utc::now().naive_utc(),
        }
    }

    pub fn charge_point_id(&self) -> &str {
        &self.charge_point_id
    }

    pub fn connected_at(&self) -> NaiveDateTime {
        self.connected_at
    }

    /// Queue a frame for the write task. Fails only once the socket's write
    /// half has been torn down.
    pub fn send(&self, frame: String) -> Result<(), ()> {
        self.sender.send(frame).map_err(|_| ())
    }
}

/// Process-local mapping `{cp_id -> session}` (C5). The only mutable shared
/// map in the process: the acceptor writes on connect, the connection's
/// finalizer writes on disconnect, and the operator command path (C7) only
/// ever reads.
pub struct SessionRegistry {
    connections: DashMap<String, Connection>,
    charge_points: Arc<dyn ChargePointRepository>,
}

/// Distinguishes "never registered here" from "was here, now isn't" —
/// callers resolving a command target need the distinction (§4.3).
pub enum Lookup {
    Connected(Connection),
    NotInThisProcess,
}

impl SessionRegistry {
    pub fn new(charge_points: Arc<dyn ChargePointRepository>) -> Self {
        Self {
            connections: DashMap::new(),
            charge_points,
        }
    }

    /// Register a newly accepted connection, replacing any prior entry for
    /// the same `cp_id` (reconnect semantics — §4.3). Writes through to the
    /// persistent store.
    pub async fn register(&self, connection: Connection) {
        let cp_id = connection.charge_point_id().to_string();
        let replaced = self.connections.insert(cp_id.clone(), connection);
        if replaced.is_some() {
            info!(charge_point_id = %cp_id, "replaced prior connection on reconnect");
        }

        let now = Utc::now().naive_utc();
        let had_row = matches!(self.charge_points.get(&cp_id).await, Ok(Some(_)));
        if let Err(e) = self.charge_points.set_online(&cp_id, true, now).await {
            warn!(charge_point_id = %cp_id, error = %e, "failed to mark charge point online");
        }
        if !had_row {
            if let Err(e) = self
                .charge_points
                .set_status(&cp_id, crate::domain::OcppStatus::Available, now)
                .await
            {
                warn!(charge_point_id = %cp_id, error = %e, "failed to seed default status");
            }
        }
    }

    /// Remove the in-memory entry and mark the charge point offline. Called
    /// unconditionally from the connection finalizer, so it must tolerate
    /// there being no in-memory entry left to remove.
    pub async fn unregister(&self, cp_id: &str) {
        self.connections.remove(cp_id);
        let now = Utc::now().naive_utc();
        if let Err(e) = self.charge_points.set_online(cp_id, false, now).await {
            warn!(charge_point_id = %cp_id, error = %e, "failed to mark charge point offline");
        }
    }

    /// Authoritative liveness check for the outbound command path (§4.3).
    pub fn lookup(&self, cp_id: &str) -> Lookup {
        match self.connections.get(cp_id) {
            Some(entry) => Lookup::Connected(entry.clone()),
            None => Lookup::NotInThisProcess,
        }
    }

    pub fn is_connected(&self, cp_id: &str) -> bool {
        self.connections.contains_key(cp_id)
    }

    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }
}
