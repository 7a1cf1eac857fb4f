//! Id tag (RFID credential) domain entity and the authorize predicate.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdTagStatus {
    Accepted,
    Blocked,
    Expired,
    Invalid,
}

impl fmt::Display for IdTagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct IdTag {
    pub id: i32,
    pub tag: String,
    pub status: IdTagStatus,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub expiry_date: Option<NaiveDateTime>,
    pub parent_id_tag: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Outcome of resolving an id tag against §4.4's Authorize predicate.
#[derive(Debug, Clone)]
pub struct IdTagInfo {
    pub status: IdTagStatus,
    pub expiry_date: Option<NaiveDateTime>,
    pub parent_id_tag: Option<String>,
}

impl IdTag {
    /// Resolve this row's effective status at query time.
    ///
    /// Blocked takes precedence over Expired — this check order is the
    /// contract, even though a row could in principle satisfy both.
    pub fn resolve(&self, now: NaiveDateTime) -> IdTagInfo {
        if self.status == IdTagStatus::Blocked {
            return IdTagInfo {
                status: IdTagStatus::Blocked,
                expiry_date: self.expiry_date,
                parent_id_tag: self.parent_id_tag.clone(),
            };
        }
        if let Some(expiry) = self.expiry_date {
            if expiry < now {
                return IdTagInfo {
                    status: IdTagStatus::Expired,
                    expiry_date: Some(expiry),
                    parent_id_tag: self.parent_id_tag.clone(),
                };
            }
        }
        IdTagInfo {
            status: self.status,
            expiry_date: self.expiry_date,
            parent_id_tag: self.parent_id_tag.clone(),
        }
    }
}

/// Resolve an id tag that may not exist at all (row-absent ⇒ Invalid).
pub fn resolve_id_tag(row: Option<&IdTag>, now: NaiveDateTime) -> IdTagInfo {
    match row {
        Some(tag) => tag.resolve(now),
        None => IdTagInfo {
            status: IdTagStatus::Invalid,
            expiry_date: None,
            parent_id_tag: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(status: IdTagStatus, expiry: Option<NaiveDateTime>) -> IdTag {
        let now: NaiveDateTime = "2024-01-01T00:00:00".parse().unwrap();
        IdTag {
            id: 1,
            tag: "TAG001".into(),
            status,
            user_name: None,
            user_email: None,
            expiry_date: expiry,
            parent_id_tag: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn blocked_beats_expired() {
        let now: NaiveDateTime = "2024-06-01T00:00:00".parse().unwrap();
        let past: NaiveDateTime = "2024-01-01T00:00:00".parse().unwrap();
        let row = tag(IdTagStatus::Blocked, Some(past));
        assert_eq!(row.resolve(now).status, IdTagStatus::Blocked);
    }

    #[test]
    fn expired_overrides_accepted_without_rewriting_storage() {
        let now: NaiveDateTime = "2024-06-01T00:00:00".parse().unwrap();
        let past: NaiveDateTime = "2024-01-01T00:00:00".parse().unwrap();
        let row = tag(IdTagStatus::Accepted, Some(past));
        assert_eq!(row.resolve(now).status, IdTagStatus::Expired);
        assert_eq!(row.status, IdTagStatus::Accepted);
    }

    #[test]
    fn missing_row_is_invalid() {
        let now: NaiveDateTime = "2024-06-01T00:00:00".parse().unwrap();
        assert_eq!(resolve_id_tag(None, now).status, IdTagStatus::Invalid);
    }

    #[test]
    fn accepted_with_future_expiry_stays_accepted() {
        let now: NaiveDateTime = "2024-01-01T00:00:00".parse().unwrap();
        let future: NaiveDateTime = "2024-06-01T00:00:00".parse().unwrap();
        let row = tag(IdTagStatus::Accepted, Some(future));
        assert_eq!(row.resolve(now).status, IdTagStatus::Accepted);
    }
}
