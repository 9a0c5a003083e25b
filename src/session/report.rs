//! Session Reporting
//!
//! Enumeration of stored sessions and the admin reports built on it. Every
//! report reads sessions through the regular `get` path.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use super::record::{SESSION_SOURCE, USER_LOGIN, USER_TYPE};
use super::store::{SessionStore, KEY_PREFIX};
use crate::error::Result;

/// Session counts for one user type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveSessionStats {
    pub total: usize,
    pub per_user: BTreeMap<String, usize>,
}

/// Sessions past their lifetime.
///
/// `idle` is always empty: idle sessions are evicted by the backend's TTL and
/// never show up here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpiredSessions {
    pub expired: Vec<String>,
    pub idle: Vec<String>,
}

impl SessionStore {
    // == List Ids ==
    /// All stored session ids, in no particular order.
    pub async fn list_ids(&mut self) -> Result<Vec<String>> {
        let pattern = format!("{KEY_PREFIX}*");
        let listed = {
            let conn = self.connector.connect().await?;
            conn.keys(&pattern).await
        };

        match listed {
            Ok(keys) => Ok(keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(KEY_PREFIX).map(str::to_string))
                .collect()),
            Err(e) => {
                self.command_failed("KEYS", "*", &e);
                Err(e)
            }
        }
    }

    // == Active Session Stats ==
    /// Counts sessions of `user_type`, leaving out internal API sessions.
    pub async fn active_session_stats(&mut self, user_type: &str) -> Result<ActiveSessionStats> {
        let mut stats = ActiveSessionStats::default();

        for id in self.list_ids().await? {
            let Some(record) = self.get(&id).await else {
                continue;
            };

            if record.get_str(SESSION_SOURCE).as_deref()
                == Some(self.config.internal_source_marker.as_str())
            {
                continue;
            }
            if record.get_str(USER_TYPE).as_deref() != Some(user_type) {
                continue;
            }

            stats.total += 1;
            let login = record.get_str(USER_LOGIN).unwrap_or_default();
            *stats.per_user.entry(login).or_insert(0) += 1;
        }

        Ok(stats)
    }

    // == Expired Ids ==
    /// Sessions older than the max lifetime.
    pub async fn expired_ids(&mut self) -> Result<ExpiredSessions> {
        let max = self.max_lifetime();
        let mut report = ExpiredSessions::default();

        for id in self.list_ids().await? {
            let Some(record) = self.get(&id).await else {
                continue;
            };
            if self.session_age(&record) > max {
                report.expired.push(id);
            }
        }

        Ok(report)
    }

    // == Clear All ==
    /// Flushes the whole selected database. Cannot be undone.
    pub async fn clear_all(&mut self) -> Result<()> {
        let flushed = {
            let conn = self.connector.connect().await?;
            conn.flush_db().await
        };
        if let Err(e) = flushed {
            self.command_failed("FLUSHDB", "*", &e);
            return Err(e);
        }

        self.cache.clear();
        warn!(database = self.config.database_index, "All sessions removed");
        Ok(())
    }

    /// Removes every session past its max lifetime, returning how many went.
    pub async fn remove_expired(&mut self) -> Result<usize> {
        let report = self.expired_ids().await?;
        let mut removed = 0;
        for id in &report.expired {
            if self.remove(id).await.is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Removed expired sessions");
        }
        Ok(removed)
    }
}
