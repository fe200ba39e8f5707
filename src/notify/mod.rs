//! Notification fan-out.
//!
//! Every notification is persisted and simultaneously pushed to the
//! team's live subscribers over a broadcast channel; the SSE endpoint
//! turns a subscription into an event stream.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core::models::{Notification, NotificationKind, new_id};
use crate::db;
use crate::errors::AppResult;

/// Buffered events per team before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Per-team broadcast registry. Senders are created lazily on first use
/// and kept for the life of the process; a team's sender with no
/// receivers just drops published values.
#[derive(Default)]
pub struct NotificationHub {
    teams: RwLock<HashMap<String, broadcast::Sender<Notification>>>,
}

impl NotificationHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, team_id: &str) -> broadcast::Receiver<Notification> {
        if let Some(sender) = self.read_sender(team_id) {
            return sender.subscribe();
        }
        let mut teams = self
            .teams
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        teams
            .entry(team_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, notification: &Notification) {
        if let Some(sender) = self.read_sender(&notification.team_id) {
            // Receiver count can be zero; that is not an error.
            let delivered = sender.send(notification.clone()).unwrap_or(0);
            debug!(
                team = %notification.team_id,
                subscribers = delivered,
                "notification published"
            );
        }
    }

    fn read_sender(&self, team_id: &str) -> Option<broadcast::Sender<Notification>> {
        self.teams
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(team_id)
            .cloned()
    }
}

/// Persists a notification and pushes it to live subscribers.
///
/// # Errors
///
/// Returns an error when the insert fails; broadcast delivery itself
/// cannot fail.
pub async fn emit(
    pool: &SqlitePool,
    hub: &NotificationHub,
    team_id: &str,
    user_id: Option<&str>,
    kind: NotificationKind,
    title: impl Into<String>,
    body: impl Into<String>,
) -> AppResult<Notification> {
    let notification = Notification {
        id: new_id(),
        team_id: team_id.to_string(),
        user_id: user_id.map(ToString::to_string),
        kind,
        title: title.into(),
        body: body.into(),
        read: false,
        created_at: Utc::now(),
    };

    db::notifications::insert(pool, &notification).await?;
    hub.publish(&notification);
    Ok(notification)
}
