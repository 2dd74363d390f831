// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory per-user conversation agent cache.
//!
//! Entries are evicted lazily: a sweep runs after each processed message,
//! there is no background timer.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use comanda_core::types::{CatalogSnapshot, MessageRole, Turn, UserProfileView};

/// Per-user conversational state handed to the reply provider.
///
/// Holds the rolling turn history, the profile snapshot, and the catalog
/// view captured at construction time.
pub struct ConversationAgent {
    profile: UserProfileView,
    catalog: CatalogSnapshot,
    history: VecDeque<Turn>,
    max_turns: usize,
}

impl ConversationAgent {
    pub fn new(profile: UserProfileView, catalog: CatalogSnapshot, max_turns: usize) -> Self {
        Self {
            profile,
            catalog,
            history: VecDeque::new(),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest past the rolling cap.
    pub fn push_turn(&mut self, role: MessageRole, text: impl Into<String>) {
        if self.history.len() >= self.max_turns {
            self.history.pop_front();
        }
        self.history.push_back(Turn {
            role,
            text: text.into(),
        });
    }

    pub fn history(&self) -> Vec<Turn> {
        self.history.iter().cloned().collect()
    }

    pub fn profile(&self) -> &UserProfileView {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: UserProfileView) {
        self.profile = profile;
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }
}

struct CacheEntry {
    agent: Arc<Mutex<ConversationAgent>>,
    last_seen: DateTime<Utc>,
}

/// Keyed cache of live conversation agents.
pub struct AgentCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl AgentCache {
    pub fn new(ttl_hours: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    /// Fetch a cached agent, refreshing its last-seen time.
    pub fn get(&self, user_key: &str, now: DateTime<Utc>) -> Option<Arc<Mutex<ConversationAgent>>> {
        self.entries.get_mut(user_key).map(|mut entry| {
            entry.last_seen = now;
            entry.agent.clone()
        })
    }

    /// Insert a freshly built agent and return its handle.
    pub fn insert(
        &self,
        user_key: String,
        agent: ConversationAgent,
        now: DateTime<Utc>,
    ) -> Arc<Mutex<ConversationAgent>> {
        let agent = Arc::new(Mutex::new(agent));
        self.entries.insert(
            user_key,
            CacheEntry {
                agent: agent.clone(),
                last_seen: now,
            },
        );
        agent
    }

    /// Evict entries idle longer than the TTL.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.last_seen <= self.ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "swept idle conversation agents");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot(at: DateTime<Utc>) -> CatalogSnapshot {
        CatalogSnapshot {
            products: vec![],
            locations: vec![],
            loaded_at: at,
        }
    }

    fn at(hms: &str) -> DateTime<Utc> {
        format!("2026-02-01T{hms}Z").parse().unwrap()
    }

    fn day(day_hms: &str) -> DateTime<Utc> {
        format!("2026-02-{day_hms}Z").parse().unwrap()
    }

    #[test]
    fn history_rolls_past_the_cap() {
        let mut agent =
            ConversationAgent::new(UserProfileView::default(), empty_snapshot(at("10:00:00")), 3);
        for i in 0..5 {
            agent.push_turn(MessageRole::User, format!("m{i}"));
        }
        let history = agent.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].text, "m2");
        assert_eq!(history[2].text, "m4");
    }

    #[test]
    fn get_refreshes_last_seen() {
        let cache = AgentCache::new(24);
        cache.insert(
            "whatsapp:+54911".to_string(),
            ConversationAgent::new(UserProfileView::default(), empty_snapshot(at("10:00:00")), 10),
            day("01T10:00:00"),
        );

        // Touch at 23h59m of idle, then sweep at what would have been 24h+.
        assert!(cache.get("whatsapp:+54911", day("02T09:59:00")).is_some());
        cache.sweep(day("02T10:01:00"));
        assert_eq!(cache.len(), 1, "touched entry must survive");
    }

    #[test]
    fn sweep_evicts_past_ttl() {
        let cache = AgentCache::new(24);
        cache.insert(
            "whatsapp:+54911".to_string(),
            ConversationAgent::new(UserProfileView::default(), empty_snapshot(at("10:00:00")), 10),
            day("01T10:00:00"),
        );

        cache.sweep(day("02T09:59:00"));
        assert_eq!(cache.len(), 1, "23h59m idle survives");

        cache.sweep(day("02T10:00:01"));
        assert!(cache.is_empty(), "past 24h idle is evicted");
    }
}
