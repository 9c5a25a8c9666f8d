//! Group membership roster — which chats the account currently belongs to.
//!
//! A bot cannot ask the platform for its dialog list, so membership is
//! reconstructed from updates and kept in a small JSON file. Saved as
//! human-readable pretty JSON on every change; loading a missing or
//! corrupt file just starts empty with a warning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use groupcast_core::error::{GroupcastError, Result};
use groupcast_core::types::{GroupInfo, GroupKind, RosterEvent};

/// One group the account belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub info: GroupInfo,
    /// When membership was first observed. Drives the oldest-first order
    /// used when a cycle is capped.
    pub first_seen: DateTime<Utc>,
    /// Last time the group showed up in traffic.
    pub last_seen: DateTime<Utc>,
}

/// The roster proper — a map from chat id to entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    groups: BTreeMap<i64, RosterEntry>,
}

impl Roster {
    /// Apply one membership event. Returns true when the roster changed.
    pub fn apply(&mut self, event: RosterEvent, now: DateTime<Utc>) -> bool {
        match event {
            RosterEvent::Joined(info) => {
                tracing::info!("➕ joined {}", info.label());
                self.upsert(info, now)
            }
            RosterEvent::Seen(info) => self.upsert(info, now),
            RosterEvent::Left(id) => {
                let removed = self.groups.remove(&id).is_some();
                if removed {
                    tracing::info!("➖ left group {id}");
                }
                removed
            }
        }
    }

    /// Insert a group or refresh its title, kind and liveness.
    fn upsert(&mut self, info: GroupInfo, now: DateTime<Utc>) -> bool {
        match self.groups.get_mut(&info.id) {
            Some(entry) => {
                if !info.title.is_empty() {
                    entry.info.title = info.title;
                }
                entry.info.kind = info.kind;
                entry.last_seen = now;
            }
            None => {
                self.groups.insert(
                    info.id,
                    RosterEntry {
                        info,
                        first_seen: now,
                        last_seen: now,
                    },
                );
            }
        }
        true
    }

    /// Remove a group. Returns true when it was present.
    pub fn remove(&mut self, id: i64) -> bool {
        self.groups.remove(&id).is_some()
    }

    /// Move an entry to the chat id a supergroup migration assigned.
    /// Keeps membership age; a duplicate entry under the new id wins.
    pub fn rekey(&mut self, old_id: i64, new_id: i64) -> bool {
        let Some(mut entry) = self.groups.remove(&old_id) else {
            return false;
        };
        entry.info.id = new_id;
        entry.info.kind = GroupKind::Supergroup;
        self.groups.entry(new_id).or_insert(entry);
        true
    }

    /// Insert operator-configured chat ids that have not been observed yet.
    /// Returns how many were inserted. Kind defaults to supergroup until
    /// the first update says otherwise.
    pub fn seed(&mut self, ids: &[i64], now: DateTime<Utc>) -> usize {
        let mut inserted = 0;
        for &id in ids {
            if !self.groups.contains_key(&id) {
                self.groups.insert(
                    id,
                    RosterEntry {
                        info: GroupInfo::new(id, "", GroupKind::Supergroup),
                        first_seen: now,
                        last_seen: now,
                    },
                );
                inserted += 1;
            }
        }
        inserted
    }

    /// Broadcast targets for one cycle: everything not excluded, oldest
    /// membership first, capped at `cap`.
    pub fn eligible(&self, exclude: &HashSet<i64>, cap: usize) -> Vec<GroupInfo> {
        let mut entries: Vec<&RosterEntry> = self
            .groups
            .values()
            .filter(|e| !exclude.contains(&e.info.id))
            .collect();
        entries.sort_by_key(|e| (e.first_seen, e.info.id));
        entries
            .into_iter()
            .take(cap)
            .map(|e| e.info.clone())
            .collect()
    }

    pub fn get(&self, id: i64) -> Option<&RosterEntry> {
        self.groups.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.groups.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// File-backed roster persistence — one pretty-printed JSON file in the
/// state directory.
pub struct RosterStore {
    dir: PathBuf,
}

impl RosterStore {
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn file(&self) -> PathBuf {
        self.dir.join("roster.json")
    }

    /// Save the roster to disk.
    pub fn save(&self, roster: &Roster) -> Result<()> {
        let json = serde_json::to_string_pretty(roster)
            .map_err(|e| GroupcastError::State(format!("serialize roster: {e}")))?;
        std::fs::write(self.file(), &json)
            .map_err(|e| GroupcastError::State(format!("write roster: {e}")))?;
        tracing::debug!("💾 saved roster ({} group(s))", roster.len());
        Ok(())
    }

    /// Load the roster from disk; missing or unreadable files mean empty.
    pub fn load(&self) -> Roster {
        let file = self.file();
        if !file.exists() {
            return Roster::default();
        }
        match std::fs::read_to_string(&file) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ roster file unreadable, starting empty: {e}");
                Roster::default()
            }),
            Err(e) => {
                tracing::warn!("⚠️ failed to read roster file: {e}");
                Roster::default()
            }
        }
    }

    /// Delete the saved roster (`--fresh`). Missing file is fine.
    pub fn wipe(&self) -> Result<()> {
        match std::fs::remove_file(self.file()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Thread-safe roster shared between the update-poll task and the engine.
/// Mutations persist through the store before the lock is released.
#[derive(Clone)]
pub struct SharedRoster {
    inner: Arc<RwLock<Roster>>,
    store: Arc<RosterStore>,
}

impl SharedRoster {
    /// Load the saved roster and wrap it for sharing.
    pub fn load(store: RosterStore) -> Self {
        let roster = store.load();
        Self {
            inner: Arc::new(RwLock::new(roster)),
            store: Arc::new(store),
        }
    }

    /// Apply a membership event from the update stream. Save failures are
    /// logged, not propagated — the poll task has nowhere to send them.
    pub async fn apply(&self, event: RosterEvent) {
        let mut roster = self.inner.write().await;
        if roster.apply(event, Utc::now()) {
            if let Err(e) = self.store.save(&roster) {
                tracing::warn!("⚠️ failed to save roster: {e}");
            }
        }
    }

    /// Seed operator-configured group ids at startup.
    pub async fn seed(&self, ids: &[i64]) {
        if ids.is_empty() {
            return;
        }
        let mut roster = self.inner.write().await;
        let inserted = roster.seed(ids, Utc::now());
        if inserted > 0 {
            tracing::info!("🌱 seeded {inserted} group(s) from config");
            if let Err(e) = self.store.save(&roster) {
                tracing::warn!("⚠️ failed to save roster: {e}");
            }
        }
    }

    /// Drop a group the platform says we can no longer message.
    pub async fn remove(&self, id: i64) -> Result<()> {
        let mut roster = self.inner.write().await;
        if roster.remove(id) {
            self.store.save(&roster)?;
        }
        Ok(())
    }

    /// Follow a group→supergroup migration.
    pub async fn rekey(&self, old_id: i64, new_id: i64) -> Result<()> {
        let mut roster = self.inner.write().await;
        if roster.rekey(old_id, new_id) {
            self.store.save(&roster)?;
        }
        Ok(())
    }

    pub async fn eligible(&self, exclude: &HashSet<i64>, cap: usize) -> Vec<GroupInfo> {
        self.inner.read().await.eligible(exclude, cap)
    }

    pub async fn contains(&self, id: i64) -> bool {
        self.inner.read().await.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
