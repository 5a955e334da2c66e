//! The coordinator state machine
//!
//! Per-highlight states: local (exists only in memory and cache) →
//! pending-remote (provisional id, awaiting remote assignment) → synced
//! (remote id assigned). Removal tombstones locally first; the remote delete
//! is best-effort. All in-memory mutations are synchronous; the only
//! suspension points are remote calls.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::cache::{CacheStore, JsonFileCache};
use crate::config::EngineConfig;
use crate::content::CapturedSelection;
use crate::highlights::{DedupKey, Highlight, HighlightColor, HighlightRecord, PageRef};
use crate::identity::OwnerIdentity;
use crate::remote::{RemoteStore, SqliteRemote};

use super::events::HighlightsChanged;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Summary of an identity-change migration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Highlights adopted directly from the remote store.
    pub adopted: usize,
    /// Recovered highlights inserted remotely under the new identity.
    pub migrated: usize,
    /// Recovered highlights skipped as duplicates.
    pub skipped: usize,
}

/// Owns the in-memory highlight list, the durable cache, and the remote
/// adapter
pub struct SyncCoordinator {
    identity: OwnerIdentity,
    highlights: Vec<Highlight>,
    cache: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteStore>,
    events: broadcast::Sender<HighlightsChanged>,
}

impl SyncCoordinator {
    /// Create a coordinator for an identity, restoring its cached snapshot.
    pub fn new(
        identity: OwnerIdentity,
        cache: Arc<dyn CacheStore>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        let highlights = cache.load(identity.owner_id());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            identity,
            highlights,
            cache,
            remote,
            events,
        }
    }

    /// Assemble a coordinator from configuration: file-backed cache plus the
    /// SQLite remote store.
    pub async fn from_config(
        identity: OwnerIdentity,
        config: &EngineConfig,
    ) -> crate::Result<Self> {
        let cache = Arc::new(JsonFileCache::new(&config.cache_dir));
        let remote = Arc::new(SqliteRemote::connect(&config.database_url).await?);
        Ok(Self::new(identity, cache, remote))
    }

    pub fn identity(&self) -> &OwnerIdentity {
        &self.identity
    }

    /// The full in-memory list, in its authoritative order.
    pub fn all(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Snapshot of one page's highlights for a render pass.
    pub fn highlights_for(&self, page: &PageRef) -> Vec<Highlight> {
        self.highlights
            .iter()
            .filter(|h| &h.page == page)
            .cloned()
            .collect()
    }

    /// Subscribe to advisory change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<HighlightsChanged> {
        self.events.subscribe()
    }

    /// Phase 1 of an add: synchronous and always succeeds.
    ///
    /// Inserts a provisional highlight into memory and cache so the UI
    /// reflects the change without waiting on the network. A candidate whose
    /// dedup signature already exists collapses to the existing record.
    pub fn add(
        &mut self,
        page: PageRef,
        selection: &CapturedSelection,
        color: HighlightColor,
    ) -> Highlight {
        let candidate = Highlight::new_local(
            self.identity.owner_id(),
            page.clone(),
            selection.text.clone(),
            selection.start_offset,
            selection.prefix_context.clone(),
            selection.suffix_context.clone(),
        )
        .with_color(color);

        if let Some(existing) = self
            .highlights
            .iter()
            .find(|h| h.dedup_key() == candidate.dedup_key())
        {
            debug!(id = %existing.id, "duplicate signature, keeping existing highlight");
            return existing.clone();
        }

        self.highlights.push(candidate.clone());
        self.persist_cache();
        self.notify(Some(page));
        candidate
    }

    /// Phase 2 of an add: promote provisional records remotely.
    ///
    /// For each provisional record: adopt the remote id when the signature
    /// already exists remotely, otherwise insert and rewrite the temporary
    /// id. Failures leave records provisional; the cache stays authoritative
    /// until a later pass succeeds. Returns the number promoted.
    pub async fn sync_pending(&mut self) -> usize {
        if !self.identity.is_authenticated() {
            return 0;
        }
        let owner = self.identity.owner_id().to_string();

        let existing: HashMap<DedupKey, String> = match self.remote.list_by_owner(&owner).await {
            Ok(records) => records
                .into_iter()
                .filter_map(HighlightRecord::into_highlight)
                .map(|h| (h.dedup_key(), h.id))
                .collect(),
            Err(err) => {
                debug!(%err, "remote list failed; pending highlights stay local");
                return 0;
            }
        };

        let mut promoted = 0;
        for idx in 0..self.highlights.len() {
            if !self.highlights[idx].is_provisional() {
                continue;
            }
            if let Some(remote_id) = existing.get(&self.highlights[idx].dedup_key()) {
                // Signature already stored remotely: skip the insert and
                // adopt the existing record's id.
                self.highlights[idx].id = remote_id.clone();
                promoted += 1;
                continue;
            }
            let record = HighlightRecord::from_highlight(&self.highlights[idx]);
            match self.remote.insert(&owner, &record).await {
                Ok(Some(stored)) => {
                    self.highlights[idx].id = stored.id;
                    promoted += 1;
                }
                Ok(None) => {
                    debug!(id = %record.id, "remote declined insert; highlight stays provisional");
                }
                Err(err) => {
                    debug!(%err, id = %record.id, "remote insert failed; highlight stays provisional");
                }
            }
        }

        if promoted > 0 {
            self.persist_cache();
            self.notify(None);
        }
        promoted
    }

    /// Optimistic add followed by an immediate promotion attempt.
    ///
    /// Returns the current copy of the record, promoted when the remote
    /// insert succeeded and still provisional when it did not.
    pub async fn add_highlight(
        &mut self,
        page: PageRef,
        selection: &CapturedSelection,
        color: HighlightColor,
    ) -> Highlight {
        let provisional = self.add(page, selection, color);
        self.sync_pending().await;
        self.highlights
            .iter()
            .find(|h| h.dedup_key() == provisional.dedup_key())
            .cloned()
            .unwrap_or(provisional)
    }

    /// Remove a highlight. The local removal is synchronous and final; the
    /// remote delete is best-effort and never reverts it.
    pub async fn remove(&mut self, id: &str) -> bool {
        let Some(idx) = self.highlights.iter().position(|h| h.id == id) else {
            return false;
        };
        let removed = self.highlights.remove(idx);
        self.persist_cache();
        self.notify(Some(removed.page.clone()));

        if self.identity.is_authenticated() && !removed.is_provisional() {
            if let Err(err) = self.remote.delete(&removed.id).await {
                debug!(%err, id = %removed.id, "remote delete failed; local removal stands");
            }
        }
        true
    }

    /// Drop every highlight for the current identity, locally and remotely.
    pub async fn clear(&mut self) {
        self.highlights.clear();
        self.persist_cache();
        self.notify(None);

        if self.identity.is_authenticated() {
            let owner = self.identity.owner_id().to_string();
            if let Err(err) = self.remote.delete_all_by_owner(&owner).await {
                debug!(%err, "remote clear failed; local clear stands");
            }
        }
    }

    /// Identity change: sign-in.
    ///
    /// Loads the new identity's remote highlights; when the remote store is
    /// empty, recovers from the local cache for that identity, then from a
    /// scan of all cached owner keys (highlights created under a prior
    /// anonymous identity). Recovered highlights are migrated by content
    /// under the new identity, skipping duplicate signatures, and the final
    /// state is refreshed from the remote store with any still-local records
    /// appended.
    pub async fn sign_in(&mut self, identity: OwnerIdentity) -> MigrationReport {
        let owner = identity.owner_id().to_string();
        self.identity = identity;

        let remote_existing: Vec<Highlight> = match self.remote.list_by_owner(&owner).await {
            Ok(records) => records
                .into_iter()
                .filter_map(HighlightRecord::into_highlight)
                .collect(),
            Err(err) => {
                debug!(%err, "remote list failed during sign-in; treating as empty");
                Vec::new()
            }
        };

        if !remote_existing.is_empty() {
            let adopted = remote_existing.len();
            self.highlights = remote_existing;
            self.persist_cache();
            self.notify(None);
            return MigrationReport {
                adopted,
                ..MigrationReport::default()
            };
        }

        let mut recovered = self.cache.load(&owner);
        if recovered.is_empty() {
            recovered = self.cache.load_all_owners();
        }

        let mut seen: HashSet<DedupKey> = HashSet::new();
        let mut report = MigrationReport::default();
        // Every recovered highlight, promoted where the insert succeeded.
        // Serves as the fallback list when the final refresh fails.
        let mut migrated: Vec<Highlight> = Vec::new();

        for mut highlight in recovered {
            if !seen.insert(highlight.dedup_key()) {
                report.skipped += 1;
                continue;
            }
            highlight.owner_id = owner.clone();
            // Migrate by content; the old id belongs to the old identity.
            let record = HighlightRecord::from_highlight(&highlight);
            match self.remote.insert(&owner, &record).await {
                Ok(Some(stored)) => {
                    report.migrated += 1;
                    highlight.id = stored.id;
                }
                Ok(None) => {
                    debug!(id = %highlight.id, "remote declined migrated insert; keeping local");
                }
                Err(err) => {
                    debug!(%err, id = %highlight.id, "migrating insert failed; keeping local");
                }
            }
            migrated.push(highlight);
        }

        self.highlights = match self.remote.list_by_owner(&owner).await {
            Ok(records) => {
                let mut refreshed: Vec<Highlight> = records
                    .into_iter()
                    .filter_map(HighlightRecord::into_highlight)
                    .collect();
                // Still-provisional recoveries are appended, never
                // interleaved.
                let remote_keys: HashSet<DedupKey> =
                    refreshed.iter().map(Highlight::dedup_key).collect();
                refreshed.extend(
                    migrated
                        .into_iter()
                        .filter(|h| h.is_provisional() && !remote_keys.contains(&h.dedup_key())),
                );
                refreshed
            }
            Err(err) => {
                debug!(%err, "remote refresh failed after migration; keeping recovered list");
                migrated
            }
        };
        self.persist_cache();
        self.notify(None);

        if report.migrated > 0 || report.skipped > 0 {
            info!(
                owner = %owner,
                migrated = report.migrated,
                skipped = report.skipped,
                "migrated highlights to new identity"
            );
        }
        report
    }

    /// Identity change: sign-out.
    ///
    /// Before the authenticated session is invalidated, the remote snapshot
    /// is backed up under the last-known-owner record so a guest view on the
    /// same device can still show historical data read-only. The session then
    /// continues under the guest identity with its own cached state.
    pub async fn sign_out(&mut self, guest: OwnerIdentity) {
        if self.identity.is_authenticated() {
            let owner = self.identity.owner_id().to_string();
            let snapshot = match self.remote.list_by_owner(&owner).await {
                Ok(records) => records
                    .into_iter()
                    .filter_map(HighlightRecord::into_highlight)
                    .collect(),
                Err(err) => {
                    debug!(%err, "remote list failed at sign-out; backing up local list");
                    self.highlights.clone()
                }
            };
            self.cache.save_backup(&owner, &snapshot);
        }

        self.identity = guest;
        self.highlights = self.cache.load(self.identity.owner_id());
        self.notify(None);
    }

    /// Manual re-sync: push cache-only highlights to the remote store.
    ///
    /// Diffs the cached snapshot against the remote list by dedup signature
    /// and inserts only the missing ones. Returns the count pushed.
    pub async fn resync(&mut self) -> usize {
        if !self.identity.is_authenticated() {
            return 0;
        }
        let owner = self.identity.owner_id().to_string();

        let remote_records = match self.remote.list_by_owner(&owner).await {
            Ok(records) => records,
            Err(err) => {
                debug!(%err, "remote list failed; re-sync aborted");
                return 0;
            }
        };
        let remote_keys: HashSet<DedupKey> = remote_records
            .into_iter()
            .filter_map(HighlightRecord::into_highlight)
            .map(|h| h.dedup_key())
            .collect();

        let mut pushed = 0;
        for highlight in self.cache.load(&owner) {
            if remote_keys.contains(&highlight.dedup_key()) {
                continue;
            }
            let record = HighlightRecord::from_highlight(&highlight);
            match self.remote.insert(&owner, &record).await {
                Ok(Some(_)) => pushed += 1,
                Ok(None) => debug!(id = %record.id, "remote declined re-sync insert"),
                Err(err) => debug!(%err, id = %record.id, "re-sync insert failed"),
            }
        }

        if pushed > 0 {
            info!(owner = %owner, pushed, "manual re-sync complete");
            self.refresh_from_remote().await;
        }
        pushed
    }

    /// Replace the in-memory list with the remote one (creation-time
    /// ascending), appending provisional records the remote store does not
    /// have yet.
    async fn refresh_from_remote(&mut self) {
        let owner = self.identity.owner_id().to_string();
        match self.remote.list_by_owner(&owner).await {
            Ok(records) => {
                let mut refreshed: Vec<Highlight> = records
                    .into_iter()
                    .filter_map(HighlightRecord::into_highlight)
                    .collect();
                let remote_keys: HashSet<DedupKey> =
                    refreshed.iter().map(Highlight::dedup_key).collect();
                let local_only: Vec<Highlight> = self
                    .highlights
                    .iter()
                    .filter(|h| h.is_provisional() && !remote_keys.contains(&h.dedup_key()))
                    .cloned()
                    .collect();
                refreshed.extend(local_only);
                self.highlights = refreshed;
                self.persist_cache();
                self.notify(None);
            }
            Err(err) => {
                debug!(%err, "remote refresh failed; keeping current list");
            }
        }
    }

    fn persist_cache(&self) {
        self.cache.save(self.identity.owner_id(), &self.highlights);
    }

    fn notify(&self, page: Option<PageRef>) {
        // Nobody listening is fine.
        let _ = self.events.send(HighlightsChanged {
            owner_id: self.identity.owner_id().to_string(),
            page,
        });
    }
}
