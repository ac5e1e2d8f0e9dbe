use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use hd_core::scoring::{rank, ScoredItem};
use hd_core::storage::settings;
use hd_core::{
    DigestConfig, DigestStore, Error, Extractor, Feed, Item, ItemId, MessageId, Result, Sender, StoryDetail,
    Summarizer,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use crate::preferences::PreferenceModel;
use crate::run_lock::RunLock;
use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    Detail,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub id: ItemId,
    pub stage: SkipStage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveredItem {
    pub id: ItemId,
    pub message_id: MessageId,
    pub score: f64,
    pub persisted: bool,
}

/// What one cycle did, stage by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub target: usize,
    pub decayed: bool,
    pub fetched: usize,
    pub filtered_recent: usize,
    pub filter_degraded: bool,
    pub enriched: usize,
    pub extraction_fallbacks: usize,
    pub skipped: Vec<SkippedItem>,
    pub selected: usize,
    pub delivered: Vec<DeliveredItem>,
    pub failed_deliveries: Vec<ItemId>,
    pub cancelled: bool,
}

impl CycleReport {
    fn new(target: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            target,
            decayed: false,
            fetched: 0,
            filtered_recent: 0,
            filter_degraded: false,
            enriched: 0,
            extraction_fallbacks: 0,
            skipped: Vec::new(),
            selected: 0,
            delivered: Vec::new(),
            failed_deliveries: Vec::new(),
            cancelled: false,
        }
    }

    pub fn skipped_ids(&self) -> Vec<ItemId> {
        self.skipped.iter().map(|s| s.id).collect()
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    fn cancel(mut self, stage: &str) -> Self {
        info!("🛑 Digest cycle cancelled before {}", stage);
        self.cancelled = true;
        self.finish()
    }
}

/// One digest cycle: decay, fetch, filter, enrich, rank, select,
/// deliver and persist. Only the fetch stage can fail the cycle.
pub struct DigestPipeline {
    feed: Arc<dyn Feed>,
    extractor: Arc<dyn Extractor>,
    summarizer: Arc<dyn Summarizer>,
    sender: Arc<dyn Sender>,
    store: Arc<dyn DigestStore>,
    preferences: PreferenceModel,
    config: DigestConfig,
    lock: RunLock,
}

impl DigestPipeline {
    pub fn new(
        feed: Arc<dyn Feed>,
        extractor: Arc<dyn Extractor>,
        summarizer: Arc<dyn Summarizer>,
        sender: Arc<dyn Sender>,
        store: Arc<dyn DigestStore>,
        config: DigestConfig,
    ) -> Self {
        Self {
            feed,
            extractor,
            summarizer,
            sender,
            preferences: PreferenceModel::new(store.clone()),
            store,
            config,
            lock: RunLock::new(),
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn DigestStore> {
        self.store.clone()
    }

    pub fn preferences(&self) -> &PreferenceModel {
        &self.preferences
    }

    pub fn is_running(&self) -> bool {
        self.lock.is_held()
    }

    /// Digest size: the `digest_size` setting when it holds a positive
    /// integer, the configured size otherwise.
    pub async fn target_count(&self) -> usize {
        match self.store.get_setting(settings::DIGEST_SIZE).await {
            Ok(Some(value)) => match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    warn!("Ignoring invalid digest_size setting '{}'", value);
                    self.config.digest_size
                }
            },
            Ok(None) => self.config.digest_size,
            Err(e) => {
                warn!("Could not read digest_size setting: {}", e);
                self.config.digest_size
            }
        }
    }

    /// Run a cycle unless one is already in flight, in which case this
    /// returns `Error::CycleInProgress` at once.
    pub async fn run(&self, shutdown: &Shutdown) -> Result<CycleReport> {
        let _guard = self.lock.try_acquire()?;
        self.run_cycle(shutdown).await
    }

    async fn run_cycle(&self, shutdown: &Shutdown) -> Result<CycleReport> {
        let target = self.target_count().await;
        let mut report = CycleReport::new(target);
        info!("🗞️ Starting digest cycle (target {})", target);

        // Decay
        match self.preferences.decay(self.config.decay_rate, self.config.decay_floor).await {
            Ok(()) => report.decayed = true,
            Err(e) => warn!("Decay failed, continuing without it: {}", e),
        }
        if shutdown.is_triggered() {
            return Ok(report.cancel("fetch"));
        }

        // Fetch
        let ids = match self.feed.top_stories().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("❌ Could not fetch candidates, aborting cycle: {}", e);
                return Err(match e {
                    Error::Feed(msg) => Error::Feed(msg),
                    other => Error::Feed(format!("Failed to fetch top stories: {}", other)),
                });
            }
        };
        report.fetched = ids.len();
        if shutdown.is_triggered() {
            return Ok(report.cancel("filtering"));
        }

        // Filter
        let lookup = match self.config.recency_window() {
            Ok(window) => self.store.recently_delivered_ids(window).await,
            Err(e) => Err(e),
        };
        let recent = match lookup {
            Ok(recent) => recent,
            Err(e) => {
                warn!("Recency lookup failed, proceeding unfiltered: {}", e);
                report.filter_degraded = true;
                HashSet::new()
            }
        };
        let limit = self.config.candidate_limit(target);
        report.filtered_recent = ids.iter().filter(|id| recent.contains(id)).count();
        let candidates = select_candidates(ids, &recent, limit);
        debug!("{} candidates after filtering", candidates.len());

        // Enrich
        let mut items = Vec::with_capacity(candidates.len());
        for id in candidates {
            if shutdown.is_triggered() {
                return Ok(report.cancel("enriching the remaining candidates"));
            }
            if let Some(item) = self.enrich(id, &mut report).await {
                items.push(item);
            }
        }
        report.enriched = items.len();
        info!("✨ Enriched {} items", items.len());

        // Rank
        let weights = match self.preferences.weights().await {
            Ok(weights) => weights,
            Err(e) => {
                warn!("Could not load tag weights, ranking with baseline weights: {}", e);
                Default::default()
            }
        };
        let mut ranked = rank(items, &weights, self.config.scoring);

        // Select
        ranked.truncate(target);
        report.selected = ranked.len();

        // Deliver and persist
        for scored in ranked {
            if shutdown.is_triggered() {
                return Ok(report.cancel("delivering the remaining items"));
            }
            self.deliver(scored, &mut report).await;
        }

        info!(
            "✅ Digest cycle finished: {} delivered, {} skipped, {} failed deliveries",
            report.delivered.len(),
            report.skipped.len(),
            report.failed_deliveries.len()
        );
        Ok(report.finish())
    }

    async fn enrich(&self, id: ItemId, report: &mut CycleReport) -> Option<Item> {
        let story: StoryDetail = match self.feed.get_item(id).await {
            Ok(story) => story,
            Err(e) => {
                warn!("Skipping story {}: {}", id, e);
                report.skipped.push(SkippedItem {
                    id,
                    stage: SkipStage::Detail,
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let content = match self.extractor.extract(&story.url).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                debug!("No content extracted from {}, using title", story.url);
                report.extraction_fallbacks += 1;
                story.title.clone()
            }
            Err(e) => {
                warn!("Extraction failed for {}, using title: {}", story.url, e);
                report.extraction_fallbacks += 1;
                story.title.clone()
            }
        };

        match self.summarizer.summarize(&story.title, &content).await {
            Ok(summary) => Some(Item::from_story(story, summary, Utc::now())),
            Err(e) => {
                warn!("Skipping story {}: summarization failed: {}", id, e);
                report.skipped.push(SkippedItem {
                    id,
                    stage: SkipStage::Summary,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Delivery comes first; persistence failures are logged and never
    /// undo a sent message.
    async fn deliver(&self, scored: ScoredItem, report: &mut CycleReport) {
        let ScoredItem { mut item, score } = scored;

        let message_id = match self.sender.deliver(&item).await {
            Ok(message_id) => message_id,
            Err(e) => {
                warn!("Delivery of item {} failed: {}", item.id, e);
                report.failed_deliveries.push(item.id);
                return;
            }
        };

        // Stamp first so the stored row already carries the delivery.
        let delivered_at = Utc::now();
        item.mark_delivered(delivered_at, message_id);
        let persisted = match self.store.save_item(&item).await {
            Ok(()) => match self.store.mark_delivered(item.id, delivered_at, message_id).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Item {} sent but its delivery stamp was not stored: {}", item.id, e);
                    false
                }
            },
            Err(e) => {
                warn!("Item {} sent but could not be stored: {}", item.id, e);
                false
            }
        };

        info!("📨 Delivered '{}' (score {:.3}) as message {}", item.title, score, message_id);
        report.delivered.push(DeliveredItem {
            id: item.id,
            message_id,
            score,
            persisted,
        });
    }
}

/// Feed order minus recently delivered ids, at most `limit` long.
fn select_candidates(ids: Vec<ItemId>, recent: &HashSet<ItemId>, limit: usize) -> Vec<ItemId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| !recent.contains(id) && seen.insert(*id))
        .take(limit)
        .collect()
}
