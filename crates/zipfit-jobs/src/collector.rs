//! Registry feed collection and offer expiry sweep.
//!
//! Two independently scheduled maintenance runs:
//! - **collect**: pull candidate records from the registry feed, dedupe by
//!   external id, create new registry-sourced offers or refresh existing
//!   ones. Per-record failures are logged and skipped; one bad record never
//!   aborts the run.
//! - **sweep**: deactivate offers whose application window has closed. The
//!   sweep never touches document or outcome state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use zipfit_core::{defaults, OfferRepository, RegistryFeed, RegistryRecord, Result};

/// How far back each collection run looks.
const COLLECT_LOOKBACK_DAYS: i64 = 90;

/// Counters from one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Collects registry offers and sweeps expired ones.
pub struct RegistryCollector {
    feed: Arc<dyn RegistryFeed>,
    offers: Arc<dyn OfferRepository>,
}

impl RegistryCollector {
    pub fn new(feed: Arc<dyn RegistryFeed>, offers: Arc<dyn OfferRepository>) -> Self {
        Self { feed, offers }
    }

    /// Run one feed collection pass.
    pub async fn collect_once(&self, today: NaiveDate) -> Result<CollectorReport> {
        let from = today - chrono::Duration::days(COLLECT_LOOKBACK_DAYS);
        let records = self.feed.fetch_records(from).await?;

        info!(
            subsystem = "jobs",
            component = "collector",
            op = "collect",
            record_count = records.len(),
            "Fetched registry feed records"
        );

        let mut report = CollectorReport::default();
        for record in records {
            match self.apply_record(&record).await {
                Ok(true) => report.created += 1,
                Ok(false) => report.updated += 1,
                Err(e) => {
                    warn!(
                        external_id = %record.external_id,
                        error = %e,
                        "Skipping registry record"
                    );
                    report.skipped += 1;
                }
            }
        }

        info!(
            subsystem = "jobs",
            component = "collector",
            op = "collect",
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "Registry collection finished"
        );
        Ok(report)
    }

    /// Create or refresh one offer from a feed record. Returns true when a
    /// new offer was created.
    async fn apply_record(&self, record: &RegistryRecord) -> Result<bool> {
        match self.offers.find_by_external_id(&record.external_id).await? {
            None => {
                self.offers.create(&record.to_offer()).await?;
                Ok(true)
            }
            Some(mut existing) => {
                // Refresh registry-mutable fields in place. Provenance, the
                // external id and any document link stay as they are — a
                // merged offer keeps its merge.
                existing.name = record.name.clone();
                existing.region = record.region.clone();
                existing.address = record.address.clone();
                existing.category =
                    zipfit_core::HousingCategory::from_text(record.housing_category.as_deref());
                existing.min_price = record.min_price;
                existing.max_price = record.max_price;
                existing.application_start = record.application_start;
                existing.application_end = record.application_end;
                self.offers.update(&existing).await?;
                Ok(false)
            }
        }
    }

    /// Deactivate offers whose application window closed before `today`.
    /// Returns the number of offers deactivated.
    pub async fn sweep_once(&self, today: NaiveDate) -> Result<u64> {
        let count = self.offers.deactivate_expired(today).await?;
        info!(
            subsystem = "jobs",
            component = "collector",
            op = "sweep",
            deactivated = count,
            "Expired offer sweep finished"
        );
        Ok(count)
    }

    /// Start the periodic scheduler for both runs.
    ///
    /// Intervals default from [`defaults::COLLECTOR_INTERVAL_SECS`] and
    /// [`defaults::SWEEP_INTERVAL_SECS`]. Failures are logged and the
    /// schedule continues.
    pub fn start(self: Arc<Self>) -> CollectorHandle {
        self.start_with_intervals(
            Duration::from_secs(defaults::COLLECTOR_INTERVAL_SECS),
            Duration::from_secs(defaults::SWEEP_INTERVAL_SECS),
        )
    }

    /// Start the scheduler with custom intervals.
    pub fn start_with_intervals(
        self: Arc<Self>,
        collect_every: Duration,
        sweep_every: Duration,
    ) -> CollectorHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut collect_timer = tokio::time::interval(collect_every);
            let mut sweep_timer = tokio::time::interval(sweep_every);
            // The first tick fires immediately; skip it so startup does not
            // hammer the feed.
            collect_timer.tick().await;
            sweep_timer.tick().await;

            info!(
                collect_every_secs = collect_every.as_secs(),
                sweep_every_secs = sweep_every.as_secs(),
                "Registry collector scheduler started"
            );

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Registry collector scheduler stopped");
                        break;
                    }
                    _ = collect_timer.tick() => {
                        if let Err(e) = self.collect_once(Utc::now().date_naive()).await {
                            error!(error = %e, "Registry collection run failed");
                        }
                    }
                    _ = sweep_timer.tick() => {
                        if let Err(e) = self.sweep_once(Utc::now().date_naive()).await {
                            error!(error = %e, "Expiry sweep run failed");
                        }
                    }
                }
            }
        });

        CollectorHandle { shutdown_tx }
    }
}

/// Handle for stopping the collector scheduler.
pub struct CollectorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CollectorHandle {
    /// Signal the scheduler to stop.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
