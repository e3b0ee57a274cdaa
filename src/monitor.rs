//! The polling loop: fetch specials, inspect each app, record freebies.
//!
//! Every public operation here degrades failures into logged "no result"
//! values, so a broken response, a network outage or an unreadable
//! discoveries file never ends the loop. [`Monitor::inspect`] is the one
//! exception and returns errors for callers that want them.

use core::any::Any;
use core::future::Future;
use core::panic::AssertUnwindSafe;

use futures_util::FutureExt as _;

use crate::client::StoreClient;
use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::error::{FreebiesError, Result};
use crate::models::{AppId, DiscoveredGame, PriceSnapshot, TIMESTAMP_FORMAT};
use crate::storage::{FileStorage, Storage};

/// Why an inspected app was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The details response had no entry for the app, or `success` was false.
    Unlisted,
    /// The app has no `price_overview` (free to play, or not sold).
    NoPriceOverview,
    /// The app is priced but not a paid app at 100% off.
    NotDiscounted,
}

impl core::fmt::Display for SkipReason {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match *self {
            Self::Unlisted => "not found in the store",
            Self::NoPriceOverview => "no price information (free to play or not sold)",
            Self::NotDiscounted => "not discounted to free",
        };
        f.write_str(text)
    }
}

/// Result of inspecting one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// The app qualified and was recorded for the first time.
    Discovered(DiscoveredGame),
    /// The app qualified but was recorded before.
    AlreadyRecorded,
    /// The app did not qualify.
    NotQualifying(SkipReason),
}

impl Inspection {
    /// Returns `true` if this inspection added a new record.
    #[inline]
    #[must_use]
    pub const fn is_new_discovery(&self) -> bool {
        matches!(*self, Self::Discovered(_))
    }
}

/// Summary of one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of ids in the specials listing.
    pub listed: usize,
    /// Number of ids whose details were fetched and evaluated.
    pub inspected: usize,
    /// Games recorded for the first time, in listing order.
    pub discovered: Vec<DiscoveredGame>,
    /// Ids whose inspection failed.
    pub failed: Vec<AppId>,
}

/// Builder for constructing a [`Monitor`].
#[derive(Debug)]
pub struct MonitorBuilder<S: Storage, C: Clock> {
    /// Monitor settings.
    config: MonitorConfig,
    /// Storage backend.
    storage: Option<S>,
    /// Clock used for timestamps and sleeps.
    clock: Option<C>,
}

impl<S: Storage, C: Clock> MonitorBuilder<S, C> {
    /// Sets the configuration (defaults to [`MonitorConfig::default`]).
    #[inline]
    #[must_use]
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the storage backend.
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the clock.
    #[inline]
    #[must_use]
    pub fn clock(mut self, clock: C) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the monitor.
    ///
    /// # Errors
    ///
    /// Returns [`FreebiesError::MissingComponent`] if no storage or clock
    /// was provided, and any error of [`MonitorConfig::store_client`].
    #[inline]
    pub fn build(self) -> Result<Monitor<S, C>> {
        let storage = self
            .storage
            .ok_or(FreebiesError::MissingComponent("storage backend"))?;
        let clock = self.clock.ok_or(FreebiesError::MissingComponent("clock"))?;
        let client = self.config.store_client()?;
        Ok(Monitor {
            client,
            storage,
            clock,
            config: self.config,
        })
    }
}

/// Watches the store for paid games discounted to free.
///
/// Use [`Monitor::builder()`] or [`Monitor::from_config`] to construct an
/// instance.
#[derive(Debug)]
pub struct Monitor<S: Storage, C: Clock> {
    /// Store API client.
    client: StoreClient,
    /// Discoveries backend.
    storage: S,
    /// Time source.
    clock: C,
    /// Delays and endpoints.
    config: MonitorConfig,
}

impl Monitor<FileStorage, SystemClock> {
    /// Creates a monitor writing to [`MonitorConfig::data_file`] and using
    /// real time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store client cannot be built.
    #[inline]
    pub fn from_config(config: MonitorConfig) -> Result<Self> {
        let storage = config.file_storage();
        Self::builder()
            .config(config)
            .storage(storage)
            .clock(SystemClock)
            .build()
    }
}

impl<S: Storage, C: Clock> Monitor<S, C> {
    /// Creates a new builder for configuring the monitor.
    #[inline]
    #[must_use]
    pub fn builder() -> MonitorBuilder<S, C> {
        MonitorBuilder {
            config: MonitorConfig::default(),
            storage: None,
            clock: None,
        }
    }

    /// Returns the active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the storage backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns all recorded games.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    pub async fn discoveries(&self) -> Result<Vec<DiscoveredGame>> {
        self.storage.discoveries().await
    }

    /// Fetches the ids of all apps on special.
    ///
    /// Never fails: a transport or parse error is logged at error level
    /// and an unexpected shape at warn level; both yield an empty list.
    #[tracing::instrument(skip_all)]
    pub async fn fetch_specials(&self) -> Vec<AppId> {
        match self.client.featured_categories().await {
            Ok(listing) => listing.special_ids().unwrap_or_else(|| {
                tracing::warn!("specials listing has no specials.items; nothing to check");
                Vec::new()
            }),
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch specials listing");
                Vec::new()
            }
        }
    }

    /// Fetches one app's details and records it if it is a paid app at
    /// 100% off.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the store answers with
    /// a non-success status, the body cannot be deserialized, or the
    /// storage backend fails.
    #[tracing::instrument(skip_all, fields(app_id = %id))]
    pub async fn inspect(&self, id: AppId) -> Result<Inspection> {
        let Some(entry) = self.client.app_details(id).await? else {
            tracing::debug!("app missing from details response");
            return Ok(Inspection::NotQualifying(SkipReason::Unlisted));
        };
        if !entry.success {
            tracing::debug!("store reported success=false");
            return Ok(Inspection::NotQualifying(SkipReason::Unlisted));
        }
        let Some(snapshot) = entry.data.as_ref().and_then(PriceSnapshot::from_details) else {
            tracing::debug!("no price_overview; free to play or unlisted");
            return Ok(Inspection::NotQualifying(SkipReason::NoPriceOverview));
        };
        if !snapshot.is_free_via_full_discount() {
            tracing::trace!(
                initial = snapshot.initial_price,
                discount_percent = snapshot.discount_percent,
                "not free"
            );
            return Ok(Inspection::NotQualifying(SkipReason::NotDiscounted));
        }
        Ok(match self.try_record(id, &snapshot).await? {
            Some(game) => Inspection::Discovered(game),
            None => Inspection::AlreadyRecorded,
        })
    }

    /// Inspects one app, returning `true` only if it was newly recorded.
    ///
    /// Never fails: errors are logged with the app id and count as "not
    /// qualifying".
    #[inline]
    pub async fn inspect_item(&self, id: AppId) -> bool {
        self.inspect_logged(id)
            .await
            .is_some_and(|inspection| inspection.is_new_discovery())
    }

    /// Records a qualifying snapshot unless `id` is already stored.
    ///
    /// Returns `true` if a new record was written. Storage errors are
    /// logged and yield `false`.
    #[inline]
    pub async fn record_discovery(&self, id: AppId, snapshot: &PriceSnapshot) -> bool {
        match self.try_record(id, snapshot).await {
            Ok(recorded) => recorded.is_some(),
            Err(err) => {
                tracing::error!(app_id = %id, error = %err, "failed to record discovery");
                false
            }
        }
    }

    /// Runs one cycle: fetch specials, then inspect each id with a
    /// courtesy pause after every request.
    #[tracing::instrument(skip_all)]
    pub async fn run_cycle(&self) -> CycleReport {
        let ids = self.fetch_specials().await;
        let mut report = CycleReport {
            listed: ids.len(),
            ..CycleReport::default()
        };
        tracing::debug!(count = ids.len(), "checking specials");
        for id in ids {
            match self.inspect_logged(id).await {
                Some(inspection) => {
                    report.inspected += 1;
                    if let Inspection::Discovered(game) = inspection {
                        report.discovered.push(game);
                    }
                }
                None => report.failed.push(id),
            }
            self.clock.sleep(self.config.item_delay).await;
        }
        tracing::info!(
            listed = report.listed,
            inspected = report.inspected,
            discovered = report.discovered.len(),
            failed = report.failed.len(),
            "cycle finished"
        );
        report
    }

    /// Runs cycles until Ctrl-C.
    #[inline]
    pub async fn run_forever(&self) {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "cannot listen for Ctrl-C; running until killed");
                core::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Runs cycles until `shutdown` completes.
    ///
    /// Each iteration runs one cycle and then sleeps
    /// [`MonitorConfig::check_interval`]. A panic inside a cycle is logged
    /// and followed by [`MonitorConfig::retry_delay`] instead. `shutdown`
    /// is honoured at any await point, including mid-sleep.
    pub async fn run_until<F: Future<Output = ()>>(&self, shutdown: F) {
        let mut shutdown = core::pin::pin!(shutdown);
        tracing::info!(
            interval_secs = self.config.check_interval.as_secs(),
            data_file = %self.config.data_file.display(),
            "monitor started"
        );
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping monitor");
                    break;
                }
                () = self.tick() => {}
            }
        }
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// One loop iteration: cycle plus the following sleep.
    async fn tick(&self) {
        tracing::info!(
            "checking for 100% discounts at {}",
            self.clock.now().format(TIMESTAMP_FORMAT)
        );
        let pause = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(_report) => self.config.check_interval,
            Err(payload) => {
                tracing::error!(
                    panic = panic_message(&*payload),
                    retry_secs = self.config.retry_delay.as_secs(),
                    "cycle failed unexpectedly"
                );
                self.config.retry_delay
            }
        };
        self.clock.sleep(pause).await;
    }

    /// [`Monitor::inspect`] with errors logged and mapped to `None`.
    async fn inspect_logged(&self, id: AppId) -> Option<Inspection> {
        match self.inspect(id).await {
            Ok(inspection) => Some(inspection),
            Err(err) => {
                tracing::error!(app_id = %id, error = %err, "failed to check app");
                None
            }
        }
    }

    /// Builds the record and stores it if the id is new.
    async fn try_record(
        &self,
        id: AppId,
        snapshot: &PriceSnapshot,
    ) -> Result<Option<DiscoveredGame>> {
        let game = DiscoveredGame::from_snapshot(id, snapshot, &self.clock.now());
        if !self.storage.insert_if_absent(game.clone()).await? {
            tracing::debug!(app_id = %id, "already recorded");
            return Ok(None);
        }
        tracing::info!(
            app_id = %id,
            "found new temp free game: {} (was {}, free until {})",
            game.name,
            game.original_price,
            game.end_date
        );
        Ok(Some(game))
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
