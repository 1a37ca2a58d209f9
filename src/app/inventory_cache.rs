//! Process-wide inventory cache with single-flight refresh.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use crate::domain::{AppError, HostVars, InventorySnapshot};
use crate::ports::InventorySource;

/// Outcome of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The source was fetched and a new snapshot installed.
    Reloaded { hosts: usize, watermark: Option<DateTime<Utc>> },
    /// The current snapshot is still valid; nothing was fetched.
    Fresh,
}

/// Holds the last fetched inventory and decides when to fetch it again.
///
/// Reads share an immutable snapshot and never wait on each other. Refreshes
/// are serialized by `refresh_lock` across the watermark check, the fetch, and
/// the swap, so concurrent callers wait for an in-flight refresh instead of
/// starting their own. A failed fetch leaves the previous snapshot in place.
pub struct InventoryCache<S: InventorySource> {
    source: S,
    ttl: Duration,
    snapshot: RwLock<Arc<InventorySnapshot>>,
    refresh_lock: Mutex<()>,
}

impl<S: InventorySource> InventoryCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: RwLock::new(Arc::new(InventorySnapshot::default())),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The snapshot currently installed, without triggering a refresh.
    pub fn snapshot(&self) -> Result<Arc<InventorySnapshot>, AppError> {
        self.snapshot
            .read()
            .map(|snapshot| Arc::clone(&snapshot))
            .map_err(|_| AppError::inventory("Inventory cache lock poisoned"))
    }

    /// Refresh the snapshot if forced, empty, expired, or outdated by the source.
    pub fn refresh(&self, force: bool) -> Result<RefreshOutcome, AppError> {
        let _guard = self
            .refresh_lock
            .lock()
            .map_err(|_| AppError::inventory("Inventory refresh lock poisoned"))?;

        let now = Utc::now();
        let watermark = self.source.watermark()?;
        if !self.snapshot()?.should_reload(force, now, self.ttl, watermark) {
            debug!("Inventory cache is fresh");
            return Ok(RefreshOutcome::Fresh);
        }

        info!("Inventory change or TTL detected. Refreshing cache...");
        let document = self.source.fetch()?;
        let next = InventorySnapshot::from_document(&document, now, watermark);
        let hosts = next.host_count();

        *self
            .snapshot
            .write()
            .map_err(|_| AppError::inventory("Inventory cache lock poisoned"))? = Arc::new(next);

        info!(
            "Inventory cache updated: {} hosts, marker {}",
            hosts,
            watermark.map(|mark| mark.to_rfc3339()).unwrap_or_else(|| "none".to_string())
        );
        Ok(RefreshOutcome::Reloaded { hosts, watermark })
    }

    /// A snapshot that is fresh according to the refresh policy.
    ///
    /// When a refresh is due but fails, the previous snapshot is served as long
    /// as it holds any hosts.
    pub fn current(&self) -> Result<Arc<InventorySnapshot>, AppError> {
        let snapshot = self.snapshot()?;
        let due = match self.source.watermark() {
            Ok(watermark) => snapshot.should_reload(false, Utc::now(), self.ttl, watermark),
            Err(err) => {
                error!("Cannot read inventory watermark: {}", err);
                snapshot.is_empty()
            }
        };
        if !due {
            return Ok(snapshot);
        }

        match self.refresh(false) {
            Ok(_) => self.snapshot(),
            Err(err) if !snapshot.is_empty() => {
                error!("Inventory refresh failed, serving stale data: {}", err);
                Ok(snapshot)
            }
            Err(err) => Err(err),
        }
    }

    /// Variables of `hostname`.
    pub fn get(&self, hostname: &str) -> Result<HostVars, AppError> {
        self.current()?
            .host(hostname)
            .cloned()
            .ok_or_else(|| AppError::inventory(format!("Node {} not found in inventory", hostname)))
    }

    /// Fleet-wide variables (the `all` group).
    pub fn global_vars(&self) -> Result<HostVars, AppError> {
        Ok(self.current()?.global_vars().clone())
    }

    /// Hostname bound to `machine_id`, if any.
    pub fn hostname_by_machine_id(&self, machine_id: &str) -> Result<Option<String>, AppError> {
        Ok(self.current()?.hostname_by_machine_id(machine_id).map(str::to_string))
    }
}
