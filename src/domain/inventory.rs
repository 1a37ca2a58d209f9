//! Inventory snapshot model and the refresh policy that governs it.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::warn;

/// Per-host (or global) variable mapping as emitted by the inventory source.
pub type HostVars = Map<String, Value>;

/// Host variable that binds a node to its machine identity.
pub const MACHINE_ID_VAR: &str = "nexus_id";

/// Immutable view of the last successful inventory fetch.
///
/// A snapshot is never edited after construction; refreshing builds a new one
/// and swaps it in whole.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    host_vars: BTreeMap<String, HostVars>,
    global_vars: HostVars,
    refreshed_at: Option<DateTime<Utc>>,
    watermark: Option<DateTime<Utc>>,
}

impl InventorySnapshot {
    /// Split an inventory document into per-host and global variables.
    ///
    /// Only `_meta.hostvars` and `all.vars` are retained. Host entries that are
    /// not mappings are skipped.
    pub fn from_document(
        document: &Value,
        refreshed_at: DateTime<Utc>,
        watermark: Option<DateTime<Utc>>,
    ) -> Self {
        let mut host_vars = BTreeMap::new();
        if let Some(hosts) = document.pointer("/_meta/hostvars").and_then(Value::as_object) {
            for (hostname, vars) in hosts {
                match vars.as_object() {
                    Some(vars) => {
                        host_vars.insert(hostname.clone(), vars.clone());
                    }
                    None => warn!("Ignoring host {} with non-mapping variables", hostname),
                }
            }
        }

        let global_vars =
            document.pointer("/all/vars").and_then(Value::as_object).cloned().unwrap_or_default();

        Self { host_vars, global_vars, refreshed_at: Some(refreshed_at), watermark }
    }

    pub fn is_empty(&self) -> bool {
        self.host_vars.is_empty()
    }

    pub fn host_count(&self) -> usize {
        self.host_vars.len()
    }

    pub fn host(&self, hostname: &str) -> Option<&HostVars> {
        self.host_vars.get(hostname)
    }

    pub fn global_vars(&self) -> &HostVars {
        &self.global_vars
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark
    }

    /// Find the host whose `nexus_id` equals `machine_id`.
    ///
    /// Hosts are scanned in hostname order and the first match wins. Identity
    /// values are expected to be unique; a duplicate is reported but not
    /// resolved.
    pub fn hostname_by_machine_id(&self, machine_id: &str) -> Option<&str> {
        let mut matches = self
            .host_vars
            .iter()
            .filter(|(_, vars)| vars.get(MACHINE_ID_VAR).and_then(Value::as_str) == Some(machine_id))
            .map(|(hostname, _)| hostname.as_str());

        let first = matches.next()?;
        if let Some(other) = matches.next() {
            warn!(
                "Machine id {} is bound to several hosts ({}, {}, ...); using {}",
                machine_id, first, other, first
            );
        }
        Some(first)
    }

    /// Decide whether the inventory must be fetched again.
    ///
    /// `current_watermark` is the newest modification time currently observed
    /// across the inventory definition files.
    pub fn should_reload(
        &self,
        force: bool,
        now: DateTime<Utc>,
        ttl: Duration,
        current_watermark: Option<DateTime<Utc>>,
    ) -> bool {
        if force || self.is_empty() {
            return true;
        }
        let expired = match self.refreshed_at {
            Some(refreshed_at) => now - refreshed_at > ttl,
            None => true,
        };
        expired || current_watermark > self.watermark
    }
}
