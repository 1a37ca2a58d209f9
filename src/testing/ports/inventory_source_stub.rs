use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::AppError;
use crate::ports::InventorySource;

/// In-memory inventory source that counts fetches.
pub struct FakeInventorySource {
    document: Mutex<Value>,
    watermark: Mutex<Option<DateTime<Utc>>>,
    fetches: AtomicUsize,
    failing: AtomicBool,
    fetch_delay: Duration,
}

impl FakeInventorySource {
    pub fn new(document: Value) -> Self {
        Self {
            document: Mutex::new(document),
            watermark: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            fetch_delay: Duration::ZERO,
        }
    }

    /// Make every fetch take at least `delay`.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn set_document(&self, document: Value) {
        *self.document.lock().unwrap() = document;
    }

    pub fn set_watermark(&self, watermark: Option<DateTime<Utc>>) {
        *self.watermark.lock().unwrap() = watermark;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl InventorySource for FakeInventorySource {
    fn fetch(&self) -> Result<Value, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            thread::sleep(self.fetch_delay);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InventoryCommand {
                command: "fake-inventory --list".into(),
                details: "source unavailable".into(),
            });
        }
        Ok(self.document.lock().unwrap().clone())
    }

    fn watermark(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        Ok(*self.watermark.lock().unwrap())
    }
}
