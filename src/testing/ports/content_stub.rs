use std::collections::HashMap;
use std::sync::Mutex;

use crate::ports::ContentFingerprints;

/// Content fingerprints served from maps; records every lookup.
#[derive(Default)]
pub struct FakeContent {
    scripts: HashMap<String, String>,
    skeletons: HashMap<String, String>,
    certificates: HashMap<(String, String), String>,
    lookups: Mutex<Vec<String>>,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, name: &str, hash: &str) -> Self {
        self.scripts.insert(name.to_string(), hash.to_string());
        self
    }

    pub fn with_skeleton(mut self, name: &str, hash: &str) -> Self {
        self.skeletons.insert(name.to_string(), hash.to_string());
        self
    }

    pub fn with_certificate(mut self, domain: &str, file_name: &str, hash: &str) -> Self {
        self.certificates.insert((domain.to_string(), file_name.to_string()), hash.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    fn record(&self, lookup: String) {
        self.lookups.lock().unwrap().push(lookup);
    }
}

impl ContentFingerprints for FakeContent {
    fn script(&self, name: &str) -> Option<String> {
        self.record(format!("scripts/{}", name));
        self.scripts.get(name).cloned()
    }

    fn skeleton(&self, name: &str) -> Option<String> {
        self.record(format!("skels/{}", name));
        self.skeletons.get(name).cloned()
    }

    fn certificate(&self, domain: &str, file_name: &str) -> Option<String> {
        self.record(format!("certs/{}/{}", domain, file_name));
        self.certificates.get(&(domain.to_string(), file_name.to_string())).cloned()
    }
}
