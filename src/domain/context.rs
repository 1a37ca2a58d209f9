use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::domain::credential::SCRAMBLED_KEY_VAR;
use crate::domain::inventory::HostVars;
use crate::domain::manifest::Manifests;

/// Keys owned by the assembler; host variables with these names are shadowed.
const RESERVED_KEYS: [&str; 5] =
    ["hostname", SCRAMBLED_KEY_VAR, "script_manifest", "skel_manifest", "cert_manifest"];

/// Fully built variable set handed to the renderer as `node`.
///
/// A context is only constructed once every phase has produced its value, and
/// it cannot be changed afterwards.
#[derive(Debug, Clone)]
pub struct NodeContext {
    hostname: String,
    vars: HostVars,
    api_key_scrambled: String,
    manifests: Option<Manifests>,
}

impl NodeContext {
    /// Context for the normal provisioning workflow.
    pub fn provisioning(
        hostname: impl Into<String>,
        vars: HostVars,
        api_key_scrambled: String,
        manifests: Manifests,
    ) -> Self {
        Self { hostname: hostname.into(), vars, api_key_scrambled, manifests: Some(manifests) }
    }

    /// Context for the purge workflow, which carries no manifests.
    pub fn purge(hostname: impl Into<String>, vars: HostVars, api_key_scrambled: String) -> Self {
        Self { hostname: hostname.into(), vars, api_key_scrambled, manifests: None }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn manifests(&self) -> Option<&Manifests> {
        self.manifests.as_ref()
    }

    /// Look up a dotted path such as `script_manifest.0.name` in the context.
    pub fn contains_path(&self, path: &str) -> bool {
        let Ok(mut current) = serde_json::to_value(self) else {
            return false;
        };
        for segment in path.split('.') {
            let next = match &current {
                Value::Object(map) => map.get(segment).cloned(),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return false,
            }
        }
        true
    }
}

impl Serialize for NodeContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.vars {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry("hostname", &self.hostname)?;
        map.serialize_entry(SCRAMBLED_KEY_VAR, &self.api_key_scrambled)?;
        if let Some(manifests) = &self.manifests {
            map.serialize_entry("script_manifest", &manifests.scripts)?;
            map.serialize_entry("skel_manifest", &manifests.skeletons)?;
            map.serialize_entry("cert_manifest", &manifests.certificates)?;
        }
        map.end()
    }
}
