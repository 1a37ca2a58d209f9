use serde::Serialize;
use tracing::warn;

use super::declaration::FileDeclaration;
use crate::ports::ContentFingerprints;

/// Inventory key holding a node's script declarations.
pub const SCRIPTS_KEY: &str = "nexus_scripts";

/// A script the node should install (or remove).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptEntry {
    pub name: String,
    pub remove: bool,
    pub r#override: bool,
    /// Content fingerprint; empty when removing or when an override vouches
    /// for a file that is not on disk.
    pub hash: String,
}

pub fn build_script_manifest(
    declarations: Vec<FileDeclaration>,
    content: &impl ContentFingerprints,
) -> Vec<ScriptEntry> {
    let mut manifest = Vec::new();

    for declaration in declarations {
        let Some(name) = declaration.name() else {
            continue;
        };

        let mut entry = ScriptEntry {
            name: name.to_string(),
            remove: declaration.remove,
            r#override: declaration.r#override,
            hash: String::new(),
        };

        if !entry.remove {
            match content.script(name) {
                Some(hash) => entry.hash = hash,
                None if entry.r#override => {}
                None => {
                    warn!("Script {} defined but not found in the scripts directory", name);
                    continue;
                }
            }
        }
        manifest.push(entry);
    }

    manifest
}
