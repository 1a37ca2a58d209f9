use serde::Serialize;

use super::declaration::FileDeclaration;
use crate::ports::ContentFingerprints;

/// Inventory key holding a node's skeleton (dotfile) declarations.
pub const SKELETONS_KEY: &str = "nexus_skels";

const DOT_PREFIX: &str = "dot.";

/// A skeleton file and the name it takes on the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkeletonEntry {
    pub src_name: String,
    pub dest_name: String,
    pub remove: bool,
    pub r#override: bool,
    pub hash: String,
}

/// Map a stored skeleton name to its on-node name: `dot.bashrc` -> `.bashrc`.
pub fn destination_name(src_name: &str) -> String {
    match src_name.strip_prefix(DOT_PREFIX) {
        Some(rest) => format!(".{}", rest),
        None => src_name.to_string(),
    }
}

/// Build the skeleton manifest.
///
/// Unlike scripts, a missing file is kept with an empty fingerprint whatever
/// the `override` flag says.
pub fn build_skeleton_manifest(
    declarations: Vec<FileDeclaration>,
    content: &impl ContentFingerprints,
) -> Vec<SkeletonEntry> {
    declarations
        .into_iter()
        .filter_map(|declaration| {
            let name = declaration.name()?;
            let hash = if declaration.remove {
                String::new()
            } else {
                content.skeleton(name).unwrap_or_default()
            };
            Some(SkeletonEntry {
                src_name: name.to_string(),
                dest_name: destination_name(name),
                remove: declaration.remove,
                r#override: declaration.r#override,
                hash,
            })
        })
        .collect()
}
