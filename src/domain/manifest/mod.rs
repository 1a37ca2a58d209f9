//! Normalization of per-node script, skeleton, and certificate declarations.

pub mod certificates;
pub mod declaration;
pub mod scripts;
pub mod skeletons;

pub use certificates::{CertificateEntry, CertificateFile, CertificateRole};
pub use declaration::FileDeclaration;
pub use scripts::ScriptEntry;
pub use skeletons::SkeletonEntry;

use crate::domain::inventory::HostVars;
use crate::ports::ContentFingerprints;

/// The three manifests attached to a node context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifests {
    pub scripts: Vec<ScriptEntry>,
    pub skeletons: Vec<SkeletonEntry>,
    pub certificates: Vec<CertificateEntry>,
}

impl Manifests {
    /// Normalize every manifest category declared in a node's variables.
    pub fn build(vars: &HostVars, content: &impl ContentFingerprints) -> Self {
        Self {
            scripts: scripts::build_script_manifest(
                declaration::parse_declarations(vars, scripts::SCRIPTS_KEY),
                content,
            ),
            skeletons: skeletons::build_skeleton_manifest(
                declaration::parse_declarations(vars, skeletons::SKELETONS_KEY),
                content,
            ),
            certificates: certificates::build_certificate_manifest(
                declaration::parse_declarations(vars, certificates::CERTIFICATES_KEY),
                content,
            ),
        }
    }
}
