use serde::{Deserialize, Serialize};

use super::declaration::{FromName, null_as_default};
use crate::ports::ContentFingerprints;

/// Inventory key holding a node's certificate declarations.
pub const CERTIFICATES_KEY: &str = "nexus_ssl";

/// The artifacts a certificate bundle may consist of, in manifest order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateRole {
    Cert,
    PrivateKey,
    Chain,
    FullChain,
}

impl CertificateRole {
    pub const ALL: [CertificateRole; 4] =
        [CertificateRole::Cert, CertificateRole::PrivateKey, CertificateRole::Chain, CertificateRole::FullChain];

    pub fn file_name(self) -> &'static str {
        match self {
            CertificateRole::Cert => "cert.pem",
            CertificateRole::PrivateKey => "privkey.pem",
            CertificateRole::Chain => "chain.pem",
            CertificateRole::FullChain => "fullchain.pem",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CertificateDeclaration {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub dest_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remove: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#override: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generate_p12: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generate_combined: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub restart_services: Vec<String>,
}

impl FromName for CertificateDeclaration {
    fn from_name(domain: String) -> Self {
        Self { domain: Some(domain), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateFile {
    pub name: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateEntry {
    pub domain: String,
    pub dest_path: Option<String>,
    pub remove: bool,
    pub r#override: bool,
    pub generate_p12: bool,
    pub generate_combined: bool,
    pub restart_services: Vec<String>,
    pub files: Vec<CertificateFile>,
}

/// Build the certificate manifest.
///
/// Only the artifacts present on disk are listed; a partial bundle (for
/// example while a renewal is pending) is valid and needs no override.
pub fn build_certificate_manifest(
    declarations: Vec<CertificateDeclaration>,
    content: &impl ContentFingerprints,
) -> Vec<CertificateEntry> {
    declarations
        .into_iter()
        .filter_map(|declaration| {
            let domain = declaration.domain.filter(|domain| !domain.is_empty())?;

            let files = if declaration.remove {
                Vec::new()
            } else {
                CertificateRole::ALL
                    .iter()
                    .filter_map(|role| {
                        let name = role.file_name();
                        content
                            .certificate(&domain, name)
                            .map(|hash| CertificateFile { name: name.to_string(), hash })
                    })
                    .collect()
            };

            Some(CertificateEntry {
                domain,
                dest_path: declaration.dest_path,
                remove: declaration.remove,
                r#override: declaration.r#override,
                generate_p12: declaration.generate_p12,
                generate_combined: declaration.generate_combined,
                restart_services: declaration.restart_services,
                files,
            })
        })
        .collect()
}
