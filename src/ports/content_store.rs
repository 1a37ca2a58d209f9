/// Port for fingerprinting the physical content a node may be told to fetch.
///
/// Every lookup returns `None` when the file does not exist.
pub trait ContentFingerprints {
    /// Fingerprint of a file under the scripts root.
    fn script(&self, name: &str) -> Option<String>;

    /// Fingerprint of a file under the skeleton (dotfiles) root.
    fn skeleton(&self, name: &str) -> Option<String>;

    /// Fingerprint of a certificate artifact stored under `domain`.
    fn certificate(&self, domain: &str, file_name: &str) -> Option<String>;
}
