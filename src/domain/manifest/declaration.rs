use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::domain::inventory::HostVars;

/// An inventory list item: either a bare name or a structured declaration.
///
/// Normalized to the structured form as soon as it is deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Declaration<T> {
    Name(String),
    Detailed(T),
}

/// Structured declaration that can be built from its bare-name shorthand.
pub trait FromName {
    fn from_name(name: String) -> Self;
}

/// Declaration shape shared by scripts and skeleton files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remove: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#override: bool,
}

/// Deserialize an explicit `null` (an empty YAML key) as the field's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl FromName for FileDeclaration {
    fn from_name(name: String) -> Self {
        Self { name: Some(name), ..Self::default() }
    }
}

impl FileDeclaration {
    /// The declared name, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Read the declaration list stored under `key` in the host variables.
///
/// A missing key means no declarations. Items that fail to deserialize are
/// skipped with a warning; they never fail the assembly.
pub fn parse_declarations<T>(vars: &HostVars, key: &str) -> Vec<T>
where
    T: DeserializeOwned + FromName,
{
    let items = match vars.get(key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!("Ignoring {}: expected a list, found {}", key, type_name(other));
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<Declaration<T>>(item.clone()) {
            Ok(Declaration::Name(name)) => Some(T::from_name(name)),
            Ok(Declaration::Detailed(declaration)) => Some(declaration),
            Err(err) => {
                warn!("Skipping malformed {} entry {}: {}", key, item, err);
                None
            }
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> HostVars {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn bare_names_become_default_declarations() {
        let host = vars(json!({ "nexus_scripts": ["backup.sh", { "name": "cron.sh", "override": true }] }));
        let parsed: Vec<FileDeclaration> = parse_declarations(&host, "nexus_scripts");

        assert_eq!(parsed[0], FileDeclaration::from_name("backup.sh".into()));
        assert_eq!(parsed[1].name(), Some("cron.sh"));
        assert!(parsed[1].r#override);
        assert!(!parsed[1].remove);
    }

    #[test]
    fn malformed_items_are_skipped() {
        let host = vars(json!({ "nexus_scripts": [42, { "name": "ok.sh", "remove": "yes" }, "fine.sh"] }));
        let parsed: Vec<FileDeclaration> = parse_declarations(&host, "nexus_scripts");

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name(), Some("fine.sh"));
    }

    #[test]
    fn null_flags_fall_back_to_defaults() {
        let host = vars(json!({ "nexus_scripts": [{ "name": "deploy.sh", "remove": null, "override": null }] }));
        let parsed: Vec<FileDeclaration> = parse_declarations(&host, "nexus_scripts");

        assert_eq!(parsed, vec![FileDeclaration::from_name("deploy.sh".into())]);
    }

    #[test]
    fn non_list_value_yields_nothing() {
        let host = vars(json!({ "nexus_scripts": "backup.sh" }));
        let parsed: Vec<FileDeclaration> = parse_declarations(&host, "nexus_scripts");
        assert!(parsed.is_empty());
    }

    #[test]
    fn empty_name_is_treated_as_missing() {
        let declaration = FileDeclaration { name: Some(String::new()), ..Default::default() };
        assert_eq!(declaration.name(), None);
    }
}
