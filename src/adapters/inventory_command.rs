use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::domain::AppError;
use crate::ports::InventorySource;

/// Inventory source backed by an external command that prints JSON.
///
/// The watermark is the newest modification time of the inventory definition
/// files found (recursively) under `inventory_dir`.
#[derive(Debug, Clone)]
pub struct CommandInventorySource {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    inventory_dir: PathBuf,
    extensions: Vec<String>,
}

impl CommandInventorySource {
    pub fn new(
        command: &[String],
        working_dir: PathBuf,
        inventory_dir: PathBuf,
        extensions: Vec<String>,
    ) -> Result<Self, AppError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AppError::config_error("inventory_command must not be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir,
            inventory_dir,
            extensions,
        })
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self) -> Result<Vec<u8>, AppError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| AppError::InventoryCommand {
                command: self.command_line(),
                details: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AppError::InventoryCommand {
                command: self.command_line(),
                details: if stderr.is_empty() { output.status.to_string() } else { stderr },
            });
        }

        Ok(output.stdout)
    }
}

impl InventorySource for CommandInventorySource {
    fn fetch(&self) -> Result<Value, AppError> {
        let stdout = self.run()?;
        let document: Value = serde_json::from_slice(&stdout).map_err(|e| {
            AppError::inventory(format!("Inventory output is not valid JSON: {}", e))
        })?;
        if !document.is_object() {
            return Err(AppError::inventory("Inventory output is not a JSON object"));
        }
        Ok(document)
    }

    fn watermark(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let newest = latest_modification(&self.inventory_dir, &self.extensions).map_err(|e| {
            AppError::inventory(format!(
                "Cannot scan inventory directory {}: {}",
                self.inventory_dir.display(),
                e
            ))
        })?;
        Ok(newest.map(DateTime::<Utc>::from))
    }
}

/// Newest mtime of files under `dir` whose extension is in `extensions`.
///
/// Only a failure to list `dir` itself is an error. Entries that cannot be
/// inspected, such as dangling editor lock links, are skipped.
fn latest_modification(dir: &Path, extensions: &[String]) -> io::Result<Option<SystemTime>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let mut newest = None;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        let candidate = match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => match latest_modification(&path, extensions) {
                Ok(candidate) => candidate,
                Err(err) => {
                    warn!("Skipping inventory directory {}: {}", path.display(), err);
                    None
                }
            },
            Ok(_) if has_extension(&path, extensions) => {
                match fs::metadata(&path).and_then(|metadata| metadata.modified()) {
                    Ok(modified) => Some(modified),
                    Err(err) => {
                        warn!("Skipping inventory file {}: {}", path.display(), err);
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(err) => {
                warn!("Skipping inventory entry {}: {}", path.display(), err);
                None
            }
        };
        newest = newest.max(candidate);
    }
    Ok(newest)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}
