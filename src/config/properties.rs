use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("Could not read properties file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Key-value pairs loaded from a Java-style properties file.
///
/// Supported format: one `key=value` or `key:value` pair per line (the
/// first separator wins), `#` or `!` comment lines, surrounding
/// whitespace trimmed. A key with an empty value is indistinguishable
/// from an absent key.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn load(path: &Path) -> Result<Self, PropertiesError> {
        let text = fs::read_to_string(path).map_err(|source| {
            error!("Not able to read configuration file {}", path.display());
            PropertiesError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = match line.find(['=', ':']) {
                Some(idx) => (line[..idx].trim(), line[idx + 1..].trim()),
                None => (line, ""),
            };

            if key.is_empty() {
                continue;
            }

            entries.insert(key.to_string(), value.to_string());
        }

        Self { entries }
    }

    /// Returns the value for `key`, or `None` if the key is absent or
    /// its value is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
