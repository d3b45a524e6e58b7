//! RON session configuration

use crate::Result;
use colloquy_history::HistoryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Session settings
///
/// Every field has a default, so a partial file is valid:
///
/// ```
/// use colloquy_session::SessionConfig;
///
/// let config = SessionConfig::from_ron_str("(history: (max_pairs: 5))").unwrap();
/// assert_eq!(config.history.max_pairs, 5);
/// assert!(!config.ignore_children);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Per-actor history bounds
    pub history: HistoryConfig,
    /// Whether ignoring an event also ignores the replies to it
    pub ignore_children: bool,
}

impl SessionConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Load a configuration from a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from_ron_str("()").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.history.max_pairs, 3);
    }

    #[test]
    fn test_full() {
        let config = SessionConfig::from_ron_str(
            r#"(
                history: (max_pairs: 2),
                ignore_children: true,
            )"#,
        )
        .unwrap();
        assert_eq!(config.history.max_entries(), 4);
        assert!(config.ignore_children);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            SessionConfig::from_ron_str("(history: 7)"),
            Err(Error::Ron(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("colloquy-session-{}.ron", std::process::id()));
        fs::write(&path, "(ignore_children: true)").unwrap();
        let config = SessionConfig::load_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(config.ignore_children);

        assert!(matches!(
            SessionConfig::load_file("/nonexistent/colloquy.ron"),
            Err(Error::Io(_))
        ));
    }
}
