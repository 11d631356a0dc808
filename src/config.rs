use crate::error::{Result, TemplateCopyError};
use crate::node::TreeRoot;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

pub const DEFAULT_TEMPLATE_TITLE: &str = "Templates";
pub const DEFAULT_DESTINATION_TITLE: &str = "Destination";

/// One document library the session works against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library id, a hyphenated GUID.
    pub tree_id: String,
    /// Label of the root breadcrumb entry.
    pub title: String,
    pub host_url: String,
}

impl LibraryConfig {
    fn unconfigured(title: &str) -> Self {
        Self {
            tree_id: String::new(),
            title: title.to_string(),
            host_url: String::new(),
        }
    }

    pub fn tree_root(&self) -> TreeRoot {
        TreeRoot::new(self.tree_id.clone(), self.host_url.clone())
    }

    pub fn has_valid_id(&self) -> bool {
        is_hyphenated_guid(&self.tree_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub templates: LibraryConfig,
    pub destination: LibraryConfig,
    pub allow_create_at_root: bool,
    pub page_size: usize,
    pub search_debounce_ms: u64,
    /// Fraction of the scrollable extent after which the next page loads.
    pub scroll_threshold: f32,
    /// Reload the template folder after a successful copy.
    pub refresh_templates_after_copy: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            templates: LibraryConfig::unconfigured(DEFAULT_TEMPLATE_TITLE),
            destination: LibraryConfig::unconfigured(DEFAULT_DESTINATION_TITLE),
            allow_create_at_root: false,
            page_size: 50,
            search_debounce_ms: 500,
            scroll_threshold: 0.8,
            refresh_templates_after_copy: true,
        }
    }
}

impl SessionConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Check the settings a session cannot run without.
    pub fn validate(&self) -> Result<()> {
        let missing = match (self.templates.has_valid_id(), self.destination.has_valid_id()) {
            (true, true) => None,
            (false, true) => Some("templates library"),
            (true, false) => Some("destination library"),
            (false, false) => Some("templates and destination libraries"),
        };
        if let Some(which) = missing {
            return Err(TemplateCopyError::Config(format!(
                "configure the {} (expected a library GUID)",
                which
            )));
        }

        for (name, library) in [("templates", &self.templates), ("destination", &self.destination)] {
            match Url::parse(&library.host_url) {
                Ok(url) if url.has_host() => {}
                _ => {
                    return Err(TemplateCopyError::Config(format!(
                        "{} host_url is not an absolute URL: {:?}",
                        name, library.host_url
                    )))
                }
            }
        }

        if self.page_size == 0 {
            return Err(TemplateCopyError::Config("page_size must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.scroll_threshold) {
            return Err(TemplateCopyError::Config(
                "scroll_threshold must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, any case.
pub fn is_hyphenated_guid(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATES_ID: &str = "6f1c2a9e-8d3b-4c57-9e21-0b7a4d5e3f10";
    const DESTINATION_ID: &str = "A2B3C4D5-E6F7-4890-ABCD-EF0123456789";

    fn configured() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.templates.tree_id = TEMPLATES_ID.to_string();
        config.templates.host_url = "https://contoso.example/sites/hr".to_string();
        config.destination.tree_id = DESTINATION_ID.to_string();
        config.destination.host_url = "https://contoso.example/sites/team".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert!(!config.allow_create_at_root);
        assert_eq!(config.templates.title, "Templates");
        assert_eq!(config.destination.title, "Destination");
    }

    #[test]
    fn test_guid_shapes() {
        assert!(is_hyphenated_guid(TEMPLATES_ID));
        assert!(is_hyphenated_guid(DESTINATION_ID));
        assert!(!is_hyphenated_guid("6f1c2a9e8d3b4c579e210b7a4d5e3f10"));
        assert!(!is_hyphenated_guid("{6f1c2a9e-8d3b-4c57-9e21-0b7a4d5e3f10}"));
        assert!(!is_hyphenated_guid(""));
    }

    #[test]
    fn test_validate_names_missing_library() {
        assert!(configured().validate().is_ok());

        let mut config = configured();
        config.destination.tree_id.clear();
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("destination library"), "{}", message);

        let message = SessionConfig::default().validate().unwrap_err().to_string();
        assert!(message.contains("templates and destination"), "{}", message);
    }

    #[test]
    fn test_validate_host_url() {
        let mut config = configured();
        config.templates.host_url = "/sites/hr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "page_size": 20 }"#).unwrap();

        let config = SessionConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.search_debounce_ms, 500);
    }
}
