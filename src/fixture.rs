//! JSON description of the two libraries a headless session runs against.

use crate::config::{LibraryConfig, SessionConfig};
use crate::error::Result;
use crate::memory_repository::{FailureRule, MemoryRepository};
use crate::node::{Node, TreeRoot};
use crate::path_utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureFile {
    /// Relative to the library root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_ref: Option<String>,
}

/// `count` folders named `{prefix}{n:03}` under `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFolders {
    #[serde(default)]
    pub parent: String,
    pub prefix: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryFixture {
    pub tree_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub host_url: String,
    pub root_path: String,
    /// Folder paths relative to the root; parents are created implicitly.
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub files: Vec<FixtureFile>,
    #[serde(default)]
    pub generated_folders: Vec<GeneratedFolders>,
}

impl LibraryFixture {
    pub fn tree_root(&self) -> TreeRoot {
        TreeRoot::new(self.tree_id.clone(), self.host_url.clone())
    }

    fn absolute(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            self.root_path.clone()
        } else {
            path_utils::join(&self.root_path, relative)
        }
    }

    fn add_folder(&self, nodes: &mut Vec<Node>, relative: &str) {
        let mut cumulative = String::new();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            cumulative = if cumulative.is_empty() {
                segment.to_string()
            } else {
                format!("{}/{}", cumulative, segment)
            };
            let path = self.absolute(&cumulative);
            if !nodes.iter().any(|n| path_utils::same_path(&n.path, &path)) {
                nodes.push(Node::folder(segment, path));
            }
        }
    }

    /// Every node of the library, with absolute paths.
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        for folder in &self.folders {
            self.add_folder(&mut nodes, folder);
        }
        for generated in &self.generated_folders {
            self.add_folder(&mut nodes, &generated.parent);
            for i in 1..=generated.count {
                let relative = format!(
                    "{}/{}{:03}",
                    generated.parent.trim_matches('/'),
                    generated.prefix,
                    i
                );
                self.add_folder(&mut nodes, &relative);
            }
        }
        for file in &self.files {
            self.add_folder(&mut nodes, &path_utils::parent(&format!("/{}", file.path)));
            let path = self.absolute(&file.path);
            let mut node = Node::file(path_utils::file_name(&path), path.clone());
            node.size_bytes = file.size_bytes;
            node.modified_at = file.modified_at;
            node.modified_by = file.modified_by.clone();
            node.preview_ref = file.preview_ref.clone();
            nodes.push(node);
        }
        nodes
    }

    fn library_config(&self, default_title: &str) -> LibraryConfig {
        LibraryConfig {
            tree_id: self.tree_id.clone(),
            title: self.title.clone().unwrap_or_else(|| default_title.to_string()),
            host_url: self.host_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub templates: LibraryFixture,
    pub destination: LibraryFixture,
    /// Session settings; library entries are taken from the fixture.
    #[serde(default)]
    pub settings: SessionConfig,
    #[serde(default)]
    pub latency_ms: u64,
    /// Per-query search latency, for exercising out-of-order responses.
    #[serde(default)]
    pub search_latency_ms: HashMap<String, u64>,
    #[serde(default)]
    pub failures: Vec<FailureRule>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            templates: LibraryFixture {
                tree_id: "6f1c2a9e-8d3b-4c57-9e21-0b7a4d5e3f10".to_string(),
                title: Some("Templates".to_string()),
                host_url: "https://contoso.example/sites/hr".to_string(),
                root_path: "/sites/hr/Templates".to_string(),
                folders: vec!["Policies".to_string()],
                files: vec![
                    FixtureFile {
                        path: "template.docx".to_string(),
                        size_bytes: Some(24_576),
                        modified_at: None,
                        modified_by: Some("HR Team".to_string()),
                        preview_ref: Some("5f0c7e1a-3b2d-4e6f-8a9b-0c1d2e3f4a5b".to_string()),
                    },
                    FixtureFile {
                        path: "Policies/leave.docx".to_string(),
                        size_bytes: Some(18_432),
                        modified_at: None,
                        modified_by: None,
                        preview_ref: None,
                    },
                    FixtureFile {
                        path: "Policies/budget.xlsx".to_string(),
                        size_bytes: Some(9_216),
                        modified_at: None,
                        modified_by: None,
                        preview_ref: None,
                    },
                ],
                generated_folders: Vec::new(),
            },
            destination: LibraryFixture {
                tree_id: "a2b3c4d5-e6f7-4890-abcd-ef0123456789".to_string(),
                title: Some("Shared Documents".to_string()),
                host_url: "https://contoso.example/sites/team".to_string(),
                root_path: "/sites/team/Shared Documents".to_string(),
                folders: vec![
                    "2024".to_string(),
                    "Clients/Acme".to_string(),
                    "Clients/Globex".to_string(),
                    "Invoices/invoice-2023".to_string(),
                    "Invoices/invoice-2024".to_string(),
                    "Forms".to_string(),
                ],
                files: Vec::new(),
                generated_folders: Vec::new(),
            },
            settings: SessionConfig::default(),
            latency_ms: 0,
            search_latency_ms: HashMap::new(),
            failures: Vec::new(),
        }
    }
}

impl Fixture {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        Ok(fixture)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            templates: self.templates.library_config(&self.settings.templates.title),
            destination: self.destination.library_config(&self.settings.destination.title),
            ..self.settings.clone()
        }
    }

    pub fn repository(&self) -> MemoryRepository {
        let mut repository = MemoryRepository::new()
            .with_tree(
                self.templates.tree_root(),
                self.templates.root_path.clone(),
                self.templates.nodes(),
            )
            .with_tree(
                self.destination.tree_root(),
                self.destination.root_path.clone(),
                self.destination.nodes(),
            )
            .with_latency(Duration::from_millis(self.latency_ms));
        for (query, ms) in &self.search_latency_ms {
            repository = repository.with_search_latency(query.clone(), Duration::from_millis(*ms));
        }
        for rule in &self.failures {
            repository = repository.with_failure(rule.clone());
        }
        repository
    }
}
