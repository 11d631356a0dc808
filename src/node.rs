use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A file or folder entry within one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    /// Server-relative path, meaningful only within the tree that produced it.
    pub path: String,
    pub is_container: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    /// Opaque handle the store uses to build embedded previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_ref: Option<String>,
}

impl Node {
    /// Create a new folder node
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: path.clone(),
            name: name.into(),
            path,
            is_container: true,
            size_bytes: None,
            modified_at: None,
            modified_by: None,
            preview_ref: None,
        }
    }

    /// Create a new file node
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            is_container: false,
            ..Self::folder(name, path)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_modified(mut self, at: DateTime<Utc>, by: impl Into<String>) -> Self {
        self.modified_at = Some(at);
        self.modified_by = Some(by.into());
        self
    }

    pub fn with_preview_ref(mut self, preview_ref: impl Into<String>) -> Self {
        self.preview_ref = Some(preview_ref.into());
        self
    }
}

/// Identifies one independently-addressable hierarchy.
///
/// `host_url` is the absolute location the tree is served from; every path
/// handed out for this tree is relative to that host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeRoot {
    pub tree_id: String,
    pub host_url: String,
}

impl TreeRoot {
    pub fn new(tree_id: impl Into<String>, host_url: impl Into<String>) -> Self {
        Self {
            tree_id: tree_id.into(),
            host_url: host_url.into(),
        }
    }
}

/// Case-insensitive name order, falling back to the raw names so the
/// ordering stays total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Containers first, then files; each group by [`compare_names`].
pub fn sort_listing(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| match (a.is_container, b.is_container) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_names(&a.name, &b.name),
    });
}

/// Name order only, used for destination pages which hold folders exclusively.
pub fn sort_by_name(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| compare_names(&a.name, &b.name));
}
