//! Request tagging shared by both browsers.
//!
//! Every fetch leaves a browser carrying the parameters that were active at
//! dispatch time. When the result comes back the browser compares the tag
//! against its current parameters and drops anything that no longer
//! matches.

use crate::node::Node;
use crate::repository::PageRequest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchMode {
    /// Replaces the listing wholesale (open, navigation, fresh search).
    Replace,
    /// Appends the next page to the listing.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTag {
    /// Monotonic per browser; only the latest dispatched request may land.
    pub seq: u64,
    /// `None` targets the tree's root folder.
    pub folder: Option<String>,
    pub search_text: String,
    pub mode: FetchMode,
}

/// A fetch a browser wants dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRequest {
    pub tag: FetchTag,
    /// `None` loads the whole folder.
    pub page: Option<PageRequest>,
}

/// Raw folder contents as returned through the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFolder {
    pub root_path: String,
    pub folder_path: String,
    pub nodes: Vec<Node>,
}

/// What applying a result did to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Failed(String),
    /// The result no longer matched the browser's parameters and was dropped.
    Stale,
}

impl Applied {
    pub fn is_stale(&self) -> bool {
        matches!(self, Applied::Stale)
    }
}

/// Coarse status of one browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}
