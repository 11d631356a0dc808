//! Breadcrumb trails derived from a current folder and its library root.

use crate::path_utils;
use crate::url_utils;
use serde::{Deserialize, Serialize};

/// Where activating a breadcrumb entry leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreadcrumbTarget {
    /// Navigate the owning browser to this folder.
    Path(String),
    /// Open an externally viewable location.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbEntry {
    pub key: String,
    pub label: String,
    /// `None` for entries that cannot be activated.
    pub target: Option<BreadcrumbTarget>,
    pub is_current: bool,
}

impl BreadcrumbEntry {
    pub fn is_navigable(&self) -> bool {
        self.target.is_some()
    }
}

/// Build the trail from `root_path` down to `current_path`.
///
/// Empty at the root. Otherwise the first entry is the root itself and the
/// last one stands for the current folder and has no target. Targets are
/// accumulated from `root_path` segment by segment.
pub fn build(current_path: &str, root_path: &str, root_label: &str) -> Vec<BreadcrumbEntry> {
    if current_path.is_empty() || path_utils::same_path(current_path, root_path) {
        return Vec::new();
    }

    let segments = path_utils::segments_below(current_path, root_path);
    if segments.is_empty() {
        return Vec::new();
    }

    let mut entries = Vec::with_capacity(segments.len() + 1);
    entries.push(BreadcrumbEntry {
        key: "root".to_string(),
        label: root_label.to_string(),
        target: Some(BreadcrumbTarget::Path(root_path.to_string())),
        is_current: false,
    });

    let last = segments.len() - 1;
    let mut cumulative = root_path.to_string();
    for (index, segment) in segments.into_iter().enumerate() {
        cumulative = path_utils::join(&cumulative, &segment);
        let is_last = index == last;
        entries.push(BreadcrumbEntry {
            key: format!("folder-{}", index),
            label: segment,
            target: (!is_last).then(|| BreadcrumbTarget::Path(cumulative.clone())),
            is_current: is_last,
        });
    }

    entries
}

/// Collapse the trail for the success view: an ellipsis when the full trail
/// had more than one entry, followed by the destination folder pointing at
/// its external URL.
pub fn build_success_trail(
    destination_folder: &str,
    root_path: &str,
    root_label: &str,
    host_url: &str,
) -> Vec<BreadcrumbEntry> {
    let full = build(destination_folder, root_path, root_label);
    let Some(last) = full.last() else {
        return Vec::new();
    };

    let mut trail = Vec::with_capacity(2);
    if full.len() > 1 {
        trail.push(BreadcrumbEntry {
            key: "ellipsis".to_string(),
            label: "...".to_string(),
            target: None,
            is_current: false,
        });
    }
    trail.push(BreadcrumbEntry {
        key: last.key.clone(),
        label: last.label.clone(),
        target: Some(BreadcrumbTarget::Url(url_utils::build_full_url(
            destination_folder,
            host_url,
        ))),
        is_current: true,
    });
    trail
}

/// Labels joined for display and assertions, e.g. `Documents > 2024 > Q1`.
pub fn trail_text(entries: &[BreadcrumbEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.label.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}
