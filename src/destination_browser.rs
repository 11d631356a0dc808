//! Destination-tree navigation with paging, search and selection.
//!
//! The browser never performs I/O. Every operation that needs data returns
//! a [`FolderRequest`] carrying a [`FetchTag`]; the session dispatches it
//! and feeds the result back through [`DestinationBrowser::apply`], which
//! drops anything that no longer matches the browser's parameters.

use crate::breadcrumb;
use crate::error::{RepositoryError, Result, TemplateCopyError};
use crate::fetch::{Applied, BrowserStatus, FetchMode, FetchTag, FetchedFolder, FolderRequest};
use crate::node::{self, Node, TreeRoot};
use crate::path_utils;
use crate::repository::{self, PageRequest};
use crate::template_browser::NavigationState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page_size: usize,
    pub loaded_count: usize,
    pub has_more: bool,
    /// Search text the loaded pages were fetched with.
    pub search_text: String,
}

impl PaginationState {
    fn new(page_size: usize) -> Self {
        Self {
            page_size,
            loaded_count: 0,
            has_more: false,
            search_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected_path: Option<String>,
}

/// Scroll position reported by whatever renders the listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f32,
    pub viewport: f32,
    pub extent: f32,
}

impl ScrollMetrics {
    /// True once the bottom of the viewport has passed `threshold` of the
    /// scrollable extent. A listing shorter than the viewport counts as
    /// scrolled to the bottom.
    pub fn is_near_bottom(&self, threshold: f32) -> bool {
        if self.extent <= 0.0 || self.extent <= self.viewport {
            return true;
        }
        (self.offset + self.viewport) / self.extent >= threshold
    }
}

#[derive(Debug)]
pub struct DestinationBrowser {
    root_label: String,
    tree: Option<TreeRoot>,
    root_path: Option<String>,
    /// Folder the next replace fetch targets; follows navigation before the
    /// listing arrives.
    target_folder: Option<String>,
    navigation: NavigationState,
    pagination: PaginationState,
    selection: SelectionState,
    status: BrowserStatus,
    in_flight: Option<FetchTag>,
    next_seq: u64,
}

impl DestinationBrowser {
    pub fn new(root_label: impl Into<String>, page_size: usize) -> Self {
        Self {
            root_label: root_label.into(),
            tree: None,
            root_path: None,
            target_folder: None,
            navigation: NavigationState::default(),
            pagination: PaginationState::new(page_size.max(1)),
            selection: SelectionState::default(),
            status: BrowserStatus::Idle,
            in_flight: None,
            next_seq: 0,
        }
    }

    /// Forget the opened tree. The fetch sequence keeps counting so results
    /// issued before the reset stay stale.
    pub fn reset(&mut self) {
        let next_seq = self.next_seq;
        *self = Self::new(std::mem::take(&mut self.root_label), self.pagination.page_size);
        self.next_seq = next_seq;
    }

    /// Reset every piece of state and load the first page of the root.
    pub fn open(&mut self, tree: TreeRoot) -> FolderRequest {
        log::debug!("destination browser: opening tree {}", tree.tree_id);
        self.tree = Some(tree);
        self.root_path = None;
        self.target_folder = None;
        self.navigation = NavigationState::default();
        self.pagination = PaginationState::new(self.pagination.page_size);
        self.selection = SelectionState::default();
        self.replace_request()
    }

    pub fn navigate_into(&mut self, node: &Node) -> Result<FolderRequest> {
        if !node.is_container {
            return Err(TemplateCopyError::NotAContainer(node.path.clone()));
        }
        self.navigate_to_breadcrumb(&node.path)
    }

    /// Replace the folder. Search text and selection are cleared at once;
    /// the listing is replaced when the first page lands.
    pub fn navigate_to_breadcrumb(&mut self, path: &str) -> Result<FolderRequest> {
        if self.tree.is_none() {
            return Err(TemplateCopyError::InvalidSelection(
                "destination library is not open".to_string(),
            ));
        }
        self.target_folder = Some(path.to_string());
        self.navigation.filter_text.clear();
        self.selection.selected_path = None;
        Ok(self.replace_request())
    }

    /// Store the text for display. The fetch itself is issued by
    /// [`Self::search_fetch`] once the debounce interval has passed.
    pub fn set_search_text(&mut self, text: &str) {
        self.navigation.filter_text = text.to_string();
    }

    pub fn search_text(&self) -> &str {
        &self.navigation.filter_text
    }

    /// First page for the current search text in the current folder.
    pub fn search_fetch(&mut self) -> Option<FolderRequest> {
        self.tree.as_ref()?;
        Some(self.replace_request())
    }

    /// Next page of the active listing, or `None` when there is nothing
    /// more to load or a fetch is already outstanding.
    pub fn load_more(&mut self) -> Option<FolderRequest> {
        if !self.pagination.has_more || self.in_flight.is_some() {
            return None;
        }
        // Typed text that has not been fetched yet would mix two searches.
        if self.navigation.filter_text != self.pagination.search_text {
            return None;
        }
        let tag = self.next_tag(
            Some(self.navigation.current_path.clone()),
            FetchMode::Append,
        );
        let page = PageRequest {
            size: self.pagination.page_size,
            skip: self.pagination.loaded_count,
        };
        log::debug!(
            "destination browser: loading more (skip {}) in {}",
            page.skip,
            self.navigation.current_path
        );
        Some(FolderRequest {
            tag,
            page: Some(page),
        })
    }

    /// Scroll signal; loads the next page once past `threshold`.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, threshold: f32) -> Option<FolderRequest> {
        if metrics.is_near_bottom(threshold) {
            self.load_more()
        } else {
            None
        }
    }

    fn replace_request(&mut self) -> FolderRequest {
        let tag = self.next_tag(self.target_folder.clone(), FetchMode::Replace);
        self.status = BrowserStatus::Loading;
        FolderRequest {
            tag,
            page: Some(PageRequest {
                size: self.pagination.page_size,
                skip: 0,
            }),
        }
    }

    fn next_tag(&mut self, folder: Option<String>, mode: FetchMode) -> FetchTag {
        self.next_seq += 1;
        let tag = FetchTag {
            seq: self.next_seq,
            folder,
            search_text: self.navigation.filter_text.clone(),
            mode,
        };
        self.in_flight = Some(tag.clone());
        tag
    }

    fn is_stale(&self, tag: &FetchTag) -> bool {
        let Some(in_flight) = &self.in_flight else {
            return true;
        };
        if in_flight.seq != tag.seq || tag.search_text != self.navigation.filter_text {
            return true;
        }
        tag.mode == FetchMode::Append
            && tag.folder.as_deref() != Some(self.navigation.current_path.as_str())
    }

    /// Apply a page of results if its tag still matches the browser.
    pub fn apply(
        &mut self,
        tag: &FetchTag,
        result: std::result::Result<FetchedFolder, RepositoryError>,
    ) -> Applied {
        if self.is_stale(tag) {
            if self.in_flight.as_ref().map(|t| t.seq) == Some(tag.seq) {
                self.in_flight = None;
            }
            log::debug!(
                "destination browser: dropping stale result #{} ({:?})",
                tag.seq,
                tag.search_text
            );
            return Applied::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(folder) => {
                match tag.mode {
                    FetchMode::Replace => self.apply_first_page(folder, tag),
                    FetchMode::Append => self.apply_next_page(folder),
                }
                self.status = BrowserStatus::Loaded;
                Applied::Updated
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("destination browser: fetch failed: {}", message);
                if tag.mode == FetchMode::Replace {
                    self.navigation.listing.clear();
                    self.pagination.loaded_count = 0;
                    self.pagination.has_more = false;
                    self.selection.selected_path = None;
                    self.target_folder = (!self.navigation.current_path.is_empty())
                        .then(|| self.navigation.current_path.clone());
                }
                self.status = BrowserStatus::Failed(message.clone());
                Applied::Failed(message)
            }
        }
    }

    fn apply_first_page(&mut self, folder: FetchedFolder, tag: &FetchTag) {
        let raw_count = folder.nodes.len();
        let mut listing = self.page_nodes(&folder, &tag.search_text);
        node::sort_by_name(&mut listing);

        self.navigation.breadcrumb =
            breadcrumb::build(&folder.folder_path, &folder.root_path, &self.root_label);
        self.navigation.current_path = folder.folder_path.clone();
        self.navigation.listing = listing;
        self.root_path = Some(folder.root_path);
        self.target_folder = Some(folder.folder_path);
        self.pagination.loaded_count = raw_count;
        self.pagination.has_more = raw_count == self.pagination.page_size;
        self.pagination.search_text = tag.search_text.clone();
        self.selection.selected_path = None;
        log::debug!(
            "destination browser: first page of {} ({} items, more: {})",
            self.navigation.current_path,
            raw_count,
            self.pagination.has_more
        );
    }

    fn apply_next_page(&mut self, folder: FetchedFolder) {
        let raw_count = folder.nodes.len();
        let mut page = self.page_nodes(&folder, &self.pagination.search_text);
        node::sort_by_name(&mut page);

        let previous = self.selection.selected_path.take();
        self.navigation.listing.extend(page);
        self.selection.selected_path = rederive_selection(previous.as_deref(), &self.navigation.listing);
        self.pagination.loaded_count += raw_count;
        self.pagination.has_more = raw_count == self.pagination.page_size;
        log::debug!(
            "destination browser: appended {} items (total {}, more: {})",
            raw_count,
            self.pagination.loaded_count,
            self.pagination.has_more
        );
    }

    fn page_nodes(&self, folder: &FetchedFolder, search_text: &str) -> Vec<Node> {
        if search_text.is_empty() {
            folder
                .nodes
                .iter()
                .filter(|n| n.is_container && !repository::is_reserved_name(&n.name))
                .cloned()
                .collect()
        } else {
            filter_search_results(&folder.folder_path, &folder.nodes)
        }
    }

    /// Select a folder of the current listing, or clear the selection.
    pub fn select(&mut self, path: Option<&str>) -> Result<()> {
        match path {
            None => {
                self.selection.selected_path = None;
                Ok(())
            }
            Some(path) => {
                let node = self
                    .navigation
                    .listing
                    .iter()
                    .find(|n| path_utils::same_path(&n.path, path))
                    .ok_or_else(|| {
                        TemplateCopyError::InvalidSelection(format!("{} is not listed", path))
                    })?;
                self.selection.selected_path = Some(node.path.clone());
                Ok(())
            }
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selection.selected_path.as_deref()?;
        self.navigation
            .listing
            .iter()
            .position(|n| path_utils::same_path(&n.path, selected))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.navigation
            .listing
            .iter()
            .find(|node| node.name.eq_ignore_ascii_case(name))
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn status(&self) -> &BrowserStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn tree(&self) -> Option<&TreeRoot> {
        self.tree.as_ref()
    }

    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    pub fn root_label(&self) -> &str {
        &self.root_label
    }
}

/// Keep only direct child folders of `current_folder` from a search page.
///
/// The search index may lag or return deeper and unrelated matches, so a
/// result must sit exactly one level below the folder being browsed.
pub fn filter_search_results(current_folder: &str, nodes: &[Node]) -> Vec<Node> {
    let current = path_utils::normalize(current_folder);
    let wanted_depth = path_utils::depth_segments(current_folder).len() + 1;

    nodes
        .iter()
        .filter(|n| n.is_container && !repository::is_reserved_name(&n.name))
        .filter(|n| {
            let relative = path_utils::server_relative(&n.path);
            path_utils::normalize(&path_utils::parent(&relative)) == current
        })
        .filter(|n| path_utils::depth_segments(&n.path).len() == wanted_depth)
        .map(|n| Node {
            path: path_utils::join(current_folder, &n.name),
            ..n.clone()
        })
        .collect()
}

/// Selection after the listing changed: kept only while the path is still
/// listed.
pub fn rederive_selection(previous: Option<&str>, listing: &[Node]) -> Option<String> {
    let previous = previous?;
    listing
        .iter()
        .find(|n| path_utils::same_path(&n.path, previous))
        .map(|n| n.path.clone())
}
