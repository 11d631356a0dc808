//! Source-tree navigation
//!
//! The template browser walks the template library one folder at a time.
//! Folders are fetched whole; the free-text filter is applied client-side
//! over the fetched listing since template libraries are small.

use crate::breadcrumb::{self, BreadcrumbEntry};
use crate::error::{RepositoryError, Result, TemplateCopyError};
use crate::fetch::{Applied, BrowserStatus, FetchMode, FetchTag, FetchedFolder, FolderRequest};
use crate::node::{self, Node, TreeRoot};
use serde::{Deserialize, Serialize};

/// Where a browser is and what it shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_path: String,
    pub breadcrumb: Vec<BreadcrumbEntry>,
    pub listing: Vec<Node>,
    pub filter_text: String,
}

#[derive(Debug)]
pub struct TemplateBrowser {
    root_label: String,
    tree: Option<TreeRoot>,
    root_path: Option<String>,
    state: NavigationState,
    status: BrowserStatus,
    in_flight: Option<FetchTag>,
    next_seq: u64,
}

impl TemplateBrowser {
    pub fn new(root_label: impl Into<String>) -> Self {
        Self {
            root_label: root_label.into(),
            tree: None,
            root_path: None,
            state: NavigationState::default(),
            status: BrowserStatus::Idle,
            in_flight: None,
            next_seq: 0,
        }
    }

    /// Attach to `tree` and load its root folder.
    pub fn open(&mut self, tree: TreeRoot) -> FolderRequest {
        log::debug!("template browser: opening tree {}", tree.tree_id);
        self.tree = Some(tree);
        self.root_path = None;
        self.state = NavigationState::default();
        self.request(None)
    }

    /// Enter a folder from the current listing.
    pub fn navigate_into(&mut self, node: &Node) -> Result<FolderRequest> {
        if !node.is_container {
            return Err(TemplateCopyError::NotAContainer(node.path.clone()));
        }
        self.navigate_to_breadcrumb(&node.path)
    }

    /// Jump to an arbitrary folder, typically an ancestor from the trail.
    pub fn navigate_to_breadcrumb(&mut self, path: &str) -> Result<FolderRequest> {
        if self.tree.is_none() {
            return Err(TemplateCopyError::InvalidSelection(
                "template library is not open".to_string(),
            ));
        }
        Ok(self.request(Some(path.to_string())))
    }

    /// Reload the folder currently shown.
    pub fn refresh(&mut self) -> Option<FolderRequest> {
        self.tree.as_ref()?;
        let folder = (!self.state.current_path.is_empty()).then(|| self.state.current_path.clone());
        Some(self.request(folder))
    }

    fn request(&mut self, folder: Option<String>) -> FolderRequest {
        self.next_seq += 1;
        let tag = FetchTag {
            seq: self.next_seq,
            folder,
            search_text: String::new(),
            mode: FetchMode::Replace,
        };
        self.in_flight = Some(tag.clone());
        self.status = BrowserStatus::Loading;
        FolderRequest { tag, page: None }
    }

    /// Filter the fetched listing by name. Never triggers a fetch.
    pub fn set_filter(&mut self, text: &str) {
        self.state.filter_text = text.to_string();
    }

    /// Folders first, then files, each by name; narrowed by the filter.
    pub fn current_listing(&self) -> Vec<&Node> {
        let query = self.state.filter_text.to_lowercase();
        self.state
            .listing
            .iter()
            .filter(|node| query.is_empty() || node.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Look up a node of the current listing by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.state
            .listing
            .iter()
            .find(|node| node.name.eq_ignore_ascii_case(name))
    }

    /// Apply a completed fetch. Listing, breadcrumb and current path change
    /// together or not at all.
    pub fn apply(
        &mut self,
        tag: &FetchTag,
        result: std::result::Result<FetchedFolder, RepositoryError>,
    ) -> Applied {
        if self.in_flight.as_ref().map(|t| t.seq) != Some(tag.seq) {
            log::debug!("template browser: dropping stale result #{}", tag.seq);
            return Applied::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(folder) => {
                let mut listing = folder.nodes;
                node::sort_listing(&mut listing);
                self.state.breadcrumb =
                    breadcrumb::build(&folder.folder_path, &folder.root_path, &self.root_label);
                self.state.current_path = folder.folder_path;
                self.state.listing = listing;
                self.root_path = Some(folder.root_path);
                self.status = BrowserStatus::Loaded;
                log::debug!(
                    "template browser: {} items in {}",
                    self.state.listing.len(),
                    self.state.current_path
                );
                Applied::Updated
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("template browser: fetch failed: {}", message);
                self.state.listing.clear();
                self.status = BrowserStatus::Failed(message.clone());
                Applied::Failed(message)
            }
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
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

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/sites/hr/Templates";

    fn tree() -> TreeRoot {
        TreeRoot::new("templates", "https://contoso.example/sites/hr")
    }

    fn root_listing() -> FetchedFolder {
        FetchedFolder {
            root_path: ROOT.to_string(),
            folder_path: ROOT.to_string(),
            nodes: vec![
                Node::file("template.docx", format!("{}/template.docx", ROOT)),
                Node::folder("Policies", format!("{}/Policies", ROOT)),
            ],
        }
    }

    fn policies_listing() -> FetchedFolder {
        FetchedFolder {
            root_path: ROOT.to_string(),
            folder_path: format!("{}/Policies", ROOT),
            nodes: vec![Node::file("leave.docx", format!("{}/Policies/leave.docx", ROOT))],
        }
    }

    fn opened_browser() -> TemplateBrowser {
        let mut browser = TemplateBrowser::new("Templates");
        let request = browser.open(tree());
        assert_eq!(browser.apply(&request.tag, Ok(root_listing())), Applied::Updated);
        browser
    }

    #[test]
    fn test_open_moves_through_loading_to_loaded() {
        let mut browser = TemplateBrowser::new("Templates");
        assert_eq!(browser.status(), &BrowserStatus::Idle);

        let request = browser.open(tree());
        assert_eq!(browser.status(), &BrowserStatus::Loading);
        assert_eq!(request.tag.folder, None);

        browser.apply(&request.tag, Ok(root_listing()));
        assert_eq!(browser.status(), &BrowserStatus::Loaded);
        assert_eq!(browser.state().current_path, ROOT);
        assert!(browser.state().breadcrumb.is_empty());
    }

    #[test]
    fn test_listing_orders_folders_first() {
        let browser = opened_browser();
        let names: Vec<&str> = browser.current_listing().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Policies", "template.docx"]);
    }

    #[test]
    fn test_navigate_into_file_is_rejected() {
        let mut browser = opened_browser();
        let file = browser.find_by_name("template.docx").cloned().unwrap();
        assert!(matches!(
            browser.navigate_into(&file),
            Err(TemplateCopyError::NotAContainer(_))
        ));
        assert!(!browser.is_loading());
    }

    #[test]
    fn test_navigate_into_and_back_to_root() {
        let mut browser = opened_browser();
        let original = browser.state().listing.clone();

        let policies = browser.find_by_name("Policies").cloned().unwrap();
        let request = browser.navigate_into(&policies).unwrap();
        browser.apply(&request.tag, Ok(policies_listing()));
        assert_eq!(
            breadcrumb::trail_text(&browser.state().breadcrumb),
            "Templates > Policies"
        );

        let request = browser.navigate_to_breadcrumb(ROOT).unwrap();
        browser.apply(&request.tag, Ok(root_listing()));
        assert_eq!(browser.state().listing, original);
        assert!(browser.state().breadcrumb.is_empty());
    }

    #[test]
    fn test_older_navigation_result_is_dropped() {
        let mut browser = opened_browser();
        let policies = browser.find_by_name("Policies").cloned().unwrap();
        let first = browser.navigate_into(&policies).unwrap();
        let second = browser.navigate_to_breadcrumb(ROOT).unwrap();

        browser.apply(&second.tag, Ok(root_listing()));
        assert!(browser.apply(&first.tag, Ok(policies_listing())).is_stale());
        assert_eq!(browser.state().current_path, ROOT);
    }

    #[test]
    fn test_failure_clears_listing_and_keeps_position() {
        let mut browser = opened_browser();
        let request = browser.refresh().unwrap();
        let applied = browser.apply(
            &request.tag,
            Err(RepositoryError::AccessDenied(ROOT.to_string())),
        );
        assert!(matches!(applied, Applied::Failed(_)));
        assert!(browser.state().listing.is_empty());
        assert_eq!(browser.state().current_path, ROOT);
        assert!(matches!(browser.status(), BrowserStatus::Failed(_)));
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let mut browser = opened_browser();
        browser.set_filter("TEMP");
        let names: Vec<&str> = browser.current_listing().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["template.docx"]);
        assert!(!browser.is_loading());

        browser.set_filter("");
        assert_eq!(browser.current_listing().len(), 2);
    }
}
