//! In-memory [`Repository`] used by the CLI driver and the tests.
//!
//! Behaves like the remote store where it matters to the session: children
//! come back in pages, reserved names stay hidden from listings, search
//! returns absolute URLs and may include deeper matches, and copies
//! overwrite. Latency and failures can be injected per call.

use crate::error::RepositoryError;
use crate::node::{self, Node, TreeRoot};
use crate::path_utils;
use crate::repository::{
    self, CopiedFile, FolderRoot, ListOptions, PageRequest, Repository, RepositoryFuture,
};
use crate::url_utils;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListFolderRoot,
    ListChildren,
    SearchChildren,
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    AccessDenied,
    Rejected,
    Transport,
}

/// Make matching calls fail instead of touching the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRule {
    pub operation: Operation,
    /// Only calls whose target path contains this text fail.
    #[serde(default)]
    pub path_contains: Option<String>,
    pub kind: FailureKind,
    #[serde(default)]
    pub message: String,
}

impl FailureRule {
    fn matches(&self, operation: Operation, path: &str) -> bool {
        self.operation == operation
            && self
                .path_contains
                .as_deref()
                .map_or(true, |needle| path.to_lowercase().contains(&needle.to_lowercase()))
    }

    fn error(&self, path: &str) -> RepositoryError {
        let detail = if self.message.is_empty() {
            path.to_string()
        } else {
            self.message.clone()
        };
        match self.kind {
            FailureKind::NotFound => RepositoryError::NotFound(detail),
            FailureKind::AccessDenied => RepositoryError::AccessDenied(detail),
            FailureKind::Rejected => RepositoryError::Rejected(detail),
            FailureKind::Transport => RepositoryError::Transport(detail),
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryTree {
    tree: TreeRoot,
    root_path: String,
    nodes: Vec<Node>,
}

impl MemoryTree {
    fn find(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| path_utils::same_path(&n.path, path))
    }

    fn folder_exists(&self, path: &str) -> bool {
        path_utils::same_path(path, &self.root_path)
            || self.find(path).map_or(false, |n| n.is_container)
    }

    fn is_below(&self, path: &str, folder: &str) -> bool {
        !path_utils::segments_below(path, folder).is_empty()
    }
}

/// A recorded repository call, e.g. `search_children /Dest invoice-2024`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCall {
    pub operation: Operation,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    trees: Mutex<HashMap<String, MemoryTree>>,
    latency: Duration,
    search_latency: HashMap<String, Duration>,
    failures: Vec<FailureRule>,
    calls: Mutex<Vec<RepositoryCall>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tree rooted at `root_path`. Nodes keep their own paths.
    pub fn with_tree(self, tree: TreeRoot, root_path: impl Into<String>, nodes: Vec<Node>) -> Self {
        let entry = MemoryTree {
            tree: tree.clone(),
            root_path: root_path.into(),
            nodes,
        };
        if let Ok(mut trees) = self.trees.lock() {
            trees.insert(tree.tree_id, entry);
        }
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay searches for exactly `query_text` by `latency` instead of the
    /// default.
    pub fn with_search_latency(mut self, query_text: impl Into<String>, latency: Duration) -> Self {
        self.search_latency.insert(query_text.into(), latency);
        self
    }

    pub fn with_failure(mut self, rule: FailureRule) -> Self {
        self.failures.push(rule);
        self
    }

    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn count_calls(&self, operation: Operation) -> usize {
        self.calls().iter().filter(|c| c.operation == operation).count()
    }

    /// Whether `path` exists in `tree_id`.
    pub fn contains(&self, tree_id: &str, path: &str) -> bool {
        self.trees
            .lock()
            .map(|trees| trees.get(tree_id).and_then(|t| t.find(path)).is_some())
            .unwrap_or(false)
    }

    fn record(&self, operation: Operation, path: &str, query: Option<&str>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RepositoryCall {
                operation,
                path: path.to_string(),
                query: query.map(str::to_string),
            });
        }
    }

    fn check_failure(&self, operation: Operation, path: &str) -> Result<(), RepositoryError> {
        match self.failures.iter().find(|rule| rule.matches(operation, path)) {
            Some(rule) => Err(rule.error(path)),
            None => Ok(()),
        }
    }

    fn with_trees<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, MemoryTree>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut trees = self
            .trees
            .lock()
            .map_err(|_| RepositoryError::Transport("repository state poisoned".to_string()))?;
        f(&mut trees)
    }

    fn respond<T: Send + 'static>(
        &self,
        latency: Duration,
        result: Result<T, RepositoryError>,
    ) -> RepositoryFuture<T> {
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        })
    }

    fn root_of(&self, tree: &TreeRoot) -> Result<FolderRoot, RepositoryError> {
        self.with_trees(|trees| {
            trees
                .get(&tree.tree_id)
                .map(|t| FolderRoot {
                    root_path: t.root_path.clone(),
                })
                .ok_or_else(|| RepositoryError::NotFound(format!("library {}", tree.tree_id)))
        })
    }

    fn children_of(
        &self,
        tree: &TreeRoot,
        folder_path: &str,
        options: ListOptions,
    ) -> Result<Vec<Node>, RepositoryError> {
        self.with_trees(|trees| {
            let memory = trees
                .get(&tree.tree_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("library {}", tree.tree_id)))?;
            if !memory.folder_exists(folder_path) {
                return Err(RepositoryError::NotFound(folder_path.to_string()));
            }
            let mut children: Vec<Node> = memory
                .nodes
                .iter()
                .filter(|n| path_utils::same_path(&path_utils::parent(&n.path), folder_path))
                .filter(|n| !repository::is_reserved_name(&n.name))
                .filter(|n| options.include_files || n.is_container)
                .cloned()
                .collect();
            node::sort_listing(&mut children);
            Ok(page_of(children, options.page))
        })
    }

    fn search_in(
        &self,
        tree: &TreeRoot,
        folder_path: &str,
        query_text: &str,
        page: PageRequest,
    ) -> Result<Vec<Node>, RepositoryError> {
        let query = query_text.to_lowercase();
        self.with_trees(|trees| {
            let memory = trees
                .get(&tree.tree_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("library {}", tree.tree_id)))?;
            // The index matches anywhere below the folder, not just children.
            let mut matches: Vec<Node> = memory
                .nodes
                .iter()
                .filter(|n| n.is_container && memory.is_below(&n.path, folder_path))
                .filter(|n| n.name.to_lowercase().contains(&query))
                .map(|n| Node {
                    path: url_utils::build_full_url(&n.path, &memory.tree.host_url),
                    ..n.clone()
                })
                .collect();
            node::sort_by_name(&mut matches);
            Ok(page_of(matches, Some(page)))
        })
    }

    fn copy_file(
        &self,
        source: &TreeRoot,
        source_path: &str,
        destination: &TreeRoot,
        destination_path: &str,
    ) -> Result<CopiedFile, RepositoryError> {
        self.with_trees(|trees| {
            let template = trees
                .get(&source.tree_id)
                .and_then(|t| t.find(source_path))
                .filter(|n| !n.is_container)
                .cloned()
                .ok_or_else(|| RepositoryError::NotFound(source_path.to_string()))?;

            let target = trees
                .get_mut(&destination.tree_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("library {}", destination.tree_id)))?;
            let folder = path_utils::parent(destination_path);
            if !target.folder_exists(&folder) {
                return Err(RepositoryError::NotFound(folder));
            }

            let result_id = uuid::Uuid::new_v4().to_string();
            let copied = Node {
                id: result_id.clone(),
                name: path_utils::file_name(destination_path).to_string(),
                path: destination_path.to_string(),
                modified_at: Some(chrono::Utc::now()),
                ..template
            };
            target
                .nodes
                .retain(|n| !path_utils::same_path(&n.path, destination_path));
            target.nodes.push(copied);

            Ok(CopiedFile {
                result_path: destination_path.to_string(),
                result_id,
            })
        })
    }
}

fn page_of(nodes: Vec<Node>, page: Option<PageRequest>) -> Vec<Node> {
    match page {
        Some(page) => nodes.into_iter().skip(page.skip).take(page.size).collect(),
        None => nodes,
    }
}

impl Repository for MemoryRepository {
    fn list_folder_root(&self, tree: TreeRoot) -> RepositoryFuture<FolderRoot> {
        self.record(Operation::ListFolderRoot, &tree.tree_id, None);
        let result = self
            .check_failure(Operation::ListFolderRoot, &tree.tree_id)
            .and_then(|_| self.root_of(&tree));
        self.respond(self.latency, result)
    }

    fn list_children(
        &self,
        tree: TreeRoot,
        folder_path: String,
        options: ListOptions,
    ) -> RepositoryFuture<Vec<Node>> {
        self.record(Operation::ListChildren, &folder_path, None);
        let result = self
            .check_failure(Operation::ListChildren, &folder_path)
            .and_then(|_| self.children_of(&tree, &folder_path, options));
        self.respond(self.latency, result)
    }

    fn search_children(
        &self,
        tree: TreeRoot,
        folder_path: String,
        query_text: String,
        page: PageRequest,
    ) -> RepositoryFuture<Vec<Node>> {
        log::debug!("memory repository: search {:?} in {}", query_text, folder_path);
        self.record(Operation::SearchChildren, &folder_path, Some(&query_text));
        let latency = self
            .search_latency
            .get(&query_text)
            .copied()
            .unwrap_or(self.latency);
        let result = self
            .check_failure(Operation::SearchChildren, &folder_path)
            .and_then(|_| self.search_in(&tree, &folder_path, &query_text, page));
        self.respond(latency, result)
    }

    fn copy(
        &self,
        source: TreeRoot,
        source_path: String,
        destination: TreeRoot,
        destination_path: String,
    ) -> RepositoryFuture<CopiedFile> {
        self.record(Operation::Copy, &destination_path, None);
        let result = self
            .check_failure(Operation::Copy, &destination_path)
            .and_then(|_| self.copy_file(&source, &source_path, &destination, &destination_path));
        self.respond(self.latency, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> TreeRoot {
        TreeRoot::new("dest", "https://contoso.example/sites/team")
    }

    fn repository() -> MemoryRepository {
        let root = "/sites/team/Docs";
        MemoryRepository::new().with_tree(
            tree(),
            root,
            vec![
                Node::folder("Invoices", format!("{}/Invoices", root)),
                Node::folder("invoice-2024", format!("{}/Invoices/invoice-2024", root)),
                Node::folder("Archive", format!("{}/Archive", root)),
                Node::folder("Forms", format!("{}/Forms", root)),
                Node::folder(".hidden", format!("{}/.hidden", root)),
                Node::file("readme.txt", format!("{}/readme.txt", root)),
            ],
        )
    }

    #[tokio::test]
    async fn test_list_children_hides_reserved_and_files() {
        let repo = repository();
        let nodes = repo
            .list_children(tree(), "/sites/team/Docs".into(), ListOptions::default())
            .await
            .unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Archive", "Invoices"]);
    }

    #[tokio::test]
    async fn test_list_children_pages() {
        let repo = repository();
        let options = ListOptions {
            include_files: true,
            page: Some(PageRequest { size: 2, skip: 1 }),
        };
        let nodes = repo
            .list_children(tree(), "/sites/team/Docs".into(), options)
            .await
            .unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Invoices", "readme.txt"]);
    }

    #[tokio::test]
    async fn test_search_returns_deep_matches_as_urls() {
        let repo = repository();
        let nodes = repo
            .search_children(
                tree(),
                "/sites/team/Docs".into(),
                "INVOICE".into(),
                PageRequest { size: 10, skip: 0 },
            )
            .await
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.path.starts_with("https://contoso.example/sites/team/Docs/")));
        assert_eq!(repo.count_calls(Operation::SearchChildren), 1);
    }

    #[tokio::test]
    async fn test_copy_overwrites_existing_file() {
        let repo = MemoryRepository::new()
            .with_tree(
                TreeRoot::new("src", "https://contoso.example"),
                "/Templates",
                vec![Node::file("template.docx", "/Templates/template.docx").with_size(10)],
            )
            .with_tree(
                TreeRoot::new("dst", "https://contoso.example"),
                "/Dest",
                vec![Node::folder("2024", "/Dest/2024")],
            );
        for _ in 0..2 {
            let copied = repo
                .copy(
                    TreeRoot::new("src", "https://contoso.example"),
                    "/Templates/template.docx".into(),
                    TreeRoot::new("dst", "https://contoso.example"),
                    "/Dest/2024/template.docx".into(),
                )
                .await
                .unwrap();
            assert_eq!(copied.result_path, "/Dest/2024/template.docx");
        }
        let listed = repo
            .list_children(
                TreeRoot::new("dst", "https://contoso.example"),
                "/Dest/2024".into(),
                ListOptions {
                    include_files: true,
                    page: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size_bytes, Some(10));
    }

    #[tokio::test]
    async fn test_copy_into_missing_folder_fails() {
        let repo = repository();
        let result = repo
            .copy(tree(), "/sites/team/Docs/readme.txt".into(), tree(), "/sites/team/Docs/Nope/readme.txt".into())
            .await;
        assert_eq!(
            result,
            Err(RepositoryError::NotFound("/sites/team/Docs/Nope".into()))
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let repo = repository().with_failure(FailureRule {
            operation: Operation::ListChildren,
            path_contains: Some("archive".into()),
            kind: FailureKind::AccessDenied,
            message: String::new(),
        });
        let denied = repo
            .list_children(tree(), "/sites/team/Docs/Archive".into(), ListOptions::default())
            .await;
        assert_eq!(
            denied,
            Err(RepositoryError::AccessDenied("/sites/team/Docs/Archive".into()))
        );
        assert!(repo
            .list_children(tree(), "/sites/team/Docs".into(), ListOptions::default())
            .await
            .is_ok());
    }
}
