//! Boundary to the remote document store.
//!
//! The core never talks to the store directly; it hands a [`Repository`] to
//! the background worker and only ever sees the results as
//! [`crate::async_task::TaskResult`]s. Every call names the [`TreeRoot`] it
//! targets, so nothing resolves against an implicit "current site".

use crate::error::RepositoryError;
use crate::node::{Node, TreeRoot};
use crate::url_utils;
use std::future::Future;
use std::pin::Pin;

/// Boxed async result used by [`Repository`] methods.
pub type RepositoryFuture<T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send>>;

/// Names starting with this marker are hidden from every listing.
pub const RESERVED_MARKER: char = '.';
/// Folder the store keeps its list forms in.
pub const RESERVED_FOLDER: &str = "forms";

/// Whether a child with this name should never be shown.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_MARKER) || name.eq_ignore_ascii_case(RESERVED_FOLDER)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRoot {
    pub root_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    pub skip: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub include_files: bool,
    /// `None` returns every child.
    pub page: Option<PageRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub result_path: String,
    pub result_id: String,
}

/// Async document-store boundary used by the browsers and the copy step.
///
/// Production adapters talk to the remote store, while tests can inject
/// `MockRepository` or [`crate::memory_repository::MemoryRepository`].
#[cfg_attr(test, mockall::automock)]
pub trait Repository: Send + Sync {
    /// Resolves the root folder of `tree`.
    fn list_folder_root(&self, tree: TreeRoot) -> RepositoryFuture<FolderRoot>;

    /// Lists the children of `folder_path`, ordered by name.
    ///
    /// Children with reserved names (see [`is_reserved_name`]) are excluded.
    fn list_children(
        &self,
        tree: TreeRoot,
        folder_path: String,
        options: ListOptions,
    ) -> RepositoryFuture<Vec<Node>>;

    /// Runs a folder-only search scoped to `folder_path`.
    ///
    /// The search index may lag or return deeper matches; callers filter the
    /// page themselves.
    fn search_children(
        &self,
        tree: TreeRoot,
        folder_path: String,
        query_text: String,
        page: PageRequest,
    ) -> RepositoryFuture<Vec<Node>>;

    /// Copies a file across trees, replacing any file already at
    /// `destination_path`.
    fn copy(
        &self,
        source: TreeRoot,
        source_path: String,
        destination: TreeRoot,
        destination_path: String,
    ) -> RepositoryFuture<CopiedFile>;

    /// Absolute URL for `path` within `tree`.
    fn resolve_external_url(&self, tree: TreeRoot, path: String) -> RepositoryFuture<String> {
        let url = url_utils::build_full_url(&path, &tree.host_url);
        Box::pin(async move { Ok(url) })
    }
}
