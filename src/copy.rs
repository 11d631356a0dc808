//! Cross-tree copy of a template into the chosen destination folder.
//!
//! Planning is synchronous and never touches the repository, so a copy that
//! policy forbids is rejected before any request leaves the session.

use crate::error::{Result, TemplateCopyError};
use crate::file_kind;
use crate::file_name::CopyFileName;
use crate::node::{Node, TreeRoot};
use crate::path_utils;
use crate::repository::Repository;
use crate::url_utils;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the user is in the destination tree when they confirm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationTarget {
    pub selected_folder: Option<String>,
    pub current_folder: Option<String>,
    pub library_root: String,
}

impl DestinationTarget {
    /// Selection, else the current folder, else the library root.
    pub fn effective_folder(&self) -> &str {
        self.selected_folder
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.current_folder.as_deref().filter(|p| !p.is_empty()))
            .unwrap_or(&self.library_root)
    }

    pub fn is_library_root(&self) -> bool {
        path_utils::same_path(self.effective_folder(), &self.library_root)
    }
}

/// A validated copy, ready to hand to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    pub source: TreeRoot,
    pub source_path: String,
    pub destination: TreeRoot,
    pub destination_folder: String,
    pub destination_path: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOutcome {
    success: bool,
    file_name: String,
    destination_folder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    desktop_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl CopyOutcome {
    pub fn succeeded(plan: &CopyPlan, result_path: String, url: String) -> Self {
        Self {
            success: true,
            desktop_link: file_kind::desktop_link(&plan.file_name, &url),
            file_name: plan.file_name.clone(),
            destination_folder: plan.destination_folder.clone(),
            result_path: Some(result_path),
            url: Some(url),
            error_message: None,
        }
    }

    pub fn failed(plan: &CopyPlan, message: impl Into<String>) -> Self {
        Self {
            success: false,
            file_name: plan.file_name.clone(),
            destination_folder: plan.destination_folder.clone(),
            result_path: None,
            url: None,
            desktop_link: None,
            error_message: Some(message.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn destination_folder(&self) -> &str {
        &self.destination_folder
    }

    pub fn result_path(&self) -> Option<&str> {
        self.result_path.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn desktop_link(&self) -> Option<&str> {
        self.desktop_link.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Validate a copy request and work out where the file will land.
pub fn plan(
    template: &Node,
    source: &TreeRoot,
    destination: &TreeRoot,
    target: &DestinationTarget,
    allow_create_at_root: bool,
    file_name: Option<&CopyFileName>,
) -> Result<CopyPlan> {
    if template.is_container {
        return Err(TemplateCopyError::InvalidSelection(format!(
            "{} is a folder, not a template",
            template.name
        )));
    }
    if target.library_root.is_empty() {
        return Err(TemplateCopyError::InvalidSelection(
            "destination library has not loaded".to_string(),
        ));
    }
    if target.is_library_root() && !allow_create_at_root {
        return Err(TemplateCopyError::InvalidSelection(
            "choose a folder inside the destination library".to_string(),
        ));
    }

    let file_name = match file_name {
        Some(name) => {
            name.validate()?;
            name.file_name().to_string()
        }
        None => template.name.clone(),
    };

    let destination_folder = target.effective_folder().to_string();
    Ok(CopyPlan {
        source: source.clone(),
        source_path: template.path.clone(),
        destination: destination.clone(),
        destination_path: path_utils::join(&destination_folder, &file_name),
        destination_folder,
        file_name,
    })
}

/// Run a plan against the repository. Failures come back as an
/// unsuccessful outcome and are never retried.
pub async fn run(repository: &dyn Repository, plan: CopyPlan) -> CopyOutcome {
    log::info!(
        "📤 copying {} -> {}",
        plan.source_path,
        plan.destination_path
    );
    let copied = match repository
        .copy(
            plan.source.clone(),
            plan.source_path.clone(),
            plan.destination.clone(),
            plan.destination_path.clone(),
        )
        .await
    {
        Ok(copied) => copied,
        Err(e) => {
            log::warn!("copy to {} failed: {}", plan.destination_path, e);
            return CopyOutcome::failed(&plan, e.to_string());
        }
    };

    let url = match repository
        .resolve_external_url(plan.destination.clone(), copied.result_path.clone())
        .await
    {
        Ok(url) => url,
        Err(e) => {
            log::warn!("could not resolve URL for {}: {}", copied.result_path, e);
            url_utils::build_full_url(&copied.result_path, &plan.destination.host_url)
        }
    };

    log::info!("📤 created {} ({})", copied.result_path, copied.result_id);
    CopyOutcome::succeeded(&plan, copied.result_path, url)
}

/// Plans and runs copies against one repository.
pub struct CopyOrchestrator {
    repository: Arc<dyn Repository>,
    allow_create_at_root: bool,
}

impl CopyOrchestrator {
    pub fn new(repository: Arc<dyn Repository>, allow_create_at_root: bool) -> Self {
        Self {
            repository,
            allow_create_at_root,
        }
    }

    pub fn plan(
        &self,
        template: &Node,
        source: &TreeRoot,
        destination: &TreeRoot,
        target: &DestinationTarget,
        file_name: Option<&CopyFileName>,
    ) -> Result<CopyPlan> {
        plan(
            template,
            source,
            destination,
            target,
            self.allow_create_at_root,
            file_name,
        )
    }

    pub async fn run(&self, plan: CopyPlan) -> CopyOutcome {
        run(self.repository.as_ref(), plan).await
    }

    /// Plan and run in one step. A plan that policy rejects is returned as
    /// an error without calling the repository.
    pub async fn execute(
        &self,
        template: &Node,
        source: &TreeRoot,
        destination: &TreeRoot,
        target: &DestinationTarget,
        file_name: Option<&CopyFileName>,
    ) -> Result<CopyOutcome> {
        let plan = self.plan(template, source, destination, target, file_name)?;
        Ok(self.run(plan).await)
    }
}
