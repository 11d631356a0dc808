//! Session orchestration: pick a template, pick a destination, copy.
//!
//! The controller is the single logical thread that mutates browser state.
//! Repository work runs in the background worker; results come back on one
//! channel and are applied in arrival order, with each browser deciding
//! whether a result is still current.

use crate::async_task::{self, Task, TaskResult};
use crate::breadcrumb::{self, BreadcrumbEntry};
use crate::config::SessionConfig;
use crate::copy::{CopyOrchestrator, CopyOutcome, DestinationTarget};
use crate::debounce::Debouncer;
use crate::destination_browser::{DestinationBrowser, ScrollMetrics};
use crate::error::{Result, TemplateCopyError};
use crate::fetch::{Applied, FolderRequest};
use crate::file_kind::{self, IconKind};
use crate::file_name::CopyFileName;
use crate::node::Node;
use crate::repository::Repository;
use crate::template_browser::TemplateBrowser;
use crate::url_utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Looking through the template library.
    Browsing,
    /// A template is chosen and the destination picker is open.
    Picking,
    Succeeded,
    /// The last copy failed; the picker is still open for a retry.
    Failed,
}

/// Details shown next to a template before it is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePreview {
    pub name: String,
    pub icon: IconKind,
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

pub struct SessionController {
    config: SessionConfig,
    templates: TemplateBrowser,
    destination: DestinationBrowser,
    debouncer: Debouncer,
    copier: CopyOrchestrator,
    phase: SessionPhase,
    selected_template: Option<Node>,
    copy_name: Option<CopyFileName>,
    outcome: Option<CopyOutcome>,
    success_trail: Vec<BreadcrumbEntry>,
    last_error: Option<String>,
    /// Ticket of the copy whose result is awaited.
    copy_in_flight: Option<u64>,
    next_copy_ticket: u64,
    outstanding: usize,
    task_sender: mpsc::Sender<Task>,
    result_sender: mpsc::Sender<TaskResult>,
    result_receiver: mpsc::Receiver<TaskResult>,
}

impl SessionController {
    /// Create a session and start its background worker. Must be called
    /// from within a tokio runtime.
    pub fn start(config: SessionConfig, repository: Arc<dyn Repository>) -> Self {
        let (task_sender, task_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (result_sender, result_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let copier = CopyOrchestrator::new(Arc::clone(&repository), config.allow_create_at_root);
        tokio::spawn(async_task::run_worker(
            task_receiver,
            result_sender.clone(),
            repository,
        ));

        Self {
            templates: TemplateBrowser::new(config.templates.title.clone()),
            destination: DestinationBrowser::new(config.destination.title.clone(), config.page_size),
            debouncer: Debouncer::new(config.search_debounce()),
            copier,
            config,
            phase: SessionPhase::Browsing,
            selected_template: None,
            copy_name: None,
            outcome: None,
            success_trail: Vec::new(),
            last_error: None,
            copy_in_flight: None,
            next_copy_ticket: 0,
            outstanding: 0,
            task_sender,
            result_sender,
            result_receiver,
        }
    }

    async fn dispatch(&mut self, task: Task) -> Result<()> {
        self.task_sender
            .send(task)
            .await
            .map_err(|e| TemplateCopyError::Generic(format!("worker stopped: {}", e)))?;
        self.outstanding += 1;
        Ok(())
    }

    async fn dispatch_template(&mut self, request: FolderRequest) -> Result<()> {
        let tree = self.config.templates.tree_root();
        log::debug!("template fetch #{} {:?}", request.tag.seq, request.tag.folder);
        self.dispatch(Task::LoadTemplateFolder {
            tag: request.tag,
            tree,
        })
        .await
    }

    async fn dispatch_destination(&mut self, request: FolderRequest) -> Result<()> {
        let tree = self.config.destination.tree_root();
        let page = request.page.unwrap_or(crate::repository::PageRequest {
            size: self.config.page_size,
            skip: 0,
        });
        log::debug!(
            "destination fetch #{} {:?} search {:?} skip {}",
            request.tag.seq,
            request.tag.folder,
            request.tag.search_text,
            page.skip
        );
        self.dispatch(Task::LoadDestinationPage {
            tag: request.tag,
            tree,
            page,
        })
        .await
    }

    // Template library

    pub async fn open_template_tree(&mut self) -> Result<()> {
        log::info!("opening template library {}", self.config.templates.tree_id);
        let request = self.templates.open(self.config.templates.tree_root());
        self.dispatch_template(request).await
    }

    pub async fn navigate_template(&mut self, path: &str) -> Result<()> {
        let request = self.templates.navigate_to_breadcrumb(path)?;
        self.dispatch_template(request).await
    }

    /// Enter a folder of the template listing by name.
    pub async fn enter_template(&mut self, name: &str) -> Result<()> {
        let node = self
            .templates
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| TemplateCopyError::InvalidSelection(format!("no item named {}", name)))?;
        let request = self.templates.navigate_into(&node)?;
        self.dispatch_template(request).await
    }

    pub fn filter_templates(&mut self, text: &str) {
        self.templates.set_filter(text);
    }

    /// Pick a template and open the destination picker at its root.
    pub async fn select_template(&mut self, name: &str) -> Result<()> {
        let node = self
            .templates
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| TemplateCopyError::InvalidSelection(format!("no item named {}", name)))?;
        if node.is_container {
            return Err(TemplateCopyError::InvalidSelection(format!(
                "{} is a folder, not a template",
                node.name
            )));
        }
        log::info!("template selected: {}", node.path);
        self.copy_name = Some(CopyFileName::for_template(&node.name));
        self.selected_template = Some(node);
        self.open_destination_picker().await
    }

    // Destination picker

    pub async fn open_destination_picker(&mut self) -> Result<()> {
        if self.selected_template.is_none() {
            return Err(TemplateCopyError::InvalidSelection(
                "select a template first".to_string(),
            ));
        }
        self.debouncer.cancel();
        self.phase = SessionPhase::Picking;
        self.outcome = None;
        self.success_trail.clear();
        self.last_error = None;
        let request = self.destination.open(self.config.destination.tree_root());
        self.dispatch_destination(request).await
    }

    pub async fn navigate_destination(&mut self, path: &str) -> Result<()> {
        self.ensure_picking()?;
        self.debouncer.cancel();
        let request = self.destination.navigate_to_breadcrumb(path)?;
        self.dispatch_destination(request).await
    }

    pub async fn enter_destination(&mut self, name: &str) -> Result<()> {
        self.ensure_picking()?;
        let node = self
            .destination
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| TemplateCopyError::InvalidSelection(format!("no folder named {}", name)))?;
        self.debouncer.cancel();
        let request = self.destination.navigate_into(&node)?;
        self.dispatch_destination(request).await
    }

    /// Update the search text now; the fetch follows after the quiet
    /// interval unless more text arrives first.
    pub fn search_destination(&mut self, text: &str) -> Result<()> {
        self.ensure_picking()?;
        self.destination.set_search_text(text);
        let generation = self.debouncer.schedule(self.result_sender.clone());
        log::debug!("search {:?} scheduled (#{})", text, generation);
        Ok(())
    }

    /// Returns whether a page was requested.
    pub async fn load_more_destination(&mut self) -> Result<bool> {
        self.ensure_picking()?;
        match self.destination.load_more() {
            Some(request) => {
                self.dispatch_destination(request).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn scroll_destination(&mut self, metrics: ScrollMetrics) -> Result<bool> {
        self.ensure_picking()?;
        match self
            .destination
            .on_scroll(metrics, self.config.scroll_threshold)
        {
            Some(request) => {
                self.dispatch_destination(request).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn select_destination(&mut self, path: Option<&str>) -> Result<()> {
        self.ensure_picking()?;
        self.destination.select(path)
    }

    /// Name the copy. The template's extension is kept.
    pub fn rename_copy(&mut self, file_name: &str) -> Result<()> {
        let current = self.copy_name.as_ref().ok_or_else(|| {
            TemplateCopyError::InvalidSelection("select a template first".to_string())
        })?;
        let renamed = current.with_file_name(file_name);
        renamed.validate()?;
        self.copy_name = Some(renamed);
        Ok(())
    }

    fn destination_target(&self) -> DestinationTarget {
        let current = &self.destination.navigation().current_path;
        DestinationTarget {
            selected_folder: self.destination.selection().selected_path.clone(),
            current_folder: (!current.is_empty()).then(|| current.clone()),
            library_root: self.destination.root_path().unwrap_or_default().to_string(),
        }
    }

    /// Whether confirming would dispatch a copy right now.
    pub fn can_confirm(&self) -> bool {
        let Some(template) = &self.selected_template else {
            return false;
        };
        self.copy_in_flight.is_none()
            && matches!(self.phase, SessionPhase::Picking | SessionPhase::Failed)
            && self
                .copier
                .plan(
                    template,
                    &self.config.templates.tree_root(),
                    &self.config.destination.tree_root(),
                    &self.destination_target(),
                    self.copy_name.as_ref(),
                )
                .is_ok()
    }

    pub async fn confirm_copy(&mut self) -> Result<()> {
        if self.copy_in_flight.is_some() {
            return Err(TemplateCopyError::InvalidSelection(
                "a copy is already in progress".to_string(),
            ));
        }
        self.ensure_picking()?;
        let template = self.selected_template.as_ref().ok_or_else(|| {
            TemplateCopyError::InvalidSelection("select a template first".to_string())
        })?;
        let plan = self.copier.plan(
            template,
            &self.config.templates.tree_root(),
            &self.config.destination.tree_root(),
            &self.destination_target(),
            self.copy_name.as_ref(),
        )?;

        self.next_copy_ticket += 1;
        let ticket = self.next_copy_ticket;
        self.dispatch(Task::CopyTemplate { ticket, plan }).await?;
        self.copy_in_flight = Some(ticket);
        self.last_error = None;
        Ok(())
    }

    /// Leave the picker. The template library stays where it was.
    pub fn close_session(&mut self) {
        log::info!("closing destination picker");
        self.debouncer.cancel();
        self.destination.reset();
        self.phase = SessionPhase::Browsing;
        self.selected_template = None;
        self.copy_name = None;
        self.outcome = None;
        self.success_trail.clear();
        self.last_error = None;
        self.copy_in_flight = None;
    }

    fn ensure_picking(&self) -> Result<()> {
        match self.phase {
            SessionPhase::Picking | SessionPhase::Failed => Ok(()),
            _ => Err(TemplateCopyError::InvalidSelection(
                "the destination picker is not open".to_string(),
            )),
        }
    }

    // Results

    /// Apply one result from the worker or the debounce timer.
    pub async fn handle_task_result(&mut self, result: TaskResult) -> Result<()> {
        match result {
            TaskResult::TemplateFolderLoaded { tag, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if let Applied::Failed(message) = self.templates.apply(&tag, result) {
                    self.last_error = Some(TemplateCopyError::FetchFailed { message }.to_string());
                }
            }
            TaskResult::DestinationPageLoaded { tag, result } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if let Applied::Failed(message) = self.destination.apply(&tag, result) {
                    self.last_error = Some(TemplateCopyError::FetchFailed { message }.to_string());
                }
            }
            TaskResult::SearchDebounceElapsed { generation } => {
                if self.debouncer.fire(generation) {
                    if let Some(request) = self.destination.search_fetch() {
                        self.dispatch_destination(request).await?;
                    }
                }
            }
            TaskResult::CopyFinished { ticket, outcome } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                if self.copy_in_flight != Some(ticket) {
                    log::debug!("dropping result of abandoned copy #{}", ticket);
                    return Ok(());
                }
                self.copy_in_flight = None;
                self.finish_copy(outcome).await?;
            }
        }
        Ok(())
    }

    async fn finish_copy(&mut self, outcome: CopyOutcome) -> Result<()> {
        if outcome.success() {
            log::info!("copy created {:?}", outcome.result_path());
            self.success_trail = breadcrumb::build_success_trail(
                outcome.destination_folder(),
                self.destination.root_path().unwrap_or_default(),
                &self.config.destination.title,
                &self.config.destination.host_url,
            );
            self.phase = SessionPhase::Succeeded;
            self.outcome = Some(outcome);
            if self.config.refresh_templates_after_copy {
                if let Some(request) = self.templates.refresh() {
                    self.dispatch_template(request).await?;
                }
            }
        } else {
            log::warn!("copy failed: {:?}", outcome.error_message());
            self.last_error = outcome.error_message().map(|message| {
                TemplateCopyError::CopyFailed {
                    message: message.to_string(),
                }
                .to_string()
            });
            self.phase = SessionPhase::Failed;
            self.outcome = Some(outcome);
        }
        Ok(())
    }

    /// Whether anything is still expected from the worker or the timer.
    pub fn is_busy(&self) -> bool {
        self.outstanding > 0 || self.debouncer.is_pending()
    }

    /// Wait for and apply the next result. Returns false once the worker
    /// has gone away.
    pub async fn process_next(&mut self) -> Result<bool> {
        match self.result_receiver.recv().await {
            Some(result) => {
                self.handle_task_result(result).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply results until no fetch, copy or debounce timer is pending.
    pub async fn settle(&mut self) -> Result<()> {
        while self.is_busy() {
            if !self.process_next().await? {
                break;
            }
        }
        Ok(())
    }

    /// Apply whatever results have already arrived, without waiting.
    pub async fn drain_ready(&mut self) -> Result<usize> {
        let mut applied = 0;
        while let Ok(result) = self.result_receiver.try_recv() {
            self.handle_task_result(result).await?;
            applied += 1;
        }
        Ok(applied)
    }

    // Queries

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn templates(&self) -> &TemplateBrowser {
        &self.templates
    }

    pub fn destination(&self) -> &DestinationBrowser {
        &self.destination
    }

    pub fn selected_template(&self) -> Option<&Node> {
        self.selected_template.as_ref()
    }

    pub fn copy_file_name(&self) -> Option<&str> {
        self.copy_name.as_ref().map(CopyFileName::file_name)
    }

    pub fn outcome(&self) -> Option<&CopyOutcome> {
        self.outcome.as_ref()
    }

    pub fn success_trail(&self) -> &[BreadcrumbEntry] {
        &self.success_trail
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_copying(&self) -> bool {
        self.copy_in_flight.is_some()
    }

    pub fn template_preview(&self, name: &str) -> Option<TemplatePreview> {
        let node = self.templates.find_by_name(name)?;
        if node.is_container {
            return None;
        }
        let host = &self.config.templates.host_url;
        Some(TemplatePreview {
            name: node.name.clone(),
            icon: file_kind::icon_kind(&node.name),
            thumbnail_url: url_utils::thumbnail_url(
                &node.path,
                host,
                url_utils::DEFAULT_THUMBNAIL_RESOLUTION,
            ),
            preview_url: url_utils::preview_url(node.preview_ref.as_deref(), &node.path, &node.name, host),
            size_bytes: node.size_bytes,
            modified_at: node.modified_at,
            modified_by: node.modified_by.clone(),
        })
    }

    /// Where to send the user after a successful copy: the desktop
    /// application when the file type has one, else the web URL.
    pub fn open_created_document(&self) -> Option<String> {
        let outcome = self.outcome.as_ref().filter(|o| o.success())?;
        outcome
            .desktop_link()
            .or_else(|| outcome.url())
            .map(str::to_string)
    }
}
