//! Serializable view of everything a presentation layer can observe.

use crate::breadcrumb::{self, BreadcrumbEntry};
use crate::copy::CopyOutcome;
use crate::destination_browser::{PaginationState, SelectionState};
use crate::fetch::BrowserStatus;
use crate::node::Node;
use crate::session::{SessionController, SessionPhase};
use crate::template_browser::NavigationState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateView {
    pub status: BrowserStatus,
    pub navigation: NavigationState,
    /// Listing after the filter, in display order.
    pub visible: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationView {
    pub status: BrowserStatus,
    pub navigation: NavigationState,
    pub pagination: PaginationState,
    pub selection: SelectionState,
    pub selected_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub templates: TemplateView,
    pub destination: DestinationView,
    pub selected_template: Option<Node>,
    pub copy_file_name: Option<String>,
    pub can_confirm: bool,
    pub is_copying: bool,
    pub outcome: Option<CopyOutcome>,
    pub success_trail: Vec<BreadcrumbEntry>,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn capture(session: &SessionController) -> Self {
        let templates = session.templates();
        let destination = session.destination();
        Self {
            phase: session.phase(),
            templates: TemplateView {
                status: templates.status().clone(),
                navigation: templates.state().clone(),
                visible: templates.current_listing().into_iter().cloned().collect(),
            },
            destination: DestinationView {
                status: destination.status().clone(),
                navigation: destination.navigation().clone(),
                pagination: destination.pagination().clone(),
                selection: destination.selection().clone(),
                selected_index: destination.selected_index(),
            },
            selected_template: session.selected_template().cloned(),
            copy_file_name: session.copy_file_name().map(str::to_string),
            can_confirm: session.can_confirm(),
            is_copying: session.is_copying(),
            outcome: session.outcome().cloned(),
            success_trail: session.success_trail().to_vec(),
            last_error: session.last_error().map(str::to_string),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a property by the dotted name used in test scripts.
    pub fn property(&self, name: &str) -> Option<String> {
        let value = match name {
            "phase" => format!("{:?}", self.phase),
            "last_error" => optional(self.last_error.as_deref()),
            "can_confirm" => self.can_confirm.to_string(),
            "is_copying" => self.is_copying.to_string(),
            "selected_template" => optional(self.selected_template.as_ref().map(|n| n.name.as_str())),
            "copy_file_name" => optional(self.copy_file_name.as_deref()),
            "success_trail" => breadcrumb::trail_text(&self.success_trail),

            "templates.status" => status_text(&self.templates.status),
            "templates.current_path" => self.templates.navigation.current_path.clone(),
            "templates.breadcrumb" => breadcrumb::trail_text(&self.templates.navigation.breadcrumb),
            "templates.filter" => self.templates.navigation.filter_text.clone(),
            "templates.listing" => names(&self.templates.visible),
            "templates.count" => self.templates.visible.len().to_string(),

            "destination.status" => status_text(&self.destination.status),
            "destination.current_path" => self.destination.navigation.current_path.clone(),
            "destination.breadcrumb" => breadcrumb::trail_text(&self.destination.navigation.breadcrumb),
            "destination.search_text" => self.destination.navigation.filter_text.clone(),
            "destination.listing" => names(&self.destination.navigation.listing),
            "destination.count" => self.destination.navigation.listing.len().to_string(),
            "destination.loaded_count" => self.destination.pagination.loaded_count.to_string(),
            "destination.has_more" => self.destination.pagination.has_more.to_string(),
            "destination.selected" => optional(self.destination.selection.selected_path.as_deref()),

            "outcome.success" => optional(self.outcome.as_ref().map(|o| if o.success() { "true" } else { "false" })),
            "outcome.result_path" => optional(self.outcome.as_ref().and_then(|o| o.result_path())),
            "outcome.url" => optional(self.outcome.as_ref().and_then(|o| o.url())),
            "outcome.desktop_link" => optional(self.outcome.as_ref().and_then(|o| o.desktop_link())),
            "outcome.error" => optional(self.outcome.as_ref().and_then(|o| o.error_message())),
            _ => return None,
        };
        Some(value)
    }
}

fn names(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or("none").to_string()
}

fn status_text(status: &BrowserStatus) -> String {
    match status {
        BrowserStatus::Failed(_) => "Failed".to_string(),
        other => format!("{:?}", other),
    }
}
