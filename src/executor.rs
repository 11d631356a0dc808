use crate::{
    command::Command,
    destination_browser::ScrollMetrics,
    error::Result,
    session::SessionController,
};

/// Result of executing a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status_message: Option<String>,
    /// Set when the command was rejected; the session is unchanged.
    pub error: Option<String>,
    pub should_quit: bool,
}

/// Executes commands against a running session
pub struct Executor;

impl Executor {
    /// Execute a command (or every step of a sequence) against `session`.
    ///
    /// Rejected commands do not stop a sequence; the last status and the
    /// last error are reported.
    pub async fn execute(session: &mut SessionController, command: Command) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        for step in command.flatten() {
            log::debug!("🧪 executing {}", step);
            match Self::execute_step(session, &step).await {
                Ok(Some(message)) => result.status_message = Some(message),
                Ok(None) => {
                    result.should_quit = true;
                    result.status_message = Some("Goodbye!".to_string());
                }
                Err(e) => {
                    log::debug!("🧪 {} rejected: {}", step, e);
                    result.status_message = Some(format!("❌ {}", e));
                    result.error = Some(e.to_string());
                }
            }
        }
        result
    }

    /// `Ok(None)` means quit.
    async fn execute_step(session: &mut SessionController, command: &Command) -> Result<Option<String>> {
        let message = match command {
            Command::OpenTemplates => {
                session.open_template_tree().await?;
                "Loading templates...".to_string()
            }
            Command::NavigateTemplate(path) => {
                session.navigate_template(path).await?;
                format!("Opening {}", path)
            }
            Command::EnterTemplate(name) => {
                session.enter_template(name).await?;
                format!("Opening {}", name)
            }
            Command::FilterTemplates(text) => {
                session.filter_templates(text);
                format!("Filter: {}", text)
            }
            Command::SelectTemplate(name) => {
                session.select_template(name).await?;
                format!("Selected {}", name)
            }
            Command::OpenPicker => {
                session.open_destination_picker().await?;
                "Choose a destination folder".to_string()
            }
            Command::NavigateDestination(path) => {
                session.navigate_destination(path).await?;
                format!("Opening {}", path)
            }
            Command::EnterDestination(name) => {
                session.enter_destination(name).await?;
                format!("Opening {}", name)
            }
            Command::SearchDestination(text) => {
                session.search_destination(text)?;
                format!("Search: {}", text)
            }
            Command::LoadMore => {
                if session.load_more_destination().await? {
                    "Loading more folders...".to_string()
                } else {
                    "Nothing more to load".to_string()
                }
            }
            Command::Scroll {
                offset,
                viewport,
                extent,
            } => {
                let metrics = ScrollMetrics {
                    offset: *offset,
                    viewport: *viewport,
                    extent: *extent,
                };
                if session.scroll_destination(metrics).await? {
                    "Loading more folders...".to_string()
                } else {
                    format!("Scrolled to {}", offset)
                }
            }
            Command::SelectDestination(path) => {
                session.select_destination(path.as_deref())?;
                match path {
                    Some(path) => format!("Destination: {}", path),
                    None => "Destination cleared".to_string(),
                }
            }
            Command::Rename(name) => {
                session.rename_copy(name)?;
                format!("File name: {}", session.copy_file_name().unwrap_or(name))
            }
            Command::Confirm => {
                session.confirm_copy().await?;
                "Creating document...".to_string()
            }
            Command::Close => {
                session.close_session();
                "Closed".to_string()
            }
            Command::Quit => return Ok(None),
            // flatten() never yields a sequence
            Command::Sequence(_) => String::new(),
        };
        Ok(Some(message))
    }
}
