use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents all possible session commands that can be executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Template library
    OpenTemplates,
    NavigateTemplate(String),
    EnterTemplate(String),
    FilterTemplates(String),
    SelectTemplate(String),

    // Destination picker
    OpenPicker,
    NavigateDestination(String),
    EnterDestination(String),
    SearchDestination(String),
    LoadMore,
    Scroll {
        offset: f32,
        viewport: f32,
        extent: f32,
    },
    SelectDestination(Option<String>),
    Rename(String),
    Confirm,
    Close,

    Quit,

    // Multi-step commands for testing
    Sequence(Vec<Command>),
}

impl Command {
    /// Parse a command from a string representation
    pub fn from_string(s: &str) -> Result<Self, String> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "open_templates" => return Ok(Command::OpenTemplates),
            "open_picker" => return Ok(Command::OpenPicker),
            "load_more" => return Ok(Command::LoadMore),
            "confirm" => return Ok(Command::Confirm),
            "close" => return Ok(Command::Close),
            "quit" | "q" => return Ok(Command::Quit),
            _ => {}
        }

        if let Some(inner) = s
            .strip_prefix("sequence:[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            // sequence:[cmd1,cmd2,cmd3]
            if inner.trim().is_empty() {
                return Ok(Command::Sequence(vec![]));
            }
            let mut commands = Vec::new();
            for cmd_str in inner.split(',') {
                let cmd_str = cmd_str.trim();
                match Command::from_string(cmd_str) {
                    Ok(cmd) => commands.push(cmd),
                    Err(e) => {
                        return Err(format!("Invalid command in sequence '{}': {}", cmd_str, e))
                    }
                }
            }
            return Ok(Command::Sequence(commands));
        }

        let Some((name, argument)) = s.split_once(':') else {
            return Err(format!("Unknown command: {}", s));
        };
        let argument = argument.to_string();
        match name.to_lowercase().as_str() {
            "navigate_template" => Ok(Command::NavigateTemplate(argument)),
            "enter_template" => Ok(Command::EnterTemplate(argument)),
            "filter_templates" => Ok(Command::FilterTemplates(argument)),
            "select_template" => Ok(Command::SelectTemplate(argument)),
            "navigate_destination" => Ok(Command::NavigateDestination(argument)),
            "enter_destination" => Ok(Command::EnterDestination(argument)),
            "search_destination" => Ok(Command::SearchDestination(argument)),
            "select_destination" => {
                if argument.eq_ignore_ascii_case("none") || argument.is_empty() {
                    Ok(Command::SelectDestination(None))
                } else {
                    Ok(Command::SelectDestination(Some(argument)))
                }
            }
            "rename" => Ok(Command::Rename(argument)),
            "scroll" => Self::parse_scroll(&argument),
            _ => Err(format!("Unknown command: {}", s)),
        }
    }

    fn parse_scroll(argument: &str) -> Result<Self, String> {
        let values: Vec<f32> = argument
            .split(':')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Invalid scroll value in '{}': {}", argument, e))?;
        match values.as_slice() {
            [offset, viewport, extent] => Ok(Command::Scroll {
                offset: *offset,
                viewport: *viewport,
                extent: *extent,
            }),
            _ => Err(format!(
                "scroll expects offset:viewport:extent, got '{}'",
                argument
            )),
        }
    }

    /// Sequences expanded into the commands they contain, in order.
    pub fn flatten(self) -> Vec<Command> {
        match self {
            Command::Sequence(commands) => commands.into_iter().flat_map(Command::flatten).collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::OpenTemplates => write!(f, "open_templates"),
            Command::NavigateTemplate(path) => write!(f, "navigate_template:{}", path),
            Command::EnterTemplate(name) => write!(f, "enter_template:{}", name),
            Command::FilterTemplates(text) => write!(f, "filter_templates:{}", text),
            Command::SelectTemplate(name) => write!(f, "select_template:{}", name),
            Command::OpenPicker => write!(f, "open_picker"),
            Command::NavigateDestination(path) => write!(f, "navigate_destination:{}", path),
            Command::EnterDestination(name) => write!(f, "enter_destination:{}", name),
            Command::SearchDestination(text) => write!(f, "search_destination:{}", text),
            Command::LoadMore => write!(f, "load_more"),
            Command::Scroll {
                offset,
                viewport,
                extent,
            } => write!(f, "scroll:{}:{}:{}", offset, viewport, extent),
            Command::SelectDestination(Some(path)) => write!(f, "select_destination:{}", path),
            Command::SelectDestination(None) => write!(f, "select_destination:none"),
            Command::Rename(name) => write!(f, "rename:{}", name),
            Command::Confirm => write!(f, "confirm"),
            Command::Close => write!(f, "close"),
            Command::Quit => write!(f, "quit"),
            Command::Sequence(commands) => write!(
                f,
                "sequence:[{}]",
                commands
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}
