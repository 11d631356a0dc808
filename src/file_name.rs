//! Name of the copy the user is about to create.
//!
//! The template's extension is fixed; the user only edits the stem.

use crate::file_kind;
use thiserror::Error;

const DISALLOWED_CHARS: [char; 9] = ['"', '*', ':', '<', '>', '?', '/', '\\', '|'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("file name cannot be empty")]
    Empty,
    #[error("file name cannot end with a period")]
    EndsWithPeriod,
    #[error("file name cannot contain any of \" * : < > ? / \\ |")]
    DisallowedCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFileName {
    extension: String,
    file_name: String,
}

impl CopyFileName {
    /// Start from the template's own name.
    pub fn for_template(template_name: &str) -> Self {
        Self {
            extension: file_kind::extension(template_name),
            file_name: template_name.to_string(),
        }
    }

    /// Replace the stem, keeping the template extension.
    ///
    /// The extension is only appended once the stem has visible content, so
    /// clearing the field does not leave a bare `.docx` behind.
    pub fn with_stem(&self, stem: &str) -> Self {
        let file_name = if !self.extension.is_empty() && !stem.trim().is_empty() {
            format!("{}.{}", stem, self.extension)
        } else {
            stem.to_string()
        };
        Self {
            extension: self.extension.clone(),
            file_name,
        }
    }

    /// Accept a full name typed by the user. Any extension they typed is
    /// replaced by the template's.
    pub fn with_file_name(&self, file_name: &str) -> Self {
        let stem = Self {
            extension: self.extension.clone(),
            file_name: file_name.to_string(),
        }
        .stem()
        .to_string();
        self.with_stem(&stem)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Name without the template extension, as shown in the edit field.
    pub fn stem(&self) -> &str {
        let name = self.file_name.as_str();
        if !self.extension.is_empty() {
            let suffix_len = self.extension.len() + 1;
            if name.len() > self.extension.len() && name.is_char_boundary(name.len() - suffix_len) {
                let (head, tail) = name.split_at(name.len() - suffix_len);
                if tail.eq_ignore_ascii_case(&format!(".{}", self.extension)) {
                    return head;
                }
            }
        }
        match name.rfind('.') {
            Some(index) if index > 0 => &name[..index],
            _ => name,
        }
    }

    pub fn validate(&self) -> Result<(), FileNameError> {
        let stem = self.stem();
        if stem.ends_with('.') {
            return Err(FileNameError::EndsWithPeriod);
        }
        if let Some(c) = stem.chars().find(|c| DISALLOWED_CHARS.contains(c)) {
            return Err(FileNameError::DisallowedCharacter(c));
        }
        if stem.trim().is_empty() {
            return Err(FileNameError::Empty);
        }
        Ok(())
    }
}
