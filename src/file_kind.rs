//! File classification by name extension.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconKind {
    Folder,
    Word,
    Excel,
    PowerPoint,
    Pdf,
    Text,
    Document,
}

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif"];

/// Lower-cased text after the last dot, or an empty string.
pub fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

pub fn icon_kind(file_name: &str) -> IconKind {
    match extension(file_name).as_str() {
        "docx" | "doc" => IconKind::Word,
        "xlsx" | "xls" => IconKind::Excel,
        "pptx" | "ppt" => IconKind::PowerPoint,
        "pdf" => IconKind::Pdf,
        "txt" => IconKind::Text,
        _ => IconKind::Document,
    }
}

pub fn is_office_document(file_name: &str) -> bool {
    desktop_protocol(file_name).is_some()
}

pub fn is_image(file_name: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension(file_name).as_str())
}

/// Protocol prefix that hands a document over to its desktop application.
pub fn desktop_protocol(file_name: &str) -> Option<&'static str> {
    match extension(file_name).as_str() {
        "docx" | "doc" => Some("ms-word:ofe|u|"),
        "xlsx" | "xls" => Some("ms-excel:ofe|u|"),
        "pptx" | "ppt" => Some("ms-powerpoint:ofe|u|"),
        _ => None,
    }
}

/// Desktop hand-off link for `url`, when the file type has a handler.
pub fn desktop_link(file_name: &str, url: &str) -> Option<String> {
    desktop_protocol(file_name).map(|protocol| format!("{}{}", protocol, url))
}
