//! External URL construction for paths handed out by a tree's host.

use crate::file_kind;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters left alone when a path is embedded as a query value.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Preview sizes accepted by the thumbnail endpoint: 0=300px, 1=480px,
/// 2=750px, 3=1024px, 4=1600px, 5=2560px, 6=original.
pub const DEFAULT_THUMBNAIL_RESOLUTION: u8 = 1;
pub const PREVIEW_THUMBNAIL_RESOLUTION: u8 = 3;
const MAX_THUMBNAIL_RESOLUTION: u8 = 6;

/// Combine a server-relative path with the host URL.
///
/// When the path already starts with the host's own path (for a host at
/// `https://x/sites/hr`, a path like `/sites/hr/Docs`), that prefix is
/// dropped so it does not appear twice.
pub fn build_full_url(server_relative: &str, host_url: &str) -> String {
    let host = host_url.trim_end_matches('/');
    let host_path = Url::parse(host)
        .map(|url| url.path().trim_end_matches('/').to_string())
        .unwrap_or_default();

    let mut relative = server_relative;
    if !host_path.is_empty() {
        if let Some(rest) = relative.strip_prefix(host_path.as_str()) {
            if rest.is_empty() || rest.starts_with('/') {
                relative = rest;
            }
        }
    }

    if relative.starts_with('/') {
        format!("{}{}", host, relative)
    } else {
        format!("{}/{}", host, relative)
    }
}

/// Thumbnail endpoint for a file.
pub fn thumbnail_url(server_relative: &str, host_url: &str, resolution: u8) -> String {
    let encoded = utf8_percent_encode(server_relative, QUERY_VALUE);
    format!(
        "{}/_layouts/15/getpreview.ashx?path={}&resolution={}",
        host_url.trim_end_matches('/'),
        encoded,
        resolution.min(MAX_THUMBNAIL_RESOLUTION)
    )
}

/// Embedded preview for a file, if the store can render one.
///
/// Documents with a preview handle get the embed viewer; images without one
/// fall back to a large thumbnail.
pub fn preview_url(
    preview_ref: Option<&str>,
    server_relative: &str,
    file_name: &str,
    host_url: &str,
) -> Option<String> {
    if let Some(unique_id) = preview_ref {
        return Some(format!(
            "{}/_layouts/15/embed.aspx?UniqueId={}&action=embedview",
            host_url.trim_end_matches('/'),
            unique_id
        ));
    }

    file_kind::is_image(file_name)
        .then(|| thumbnail_url(server_relative, host_url, PREVIEW_THUMBNAIL_RESOLUTION))
}
