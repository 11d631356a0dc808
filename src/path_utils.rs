//! Path helpers shared by both trees.
//!
//! Paths are server-relative strings using `/` as the separator. Search
//! results may come back as absolute URLs, so anything that compares paths
//! from two different sources goes through [`normalize`] or
//! [`server_relative`] first.

use url::Url;

pub const SEPARATOR: char = '/';

/// Suffix the store appends to a library root when it reports a listing page.
const LISTING_PAGE_SUFFIX: &str = "/forms/allitems.aspx";

/// Leading hierarchy markers that carry no folder meaning.
const HIERARCHY_MARKERS: [&str; 2] = ["sites", "teams"];

/// Join `name` onto `parent_path` with exactly one separator between them.
pub fn join(parent_path: &str, name: &str) -> String {
    let name = name.trim_start_matches(SEPARATOR);
    if parent_path.ends_with(SEPARATOR) {
        format!("{}{}", parent_path, name)
    } else {
        format!("{}{}{}", parent_path, SEPARATOR, name)
    }
}

/// Split a path into the segments that count towards folder depth.
///
/// Hierarchy markers (`sites`, `teams`) and anything containing a dot are
/// skipped, so `/sites/hr/Shared/Policies` yields `hr`, `Shared`, `Policies`.
pub fn depth_segments(path: &str) -> Vec<String> {
    server_relative(path)
        .split(SEPARATOR)
        .filter(|segment| {
            !segment.is_empty()
                && !segment.contains('.')
                && !HIERARCHY_MARKERS
                    .iter()
                    .any(|marker| segment.eq_ignore_ascii_case(marker))
        })
        .map(str::to_string)
        .collect()
}

/// Produce a value that is safe to compare for equality across sources.
pub fn normalize(path: &str) -> String {
    let mut value = path.to_string();
    let cut = value.len().saturating_sub(LISTING_PAGE_SUFFIX.len());
    if value.len() >= LISTING_PAGE_SUFFIX.len()
        && value.is_char_boundary(cut)
        && value[cut..].eq_ignore_ascii_case(LISTING_PAGE_SUFFIX)
    {
        value.truncate(cut);
    }
    if value.ends_with(SEPARATOR) {
        value.pop();
    }
    value.trim().to_lowercase()
}

/// Strip scheme and host from an absolute URL, leaving the path part.
///
/// Values that are already server-relative come back unchanged.
pub fn server_relative(path: &str) -> String {
    if !(path.starts_with("http://") || path.starts_with("https://")) || Url::parse(path).is_err() {
        return path.to_string();
    }
    // Sliced from the raw text: `Url::path` would percent-encode spaces.
    let after_scheme = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    let relative = match after_scheme.find(SEPARATOR) {
        Some(index) => &after_scheme[index..],
        None => "/",
    };
    relative
        .split(['?', '#'])
        .next()
        .unwrap_or(relative)
        .to_string()
}

/// Parent location of `path`, or the separator itself for top-level entries.
pub fn parent(path: &str) -> String {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rsplit_once(SEPARATOR) {
        Some((head, _)) if !head.is_empty() => head.to_string(),
        _ => SEPARATOR.to_string(),
    }
}

/// Last segment of `path`.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    trimmed
        .rsplit_once(SEPARATOR)
        .map(|(_, name)| name)
        .unwrap_or(trimmed)
}

/// Compare two paths the way the store does: case-insensitively and
/// ignoring a trailing separator.
pub fn same_path(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Segments of `current` below `root`. Empty when `current` is the root or
/// lies outside it.
pub fn segments_below(current: &str, root: &str) -> Vec<String> {
    let root = root.trim_end_matches(SEPARATOR);
    let relative = match current.get(..root.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(root) => &current[root.len()..],
        _ => return Vec::new(),
    };
    if !relative.is_empty() && !relative.starts_with(SEPARATOR) {
        // `/Docs2` is not below `/Docs`
        return Vec::new();
    }
    relative
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
