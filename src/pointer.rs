//! JSON-pointer-like document paths
//!
//! Paths follow RFC 6901 escaping, except that the document root is written
//! `/` rather than the empty string.

/// Path of the document root
pub const ROOT: &str = "/";

/// Normalize an RFC 6901 pointer (root `""` becomes `/`)
pub fn normalize(pointer: &str) -> String {
    if pointer.is_empty() {
        ROOT.to_string()
    } else {
        pointer.to_string()
    }
}

/// Path of `segment` below `parent`
pub fn child(parent: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    if parent == ROOT || parent.is_empty() {
        format!("/{}", escaped)
    } else {
        format!("{}/{}", parent, escaped)
    }
}

/// Concatenate two paths (`/children/0` + `/title` = `/children/0/title`)
pub fn join(prefix: &str, suffix: &str) -> String {
    match (prefix, suffix) {
        (ROOT | "", s) => normalize(s),
        (p, ROOT | "") => p.to_string(),
        (p, s) => format!("{}{}", p, s),
    }
}

/// Path of the enclosing value (the root is its own parent)
pub fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => ROOT.to_string(),
        Some(i) => path[..i].to_string(),
    }
}

/// Unescaped segments of a path
pub fn segments(path: &str) -> Vec<String> {
    if path == ROOT || path.is_empty() {
        return Vec::new();
    }
    path.trim_start_matches('/')
        .split('/')
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// RFC 6901 form, usable with `serde_json::Value::pointer`
pub fn to_rfc6901(path: &str) -> &str {
    if path == ROOT {
        ""
    } else {
        path
    }
}
