//! Package path arithmetic.
//!
//! References inside OFD parts are either package-absolute (`/Doc_0/...`)
//! or relative to the directory of the part that holds them.

/// Normalizes a package path: backslashes become slashes, the leading slash
/// is dropped, `.` segments vanish and `..` pops a segment.
pub fn normalize(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Directory of a package path (empty at the package root).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}

/// True for package-absolute references.
pub fn is_absolute(reference: &str) -> bool {
    reference.trim_start().starts_with('/')
}

/// Resolves `reference` against `base_dir`.
pub fn resolve(base_dir: &str, reference: &str) -> String {
    if is_absolute(reference) || base_dir.is_empty() {
        normalize(reference)
    } else {
        normalize(&format!("{base_dir}/{}", reference.trim()))
    }
}

/// Places `reference` under `dir` unless it already points inside it.
///
/// Signature list entries are written either relative to the list's own
/// directory or package-relative with that directory as prefix.
pub fn reroot(dir: &str, reference: &str) -> String {
    let path = normalize(reference);
    let prefix = format!("{}/", dir.to_uppercase());
    if dir.is_empty() || path.to_uppercase().starts_with(&prefix) {
        path
    } else {
        normalize(&format!("{dir}/{path}"))
    }
}
