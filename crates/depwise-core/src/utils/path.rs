//! Path helpers for naming the artifacts a remediation step touches.
//!
//! Artifact paths are reported relative to the project root with forward
//! slashes, whatever platform produced the snapshot.

/// Normalize a relative path by resolving `.` and `..` components
pub fn normalize_relative(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();

    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {},
            ".." => {
                // Keep leading `..` that would escape the root
                if matches!(components.last(), None | Some(&"..")) {
                    components.push(component);
                } else {
                    components.pop();
                }
            },
            other => components.push(other),
        }
    }

    components.join("/")
}

/// Manifest path for a project directory (`packages/a/` -> `packages/a/package.json`)
pub fn manifest_path(directory: &str) -> String {
    let normalized = normalize_relative(directory);
    if normalized.is_empty() {
        "package.json".to_string()
    } else {
        format!("{}/package.json", normalized)
    }
}
