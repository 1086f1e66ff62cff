// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Path normalization for boundary checks.
//!
//! The `not_under` matcher must defeat `..`-segment traversal and symlink
//! indirection, so both the allowed root and the candidate are resolved to
//! absolute, symlink-resolved paths before the prefix comparison.

use std::path::{Component, Path, PathBuf};

/// macOS and Windows ship case-insensitive filesystems by default.
const CASE_INSENSITIVE_FS: bool = cfg!(any(target_os = "macos", target_os = "windows"));

/// Expand `${HOME}`, `${PROJECT_DIR}`, and a leading `~/` in a configured
/// path. `PROJECT_DIR` is the proxy's working directory.
pub fn expand_path(path: &str) -> String {
    let home = std::env::var("HOME").unwrap_or_default();
    let cwd = std::env::current_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut expanded = path.replace("${HOME}", &home).replace("${PROJECT_DIR}", &cwd);
    if let Some(rest) = expanded.strip_prefix("~/") {
        expanded = format!("{}/{}", home, rest);
    }
    expanded
}

/// Normalize a path for directory-prefix comparison: strip surrounding
/// quotes, make absolute, fold `.`/`..` segments, resolve symlinks when the
/// path exists on disk, case-fold on case-insensitive filesystems, and append
/// a trailing separator so `/a/bc` is never a prefix of `/a/b`.
pub fn normalize_for_comparison(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c| c == '"' || c == '\'');

    let absolute = to_absolute(Path::new(trimmed));
    let resolved = lexically_resolve(&absolute);

    // Resolve symlinks when the target exists; a not-yet-created path falls
    // back to the lexically resolved form.
    let resolved = std::fs::canonicalize(&resolved).unwrap_or(resolved);

    let mut normalized = resolved.to_string_lossy().into_owned();
    if CASE_INSENSITIVE_FS {
        normalized = normalized.to_lowercase();
    }
    if !normalized.ends_with(std::path::MAIN_SEPARATOR) {
        normalized.push(std::path::MAIN_SEPARATOR);
    }
    normalized
}

/// True when `candidate` resolves outside the `allowed_root` directory.
pub fn is_outside(allowed_root: &str, candidate: &str) -> bool {
    let root = normalize_for_comparison(&expand_path(allowed_root));
    let value = normalize_for_comparison(candidate);
    !value.starts_with(&root)
}

fn to_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from(std::path::MAIN_SEPARATOR.to_string()))
            .join(path)
    }
}

/// Fold `.` and `..` components without touching the filesystem. `..` at the
/// root stays at the root, matching how the kernel resolves it.
fn lexically_resolve(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // pop is a no-op at the root: "/.." resolves to "/".
                out.pop();
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(std::path::MAIN_SEPARATOR.to_string())
    } else {
        out
    }
}
