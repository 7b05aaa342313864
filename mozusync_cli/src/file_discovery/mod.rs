//! Expansion of a target's `src` list into candidate upload paths
//!
//! Entries are processed in order. Glob patterns are matched against every
//! path under the project root, literal paths are kept as written (the upload
//! pre-filter drops the ones that do not exist), and entries starting with `!`
//! remove earlier matches.

mod filter;
mod walker;

pub use filter::PatternMatcher;
pub use walker::FileDiscovery;

use std::path::{Path, PathBuf};

/// Error type for file discovery operations
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Result type for file discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Whether `pattern` needs matching rather than being a plain path
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Escape a file name so it matches only itself as a pattern
pub fn escape_literal(path: &str) -> String {
    globset::escape(path).replace('{', "[{]").replace('}', "[}]")
}

/// Expand `patterns` into paths relative to `root`, without duplicates
pub fn expand_sources(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut project_paths: Option<Vec<PathBuf>> = None;
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            let matcher = PatternMatcher::new(negated)?;
            result.retain(|path| !matcher.matches(path));
            continue;
        }

        if !is_glob(pattern) {
            let path = PathBuf::from(pattern.trim_start_matches("./"));
            if !result.contains(&path) {
                result.push(path);
            }
            continue;
        }

        let matcher = PatternMatcher::new(pattern)?;
        if project_paths.is_none() {
            project_paths = Some(FileDiscovery::new(root)?.collect());
        }
        let paths = project_paths.as_deref().unwrap_or_default();
        for path in paths.iter().filter(|path| matcher.matches(path)) {
            if !result.contains(path) {
                result.push(path.clone());
            }
        }
    }

    log::debug!(
        "Expanded {} source pattern(s) to {} path(s)",
        patterns.len(),
        result.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("scripts/widgets")).unwrap();
        fs::create_dir_all(base.join("stylesheets")).unwrap();
        fs::write(base.join("theme.json"), "{}").unwrap();
        fs::write(base.join("scripts/app.js"), "").unwrap();
        fs::write(base.join("scripts/widgets/carousel.js"), "").unwrap();
        fs::write(base.join("stylesheets/storefront.less"), "").unwrap();
        dir
    }

    fn strings(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| mozusync_core::client::remote_path(p))
            .collect()
    }

    #[test]
    fn test_globs_match_relative_paths() {
        let dir = project();
        let paths = expand_sources(dir.path(), &["scripts/**/*.js".to_string()]).unwrap();
        assert_eq!(
            strings(&paths),
            vec!["scripts/app.js", "scripts/widgets/carousel.js"]
        );
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let dir = project();
        let paths = expand_sources(dir.path(), &["scripts/*.js".to_string()]).unwrap();
        assert_eq!(strings(&paths), vec!["scripts/app.js"]);
    }

    #[test]
    fn test_negated_patterns_remove_matches() {
        let dir = project();
        let paths = expand_sources(
            dir.path(),
            &[
                "**/*.js".to_string(),
                "**/*.json".to_string(),
                "!scripts/widgets/**".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(strings(&paths), vec!["scripts/app.js", "theme.json"]);
    }

    #[test]
    fn test_literal_paths_are_kept_even_if_missing() {
        let dir = project();
        let paths = expand_sources(
            dir.path(),
            &[
                "./theme.json".to_string(),
                "gone.js".to_string(),
                "theme.json".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(strings(&paths), vec!["theme.json", "gone.js"]);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let dir = project();
        let err = expand_sources(dir.path(), &["scripts/[".to_string()]).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPattern(_)));
    }

    #[test]
    fn test_missing_root_is_reported_only_for_globs() {
        let missing = Path::new("/definitely/not/here");
        assert!(expand_sources(missing, &["a.js".to_string()]).is_ok());
        assert!(matches!(
            expand_sources(missing, &["*.js".to_string()]),
            Err(DiscoveryError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_escaped_names_match_literally() {
        let dir = project();
        fs::write(dir.path().join("scripts/a[1].js"), "").unwrap();
        fs::write(dir.path().join("scripts/b{x,y}.js"), "").unwrap();
        fs::write(dir.path().join("scripts/bx.js"), "").unwrap();

        let patterns = [
            escape_literal("scripts/a[1].js"),
            escape_literal("scripts/b{x,y}.js"),
        ];
        assert_eq!(escape_literal("scripts/app.js"), "scripts/app.js");

        let paths = expand_sources(dir.path(), &patterns).unwrap();
        assert_eq!(strings(&paths), vec!["scripts/a[1].js", "scripts/b{x,y}.js"]);
    }
}
