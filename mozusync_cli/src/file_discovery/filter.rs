//! Glob matching for project-relative paths

use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

use super::{DiscoveryError, Result};

/// One compiled `src` pattern
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    matcher: GlobMatcher,
}

impl PatternMatcher {
    /// Compile `pattern`; `*` stops at path separators, `**` crosses them
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim_start_matches("./");
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| DiscoveryError::InvalidPattern(format!("{pattern}: {e}")))?;

        Ok(Self {
            matcher: glob.compile_matcher(),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}
