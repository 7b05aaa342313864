//! CLI errors with semantic exit codes

use crate::actions::ActionKind;
use crate::config::ConfigError;
use crate::orchestrators::SyncError;
use crate::watch::WatchError;
use colored::*;
use mozusync_core::error::{Error as CoreError, IoErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// CLI-specific error type with semantic exit codes
#[derive(Debug)]
pub struct CliError {
    /// The main error message
    message: String,

    /// Error category for exit code determination
    category: ErrorCategory,

    /// Suggestions for recovery
    pub suggestions: Vec<String>,

    /// Source error if any
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Error categories that map to exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    General,
    Misuse,
    Network,
    Filesystem,
}

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    GeneralError = 1,
    Misuse = 2,
    NetworkError = 3,
    FilesystemError = 4,
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn new(message: &str, category: ErrorCategory) -> Self {
        Self {
            message: message.to_string(),
            category,
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Create a general error
    pub fn general(message: &str) -> Self {
        Self::new(message, ErrorCategory::General)
    }

    /// Create a configuration or command misuse error
    pub fn misuse(message: &str) -> Self {
        let mut error = Self::new(message, ErrorCategory::Misuse);
        error
            .suggestions
            .push("Run 'mozusync --help' for usage information".to_string());
        error
    }

    /// Create an error for a failed remote call
    pub fn network(message: &str) -> Self {
        let mut error = Self::new(message, ErrorCategory::Network);
        error
            .suggestions
            .push("Check your internet connection and the `base_url` of the target".to_string());
        error
    }

    /// Create a filesystem error
    pub fn filesystem(message: &str) -> Self {
        let mut error = Self::new(message, ErrorCategory::Filesystem);

        if message.contains("not found") {
            error
                .suggestions
                .push("Check if the file or directory exists".to_string());
        } else if message.contains("permission") || message.contains("denied") {
            error.suggestions.push("Check file permissions".to_string());
        }

        error
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self.category {
            ErrorCategory::General => ExitCode::GeneralError,
            ErrorCategory::Misuse => ExitCode::Misuse,
            ErrorCategory::Network => ExitCode::NetworkError,
            ErrorCategory::Filesystem => ExitCode::FilesystemError,
        }
    }

    /// Attach the underlying error, shown in verbose output
    pub fn with_source(mut self, source: Box<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn prefix(&self) -> &'static str {
        match self.category {
            ErrorCategory::General => "Error",
            ErrorCategory::Misuse => "Configuration Error",
            ErrorCategory::Network => "Remote Error",
            ErrorCategory::Filesystem => "File Error",
        }
    }

    /// Format the error for user display
    pub fn format_for_user(&self, debug: bool) -> String {
        let mut output = String::new();

        let prefix = match self.category {
            ErrorCategory::Misuse => self.prefix().yellow(),
            _ => self.prefix().red(),
        };

        output.push_str(&format!("{}: {}\n", prefix, self.message));

        // Error chain in debug mode
        if debug && let Some(source) = &self.source {
            output.push_str("\nCaused by:\n");
            let mut current: Option<&dyn StdError> = Some(source.as_ref());
            let mut level = 1;

            while let Some(err) = current {
                output.push_str(&format!("  {level}: {err}\n"));
                current = err.source();
                level += 1;
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.prefix(), self.message)
    }
}

impl StdError for CliError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<SyncError> for CliError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::Configuration(message) => Self::misuse(&message),
            SyncError::UnknownAction(unknown) => {
                let mut cli = Self::misuse(&unknown.to_string());
                if let Some(close) = ActionKind::ALL
                    .iter()
                    .find(|action| levenshtein_distance(&unknown.name, action.name()) <= 2)
                {
                    cli.suggestions
                        .insert(0, format!("Did you mean '{}'?", close.name()));
                }
                cli
            }
            SyncError::SoloOnly { .. } => Self::misuse(&error.to_string()),
            SyncError::Discovery(e) => Self::filesystem(&e.to_string()),
            SyncError::Remote { message, source } => {
                let cli = match &source {
                    CoreError::Io(io) if io.kind != IoErrorKind::Other => {
                        Self::filesystem(&message)
                    }
                    CoreError::Io(_) | CoreError::Remote(_) => Self::network(&message),
                    CoreError::Credential(_) => Self::general(&message),
                };
                cli.with_source(Box::new(source))
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::misuse(&error.to_string())
    }
}

impl From<WatchError> for CliError {
    fn from(error: WatchError) -> Self {
        Self::misuse(&error.to_string())
    }
}

/// Convert anyhow errors to CLI errors
impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        if let Some(config) = error.downcast_ref::<figment::Error>() {
            return Self::misuse(&config.to_string());
        }
        Self::general(&format!("{error:#}"))
    }
}

/// Simple Levenshtein distance for suggestions
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();
    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(len1 + 1) {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate().take(len2 + 1) {
        *cell = j;
    }

    for (i, c1) in s1_chars.iter().enumerate() {
        let i1 = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let j1 = j + 1;
            let cost = if c1 == c2 { 0 } else { 1 };
            matrix[i1][j1] = std::cmp::min(
                std::cmp::min(matrix[i][j1] + 1, matrix[i1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }

    matrix[len1][len2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mozusync_core::error::RemoteError;

    #[test]
    fn test_configuration_errors_exit_with_misuse() {
        let error = CliError::from(SyncError::Configuration("missing key".to_string()));
        assert_eq!(error.exit_code(), ExitCode::Misuse);
        assert_eq!(error.exit_code() as i32, 2);
    }

    #[test]
    fn test_unknown_action_suggests_close_name() {
        let unknown = "uplaod".parse::<ActionKind>().unwrap_err();
        let error = CliError::from(SyncError::from(unknown));

        assert_eq!(error.exit_code(), ExitCode::Misuse);
        assert_eq!(error.suggestions[0], "Did you mean 'upload'?");
        assert!(error.message().contains("upload, delete, rename, deleteAll"));
    }

    #[test]
    fn test_remote_errors_exit_with_network_code() {
        let source: CoreError = RemoteError::api(500, Some("SERVER_ERROR"), "boom").into();
        let error = CliError::from(SyncError::Remote {
            message: "boom".to_string(),
            source,
        });

        assert_eq!(error.exit_code() as i32, 3);
        let text = error.format_for_user(true);
        assert!(text.contains("Caused by"));
    }

    #[test]
    fn test_missing_local_file_exits_with_filesystem_code() {
        let source: CoreError =
            mozusync_core::error::IoError::file_not_found(std::path::Path::new("a.css")).into();
        let error = CliError::from(SyncError::Remote {
            message: source.to_string(),
            source,
        });
        assert_eq!(error.exit_code() as i32, 4);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("delete", "delete"), 0);
        assert_eq!(levenshtein_distance("delet", "delete"), 1);
        assert_eq!(levenshtein_distance("rename", "upload"), 6);
    }
}
