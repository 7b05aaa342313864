//! The four sync actions and how each one is run, logged and summarized

use crate::output::{format_bytes, rule, table, wordlist};
use mozusync_core::client::{AppDevClient, RenameSpec, TransferOptions};
use mozusync_core::progress::{EventData, ProgressProvider};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Upload,
    Delete,
    Rename,
    DeleteAll,
}

/// A table column: header and width
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub width: usize,
}

const UPLOAD_COLUMNS: &[Column] = &[
    Column { name: "file", width: 50 },
    Column { name: "size", width: 10 },
    Column { name: "type", width: 20 },
];
const DELETE_COLUMNS: &[Column] = &[Column { name: "file", width: 60 }];
const RENAME_COLUMNS: &[Column] = &[
    Column { name: "old path", width: 40 },
    Column { name: "new path", width: 40 },
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "Unknown mozusync action {name}.\nSpecify a valid action in your task config options under the `action` property. \nValid actions are: {valid}"
)]
pub struct UnknownAction {
    pub name: String,
    pub valid: String,
}

/// Inputs an action may draw on
#[derive(Debug, Clone, Default)]
pub struct ActionWork {
    /// Existing local files to upload, relative to the project root
    pub upload_list: Vec<PathBuf>,
    /// Remote paths to delete
    pub remove: Vec<String>,
    pub renames: Vec<RenameSpec>,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [Self::Upload, Self::Delete, Self::Rename, Self::DeleteAll];

    pub fn name(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::DeleteAll => "deleteAll",
        }
    }

    pub fn present_tense(self) -> &'static str {
        match self {
            Self::Upload => "Uploading",
            Self::Delete => "Deleting",
            Self::Rename => "Renaming",
            Self::DeleteAll => "Deleting all!",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Upload => "Uploaded",
            Self::Delete | Self::DeleteAll => "Deleted",
            Self::Rename => "Renamed",
        }
    }

    /// Destructive actions must be requested on their own
    pub fn solo_only(self) -> bool {
        matches!(self, Self::Delete | Self::DeleteAll)
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Upload => UPLOAD_COLUMNS,
            Self::Delete | Self::DeleteAll => DELETE_COLUMNS,
            Self::Rename => RENAME_COLUMNS,
        }
    }

    fn widths(self) -> Vec<usize> {
        self.columns().iter().map(|c| c.width).collect()
    }

    /// Column names over a dashed rule
    pub fn column_header(self) -> String {
        let widths = self.widths();
        let names: Vec<&str> = self.columns().iter().map(|c| c.name).collect();
        format!("{}\n{}", table(&widths, &names), rule(&widths))
    }

    /// `<Present> progress:`, a blank line, then the column header
    pub fn table_head(self) -> String {
        format!("{} progress:\n\n{}", self.present_tense(), self.column_header())
    }

    /// One table row for an event payload
    pub fn logline(self, data: &EventData) -> String {
        let widths = self.widths();
        match (self, data) {
            (
                Self::Upload,
                EventData::File {
                    path,
                    size_in_bytes,
                    content_type,
                },
            ) => table(
                &widths,
                &[
                    path.clone(),
                    format_bytes(*size_in_bytes),
                    content_type.clone().unwrap_or_default(),
                ],
            ),
            (Self::Rename, EventData::Rename { old_path, new_path }) => {
                table(&widths, &[old_path, new_path])
            }
            (_, data) => table(&widths, &[format!("deleted {}", data.path())]),
        }
    }

    pub fn needs_to_run(self, work: &ActionWork) -> bool {
        match self {
            Self::Upload => !work.upload_list.is_empty(),
            Self::Delete => !work.remove.is_empty(),
            Self::Rename => !work.renames.is_empty(),
            Self::DeleteAll => true,
        }
    }

    /// Dispatch to the matching client operation
    pub async fn run(
        self,
        client: &dyn AppDevClient,
        work: &ActionWork,
        options: &TransferOptions,
        sink: &dyn ProgressProvider,
    ) -> mozusync_core::Result<()> {
        match self {
            Self::Upload => client.upload_files(&work.upload_list, options, sink).await,
            Self::Delete => client.delete_files(&work.remove, sink).await,
            Self::Rename => client.rename_files(&work.renames, sink).await,
            Self::DeleteAll => client.delete_all_files(sink).await,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| UnknownAction {
                name: s.to_string(),
                valid: wordlist(&Self::ALL.map(ActionKind::name)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        for action in ActionKind::ALL {
            assert_eq!(action.name().parse::<ActionKind>().unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_action_lists_valid_names() {
        let err = "sync".parse::<ActionKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Unknown mozusync action sync."));
        assert!(message.ends_with("Valid actions are: upload, delete, rename, deleteAll"));
    }

    #[test]
    fn test_solo_defaults() {
        assert!(!ActionKind::Upload.solo_only());
        assert!(ActionKind::Delete.solo_only());
        assert!(!ActionKind::Rename.solo_only());
        assert!(ActionKind::DeleteAll.solo_only());
    }

    #[test]
    fn test_column_header_rule_matches_widths() {
        let header = ActionKind::Upload.column_header();
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file"));
        assert_eq!(lines[0].len(), 80);
        assert_eq!(lines[1], "-".repeat(80));

        assert_eq!(ActionKind::Rename.column_header().lines().nth(1).unwrap().len(), 80);
        assert_eq!(ActionKind::Delete.column_header().lines().nth(1).unwrap().len(), 60);
    }

    #[test]
    fn test_table_head() {
        let head = ActionKind::Delete.table_head();
        assert!(head.starts_with("Deleting progress:\n\nfile"));
        assert!(ActionKind::DeleteAll.table_head().starts_with("Deleting all! progress:"));
    }

    #[test]
    fn test_loglines() {
        let upload = ActionKind::Upload.logline(&EventData::File {
            path: "scripts/app.js".to_string(),
            size_in_bytes: 2048,
            content_type: Some("text/javascript".to_string()),
        });
        assert!(upload.starts_with("scripts/app.js"));
        assert!(upload.contains("2.00 KB"));
        assert!(upload.contains("text/javascript"));

        let delete = ActionKind::Delete.logline(&EventData::file("old.css"));
        assert_eq!(delete.trim_end(), "deleted old.css");

        let rename = ActionKind::Rename.logline(&EventData::rename("a.css", "b.css"));
        assert_eq!(rename.len(), 80);
        assert!(rename.starts_with("a.css"));
        assert_eq!(&rename[40..45], "b.css");
    }

    #[test]
    fn test_needs_to_run() {
        let empty = ActionWork::default();
        assert!(!ActionKind::Upload.needs_to_run(&empty));
        assert!(!ActionKind::Delete.needs_to_run(&empty));
        assert!(!ActionKind::Rename.needs_to_run(&empty));
        assert!(ActionKind::DeleteAll.needs_to_run(&empty));

        let work = ActionWork {
            remove: vec!["a.css".to_string()],
            ..Default::default()
        };
        assert!(ActionKind::Delete.needs_to_run(&work));
    }
}
