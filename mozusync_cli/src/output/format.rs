//! Text layout helpers for run output

/// Width error messages are wrapped to
pub const WRAP_WIDTH: usize = 67;

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Pick the singular or plural half of `"file/files"` for `count`
pub fn pluralize(count: usize, forms: &str) -> &str {
    let (singular, plural) = forms.split_once('/').unwrap_or((forms, forms));
    if count == 1 { singular } else { plural }
}

/// Comma-separated list
pub fn wordlist<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wrap text at word boundaries to `width` columns
///
/// Existing line breaks are kept. Words longer than the width are split.
pub fn wraptext(width: usize, text: &str) -> String {
    let width = width.max(1);
    text.split('\n')
        .map(|paragraph| wrap_paragraph(width, paragraph).join("\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_paragraph(width: usize, paragraph: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        let current_len = current.chars().count();

        if current_len > 0 && current_len + 1 + word.len() <= width {
            current.push(' ');
            current.extend(word.iter());
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }
        while word.len() > width {
            lines.push(word.drain(..width).collect());
        }
        current.extend(word.iter());
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lay out `texts` in fixed-width columns, wrapping each cell
pub fn table<S: AsRef<str>>(widths: &[usize], texts: &[S]) -> String {
    let cells: Vec<Vec<String>> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let text = texts.get(i).map(AsRef::as_ref).unwrap_or("");
            wraptext(*width, text).split('\n').map(str::to_string).collect()
        })
        .collect();
    let rows = cells.iter().map(Vec::len).max().unwrap_or(0);

    (0..rows)
        .map(|row| {
            cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| {
                    let text = cell.get(row).map(String::as_str).unwrap_or("");
                    format!("{text:<width$}")
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dashed rule as wide as the columns
pub fn rule(widths: &[usize]) -> String {
    "-".repeat(widths.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "file/files"), "file");
        assert_eq!(pluralize(0, "file/files"), "files");
        assert_eq!(pluralize(2, "file was/files were"), "files were");
    }

    #[test]
    fn test_wraptext_respects_width() {
        let text = "Invalid credentials. Please re-enter your username and password, and/or check your mozusync.toml file.";
        let wrapped = wraptext(WRAP_WIDTH, text);
        assert!(wrapped.lines().count() > 1);
        assert!(wrapped.lines().all(|line| line.chars().count() <= WRAP_WIDTH));
        assert_eq!(wrapped.split_whitespace().collect::<Vec<_>>(), text.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn test_wraptext_keeps_line_breaks_and_splits_long_words() {
        assert_eq!(wraptext(10, "one\ntwo"), "one\ntwo");
        assert_eq!(wraptext(4, "abcdefghij"), "abcd\nefgh\nij");
    }

    #[test]
    fn test_table_pads_every_column() {
        let row = table(&[10, 5], &["file", "1 B"]);
        assert_eq!(row, "file      1 B  ");
        assert_eq!(row.len(), 15);
    }

    #[test]
    fn test_table_wraps_long_cells() {
        let rows = table(&[4, 3], &["abcdefgh", "x"]);
        assert_eq!(rows, "abcdx  \nefgh   ");
    }

    #[test]
    fn test_rule_length() {
        assert_eq!(rule(&[50, 10, 20]).len(), 80);
    }

    #[test]
    fn test_wordlist() {
        assert_eq!(wordlist(&["upload", "delete"]), "upload, delete");
    }
}
