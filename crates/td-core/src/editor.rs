//! Interactive editor integration for free-form task bodies.
//!
//! A task's title and long-form content are edited together in the user's
//! text editor as a settext-style document: the title on the first lines, an
//! `====` underline, then the body. This module handles editor discovery,
//! the temporary-file round-trip, and composing/splitting that document.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use tracing::debug;

/// Error type for editor operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor exited with a failure status")]
    EditorFailed,
    #[error("editor I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for editor operations.
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Discover the user's preferred text editor: the `EDITOR` environment
/// variable when set, otherwise the first available of a short fallback
/// list, defaulting to vim.
pub fn discover_editor() -> String {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.trim().is_empty() {
            return editor;
        }
    }
    for editor in ["vim", "nano", "vi"] {
        if editor_available(editor) {
            return editor.to_string();
        }
    }
    "vim".to_string()
}

fn editor_available(editor: &str) -> bool {
    Command::new("command")
        .args(["-v", editor])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Compose the document loaded into the editor for a task.
pub fn compose_document(title: &str, content: Option<&str>) -> String {
    let underline = "=".repeat(title.chars().count());
    match content {
        Some(content) => format!("{title}\n{underline}\n{content}"),
        None => format!("{title}\n{underline}"),
    }
}

/// Split an edited document back into `(title, content)`. Everything above
/// the first `===` underline is the title (trailing blanks stripped), the
/// rest is the content verbatim.
pub fn parse_document(document: &str) -> (String, String) {
    let mut title = String::new();
    let mut content = String::new();
    let mut in_title = true;
    for line in document.split_inclusive('\n') {
        if in_title && line.starts_with("===") {
            in_title = false;
            continue;
        }
        if in_title {
            title.push_str(line);
        } else {
            content.push_str(line);
        }
    }
    (title.trim_end().to_string(), content)
}

/// Run the user's editor over `initial` and return the edited text.
///
/// The temporary file outlives the editor invocation and is removed when
/// this function returns, success or not.
pub fn edit_in_editor(initial: &str) -> EditorResult<String> {
    let editor = discover_editor();
    debug!(editor, "opening editor");

    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "{initial}")?;
    file.flush()?;
    let path = file.into_temp_path();

    let status = Command::new(&editor).arg(&path).status()?;
    if !status.success() {
        return Err(EditorError::EditorFailed);
    }

    Ok(fs::read_to_string(&path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_underlines_the_title() {
        assert_eq!(compose_document("Buy milk", None), "Buy milk\n========");
        assert_eq!(
            compose_document("Buy milk", Some("two liters\n")),
            "Buy milk\n========\ntwo liters\n"
        );
    }

    #[test]
    fn parse_splits_on_the_underline() {
        let (title, content) = parse_document("Buy milk\n========\ntwo liters\n");
        assert_eq!(title, "Buy milk");
        assert_eq!(content, "two liters\n");
    }

    #[test]
    fn parse_without_underline_is_all_title() {
        let (title, content) = parse_document("Buy milk\n");
        assert_eq!(title, "Buy milk");
        assert_eq!(content, "");
    }

    #[test]
    fn parse_strips_trailing_blanks_from_the_title() {
        let (title, content) = parse_document("Buy milk\n\n====\nbody");
        assert_eq!(title, "Buy milk");
        assert_eq!(content, "body");
    }

    #[test]
    fn compose_then_parse_round_trips() {
        let (title, content) = parse_document(&compose_document("A task", Some("with body\n")));
        assert_eq!(title, "A task");
        assert_eq!(content, "with body\n");
    }
}
