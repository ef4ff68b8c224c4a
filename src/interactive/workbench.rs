//! The editor surface the interactive commands drive

use anyhow::Result;

/// What to do with an enhanced prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Replace the selection, or insert at the cursor when nothing was selected
    Replace,
    /// Open the result as a new markdown document
    NewDocument,
    /// Copy the result to the clipboard
    Clipboard,
}

impl std::str::FromStr for Disposition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "new-doc" | "newdoc" | "new-document" => Ok(Self::NewDocument),
            "copy" | "clipboard" => Ok(Self::Clipboard),
            other => Err(anyhow::anyhow!(
                "Unknown action '{}', expected replace, new-doc or copy",
                other
            )),
        }
    }
}

/// One entry of the disposition quick-pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionChoice {
    pub label: &'static str,
    pub description: &'static str,
    pub disposition: Disposition,
}

/// The three choices offered after a successful enhancement
pub fn disposition_choices(has_selection: bool) -> [DispositionChoice; 3] {
    [
        DispositionChoice {
            label: "Replace Text",
            description: if has_selection {
                "Replace the selected text"
            } else {
                "Insert at cursor"
            },
            disposition: Disposition::Replace,
        },
        DispositionChoice {
            label: "New Document",
            description: "Open enhanced prompt in a new document",
            disposition: Disposition::NewDocument,
        },
        DispositionChoice {
            label: "Copy to Clipboard",
            description: "Copy enhanced prompt to clipboard",
            disposition: Disposition::Clipboard,
        },
    ]
}

/// Editor UI collaborator. Implementations own the active document, the
/// input/quick-pick prompts, the clipboard and notifications.
pub trait Workbench {
    fn has_active_editor(&self) -> bool;

    /// Text of a non-empty selection in the active editor
    fn selected_text(&self) -> Option<String>;

    /// Ask the user for free text; `None` when dismissed
    fn show_input_box(&mut self, prompt: &str, placeholder: &str) -> Option<String>;

    /// Offer the choices; `None` when dismissed
    fn pick_disposition(&mut self, choices: &[DispositionChoice]) -> Option<Disposition>;

    fn replace_selection(&mut self, text: &str) -> Result<()>;

    fn insert_at_cursor(&mut self, text: &str) -> Result<()>;

    fn open_document(&mut self, content: &str, language: &str) -> Result<()>;

    fn write_clipboard(&mut self, text: &str) -> Result<()>;

    fn show_info(&mut self, message: &str);

    fn show_error(&mut self, message: &str);
}
