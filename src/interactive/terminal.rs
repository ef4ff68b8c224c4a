//! Terminal workbench used by the `enhance` CLI command
//!
//! The "editor" is an optional file on disk. A selection is a 1-based,
//! inclusive line range of that file; without one the cursor sits at the end
//! of the file.

use std::fs;
use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::workbench::{Disposition, DispositionChoice, Workbench};
use crate::enhancer::ProgressSink;

/// A text file opened as the active editor document
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: String,
    selection: Option<Range<usize>>,
}

impl Document {
    /// Open `path`, selecting lines `start..=end` (1-based) when given
    pub fn open(path: impl Into<PathBuf>, lines: Option<(usize, usize)>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let selection = match lines {
            Some((start, end)) => Some(line_range(&text, start, end)?),
            None => None,
        };
        Ok(Self {
            path,
            text,
            selection,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selection
            .as_ref()
            .map(|r| &self.text[r.clone()])
            .filter(|s| !s.is_empty())
    }

    /// Replace the selection and save
    pub fn replace_selection(&mut self, replacement: &str) -> Result<()> {
        let range = self
            .selection
            .clone()
            .ok_or_else(|| anyhow!("No selection to replace"))?;
        self.text.replace_range(range.clone(), replacement);
        self.selection = Some(range.start..range.start + replacement.len());
        self.save()
    }

    /// Insert at the cursor (end of the selection, else end of file) and save
    pub fn insert_at_cursor(&mut self, insertion: &str) -> Result<()> {
        let cursor = self
            .selection
            .as_ref()
            .map(|r| r.end)
            .unwrap_or(self.text.len());
        self.text.insert_str(cursor, insertion);
        self.save()
    }

    fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.text)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Byte range covering lines `start..=end` (1-based), trailing newline of the
/// last line excluded
fn line_range(text: &str, start: usize, end: usize) -> Result<Range<usize>> {
    if start == 0 || end < start {
        return Err(anyhow!("Invalid line range {}:{}", start, end));
    }

    let mut offset = 0;
    let mut range_start = None;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        if line_no == start {
            range_start = Some(offset);
        }
        offset += line.len();
        if line_no == end {
            let content_end = offset - trailing_newline_len(line);
            return range_start
                .map(|s| s..content_end)
                .ok_or_else(|| anyhow!("Invalid line range {}:{}", start, end));
        }
    }

    Err(anyhow!(
        "Line range {}:{} is outside the document",
        start,
        end
    ))
}

fn trailing_newline_len(line: &str) -> usize {
    if line.ends_with("\r\n") {
        2
    } else if line.ends_with('\n') {
        1
    } else {
        0
    }
}

/// Workbench backed by the terminal and an optional document
pub struct TerminalWorkbench {
    document: Option<Document>,
    preset: Option<Disposition>,
    open_documents: bool,
}

impl TerminalWorkbench {
    pub fn new(document: Option<Document>) -> Self {
        Self {
            document,
            preset: None,
            open_documents: true,
        }
    }

    /// Answer the disposition prompt without asking
    pub fn with_disposition(mut self, disposition: Option<Disposition>) -> Self {
        self.preset = disposition;
        self
    }

    /// Whether new documents are opened in the default viewer
    pub fn with_open_documents(mut self, open: bool) -> Self {
        self.open_documents = open;
        self
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    fn read_answer(&self, question: &str) -> Option<String> {
        eprint!("{} ", question);
        let _ = io::stderr().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
        }
    }
}

impl Workbench for TerminalWorkbench {
    fn has_active_editor(&self) -> bool {
        self.document.is_some()
    }

    fn selected_text(&self) -> Option<String> {
        self.document
            .as_ref()
            .and_then(|d| d.selected_text())
            .map(str::to_string)
    }

    fn show_input_box(&mut self, prompt: &str, placeholder: &str) -> Option<String> {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            self.read_answer(&format!("{} ({})\n>", prompt, placeholder))
                .filter(|s| !s.is_empty())
        } else {
            let mut piped = String::new();
            stdin.lock().read_to_string(&mut piped).ok()?;
            Some(piped).filter(|s| !s.trim().is_empty())
        }
    }

    fn pick_disposition(&mut self, choices: &[DispositionChoice]) -> Option<Disposition> {
        if let Some(preset) = self.preset {
            return Some(preset);
        }
        if !io::stdin().is_terminal() {
            return None;
        }

        eprintln!("✨ What would you like to do with the enhanced prompt?");
        for (idx, choice) in choices.iter().enumerate() {
            eprintln!("  {}) {} - {}", idx + 1, choice.label, choice.description);
        }
        let answer = self.read_answer(">")?;
        let index = answer.trim().parse::<usize>().ok()?;
        choices
            .get(index.checked_sub(1)?)
            .map(|c| c.disposition)
    }

    fn replace_selection(&mut self, text: &str) -> Result<()> {
        self.document
            .as_mut()
            .ok_or_else(|| anyhow!("No active document"))?
            .replace_selection(text)
    }

    fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        self.document
            .as_mut()
            .ok_or_else(|| anyhow!("No active document"))?
            .insert_at_cursor(text)
    }

    fn open_document(&mut self, content: &str, language: &str) -> Result<()> {
        let extension = if language == "markdown" { "md" } else { "txt" };
        let path = std::env::temp_dir().join(format!(
            "enhanced-prompt-{}.{}",
            Uuid::new_v4(),
            extension
        ));
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!("{}", path.display());
        info!("Enhanced prompt written to {}", path.display());

        if self.open_documents {
            if let Err(e) = open::that(&path) {
                warn!("Could not open {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| anyhow!("Clipboard unavailable: {}", e))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| anyhow!("Failed to copy to clipboard: {}", e))
    }

    fn show_info(&mut self, message: &str) {
        eprintln!("{}", message);
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("❌ {}", message);
    }
}

/// Progress sink printing to stderr
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn report(&self, increment: u32, message: &str) {
        eprintln!("[{:>3}%] {}", increment, message);
    }
}

/// Cancel `cancel` when `interrupt` fires.
///
/// A command blocked in `read_line` never observes the token, so if the
/// handler is still alive `grace` later, `on_stuck` runs. Abort the handle
/// once the command returns.
pub fn spawn_interrupt_handler<S, F>(
    interrupt: S,
    cancel: CancellationToken,
    grace: Duration,
    on_stuck: F,
) -> JoinHandle<()>
where
    S: Future<Output = io::Result<()>> + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = interrupt.await {
            warn!("Failed to listen for interrupt: {}", e);
            return;
        }
        info!("Cancelling enhancement");
        cancel.cancel();

        tokio::time::sleep(grace).await;
        warn!("Interrupted while waiting for terminal input");
        on_stuck();
    })
}
