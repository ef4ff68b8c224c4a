//! Interactive commands: "enhance prompt" and "enhance selection"

use serde_json::Value;
use tracing::{error, info, warn};

use super::store::KeyValueStore;
use super::workbench::{disposition_choices, Disposition, Workbench};
use crate::config::{Backend, EnhancerConfig};
use crate::enhancer::{OperationContext, PromptEnhancer};
use crate::error::EnhanceError;

/// Store key remembering that the welcome message was shown
pub const WELCOME_KEY: &str = "hasShownWelcome";

pub const WELCOME_MESSAGE: &str =
    "✨ Prompt Enhancer installed! Set your OpenAI API key in settings to get started.";

pub const MISSING_KEY_MESSAGE: &str =
    "OpenAI API key not configured. Please add your API key in settings.";

pub const SELECT_FIRST_MESSAGE: &str = "Please select some text to enhance first!";

const INPUT_PROMPT: &str = "✨ Enter the prompt you want to enhance";
const INPUT_PLACEHOLDER: &str = "e.g., make a todo app, create a login form...";

/// How an interactive command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The enhanced prompt was delivered as chosen
    Applied(Disposition),
    /// Enhancement succeeded but the user dismissed the choice
    Dismissed,
    /// No text to enhance (input dismissed or no selection)
    NoInput,
    /// Direct mode without a credential; nothing was sent
    NotConfigured,
    /// The caller cancelled; nothing was changed and nothing reported
    Cancelled,
    /// The enhancement failed and the error was reported
    Failed(EnhanceError),
    /// The chosen disposition could not be carried out
    ApplyFailed(String),
}

/// Interactive front-end around one [`PromptEnhancer`]
pub struct InteractiveEnhancer {
    config: EnhancerConfig,
    enhancer: PromptEnhancer,
}

impl InteractiveEnhancer {
    pub fn new(config: EnhancerConfig) -> anyhow::Result<Self> {
        let enhancer = PromptEnhancer::new(&config)?;
        Ok(Self { config, enhancer })
    }

    pub fn with_enhancer(config: EnhancerConfig, enhancer: PromptEnhancer) -> Self {
        Self { config, enhancer }
    }

    /// Show the welcome message the first time the front-end starts
    pub fn activate(&self, store: &mut dyn KeyValueStore, workbench: &mut dyn Workbench) {
        info!("Prompt Enhancer is now active ({} backend)", self.config.backend);

        if store.get_bool(WELCOME_KEY, false) {
            return;
        }
        workbench.show_info(WELCOME_MESSAGE);
        if let Err(e) = store.set(WELCOME_KEY, Value::Bool(true)) {
            warn!("Failed to remember welcome message: {}", e);
        }
    }

    /// Enhance the current selection, or text asked from the user when there
    /// is no selection
    pub async fn enhance_prompt(
        &self,
        workbench: &mut dyn Workbench,
        ctx: &OperationContext<'_>,
    ) -> CommandOutcome {
        let (text, has_selection) = match workbench
            .selected_text()
            .filter(|t| !t.trim().is_empty())
        {
            Some(text) => (text, true),
            None => match workbench.show_input_box(INPUT_PROMPT, INPUT_PLACEHOLDER) {
                Some(text) if !text.is_empty() => (text, false),
                _ => return CommandOutcome::NoInput,
            },
        };
        if ctx.is_cancelled() {
            return CommandOutcome::Cancelled;
        }

        self.perform_enhancement(workbench, &text, has_selection, ctx)
            .await
    }

    /// Enhance the current selection; requires a non-empty selection
    pub async fn enhance_selection(
        &self,
        workbench: &mut dyn Workbench,
        ctx: &OperationContext<'_>,
    ) -> CommandOutcome {
        let text = match workbench.selected_text() {
            Some(text) if workbench.has_active_editor() && !text.is_empty() => text,
            _ => {
                workbench.show_info(SELECT_FIRST_MESSAGE);
                return CommandOutcome::NoInput;
            }
        };

        self.perform_enhancement(workbench, &text, true, ctx).await
    }

    /// Enhance text supplied by the caller rather than the editor
    pub async fn enhance_text(
        &self,
        workbench: &mut dyn Workbench,
        text: &str,
        ctx: &OperationContext<'_>,
    ) -> CommandOutcome {
        if text.is_empty() {
            return CommandOutcome::NoInput;
        }
        self.perform_enhancement(workbench, text, false, ctx).await
    }

    async fn perform_enhancement(
        &self,
        workbench: &mut dyn Workbench,
        text: &str,
        has_selection: bool,
        ctx: &OperationContext<'_>,
    ) -> CommandOutcome {
        if self.config.backend == Backend::Direct && !self.config.has_api_key() {
            workbench.show_error(MISSING_KEY_MESSAGE);
            return CommandOutcome::NotConfigured;
        }

        ctx.report(20, "Calling OpenAI API...");

        let enhanced = match self.enhancer.enhance(text, ctx).await {
            Ok(enhanced) => enhanced,
            Err(EnhanceError::Cancelled) => return CommandOutcome::Cancelled,
            Err(e) => {
                error!("Enhancement error: {}", e);
                workbench.show_error(&format!("Enhancement failed: {}", failure_message(&e)));
                return CommandOutcome::Failed(e);
            }
        };

        ctx.report(90, "Enhancement complete!");

        let choices = disposition_choices(has_selection);
        let disposition = match workbench.pick_disposition(&choices) {
            Some(d) => d,
            None => return CommandOutcome::Dismissed,
        };

        // Last point before the document is touched
        if ctx.is_cancelled() {
            return CommandOutcome::Cancelled;
        }

        match apply_disposition(workbench, disposition, &enhanced, has_selection) {
            Ok(message) => {
                workbench.show_info(message);
                CommandOutcome::Applied(disposition)
            }
            Err(e) => {
                error!("Failed to apply enhanced prompt: {}", e);
                workbench.show_error(&format!("Enhancement failed: {}", e));
                CommandOutcome::ApplyFailed(e.to_string())
            }
        }
    }
}

/// Error text for the editor, pointing at settings where the user can act
pub fn failure_message(e: &EnhanceError) -> String {
    match e {
        EnhanceError::Auth => {
            "Invalid OpenAI API key. Please check your API key in settings.".to_string()
        }
        other => other.to_string(),
    }
}

fn apply_disposition(
    workbench: &mut dyn Workbench,
    disposition: Disposition,
    enhanced: &str,
    has_selection: bool,
) -> anyhow::Result<&'static str> {
    match disposition {
        Disposition::Replace if has_selection && workbench.has_active_editor() => {
            workbench.replace_selection(enhanced)?;
            Ok("✨ Prompt enhanced and replaced!")
        }
        Disposition::Replace if workbench.has_active_editor() => {
            workbench.insert_at_cursor(enhanced)?;
            Ok("✨ Enhanced prompt inserted!")
        }
        // Nowhere to insert: fall back to a fresh document
        Disposition::Replace | Disposition::NewDocument => {
            workbench.open_document(enhanced, "markdown")?;
            Ok("✨ Enhanced prompt opened in new document!")
        }
        Disposition::Clipboard => {
            workbench.write_clipboard(enhanced)?;
            Ok("✨ Enhanced prompt copied to clipboard!")
        }
    }
}
