//! Upstream exchange log
//!
//! With `PROMPT_ENHANCER_HTTP_LOG` set to a truthy value (`1`, `true`, `yes`,
//! `on`), every call to the completion API or the enhancement service is
//! appended to `.prompt-enhancer/http_requests.log`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Local};
use tracing::warn;

pub const ENV_HTTP_LOG: &str = "PROMPT_ENHANCER_HTTP_LOG";

const LOG_PATH: &str = ".prompt-enhancer/http_requests.log";

/// Bodies longer than this many bytes are cut in the log
const MAX_LOGGED_BODY: usize = 10_000;

static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Read once per process
pub fn is_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(ENV_HTTP_LOG)
            .map(|v| is_truthy(&v))
            .unwrap_or(false)
    })
}

pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// How an upstream call ended
pub enum Outcome<'a> {
    Response { status: u16, body: &'a str },
    Failed(&'a str),
}

/// One upstream POST
pub struct Exchange<'a> {
    pub url: &'a str,
    /// Bearer credential sent with the call; empty when none was sent
    pub credential: &'a str,
    pub request_body: &'a str,
    pub outcome: Outcome<'a>,
    pub duration_ms: u64,
}

impl Exchange<'_> {
    /// Log block for this exchange; the credential is masked
    pub fn render(&self, at: DateTime<Local>) -> String {
        let rule = "=".repeat(80);
        let mut out = format!(
            "\n{}\n[{}] POST {} ({}ms)\n{}\n",
            rule,
            at.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.url,
            self.duration_ms,
            rule
        );

        if !self.credential.is_empty() {
            out.push_str(&format!(
                "Authorization: Bearer {}\n",
                mask_token(self.credential)
            ));
        }
        out.push_str("\n--- Request ---\n");
        out.push_str(&format_body(self.request_body));

        match &self.outcome {
            Outcome::Response { status, body } => {
                out.push_str(&format!("\n--- Response {} ---\n", status));
                out.push_str(&format_body(body));
            }
            Outcome::Failed(error) => {
                out.push_str("\n--- Error ---\n");
                out.push_str(error);
            }
        }
        out.push('\n');
        out
    }
}

/// Append the exchange to the log file when logging is enabled
pub fn record(exchange: &Exchange<'_>) {
    if !is_enabled() {
        return;
    }
    if let Err(e) = append(Path::new(LOG_PATH), &exchange.render(Local::now())) {
        warn!("Failed to write HTTP log {}: {}", LOG_PATH, e);
    }
}

fn append(path: &Path, content: &str) -> io::Result<()> {
    // Concurrent service requests must not interleave their blocks
    let _guard = WRITE_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?
        .write_all(content.as_bytes())
}

/// Keep four characters at each end of a long credential
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn format_body(body: &str) -> String {
    let pretty = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok());
    truncate_utf8_safe(pretty.as_deref().unwrap_or(body), MAX_LOGGED_BODY)
}

/// Cut `s` to at most `max_len` bytes on a character boundary
pub fn truncate_utf8_safe(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .map(|(idx, _)| idx)
        .take_while(|&idx| idx <= max_len)
        .last()
        .unwrap_or(0);
    format!("{}... [{} bytes total]", &s[..end], s.len())
}
