//! Tests for http_logger module

use chrono::Local;
use prompt_enhancer::http_logger::{is_truthy, mask_token, truncate_utf8_safe, Exchange, Outcome};

#[test]
fn test_truncate_utf8_safe_ascii() {
    let s = "Enhance this prompt";
    assert_eq!(truncate_utf8_safe(s, 100), s);
    assert_eq!(truncate_utf8_safe(s, 7), "Enhance... [19 bytes total]");
}

#[test]
fn test_truncate_utf8_safe_multibyte() {
    // 3 bytes per CJK char; a cut at 10 lands inside the fourth char
    let truncated = truncate_utf8_safe("提示增强Hello", 10);
    assert_eq!(truncated, "提示增... [17 bytes total]");
}

#[test]
fn test_mask_token() {
    assert_eq!(mask_token("sk-abcdefghijklmnop"), "sk-a...mnop");
    assert_eq!(mask_token("short"), "****");
    assert_eq!(mask_token("密钥密钥密钥密钥密钥"), "密钥密钥...密钥密钥");
}

#[test]
fn test_is_truthy() {
    for value in ["1", "true", "TRUE", " yes ", "on"] {
        assert!(is_truthy(value), "{value}");
    }
    for value in ["", "0", "false", "off", "enabled"] {
        assert!(!is_truthy(value), "{value}");
    }
}

#[test]
fn test_render_pretty_prints_json_bodies() {
    let exchange = Exchange {
        url: "http://localhost:3000/api/enhance",
        credential: "",
        request_body: r#"{"prompt":"make a todo app"}"#,
        outcome: Outcome::Response {
            status: 500,
            body: r#"{"success":false,"error":"Invalid OpenAI API key","code":"auth_error"}"#,
        },
        duration_ms: 12,
    };

    let rendered = exchange.render(Local::now());
    assert!(rendered.contains("POST http://localhost:3000/api/enhance (12ms)"));
    assert!(rendered.contains("\"prompt\": \"make a todo app\""));
    assert!(rendered.contains("--- Response 500 ---"));
    assert!(rendered.contains("\"code\": \"auth_error\""));
}

#[test]
fn test_render_keeps_non_json_bodies() {
    let exchange = Exchange {
        url: "https://api.openai.com/v1/chat/completions",
        credential: "sk-abcdefghijklmnop",
        request_body: "{}",
        outcome: Outcome::Response {
            status: 502,
            body: "<html>Bad Gateway</html>",
        },
        duration_ms: 3,
    };

    let rendered = exchange.render(Local::now());
    assert!(rendered.contains("<html>Bad Gateway</html>"));
    assert!(rendered.contains("Bearer sk-a...mnop"));
}
