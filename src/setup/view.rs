//! 设置页面渲染
//!
//! 纯函数：输入页面状态，输出 HTML，不包含业务逻辑

/// 页面状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupView {
    /// 等待输入新凭据
    AwaitingInput {
        error: Option<String>,
        prefill_username: String,
    },
    /// 设置已完成
    Completed,
}

impl SetupView {
    pub fn form(prefill_username: impl Into<String>) -> Self {
        SetupView::AwaitingInput {
            error: None,
            prefill_username: prefill_username.into(),
        }
    }

    pub fn form_with_error(error: impl Into<String>, prefill_username: impl Into<String>) -> Self {
        SetupView::AwaitingInput {
            error: Some(error.into()),
            prefill_username: prefill_username.into(),
        }
    }
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Keycloak Initial Security Setup</title>
    <style>
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; background-color: #f4f6f8; margin: 0; }
        .card { background: white; padding: 40px; border-radius: 12px; box-shadow: 0 4px 20px rgba(0,0,0,0.08); width: 100%; max-width: 400px; }
        h2 { text-align: center; color: #1a1a1a; margin-bottom: 24px; }
        .form-group { margin-bottom: 20px; }
        label { display: block; margin-bottom: 8px; color: #4a5568; font-weight: 500; }
        input { width: 100%; padding: 12px; border: 1px solid #e2e8f0; border-radius: 6px; box-sizing: border-box; }
        input:focus { border-color: #3182ce; outline: none; }
        button { width: 100%; padding: 14px; background-color: #3182ce; color: white; border: none; border-radius: 6px; cursor: pointer; font-size: 16px; font-weight: 600; }
        button:hover { background-color: #2b6cb0; }
        .note { font-size: 13px; color: #718096; margin-top: 16px; text-align: center; }
        .success { color: #2f855a; text-align: center; padding: 20px; }
        .error { color: #c53030; background: #fff5f5; padding: 10px; border-radius: 6px; margin-bottom: 20px; font-size: 14px; }
    </style>
</head>
<body>
    <div class="card">
{{content}}
    </div>
</body>
</html>
"#;

const FORM_TEMPLATE: &str = r#"        <h2>Set Administrator Password</h2>
{{error}}        <form method="POST">
            <div class="form-group">
                <label for="username">New Username</label>
                <input type="text" id="username" name="username" required placeholder="e.g. admin" value="{{username}}">
            </div>
            <div class="form-group">
                <label for="password">New Password</label>
                <input type="password" id="password" name="password" required placeholder="Enter a strong password">
            </div>
            <button type="submit">Change and Apply</button>
        </form>
        <p class="note">The factory default administrator login was detected,<br>so this setup page was opened automatically.</p>
"#;

const ERROR_TEMPLATE: &str = r#"        <div class="error">{{message}}</div>
"#;

const COMPLETED_CONTENT: &str = r#"        <div class="success">
            <svg width="64" height="64" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">
                <path d="M22 11.08V12a10 10 0 1 1-5.93-9.14"></path>
                <polyline points="22 4 12 14.01 9 11.01"></polyline>
            </svg>
            <h3>Done!</h3>
            <p>The administrator credentials were changed.</p>
            <p>You can close this window now.</p>
        </div>
"#;

/// 渲染页面
pub fn render(view: &SetupView) -> String {
    let content = match view {
        SetupView::AwaitingInput {
            error,
            prefill_username,
        } => {
            let banner = match error {
                Some(message) => ERROR_TEMPLATE.replace("{{message}}", &escape_html(message)),
                None => String::new(),
            };
            FORM_TEMPLATE
                .replace("{{error}}", &banner)
                .replace("{{username}}", &escape_html(prefill_username))
        }
        SetupView::Completed => COMPLETED_CONTENT.to_string(),
    };

    PAGE_TEMPLATE.replace("{{content}}", &content)
}

/// HTML 文本和属性值转义
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
