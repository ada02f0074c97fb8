//! JavaScript snippets evaluated in the bracket page.
//!
//! Every frame-scoped script resolves its frame by walking `window.frames`
//! along the frame path and then applies a `(doc) => value` function to that
//! frame's document. Results travel back as a JSON string so nested values
//! survive the round trip regardless of how the protocol serializes objects.

use crate::core::FramePath;
use crate::errors::{Result, ScrapeError};
use serde::Deserialize;
use serde_json::Value;

const FRAME_ENVELOPE: &str = r#"
(function() {
    let win = window;
    for (const index of __PATH__) {
        win = win.frames[index];
        if (!win) {
            return JSON.stringify({ ok: false, inaccessible: true, error: 'frame detached' });
        }
    }

    let doc = null;
    try {
        doc = win.document;
    } catch (e) {
        return JSON.stringify({ ok: false, inaccessible: true, error: String(e) });
    }
    if (!doc) {
        return JSON.stringify({ ok: false, inaccessible: true, error: 'frame has no document' });
    }

    try {
        const value = (__BODY__)(doc);
        return JSON.stringify({ ok: true, value: value === undefined ? null : value });
    } catch (e) {
        return JSON.stringify({ ok: false, inaccessible: false, error: String((e && e.message) || e) });
    }
})()
"#;

/// Depth-first listing of the frame tree, main frame first.
pub const FRAME_TREE: &str = r#"
(function() {
    const frames = [];
    const walk = (win, path) => {
        let url = null;
        try {
            url = win.location.href;
        } catch (e) {}
        frames.push({ path: path, url: url });

        let count = 0;
        try {
            count = win.frames.length;
        } catch (e) {}
        for (let i = 0; i < count; i++) {
            walk(win.frames[i], path.concat([i]));
        }
    };
    walk(window, []);
    return JSON.stringify(frames);
})()
"#;

#[derive(Debug, Deserialize)]
struct FrameReply {
    ok: bool,
    #[serde(default)]
    inaccessible: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Wraps a `(doc) => value` function so it runs in the frame at `path`.
pub fn in_frame(path: &FramePath, function: &str) -> String {
    let path_literal = Value::from(path.clone()).to_string();
    FRAME_ENVELOPE
        .replace("__PATH__", &path_literal)
        .replace("__BODY__", function)
}

/// Unpacks the JSON string produced by [`in_frame`].
pub fn parse_frame_reply(path: &FramePath, raw: Option<Value>) -> Result<Value> {
    let raw = raw
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or_else(|| ScrapeError::JavaScriptFailed("frame script returned no value".to_string()))?;

    let reply: FrameReply = serde_json::from_str(raw)?;
    if reply.ok {
        return Ok(reply.value);
    }

    let error = reply.error.unwrap_or_else(|| "unknown error".to_string());
    if reply.inaccessible {
        Err(ScrapeError::FrameInaccessible(format!("frame {:?}: {}", path, error)))
    } else {
        Err(ScrapeError::JavaScriptFailed(format!("frame {:?}: {}", path, error)))
    }
}

fn js_string(text: &str) -> String {
    Value::from(text).to_string()
}

pub fn has_element(selector: &str) -> String {
    format!("(doc) => doc.querySelector({}) !== null", js_string(selector))
}

pub fn select_options(selector: &str) -> String {
    format!(
        r#"(doc) => {{
            const control = doc.querySelector({sel});
            if (!control) {{
                throw new Error('control not found: ' + {sel});
            }}
            return Array.from(control.querySelectorAll('option')).map((opt) => ({{
                value: opt.value,
                label: opt.label || (opt.textContent || '').trim(),
            }}));
        }}"#,
        sel = js_string(selector)
    )
}

pub fn select_option(selector: &str, value: &str) -> String {
    format!(
        r#"(doc) => {{
            const control = doc.querySelector({sel});
            if (!control) {{
                throw new Error('control not found: ' + {sel});
            }}
            const wanted = {val};
            const option = Array.from(control.querySelectorAll('option')).find((opt) => opt.value === wanted);
            if (!option) {{
                throw new Error('no option with value ' + wanted);
            }}
            control.value = wanted;
            control.dispatchEvent(new Event('input', {{ bubbles: true }}));
            control.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return control.value;
        }}"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

pub fn element_texts(selector: &str) -> String {
    format!(
        "(doc) => Array.from(doc.querySelectorAll({})).map((el) => ((el.innerText || el.textContent || '') + '').trim())",
        js_string(selector)
    )
}
