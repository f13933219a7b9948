//! Unlock overlay markup
//!
//! The overlay is a blocking modal with no close button, no backdrop click
//! handler and no escape handler. Its only exit is the completion message
//! posted by the embedded unlock document.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::locker::LockerSettings;

/// `type` of the message the unlock document posts to its parent on completion
pub const COMPLETION_MESSAGE: &str = "marquee:locker-complete";

/// Sandbox for the unlock document: scripts, forms and popups are needed by
/// third-party offer flows. No same-origin, so it can't reach the host page.
pub const UNLOCK_SANDBOX: &str =
    "allow-scripts allow-forms allow-popups allow-popups-to-escape-sandbox";

const BLANK_DOCUMENT: &str = "<!doctype html><html><head><meta charset=\"utf-8\"></head><body></body></html>";

/// Script injected into the unlock document. `call_locker()` is kept for
/// operator pages written against the global-function convention.
fn completion_bridge() -> String {
    format!(
        "<script>(function(){{\
         function done(){{window.parent.postMessage({{type:\"{msg}\"}},\"*\");}}\
         window.call_locker=done;\
         }})();</script>",
        msg = COMPLETION_MESSAGE
    )
}

/// Escape text for use inside HTML text or a double-quoted attribute
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Operator document with the completion bridge injected before `</body>`,
/// or appended when there is no body close tag. Blank input gives a blank
/// document.
pub fn unlock_document(unlock_html: &str) -> String {
    let bridge = completion_bridge();

    if unlock_html.trim().is_empty() {
        return BLANK_DOCUMENT.replace("</body>", &format!("{}</body>", bridge));
    }

    // ASCII lowercasing keeps byte offsets aligned with the original
    let lowered = unlock_html.to_ascii_lowercase();
    match lowered.rfind("</body>") {
        Some(idx) => {
            let mut doc = String::with_capacity(unlock_html.len() + bridge.len());
            doc.push_str(&unlock_html[..idx]);
            doc.push_str(&bridge);
            doc.push_str(&unlock_html[idx..]);
            doc
        }
        None => format!("{}{}", unlock_html, bridge),
    }
}

/// `data:` URI carrying the unlock document
pub fn unlock_data_uri(unlock_html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        BASE64.encode(unlock_document(unlock_html))
    )
}

/// Overlay markup. Rendered hidden; the player script reveals it when the
/// trigger fires.
pub fn render_overlay(settings: &LockerSettings) -> String {
    format!(
        r#"<div id="locker-overlay" class="locker-overlay" role="dialog" aria-modal="true" aria-label="Unlock to continue" data-complete-message="{msg}" hidden style="position:fixed;inset:0;z-index:9999;display:flex;align-items:center;justify-content:center;background:rgba(0,0,0,{opacity});">
  <iframe class="locker-frame" title="Unlock" sandbox="{sandbox}" src="{src}" width="{width}" height="{height}" style="border:0;max-width:100%;max-height:100%;background:#fff;"></iframe>
</div>"#,
        msg = COMPLETION_MESSAGE,
        opacity = settings.backdrop_opacity,
        sandbox = UNLOCK_SANDBOX,
        src = escape_html(&unlock_data_uri(&settings.unlock_html)),
        width = settings.width_px,
        height = settings.height_px,
    )
}
