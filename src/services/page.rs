// Widget page: an HTML projection of one session's transcript.
//
// The page works without script: the form posts to the session's message
// endpoint, which redirects back here with `#latest` so the newest entry
// scrolls into view. While a reply is outstanding the page refreshes itself
// until it arrives.

use crate::message::RenderedEntry;
use crate::services::render::escape_html;

pub const PAGE_TITLE: &str = "Agent Planner";
const REFRESH_SECS: u32 = 2;

/// Build the complete HTML page for one widget session.
pub fn build_widget_html(session_id: &str, entries: &[RenderedEntry], awaiting_reply: bool) -> String {
    let session_id = escape_html(session_id);
    let messages = render_messages(entries);
    let refresh = if awaiting_reply {
        format!("<meta http-equiv=\"refresh\" content=\"{REFRESH_SECS}; url=/widget/{session_id}#latest\">\n")
    } else {
        String::new()
    };
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
{refresh}<title>{title}</title>
<link rel="stylesheet" href="/widget.css">
</head>
<body>
<div class="chat-container">
  <div id="chat-box" class="chat-box">
{messages}  </div>
  <form id="chat-form" class="chat-form" method="post" action="/widget/{session_id}/messages">
    <input id="user-input" name="message" type="text" placeholder="Type your message..." autocomplete="off" autofocus>
    <button type="submit">Send</button>
  </form>
</div>
</body>
</html>
"##,
        title = PAGE_TITLE,
    )
}

fn render_messages(entries: &[RenderedEntry]) -> String {
    let last = entries.len().saturating_sub(1);
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let anchor = if i == last { " id=\"latest\"" } else { "" };
        out.push_str(&format!(
            "    <div class=\"message {}\"{anchor}>{}</div>\n",
            entry.role.as_str(),
            entry.html
        ));
    }
    out
}
