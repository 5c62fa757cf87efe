use pulldown_cmark::{Options, Parser};

use crate::message::Role;

/// Shown in place of an assistant message that carried no text.
pub const EMPTY_ASSISTANT_PLACEHOLDER: &str = "No message received.";

/// Render one transcript entry to the HTML fragment placed inside its node.
pub fn render_entry(role: Role, text: &str) -> String {
    match role {
        Role::User => escape_html(text),
        Role::Assistant if text.is_empty() => escape_html(EMPTY_ASSISTANT_PLACEHOLDER),
        Role::Assistant => markdown_to_sanitized_html(text),
    }
}

/// Markdown to HTML, then through the sanitizer.
///
/// Markdown passes raw inline HTML straight through, so the sanitizer pass
/// is what removes `<script>`, `on*` handlers and `javascript:` URLs.
pub fn markdown_to_sanitized_html(md: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(md, opts);
    let mut html = String::with_capacity(md.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    ammonia::clean(&html)
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
