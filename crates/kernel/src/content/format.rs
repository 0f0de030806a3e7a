//! Text formats used when rendering user content.
//!
//! - rich text (post bodies): sanitised HTML via ammonia
//! - plain text (comments): escaped, with newlines turned into `<br>`

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Sanitise rich-text HTML, keeping safe formatting tags.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Render plain text as HTML.
pub fn plain_text(input: &str) -> String {
    html_escape(input).replace('\n', "<br>\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_script() {
        let html = sanitize_html("<p>Hi</p><script>alert(1)</script>");
        assert_eq!(html, "<p>Hi</p>");
    }

    #[test]
    fn sanitize_strips_event_handlers() {
        let html = sanitize_html(r#"<a href="/x" onclick="evil()">x</a>"#);
        assert!(!html.contains("onclick"));
        assert!(html.contains("href=\"/x\""));
    }

    #[test]
    fn html_escape_special_chars() {
        assert_eq!(
            html_escape("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("hello world"), "hello world");
    }

    #[test]
    fn plain_text_escapes_and_breaks_lines() {
        assert_eq!(plain_text("a <b>\nc"), "a &lt;b&gt;<br>\nc");
    }
}
