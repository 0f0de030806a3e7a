//! Theme engine with Tera templates.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tera::Tera;
use tracing::debug;

use crate::content::format;

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Create a new theme engine loading every template under `template_dir`.
    ///
    /// `.html` files are autoescaped; `.txt` files (email bodies) are not.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Self::register_filters(&mut tera);

        let count = tera.get_template_names().count();
        debug!(count, dir = %template_dir.display(), "loaded templates");

        Ok(Self { tera })
    }

    /// Create a theme engine with no templates (for testing).
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        Self::register_filters(&mut tera);
        Self { tera }
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // Rich text: strip anything unsafe, templates then mark it |safe
        tera.register_filter(
            "sanitize",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let text = tera::try_get_value!("sanitize", "value", String, value);
                Ok(tera::Value::String(format::sanitize_html(&text)))
            },
        );

        tera.register_filter(
            "linebreaks",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let text = tera::try_get_value!("linebreaks", "value", String, value);
                Ok(tera::Value::String(format::plain_text(&text)))
            },
        );

        // Timestamps arrive as RFC 3339 strings from chrono's serde impl
        tera.register_filter(
            "format_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let Some(raw) = value.as_str() else {
                    return Ok(tera::Value::String(String::new()));
                };
                let formatted = chrono::DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.format("%B %-d, %Y").to_string())
                    .unwrap_or_else(|_| "Unknown date".to_string());
                Ok(tera::Value::String(formatted))
            },
        );
    }

    /// Get a mutable reference to Tera (for adding templates at runtime).
    pub fn tera_mut(&mut self) -> &mut Tera {
        &mut self.tera
    }

    /// Render a template by name.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String> {
        self.tera
            .render(template, context)
            .with_context(|| format!("failed to render template {template}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn engine_with(name: &str, source: &str) -> ThemeEngine {
        let mut engine = ThemeEngine::empty();
        engine.tera_mut().add_raw_template(name, source).unwrap();
        engine
    }

    #[test]
    fn format_date_filter() {
        let engine = engine_with("d.html", "{{ when | format_date }}");
        let mut ctx = tera::Context::new();
        ctx.insert("when", "2024-03-05T10:00:00Z");
        assert_eq!(engine.render("d.html", &ctx).unwrap(), "March 5, 2024");
    }

    #[test]
    fn sanitize_filter() {
        let engine = engine_with("s.html", "{{ body | sanitize | safe }}");
        let mut ctx = tera::Context::new();
        ctx.insert("body", "<b>bold</b><script>x()</script>");
        assert_eq!(engine.render("s.html", &ctx).unwrap(), "<b>bold</b>");
    }

    #[test]
    fn linebreaks_filter_escapes() {
        let engine = engine_with("l.html", "{{ body | linebreaks | safe }}");
        let mut ctx = tera::Context::new();
        ctx.insert("body", "<i>\nx");
        assert_eq!(engine.render("l.html", &ctx).unwrap(), "&lt;i&gt;<br>\nx");
    }

    #[test]
    fn missing_template_is_an_error() {
        let engine = ThemeEngine::empty();
        assert!(engine.render("nope.html", &tera::Context::new()).is_err());
    }
}
