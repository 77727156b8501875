// ============================================================================
// Account Infrastructure - Markdown Email Templates
// File: crates/account-infrastructure/src/notifications/templates.rs
// ============================================================================
//! Markdown e-mail templates rendered through handlebars.
//!
//! A message is `header.md`, then `{kind}.md`, then `footer.md`. Variables
//! are substituted in strict mode so a missing one fails the render. The
//! markdown is converted to HTML and inline styles are applied, since most
//! mail clients drop `<style>` blocks.

use std::fs;
use std::path::Path;

use handlebars::{Handlebars, RenderError, RenderErrorReason};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser as MdParser};
use regex::{Captures, Regex};
use tracing::{debug, info};

use account_core::domain::{NotificationKind, TemplateFields};
use account_core::notifications::{TemplateError, TemplateRenderer};

const HEADER: &str = "header";
const FOOTER: &str = "footer";

const KINDS: [NotificationKind; 3] = [
    NotificationKind::Verification,
    NotificationKind::PasswordReset,
    NotificationKind::AccountLocked,
];

const BODY_STYLE: &str = "font-family: Arial, sans-serif; line-height: 1.6; color: #333333; max-width: 600px; margin: 0 auto; padding: 20px;";
const FOOTER_STYLE: &str = "margin-top: 30px; padding-top: 15px; border-top: 1px solid #eeeeee; font-size: 12px; color: #888888;";

static STYLED_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(h1|p|a|ul|li)([\s>])").expect("valid tag regex"));

fn tag_style(tag: &str) -> &'static str {
    match tag {
        "h1" => "color: #2c3e50; font-size: 24px; margin-bottom: 20px;",
        "p" => "margin: 0 0 15px 0;",
        "a" => "color: #3498db; text-decoration: underline;",
        "ul" => "margin: 0 0 15px 0; padding-left: 20px;",
        "li" => "margin-bottom: 5px;",
        _ => "",
    }
}

fn inline_styles(html: &str) -> String {
    STYLED_TAG
        .replace_all(html, |caps: &Captures| {
            format!("<{} style=\"{}\"{}", &caps[1], tag_style(&caps[1]), &caps[2])
        })
        .into_owned()
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = MdParser::new_ext(markdown, Options::empty());
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

fn render_error(e: RenderError) -> TemplateError {
    match e.reason() {
        RenderErrorReason::MissingVariable(name) => {
            TemplateError::MissingVariable(name.clone().unwrap_or_default())
        }
        RenderErrorReason::TemplateNotFound(name) => TemplateError::NotFound(name.clone()),
        _ => TemplateError::Render(e.to_string()),
    }
}

pub struct MarkdownTemplateProvider {
    registry: Handlebars<'static>,
}

impl MarkdownTemplateProvider {
    /// Registers `(name, markdown)` pairs; names are `header`, `footer` and
    /// notification kind names.
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        for (name, source) in templates {
            registry
                .register_template_string(name.as_ref(), source.as_ref())
                .map_err(|e| TemplateError::Render(e.to_string()))?;
        }
        Ok(Self { registry })
    }

    /// Loads every known template present in `dir`. Kinds without a file
    /// fail with `NotFound` when rendered.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let names = [HEADER, FOOTER]
            .into_iter()
            .chain(KINDS.into_iter().map(|k| k.as_str()));

        let mut templates = Vec::new();
        for name in names {
            let path = dir.join(format!("{}.md", name));
            if !path.is_file() {
                debug!("No template at {}", path.display());
                continue;
            }
            let source = fs::read_to_string(&path)
                .map_err(|e| TemplateError::Render(format!("{}: {}", path.display(), e)))?;
            templates.push((name, source));
        }

        info!("Loaded {} email templates from {}", templates.len(), dir.display());
        Self::from_templates(templates)
    }

    fn render_part(&self, name: &str, fields: &TemplateFields) -> Result<String, TemplateError> {
        self.registry.render(name, fields).map_err(render_error)
    }

    fn render_optional(&self, name: &str, fields: &TemplateFields) -> Result<String, TemplateError> {
        if self.registry.has_template(name) {
            self.render_part(name, fields)
        } else {
            Ok(String::new())
        }
    }
}

impl TemplateRenderer for MarkdownTemplateProvider {
    fn render(&self, kind: NotificationKind, fields: &TemplateFields) -> Result<String, TemplateError> {
        if !self.registry.has_template(kind.as_str()) {
            return Err(TemplateError::NotFound(kind.as_str().to_string()));
        }

        let header = self.render_optional(HEADER, fields)?;
        let body = self.render_part(kind.as_str(), fields)?;
        let footer = self.render_optional(FOOTER, fields)?;

        let content = markdown_to_html(&format!("{}\n\n{}", header, body));
        let mut html_output = format!("<body style=\"{}\">\n{}", BODY_STYLE, content);
        if !footer.is_empty() {
            html_output.push_str(&format!(
                "<footer style=\"{}\">\n{}</footer>\n",
                FOOTER_STYLE,
                markdown_to_html(&footer)
            ));
        }
        html_output.push_str("</body>\n");

        Ok(inline_styles(&html_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> TemplateFields {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn provider() -> MarkdownTemplateProvider {
        MarkdownTemplateProvider::from_templates([
            ("header", "# Hello {{name}}"),
            (
                "email_verification",
                "Please confirm your address.\n\n[Verify your account]({{verification_url}})",
            ),
            ("account_locked", "- Your account was locked\n- Contact support"),
            ("footer", "Sent to {{email}}"),
        ])
        .unwrap()
    }

    #[test]
    fn test_renders_header_body_footer() {
        let html = provider()
            .render(
                NotificationKind::Verification,
                &fields([
                    ("name", "John"),
                    ("email", "john.doe@example.com"),
                    ("verification_url", "http://localhost:8000/verify-email/1/abc"),
                ]),
            )
            .unwrap();

        assert!(html.starts_with("<body style=\""));
        assert!(html.contains("<h1 style=\""));
        assert!(html.contains(">Hello John</h1>"));
        assert!(html.contains("href=\"http://localhost:8000/verify-email/1/abc\""));
        assert!(html.contains("<a style=\""));
        assert!(html.contains("<footer style=\""));
        assert!(html.contains("Sent to john.doe@example.com"));
        assert!(html.find("Hello John") < html.find("Please confirm"));
    }

    #[test]
    fn test_lists_are_styled() {
        let html = provider()
            .render(
                NotificationKind::AccountLocked,
                &fields([("name", "John"), ("email", "john.doe@example.com")]),
            )
            .unwrap();
        assert!(html.contains("<ul style=\""));
        assert!(html.contains("<li style=\""));
    }

    #[test]
    fn test_missing_variable_fails() {
        let result = provider().render(
            NotificationKind::Verification,
            &fields([("name", "John"), ("email", "john.doe@example.com")]),
        );
        assert!(matches!(result, Err(TemplateError::MissingVariable(_))));
    }

    #[test]
    fn test_missing_template_fails() {
        let result = provider().render(
            NotificationKind::PasswordReset,
            &fields([("name", "John"), ("email", "john.doe@example.com")]),
        );
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_from_missing_dir_loads_nothing() {
        let provider = MarkdownTemplateProvider::from_dir("/nonexistent/templates").unwrap();
        let result = provider.render(NotificationKind::Verification, &TemplateFields::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_shipped_templates_render() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../email_templates");
        let provider = MarkdownTemplateProvider::from_dir(dir).unwrap();
        let vars = fields([
            ("name", "John"),
            ("nickname", "johndoe"),
            ("email", "john.doe@example.com"),
            ("verification_url", "http://localhost:8000/verify-email/1/abc"),
        ]);

        for kind in KINDS {
            let html = provider.render(kind, &vars).unwrap();
            assert!(html.contains("Hello John"), "{}", kind.as_str());
            assert!(html.contains("<footer style=\""), "{}", kind.as_str());
        }
    }
}
