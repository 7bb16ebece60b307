//! Reminder templates rendered with Handlebars.
//!
//! Subjects and plain-text bodies are rendered without HTML escaping; HTML
//! bodies escape every `{{value}}`. Rendering runs in strict mode, so a
//! template that references a missing variable fails instead of printing
//! an empty string.

use handlebars::Handlebars;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{NotificationError, NotificationResult};

/// Rendered template result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Email template definition
#[derive(Clone, Debug)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Handlebars-based template engine
pub struct TemplateEngine {
    plain: Handlebars<'static>,
    html: Handlebars<'static>,
    templates: HashMap<String, EmailTemplate>,
}

impl TemplateEngine {
    /// Engine with the `due_soon` and `overdue` templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut plain = Handlebars::new();
        plain.register_escape_fn(handlebars::no_escape);
        plain.set_strict_mode(true);

        let mut html = Handlebars::new();
        html.set_strict_mode(true);

        let mut engine = Self {
            plain,
            html,
            templates: HashMap::new(),
        };
        engine.register_defaults()?;
        Ok(engine)
    }

    /// Register a template, replacing any with the same name.
    pub fn register(&mut self, template: EmailTemplate) -> NotificationResult<()> {
        let compile = |e: handlebars::TemplateError| {
            NotificationError::Template(format!("{}: {}", template.name, e))
        };

        self.plain
            .register_template_string(&format!("{}_subject", template.name), &template.subject)
            .map_err(compile)?;
        if let Some(text) = &template.body_text {
            self.plain
                .register_template_string(&format!("{}_text", template.name), text)
                .map_err(compile)?;
        }
        if let Some(body) = &template.body_html {
            self.html
                .register_template_string(&format!("{}_html", template.name), body)
                .map_err(compile)?;
        }

        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn render(&self, name: &str, data: &Value) -> NotificationResult<RenderedTemplate> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| NotificationError::Template(format!("template not found: {name}")))?;

        let subject = self.plain.render(&format!("{name}_subject"), data)?;
        let body_text = match template.body_text {
            Some(_) => Some(self.plain.render(&format!("{name}_text"), data)?),
            None => None,
        };
        let body_html = match template.body_html {
            Some(_) => Some(self.html.render(&format!("{name}_html"), data)?),
            None => None,
        };

        Ok(RenderedTemplate {
            subject,
            body_text,
            body_html,
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn register_defaults(&mut self) -> NotificationResult<()> {
        self.register(EmailTemplate {
            name: "due_soon".to_string(),
            subject: "Reminder: \"{{title}}\" is due {{due_date}}".to_string(),
            body_text: Some(
                r#"Hello {{name}},

Your todo "{{title}}" is due on {{due_date}}.

{{#if todo_url}}Open it: {{todo_url}}
{{/if}}
You are receiving this because reminders are enabled for your todos."#
                    .to_string(),
            ),
            body_html: Some(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #2563eb;">Coming up</h1>
    <p>Hello {{name}},</p>
    <p>Your todo <strong>{{title}}</strong> is due on {{due_date}}.</p>
    {{#if todo_url}}<p><a href="{{todo_url}}">Open it</a></p>{{/if}}
</body>
</html>"#
                    .to_string(),
            ),
        })?;

        self.register(EmailTemplate {
            name: "overdue".to_string(),
            subject: "Overdue: \"{{title}}\"".to_string(),
            body_text: Some(
                r#"Hello {{name}},

Your todo "{{title}}" was due on {{due_date}} and is still open.

{{#if todo_url}}Open it: {{todo_url}}
{{/if}}
Complete or reschedule it to stop these notices."#
                    .to_string(),
            ),
            body_html: Some(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #dc2626;">Overdue</h1>
    <p>Hello {{name}},</p>
    <p>Your todo <strong>{{title}}</strong> was due on {{due_date}} and is still open.</p>
    {{#if todo_url}}<p><a href="{{todo_url}}">Open it</a></p>{{/if}}
    <p style="color: #666; font-size: 14px;">Complete or reschedule it to stop these notices.</p>
</body>
</html>"#
                    .to_string(),
            ),
        })?;

        Ok(())
    }
}
