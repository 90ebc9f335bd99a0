//! Transactional email templates.
//!
//! Each [`EmailTemplate`] turns a flat JSON object of data fields into a
//! subject line and an HTML body. Every interpolated value is HTML-escaped.

use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown email template '{0}'")]
    UnknownTemplate(String),

    #[error("Template '{template}' requires data field '{field}'")]
    MissingField {
        template: &'static str,
        field: &'static str,
    },
}

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    AssetAssigned,
    ReviewReady,
    ChangesRequested,
    ShareLink,
    SelectionConfirmed,
    Mention,
}

impl EmailTemplate {
    pub const ALL: [EmailTemplate; 6] = [
        Self::AssetAssigned,
        Self::ReviewReady,
        Self::ChangesRequested,
        Self::ShareLink,
        Self::SelectionConfirmed,
        Self::Mention,
    ];

    pub fn parse(name: &str) -> Result<Self, TemplateError> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AssetAssigned => "asset-assigned",
            Self::ReviewReady => "review-ready",
            Self::ChangesRequested => "changes-requested",
            Self::ShareLink => "share-link",
            Self::SelectionConfirmed => "selection-confirmed",
            Self::Mention => "mention",
        }
    }

    /// Data fields that must be present and non-empty.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::AssetAssigned => &["asset_name", "project_name"],
            Self::ReviewReady => &["asset_name", "project_name"],
            Self::ChangesRequested => &["asset_name", "project_name"],
            Self::ShareLink => &["project_name", "share_url"],
            Self::SelectionConfirmed => &["project_name"],
            Self::Mention => &["author_name", "asset_name", "text"],
        }
    }

    pub fn render(self, data: &Map<String, Value>) -> Result<RenderedEmail, TemplateError> {
        let fields = Fields { template: self, data };
        for field in self.required_fields() {
            fields.required(field)?;
        }

        let (subject, body) = match self {
            Self::AssetAssigned => {
                let asset = fields.required("asset_name")?;
                let project = fields.required("project_name")?;
                let mut body = format!(
                    "<p>You have been assigned <strong>{}</strong> in <strong>{}</strong>.</p>",
                    escape_html(&asset),
                    escape_html(&project)
                );
                if let Some(due) = fields.optional("due_date") {
                    body.push_str(&format!("<p>Due: {}</p>", escape_html(&due)));
                }
                (format!("New assignment: {asset}"), body)
            }
            Self::ReviewReady => {
                let asset = fields.required("asset_name")?;
                let project = fields.required("project_name")?;
                (
                    format!("Ready for review: {asset}"),
                    format!(
                        "<p><strong>{}</strong> in <strong>{}</strong> is ready for review.</p>",
                        escape_html(&asset),
                        escape_html(&project)
                    ),
                )
            }
            Self::ChangesRequested => {
                let asset = fields.required("asset_name")?;
                let project = fields.required("project_name")?;
                let mut body = format!(
                    "<p>Changes were requested on <strong>{}</strong> in <strong>{}</strong>.</p>",
                    escape_html(&asset),
                    escape_html(&project)
                );
                if let Some(feedback) = fields.optional("feedback") {
                    body.push_str(&format!("<blockquote>{}</blockquote>", escape_html(&feedback)));
                }
                (format!("Changes requested: {asset}"), body)
            }
            Self::ShareLink => {
                let project = fields.required("project_name")?;
                let url = fields.required("share_url")?;
                let greeting = fields
                    .optional("recipient_name")
                    .map(|n| format!("<p>Hi {},</p>", escape_html(&n)))
                    .unwrap_or_default();
                let mut body = format!(
                    "{greeting}<p>You have been invited to view <strong>{}</strong>.</p>",
                    escape_html(&project)
                );
                if let Some(message) = fields.optional("message") {
                    body.push_str(&format!("<p>{}</p>", escape_html(&message)));
                }
                body.push_str(&format!(
                    "<p><a href=\"{0}\">{0}</a></p>",
                    escape_html(&url)
                ));
                (format!("{project} is ready to view"), body)
            }
            Self::SelectionConfirmed => {
                let project = fields.required("project_name")?;
                let who = fields
                    .optional("client_name")
                    .unwrap_or_else(|| "The client".to_string());
                let mut body = format!(
                    "<p>{} confirmed their selection for <strong>{}</strong>.</p>",
                    escape_html(&who),
                    escape_html(&project)
                );
                if let Some(count) = fields.optional("selected_count") {
                    body.push_str(&format!("<p>Selected assets: {}</p>", escape_html(&count)));
                }
                (format!("Selection confirmed: {project}"), body)
            }
            Self::Mention => {
                let author = fields.required("author_name")?;
                let asset = fields.required("asset_name")?;
                let text = fields.required("text")?;
                (
                    format!("{author} mentioned you on {asset}"),
                    format!(
                        "<p><strong>{}</strong> mentioned you on <strong>{}</strong>:</p><blockquote>{}</blockquote>",
                        escape_html(&author),
                        escape_html(&asset),
                        escape_html(&text)
                    ),
                )
            }
        };

        let mut html = body;
        if let Some(link) = fields.optional("link") {
            html.push_str(&format!(
                "<p><a href=\"{}\">Open in Studio</a></p>",
                escape_html(&link)
            ));
        }

        Ok(RenderedEmail {
            subject,
            html: wrap_layout(&html),
        })
    }
}

struct Fields<'a> {
    template: EmailTemplate,
    data: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn optional(&self, field: &str) -> Option<String> {
        match self.data.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn required(&self, field: &'static str) -> Result<String, TemplateError> {
        self.optional(field).ok_or(TemplateError::MissingField {
            template: self.template.name(),
            field,
        })
    }
}

fn wrap_layout(inner: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:sans-serif;color:#222\">{inner}</body></html>"
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
