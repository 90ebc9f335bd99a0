//! Transactional email sending for staff.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use studio_events::{EmailTemplate, OutgoingEmail};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::state::AppState;

/// Upper bound on recipients per request.
const MAX_RECIPIENTS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: Vec<String>,
    pub template: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Trim recipients and drop blanks. At least one address must remain.
fn recipients(to: &[String]) -> AppResult<Vec<String>> {
    let to: Vec<String> = to
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    if to.is_empty() {
        return Err(AppError::BadRequest("At least one recipient is required".into()));
    }
    if to.len() > MAX_RECIPIENTS {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_RECIPIENTS} recipients are allowed"
        )));
    }
    if let Some(bad) = to.iter().find(|a| !a.contains('@')) {
        return Err(AppError::BadRequest(format!("Invalid email address: {bad}")));
    }
    Ok(to)
}

/// POST /api/v1/send-email
pub async fn send_email(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<SendEmailRequest>,
) -> AppResult<Json<Value>> {
    let to = recipients(&input.to)?;
    let template = EmailTemplate::parse(&input.template)?;
    let rendered = template.render(&input.data)?;

    let sender = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Email delivery is not configured".into()))?;

    let id = sender
        .send(&OutgoingEmail {
            to,
            subject: rendered.subject,
            html: rendered.html,
        })
        .await?;

    tracing::info!(
        user_id = user.user_id,
        template = template.name(),
        message_id = %id,
        "Email sent",
    );
    Ok(Json(json!({ "success": true, "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn recipients_are_trimmed() {
        let to = recipients(&[" a@example.com ".into(), "".into(), "b@example.com".into()]).unwrap();
        assert_eq!(to, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn empty_or_malformed_recipients_rejected() {
        assert_matches!(recipients(&[]), Err(AppError::BadRequest(_)));
        assert_matches!(recipients(&["  ".into()]), Err(AppError::BadRequest(_)));
        assert_matches!(recipients(&["not-an-address".into()]), Err(AppError::BadRequest(_)));
    }
}
