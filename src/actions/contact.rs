/**
 * Contact Form Action
 * Validates a visitor message and hands it to the (simulated) mailer
 */
use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};

use super::{ActionFailure, ActionState, FormState};
use crate::routes::settings::SettingsResponse;
use crate::validation::{ContactInput, FieldErrors};

/// Outgoing notification for one contact form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEmail {
    pub to: String,
    pub from: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

impl ContactEmail {
    pub fn compose(input: &ContactInput, sender: &str, recipient: &str) -> Self {
        Self {
            to: recipient.to_string(),
            from: format!("\"{}\" <{}>", input.name, sender),
            reply_to: format!("\"{}\" <{}>", input.name, input.email),
            subject: format!("New Contact Form Submission from {}", input.name),
            body: input.message.clone(),
        }
    }
}

/// Delivery is simulated: the composed message goes to the log.
fn deliver(email: &ContactEmail) {
    tracing::info!(
        to = %email.to,
        from = %email.from,
        reply_to = %email.reply_to,
        subject = %email.subject,
        body = %email.body,
        "contact message sent (simulated)"
    );
}

/// POST /contact
pub async fn send_contact_message(
    State(state): State<ActionState>,
    form: Result<Form<ContactInput>, FormRejection>,
) -> Result<Json<FormState>, ActionFailure> {
    let Form(form) = form.map_err(|e| {
        tracing::error!("Contact form rejected: {}", e);
        ActionFailure::Validation(FieldErrors::general("Invalid form data"))
    })?;
    let input = form.validate().map_err(ActionFailure::Validation)?;

    let settings: SettingsResponse = state.api.get(&["api", "settings"], None).await.map_err(|e| {
        tracing::error!("Could not load sender settings: {}", e);
        ActionFailure::Failed(
            "An unexpected error occurred while trying to send your message. Please try again later."
                .to_string(),
        )
    })?;

    let email = ContactEmail::compose(
        &input,
        &settings.smtp_settings.from_email,
        &state.app.config.contact_recipient,
    );
    deliver(&email);

    Ok(Json(FormState::ok(
        "Thank you for your message! We will get back to you soon.",
    )))
}
