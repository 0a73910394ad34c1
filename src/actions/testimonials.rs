/**
 * Testimonial Form Actions
 * URL-encoded create/update and delete
 */
use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::HeaderMap,
    response::Redirect,
    Form,
};
use serde::Deserialize;

use super::{check_admin, ActionFailure, ActionState};
use crate::db::models::Testimonial;
use crate::session::{cookie_value, SESSION_COOKIE_NAME};
use crate::validation::{FieldErrors, TestimonialInput};

/// Raw form fields; every value arrives as a string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialForm {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stars: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_hint: Option<String>,
}

impl TestimonialForm {
    /// Coerce the strings and run the shared schema. Unparseable `stars`
    /// fail the same range check as out-of-range ones.
    pub fn into_input(self) -> Result<TestimonialInput, FieldErrors> {
        TestimonialInput {
            quote: self.quote,
            name: self.name,
            stars: self.stars.trim().parse().unwrap_or(0),
            url: self.url,
            image_hint: self.image_hint,
        }
        .validate()
    }
}

const REVALIDATED_PATHS: [&str; 2] = ["/testimonials", "/admin/testimonials"];

fn parse_form(form: Result<Form<TestimonialForm>, FormRejection>) -> Result<TestimonialInput, ActionFailure> {
    let Form(form) = form.map_err(|e| {
        tracing::error!("Form rejected: {}", e);
        ActionFailure::Validation(FieldErrors::general("Invalid form data"))
    })?;
    form.into_input().map_err(ActionFailure::Validation)
}

/// POST /admin/testimonials
pub async fn create_testimonial(
    State(state): State<ActionState>,
    headers: HeaderMap,
    form: Result<Form<TestimonialForm>, FormRejection>,
) -> Result<Redirect, ActionFailure> {
    check_admin(&state, &headers).await?;
    let input = parse_form(form)?;

    let session = cookie_value(&headers, SESSION_COOKIE_NAME);
    let created: Testimonial = state
        .api
        .post(&["api", "testimonials"], session, &input)
        .await?;

    state.app.pages.revalidate_all(&REVALIDATED_PATHS).await;
    tracing::info!("Testimonial created from form: {}", created.id);
    Ok(Redirect::to("/admin/testimonials"))
}

/// POST /admin/testimonials/{id}
pub async fn update_testimonial(
    State(state): State<ActionState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    form: Result<Form<TestimonialForm>, FormRejection>,
) -> Result<Redirect, ActionFailure> {
    check_admin(&state, &headers).await?;
    let input = parse_form(form)?;

    let session = cookie_value(&headers, SESSION_COOKIE_NAME);
    let _: Testimonial = state
        .api
        .put(&["api", "testimonials", id.as_str()], session, &input)
        .await
        .map_err(|e| match e {
            ActionFailure::NotFound(_) => {
                ActionFailure::NotFound("Could not find the testimonial to update.".to_string())
            }
            other => other,
        })?;

    state.app.pages.revalidate_all(&REVALIDATED_PATHS).await;
    state
        .app
        .pages
        .revalidate(&format!("/admin/testimonials/{}/edit", id))
        .await;
    Ok(Redirect::to("/admin/testimonials"))
}

/// POST /admin/testimonials/{id}/delete
pub async fn delete_testimonial(
    State(state): State<ActionState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Redirect, ActionFailure> {
    check_admin(&state, &headers).await?;

    let session = cookie_value(&headers, SESSION_COOKIE_NAME);
    state
        .api
        .delete(&["api", "testimonials", id.as_str()], session)
        .await
        .map_err(|e| match e {
            ActionFailure::NotFound(_) => {
                ActionFailure::NotFound("Testimonial not found or already deleted.".to_string())
            }
            other => other,
        })?;

    state.app.pages.revalidate_all(&REVALIDATED_PATHS).await;
    tracing::info!("Testimonial deleted from form: {}", id);
    Ok(Redirect::to("/admin/testimonials"))
}
