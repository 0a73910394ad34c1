/**
 * Testimonial Routes
 * CRUD API endpoints for client testimonials, keyed by id
 */
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::db::models::Testimonial;
use crate::error::ApiError;
use crate::routes::{require_admin, AppState};
use crate::validation::TestimonialInput;

fn testimonial_not_found() -> ApiError {
    ApiError::NotFound("Testimonial not found".to_string())
}

/// GET /api/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    Ok(Json(state.testimonials.list().await?))
}

/// GET /api/testimonials/{id}
pub async fn get_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Testimonial>, ApiError> {
    state
        .testimonials
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(testimonial_not_found)
}

/// POST /api/testimonials (admin only)
pub async fn create_testimonial(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TestimonialInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    require_admin(&state, &headers).await?;
    let Json(payload) = payload?;
    let input = payload.validate()?;

    let testimonial = state.testimonials.create(input).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// PUT /api/testimonials/{id} (admin only)
pub async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<TestimonialInput>, JsonRejection>,
) -> Result<Json<Testimonial>, ApiError> {
    require_admin(&state, &headers).await?;
    let Json(payload) = payload?;
    let input = payload.validate()?;

    state
        .testimonials
        .update(&id, input)
        .await?
        .map(Json)
        .ok_or_else(testimonial_not_found)
}

/// DELETE /api/testimonials/{id} (admin only)
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, &headers).await?;

    if state.testimonials.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(testimonial_not_found())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{request, TestApp};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::db::models::Testimonial;
    use crate::error::ErrorResponse;

    #[tokio::test]
    async fn test_unauthenticated_delete_is_403_and_keeps_record() {
        let app = TestApp::new();
        let (status, bytes) = app
            .send(request(Method::DELETE, "/api/testimonials/t1", None))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, "Unauthorized");

        let (status, t1) = app.get_json::<Testimonial>("/api/testimonials/t1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(t1.name, "A. N.");
    }

    #[tokio::test]
    async fn test_forged_cookie_cannot_delete() {
        let app = TestApp::new();
        let forged = "auth_session=eyJlbWFpbCI6ImFkbWluQGV4YW1wbGUuY29tIiwiaXNBZG1pbiI6dHJ1ZX0=";
        let (status, _) = app
            .send(request(Method::DELETE, "/api/testimonials/t1", Some(forged)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_validates_stars_and_quote() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        let (status, bytes) = app
            .send_json(
                Method::POST,
                "/api/testimonials",
                Some(&cookie),
                &json!({"quote": "too short", "name": "Z", "stars": 6}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = serde_json::from_slice::<ErrorResponse>(&bytes)
            .unwrap()
            .errors
            .unwrap();
        assert!(errors.contains("quote"));
        assert!(errors.contains("stars"));
    }

    #[tokio::test]
    async fn test_create_with_non_integer_stars_reports_stars_field() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        for stars in [json!(4.5), json!("5")] {
            let (status, bytes) = app
                .send_json(
                    Method::POST,
                    "/api/testimonials",
                    Some(&cookie),
                    &json!({"quote": "A lovely experience", "name": "A", "stars": stars}),
                )
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let body = serde_json::from_slice::<ErrorResponse>(&bytes).unwrap();
            assert_eq!(body.message, "Invalid input data");
            assert!(body.errors.unwrap().contains("stars"));
        }
        assert_eq!(app.state.testimonials.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        let (status, bytes) = app
            .send_json(
                Method::POST,
                "/api/testimonials",
                Some(&cookie),
                &json!({"quote": "Warm, thoughtful sessions.", "name": "P. Q.", "stars": 5, "url": ""}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Testimonial = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(created.url, None);

        let uri = format!("/api/testimonials/{}", created.id);
        let (status, bytes) = app
            .send_json(
                Method::PUT,
                &uri,
                Some(&cookie),
                &json!({"quote": "Warm, thoughtful sessions.", "name": "P. Q.", "stars": 4}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let updated: Testimonial = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(updated.stars, 4);
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn test_admin_delete_then_get_is_404() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        let (status, _) = app
            .send(request(Method::DELETE, "/api/testimonials/t2", Some(&cookie)))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.get_json::<ErrorResponse>("/api/testimonials/t2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
