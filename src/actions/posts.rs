/**
 * Post Form Actions
 * Multipart create/update with optional cover image, and delete
 */
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::HeaderMap,
    response::Redirect,
};

use super::{check_admin, ActionFailure, ActionState};
use crate::db::models::Post;
use crate::session::{cookie_value, SESSION_COOKIE_NAME};
use crate::validation::{FieldErrors, PostInput};

/// Fields of the post editor form.
#[derive(Debug, Default)]
struct PostForm {
    title: String,
    content: String,
    /// Original file name and bytes of a newly chosen image.
    image: Option<(String, Bytes)>,
}

fn invalid_form(e: impl std::fmt::Display) -> ActionFailure {
    tracing::error!("Multipart error: {}", e);
    ActionFailure::Validation(FieldErrors::general("Invalid form data"))
}

async fn read_post_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PostForm, ActionFailure> {
    let mut multipart = multipart.map_err(invalid_form)?;
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field.text().await.map_err(invalid_form)?,
            "content" => form.content = field.text().await.map_err(invalid_form)?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(invalid_form)?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    form.image = Some((file_name, bytes));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

impl PostForm {
    fn validate(&self) -> Result<PostInput, ActionFailure> {
        PostInput {
            title: self.title.clone(),
            content: self.content.clone(),
            image_url: None,
        }
        .validate()
        .map_err(ActionFailure::Validation)
    }
}

/// Write the new image, if any. A failed write is reported on the `image` field.
async fn save_image(
    state: &ActionState,
    image: Option<(String, Bytes)>,
) -> Result<Option<String>, ActionFailure> {
    let Some((name, bytes)) = image else {
        return Ok(None);
    };

    match state.app.images.save(&name, &bytes).await {
        Ok(url) => Ok(Some(url)),
        Err(e) => {
            tracing::warn!("Image save failed for {}: {}", name, e);
            Err(ActionFailure::Validation(FieldErrors::single(
                "image",
                e.to_string(),
            )))
        }
    }
}

/// POST /admin/posts
pub async fn create_post(
    State(state): State<ActionState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ActionFailure> {
    check_admin(&state, &headers).await?;
    let form = read_post_form(multipart).await?;
    let mut input = form.validate()?;

    let new_image = save_image(&state, form.image).await?;
    input.image_url = new_image.clone();

    let session = cookie_value(&headers, SESSION_COOKIE_NAME);
    let created: Post = match state.api.post(&["api", "posts"], session, &input).await {
        Ok(post) => post,
        Err(e) => {
            if let Some(url) = &new_image {
                state.app.images.delete(url).await;
            }
            return Err(e);
        }
    };

    state
        .app
        .pages
        .revalidate_all(&[
            "/blog".to_string(),
            format!("/blog/{}", created.slug),
            "/admin/posts".to_string(),
        ])
        .await;

    tracing::info!("Post created from form: {}", created.slug);
    Ok(Redirect::to(&format!("/blog/{}", created.slug)))
}

/// POST /admin/posts/{slug}
///
/// Without a new image the current one is kept. With one, the old file is
/// removed only once the new file is written and the update has persisted.
pub async fn update_post(
    State(state): State<ActionState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ActionFailure> {
    check_admin(&state, &headers).await?;
    let form = read_post_form(multipart).await?;
    let mut input = form.validate()?;

    let session = cookie_value(&headers, SESSION_COOKIE_NAME);
    let current: Post = state
        .api
        .get(&["api", "posts", slug.as_str()], session)
        .await
        .map_err(|e| match e {
            ActionFailure::NotFound(_) => {
                ActionFailure::NotFound("Could not find the post to update.".to_string())
            }
            other => other,
        })?;

    let new_image = save_image(&state, form.image).await?;
    input.image_url = new_image.clone().or_else(|| current.image_url.clone());

    let updated: Post = match state.api.put(&["api", "posts", slug.as_str()], session, &input).await {
        Ok(post) => post,
        Err(e) => {
            if let Some(url) = &new_image {
                state.app.images.delete(url).await;
            }
            return Err(e);
        }
    };

    if let (Some(new_url), Some(old_url)) = (&new_image, &current.image_url) {
        if new_url != old_url {
            state.app.images.delete(old_url).await;
        }
    }

    let mut paths = vec!["/blog".to_string(), format!("/blog/{}", slug)];
    if updated.slug != slug {
        paths.push(format!("/blog/{}", updated.slug));
    }
    paths.push("/admin/posts".to_string());
    state.app.pages.revalidate_all(&paths).await;

    tracing::info!("Post updated from form: {} -> {}", slug, updated.slug);
    Ok(Redirect::to(&format!("/blog/{}", updated.slug)))
}

/// POST /admin/posts/{slug}/delete
pub async fn delete_post(
    State(state): State<ActionState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Redirect, ActionFailure> {
    check_admin(&state, &headers).await?;

    let session = cookie_value(&headers, SESSION_COOKIE_NAME);
    state
        .api
        .delete(&["api", "posts", slug.as_str()], session)
        .await
        .map_err(|e| match e {
            ActionFailure::NotFound(_) => {
                ActionFailure::NotFound("Post not found or already deleted.".to_string())
            }
            other => other,
        })?;

    state
        .app
        .pages
        .revalidate_all(&[
            "/blog".to_string(),
            format!("/blog/{}", slug),
            "/admin/posts".to_string(),
        ])
        .await;

    tracing::info!("Post deleted from form: {}", slug);
    Ok(Redirect::to("/blog"))
}
