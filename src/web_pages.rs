use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppStore;
use crate::gallery::ImageCard;
use crate::storage::content_type_for;
use crate::upload::UploadForm;

const GALLERY_HTML: &str = include_str!("../templates/gallery.html");
const UPLOAD_FORM_HTML: &str = include_str!("../templates/upload_form.html");
const ADD_BUTTON_HTML: &str = include_str!("../templates/add_button.html");

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}

/// Shared by every page handler. `base` is the path prefix of the gallery
/// pages (`""` or `/<secret>`), used for routes, form actions and redirects.
#[derive(Clone)]
pub struct WebState {
    pub store: Arc<AppStore>,
    pub base: Arc<str>,
}

impl WebState {
    fn home(&self) -> Redirect {
        Redirect::to(&format!("{}/", self.base))
    }
}

/// Gallery pages live under `base`. Signed object links stay at `/objects`
/// since the signature already guards them.
pub fn router(store: Arc<AppStore>, base: &str) -> Router {
    let base = base.trim_end_matches('/');
    let mut router = Router::new()
        .route(&format!("{base}/"), get(gallery_page))
        .route(&format!("{base}/refresh"), post(refresh))
        .route(&format!("{base}/images/{{index}}/open"), post(open_image))
        .route(&format!("{base}/images/{{index}}/like"), post(like_image))
        .route(
            &format!("{base}/upload"),
            get(upload_page)
                .post(handle_image_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(&format!("{base}/upload/cancel"), post(cancel_upload))
        .route("/objects/{*key}", get(serve_object));
    if !base.is_empty() {
        router = router.route(base, get(gallery_page));
    }
    router.with_state(WebState {
        store,
        base: Arc::from(base),
    })
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn render_card(base: &str, card: &ImageCard) -> String {
    let arrow = if card.is_open { "&#9660;" } else { "&#9654;" };
    let detail = match (&card.url, card.is_open) {
        (Some(url), true) => format!(
            r#"<div class="imageDetail"><img src="{}" alt="{}" /></div>"#,
            escape_html(url),
            escape_html(&card.image.location)
        ),
        _ => String::new(),
    };
    format!(
        r#"<div class="imageCard">
        <form method="post" action="{base}/images/{index}/open"><button type="submit" aria-label="open">{arrow}</button></form>
        <div>
          <div class="imageLocation">{location}</div>
          <div class="imagePhotographer">{photographer}</div>
        </div>
        <div>
          <form method="post" action="{base}/images/{index}/like"><button type="submit" aria-label="like">&#128077;</button></form>
          <span class="imageLikes">{likes}</span>
        </div>
        {detail}
      </div>"#,
        index = card.index,
        location = escape_html(&card.image.location),
        photographer = escape_html(&card.image.photographer),
        likes = card.image.likes,
    )
}

pub fn render_gallery(base: &str, cards: &[ImageCard], upload_open: bool) -> String {
    let base = escape_html(base);
    let base = base.as_str();
    let cards_html = if cards.is_empty() {
        r#"<p class="empty">No images yet.</p>"#.to_string()
    } else {
        cards
            .iter()
            .map(|card| render_card(base, card))
            .collect::<Vec<_>>()
            .join("\n      ")
    };
    let upload_html = if upload_open {
        UPLOAD_FORM_HTML
    } else {
        ADD_BUTTON_HTML
    };
    GALLERY_HTML
        .replace("{{base}}", base)
        .replace("{{upload}}", &upload_html.replace("{{base}}", base))
        .replace("{{cards}}", &cards_html)
}

pub async fn gallery_page(State(web): State<WebState>) -> Html<String> {
    web.store.activate().await;
    let cards = web.store.render();
    Html(render_gallery(
        &web.base,
        &cards,
        web.store.snapshot().upload_open,
    ))
}

pub async fn refresh(State(web): State<WebState>) -> Redirect {
    web.store.fetch_images().await;
    web.home()
}

pub async fn open_image(State(web): State<WebState>, Path(index): Path<usize>) -> Redirect {
    web.store.toggle_open(index).await;
    web.home()
}

pub async fn like_image(State(web): State<WebState>, Path(index): Path<usize>) -> Redirect {
    web.store.like(index).await;
    web.home()
}

pub async fn upload_page(State(web): State<WebState>) -> Redirect {
    web.store.show_upload_form();
    web.home()
}

pub async fn cancel_upload(State(web): State<WebState>) -> Redirect {
    web.store.close_upload_form();
    web.home()
}

pub async fn handle_image_upload(State(web): State<WebState>, mut multipart: Multipart) -> Response {
    let mut form = UploadForm::default();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                match name.as_str() {
                    "location" | "photographer" => {
                        let value = match field.text().await {
                            Ok(value) => value,
                            Err(err) => {
                                return json_error(
                                    StatusCode::BAD_REQUEST,
                                    &format!("failed to read {name}: {err}"),
                                );
                            }
                        };
                        if name == "location" {
                            form.location = value;
                        } else {
                            form.photographer = value;
                        }
                    }
                    "file" => {
                        let file_name = field.file_name().unwrap_or_default().to_string();
                        let bytes = match field.bytes().await {
                            Ok(bytes) => bytes,
                            Err(err) => {
                                return json_error(
                                    StatusCode::BAD_REQUEST,
                                    &format!("failed to read file: {err}"),
                                );
                            }
                        };
                        // browsers send an empty part when nothing was picked
                        if !file_name.is_empty() && !bytes.is_empty() {
                            form = form.with_file(file_name, bytes.to_vec());
                        }
                    }
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(err) => {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    &format!("failed to read form: {err}"),
                );
            }
        }
    }

    web.store.submit_upload(&form).await;
    web.home().into_response()
}

pub async fn serve_object(
    State(web): State<WebState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Response {
    let storage = web.store.storage();
    let now = Utc::now().timestamp();
    if !storage.verify(&key, query.expires, &query.signature, now) {
        return json_error(StatusCode::FORBIDDEN, "link is invalid or expired");
    }
    match storage.read(&key).await {
        Ok(Some(bytes)) => {
            let content_type = content_type_for(&key, &bytes);
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, "private, max-age=60"),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => json_error(StatusCode::NOT_FOUND, "object not found"),
        Err(err) => {
            warn!(error = %err, key = %key, "reading object failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to read object")
        }
    }
}
