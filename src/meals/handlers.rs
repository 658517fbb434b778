use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{ManualMealRequest, Pagination, PhotoMealResponse};
use super::repo_types::{MealEntry, MealStats};
use super::services::{log_manual_meal, log_photo_meal};
use crate::{errors::CoreError, images::UploadItem, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).delete(clear_meals))
        .route("/meals/stats", get(meal_stats))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/meals/manual", post(create_manual_meal))
        .route("/meals/photo", post(create_photo_meal))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Json<Vec<MealEntry>> {
    let session = state.session.lock().await;
    Json(session.meals.recent(p.limit).to_vec())
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealEntry>, (StatusCode, String)> {
    let session = state.session.lock().await;
    session
        .meals
        .get(id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Meal not found".into()))
}

#[instrument(skip(state))]
pub async fn meal_stats(State(state): State<AppState>) -> Json<MealStats> {
    let session = state.session.lock().await;
    Json(session.meals.aggregate())
}

#[instrument(skip(state))]
pub async fn clear_meals(State(state): State<AppState>) -> StatusCode {
    let mut session = state.session.lock().await;
    let removed = session.meals.len();
    session.meals.clear();
    info!(removed, "meal log cleared");
    StatusCode::NO_CONTENT
}

#[instrument(skip(state, body))]
pub async fn create_manual_meal(
    State(state): State<AppState>,
    Json(body): Json<ManualMealRequest>,
) -> Result<(StatusCode, HeaderMap, Json<MealEntry>), CoreError> {
    let mut session = state.session.lock().await;
    let entry = log_manual_meal(&mut session, body.meal, body.carbs, body.current_glucose)?;
    Ok((StatusCode::CREATED, location(entry.id()), Json(entry)))
}

/// POST /meals/photo (multipart)
/// Fields: `image` (or `file`), optional `current_glucose`.
#[instrument(skip(state, mp))]
pub async fn create_photo_meal(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<(StatusCode, HeaderMap, Json<PhotoMealResponse>), CoreError> {
    let mut image = None;
    let mut current_bs = None;
    while let Some(field) = mp.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") | Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                image = Some(UploadItem::validated(data, &content_type)?);
            }
            Some("current_glucose") => {
                let text = field.text().await.map_err(bad_multipart)?;
                let text = text.trim();
                if !text.is_empty() {
                    current_bs = Some(text.parse::<i32>().map_err(|_| {
                        CoreError::invalid(format!("current_glucose {text:?} is not an integer"))
                    })?);
                }
            }
            _ => {}
        }
    }
    let image = image.ok_or_else(|| CoreError::invalid("image is required"))?;

    let mut session = state.session.lock().await;
    let out = log_photo_meal(&mut session, state.vision.as_ref(), &image, current_bs).await?;
    Ok((
        StatusCode::CREATED,
        location(out.entry.id()),
        Json(PhotoMealResponse {
            entry: out.entry,
            analysis: out.analysis,
        }),
    ))
}

fn location(id: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&format!("/api/v1/meals/{id}")) {
        headers.insert(header::LOCATION, v);
    }
    headers
}

fn bad_multipart<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::invalid(format!("invalid multipart body: {e}"))
}
