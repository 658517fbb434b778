use axum::{extract::State, routing::post, Json, Router};
use tracing::{debug, instrument};

use super::dto::EstimateRequest;
use super::services::Estimate;
use crate::{errors::CoreError, state::AppState};

pub fn estimate_routes() -> Router<AppState> {
    Router::new().route("/estimate", post(calculate))
}

/// Preview only: nothing is logged.
#[instrument(skip(state))]
pub async fn calculate(
    State(state): State<AppState>,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<Estimate>, CoreError> {
    let settings = {
        let session = state.session.lock().await;
        let snapshot = session.settings.snapshot();
        match body.current_glucose {
            Some(bs) => snapshot.with_current_bs(Some(bs))?,
            None => snapshot,
        }
    };
    let est = Estimate::from_settings(body.carbs, &settings)?;
    debug!(carbs = body.carbs, total = est.total(), "estimate calculated");
    Ok(Json(est))
}

#[cfg(test)]
mod estimate_handler_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::state::AppState;

    #[tokio::test]
    async fn preview_does_not_log() {
        let state = AppState::fake();
        let res = crate::app::build_app(state.clone())
            .oneshot(
                Request::post("/api/v1/estimate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"carbs":80,"current_glucose":180}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["total"], 9.6);
        assert_eq!(json["meal_bolus"], 8.0);

        let session = state.session.lock().await;
        assert!(session.meals.is_empty());
        assert_eq!(session.settings.snapshot().current_bs(), None);
    }

    #[tokio::test]
    async fn negative_carbs_rejected() {
        let res = crate::app::build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/estimate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"carbs":-5}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
