//! CityRun loop route HTTP service.
//!
//! # Endpoints
//!
//! - `POST /score-route` - recommend a loop course around an origin
//! - `GET /health` - `{"status":"OK","timestamp":"..."}`
//! - `GET /health/live`, `GET /health/ready` - probes
//! - `GET /metrics` - Prometheus metrics

#![deny(warnings)]

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use cityrun_lib::{
    recommend_with_cancel, CancelToken, Error as LibError, ErrorKind, RecommendRequest,
    Recommendation, RouteRecommendation,
};
use cityrun_service_shared::{
    extract_or_generate_request_id, from_lib_error, health, health_live, health_ready,
    metrics_handler, record_distance_ratio, record_route_failed, record_route_recommended,
    record_via_candidates, ApiError, AppState, MetricsLayer, RequestId, RouteResponse,
    ScoreRouteRequest,
};

/// Label used on business metrics.
pub const SERVICE_NAME: &str = "route";

/// Router with every endpoint and middleware attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/score-route", post(score_route))
        .route("/health", get(health))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(MetricsLayer)
        .with_state(state)
}

/// Handle `POST /score-route`.
pub async fn score_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ScoreRouteRequest>, JsonRejection>,
) -> Result<RouteResponse<RouteRecommendation>, ApiError> {
    let request_id = extract_or_generate_request_id(&headers);

    let Json(body) = payload.map_err(|rejection| {
        warn!(request_id = %request_id, error = %rejection, "rejected request body");
        record_route_failed(ErrorKind::InvalidInput.as_str(), SERVICE_NAME);
        ApiError::invalid_input()
    })?;

    let request = body.into_recommend_request().map_err(|problem| {
        warn!(request_id = %request_id, "invalid score-route request");
        record_route_failed(ErrorKind::InvalidInput.as_str(), SERVICE_NAME);
        *problem
    })?;

    info!(
        request_id = %request_id,
        distance_km = request.distance_km,
        lat = request.origin.lat,
        lng = request.origin.lng,
        minimize_crosswalks = request.preferences.minimize_crosswalks,
        "handling score-route request"
    );

    let crosswalk_mode = if request.preferences.minimize_crosswalks {
        "avoid"
    } else {
        "ignore"
    };

    match run_recommendation(&state, request).await {
        Ok(result) => {
            record_route_recommended(crosswalk_mode, SERVICE_NAME);
            record_distance_ratio(result.distance_ratio);
            record_via_candidates(result.candidates_evaluated);

            info!(
                request_id = %request_id,
                start = result.start_vertex,
                via = result.via_vertex,
                distance_m = result.route.distance_meters,
                crosswalks = result.route.crosswalk_count,
                "loop route recommended"
            );

            let message = result.message();
            Ok(RouteResponse::new(result.route, message))
        }
        Err(e) => Err(failure(&request_id, &e)),
    }
}

/// Run the CPU-bound recommendation off the async workers, bounded by the
/// request timeout.
///
/// The search is cancelled when this future completes or is dropped, so a
/// timeout or a client disconnect stops further graph queries.
async fn run_recommendation(
    state: &AppState,
    request: RecommendRequest,
) -> cityrun_lib::Result<Recommendation> {
    let store = state.store_arc();
    let config = *state.recommend_config();
    let timeout = state.request_timeout();

    let cancel = CancelToken::new();
    let _cancel_on_drop = cancel.drop_guard();
    let task = tokio::task::spawn_blocking(move || {
        recommend_with_cancel(store.as_ref(), &request, &config, &cancel)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(LibError::upstream(format!(
            "recommendation task failed: {join_error}"
        ))),
        Err(_) => Err(LibError::upstream(format!(
            "request exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}

fn failure(request_id: &RequestId, err: &LibError) -> ApiError {
    let kind = err.kind();
    match kind {
        ErrorKind::UpstreamUnavailable | ErrorKind::Internal => {
            error!(
                request_id = %request_id,
                kind = %kind,
                error = %err,
                "route recommendation failed"
            );
        }
        _ => {
            info!(
                request_id = %request_id,
                kind = %kind,
                error = %err,
                "no route returned"
            );
        }
    }
    record_route_failed(kind.as_str(), SERVICE_NAME);
    from_lib_error(err)
}
