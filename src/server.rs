use crate::backend::HighsBackend;
use crate::config::OptimizerConfig;
use crate::data::Roster;
use crate::error::ScheduleError;
use crate::optimizer::{GlobalOptimizer, Optimized};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    pub roster: Roster,
    #[serde(default)]
    pub config: OptimizerConfig,
}

pub struct ApiError(ScheduleError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            ScheduleError::InvalidConfiguration(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "InvalidConfiguration", "details": errors }),
            ),
            ScheduleError::GlobalInfeasible {
                placements,
                backend_errors,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "GlobalInfeasible",
                    "placements": placements,
                    "backendErrors": backend_errors,
                }),
            ),
            ScheduleError::Roster(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Roster", "message": e.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

async fn solve_handler(Json(request): Json<SolveRequest>) -> Result<Json<Optimized>, Response> {
    let outcome = tokio::task::spawn_blocking(move || {
        let backend = HighsBackend::new(request.config.solver.clone());
        GlobalOptimizer::from_config(&backend, &request.config).optimize(&request.roster)
    })
    .await
    .map_err(|e| {
        error!("Solve task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
    })?;

    outcome
        .map(Json)
        .map_err(|e| ApiError(e).into_response())
}

pub fn router() -> Router {
    Router::new().route("/v1/schedule/solve", post(solve_handler))
}

pub async fn run_server(addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}
