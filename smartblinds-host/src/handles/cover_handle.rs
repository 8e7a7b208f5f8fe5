use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use smartblinds_api::models::{CoverResponse, MoveStepsRequest, SetTiltRequest};

use crate::errors::{ApiError, CoverError};
use crate::services::{CoverHandle, CoverRegistry};

#[derive(Clone)]
pub struct CoverState {
    pub registry: Arc<CoverRegistry>,
}

impl CoverState {
    fn cover(&self, cover_id: &str) -> Result<&CoverHandle, CoverError> {
        self.registry.get(cover_id).ok_or(CoverError::CoverNotFound)
    }
}

pub fn cover_router(cover_state: CoverState) -> Router {
    Router::new()
        .route("/api/covers", get(get_covers))
        .route("/api/covers/:cover_id", get(get_cover_by_id))
        .route("/api/covers/:cover_id/tilt", put(set_cover_tilt_position))
        .route("/api/covers/:cover_id/steps", put(move_cover_steps))
        .route("/api/covers/:cover_id/refresh", post(refresh_cover))
        .route("/api/covers/:cover_id/reset", post(reset_cover_calibration))
        .with_state(cover_state)
}

pub async fn get_covers(State(state): State<CoverState>) -> Json<Vec<CoverResponse>> {
    Json(state.registry.snapshots())
}

pub async fn get_cover_by_id(
    State(state): State<CoverState>,
    Path(cover_id): Path<String>,
) -> Result<Json<CoverResponse>, ApiError> {
    Ok(Json(state.cover(&cover_id)?.snapshot()))
}

pub async fn set_cover_tilt_position(
    State(state): State<CoverState>,
    Path(cover_id): Path<String>,
    body: Result<Json<SetTiltRequest>, JsonRejection>,
) -> Result<Json<CoverResponse>, ApiError> {
    let cover = state.cover(&cover_id)?;
    let Json(body) = body?;

    let tilt_position = u8::try_from(body.tilt_position)
        .ok()
        .filter(|tilt| *tilt <= 100)
        .ok_or(CoverError::InvalidTiltPosition(body.tilt_position))?;

    Ok(Json(cover.set_tilt_position(tilt_position).await?))
}

/// Relative move used to calibrate the blind after a reset.
pub async fn move_cover_steps(
    State(state): State<CoverState>,
    Path(cover_id): Path<String>,
    body: Result<Json<MoveStepsRequest>, JsonRejection>,
) -> Result<Json<CoverResponse>, ApiError> {
    let cover = state.cover(&cover_id)?;
    let Json(body) = body?;

    Ok(Json(cover.move_steps(body.steps).await?))
}

/// Polls the device right away instead of waiting for the next interval.
pub async fn refresh_cover(
    State(state): State<CoverState>,
    Path(cover_id): Path<String>,
) -> Result<Json<CoverResponse>, ApiError> {
    Ok(Json(state.cover(&cover_id)?.refresh().await?))
}

pub async fn reset_cover_calibration(
    State(state): State<CoverState>,
    Path(cover_id): Path<String>,
) -> Result<Json<CoverResponse>, ApiError> {
    Ok(Json(state.cover(&cover_id)?.reset_calibration().await?))
}
