use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use sitedesk_db::models::Phase;
use sitedesk_services::notify::ChangeAction;
use tracing::warn;

use super::project::parse_project_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreatePhaseRequest {
    pub name: String,
    pub starts_on: Option<bson::DateTime>,
    pub ends_on: Option<bson::DateTime>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhaseRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PhaseResponse {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub created_at: String,
}

fn to_response(phase: Phase) -> PhaseResponse {
    PhaseResponse {
        id: phase.id.map(|id| id.to_hex()).unwrap_or_default(),
        project_id: phase.project_id.to_hex(),
        name: phase.name,
        created_at: phase
            .created_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<PhaseResponse>>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let phases = state.phases.list_for_project(pid).await?;
    Ok(Json(phases.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreatePhaseRequest>,
) -> Result<Json<PhaseResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;

    let phase = state
        .phases
        .create(pid, body.name.clone(), body.starts_on, body.ends_on)
        .await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_phase_event(&actor_id, pid, ChangeAction::Added, &body.name)
        .await
    {
        warn!(%pid, %e, "phase notification failed");
    }

    Ok(Json(to_response(phase)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, phase_id)): Path<(String, String)>,
    Json(body): Json<UpdatePhaseRequest>,
) -> Result<Json<PhaseResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let phid = parse_phase_id(&phase_id)?;

    state.phases.find_in_project(phid, pid).await?;
    state.phases.rename(phid, body.name.clone()).await?;
    let phase = state.phases.find_in_project(phid, pid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_phase_event(&actor_id, pid, ChangeAction::Updated, &body.name)
        .await
    {
        warn!(%pid, %e, "phase notification failed");
    }

    Ok(Json(to_response(phase)))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, phase_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let phid = parse_phase_id(&phase_id)?;

    let phase = state.phases.find_in_project(phid, pid).await?;
    state.phases.delete(phid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_phase_event(&actor_id, pid, ChangeAction::Deleted, &phase.name)
        .await
    {
        warn!(%pid, %e, "phase notification failed");
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn parse_phase_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid phase_id".to_string()))
}
