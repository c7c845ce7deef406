use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use sitedesk_db::models::Material;
use sitedesk_services::notify::ChangeAction;
use tracing::warn;

use super::project::parse_project_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateMaterialRequest {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMaterialRequest {
    pub quantity: f64,
}

#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub created_at: String,
}

fn to_response(material: Material) -> MaterialResponse {
    MaterialResponse {
        id: material.id.map(|id| id.to_hex()).unwrap_or_default(),
        project_id: material.project_id.to_hex(),
        name: material.name,
        quantity: material.quantity,
        unit: material.unit,
        created_at: material
            .created_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<MaterialResponse>>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let materials = state.materials.list_for_project(pid).await?;
    Ok(Json(materials.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateMaterialRequest>,
) -> Result<Json<MaterialResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;

    let material = state
        .materials
        .create(pid, body.name.clone(), body.quantity, body.unit.clone())
        .await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_material_event(
            &actor_id,
            pid,
            ChangeAction::Added,
            &body.name,
            body.quantity,
            &body.unit,
        )
        .await
    {
        warn!(%pid, %e, "material notification failed");
    }

    Ok(Json(to_response(material)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, material_id)): Path<(String, String)>,
    Json(body): Json<UpdateMaterialRequest>,
) -> Result<Json<MaterialResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let mid = parse_material_id(&material_id)?;

    state.materials.find_in_project(mid, pid).await?;
    state.materials.update_quantity(mid, body.quantity).await?;
    let material = state.materials.find_in_project(mid, pid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_material_event(
            &actor_id,
            pid,
            ChangeAction::Updated,
            &material.name,
            material.quantity,
            &material.unit,
        )
        .await
    {
        warn!(%pid, %e, "material notification failed");
    }

    Ok(Json(to_response(material)))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, material_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let mid = parse_material_id(&material_id)?;

    let material = state.materials.find_in_project(mid, pid).await?;
    state.materials.delete(mid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_material_event(
            &actor_id,
            pid,
            ChangeAction::Deleted,
            &material.name,
            material.quantity,
            &material.unit,
        )
        .await
    {
        warn!(%pid, %e, "material notification failed");
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn parse_material_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid material_id".to_string()))
}
