use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use sitedesk_db::models::{Expense, LedgerEntry};
use sitedesk_services::notify::{ChangeAction, LedgerEvent};
use tracing::warn;

use super::project::parse_project_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub entry: LedgerEntry,
    pub amount: f64,
    pub category: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub amount: f64,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: String,
    pub project_id: String,
    pub entry: LedgerEntry,
    pub amount: f64,
    pub category: String,
    pub note: Option<String>,
    pub created_at: String,
}

fn to_response(expense: Expense) -> ExpenseResponse {
    ExpenseResponse {
        id: expense.id.map(|id| id.to_hex()).unwrap_or_default(),
        project_id: expense.project_id.to_hex(),
        entry: expense.entry,
        amount: expense.amount,
        category: expense.category,
        note: expense.note,
        created_at: expense
            .created_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let expenses = state.expenses.list_for_project(pid).await?;
    Ok(Json(expenses.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateExpenseRequest>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let actor_id = auth.user_id.to_hex();

    let expense = state
        .expenses
        .create(
            pid,
            body.entry,
            body.amount,
            body.category.clone(),
            body.note,
            actor_id.clone(),
        )
        .await?;

    // The ledger write is the primary action; a failed notification is
    // logged, never surfaced.
    if let Err(e) = state
        .dispatcher
        .dispatch_expense_event(
            &actor_id,
            pid,
            ChangeAction::Added,
            LedgerEvent {
                entry: body.entry,
                amount: body.amount,
                category: body.category,
            },
        )
        .await
    {
        warn!(%pid, %e, "expense notification failed");
    }

    Ok(Json(to_response(expense)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(String, String)>,
    Json(body): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let eid = parse_expense_id(&expense_id)?;

    state.expenses.find_in_project(eid, pid).await?;
    state
        .expenses
        .update_amount(eid, body.amount, body.category)
        .await?;
    let expense = state.expenses.find_in_project(eid, pid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_expense_event(
            &actor_id,
            pid,
            ChangeAction::Updated,
            LedgerEvent {
                entry: expense.entry,
                amount: expense.amount,
                category: expense.category.clone(),
            },
        )
        .await
    {
        warn!(%pid, %e, "expense notification failed");
    }

    Ok(Json(to_response(expense)))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let eid = parse_expense_id(&expense_id)?;

    // Snapshot the row first so the notification can describe it.
    let expense = state.expenses.find_in_project(eid, pid).await?;
    state.expenses.delete(eid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_expense_event(
            &actor_id,
            pid,
            ChangeAction::Deleted,
            LedgerEvent {
                entry: expense.entry,
                amount: expense.amount,
                category: expense.category,
            },
        )
        .await
    {
        warn!(%pid, %e, "expense notification failed");
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn parse_expense_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid expense_id".to_string()))
}
