use std::sync::Arc;

use bson::{DateTime, Document, doc, oid::ObjectId};
use sitedesk_db::models::{LedgerEntry, Notification, NotificationKind};
use thiserror::Error;
use tracing::debug;

use super::names::NameResolver;
use super::recipient::RecipientResolver;
use super::repo::NotificationRepo;
use crate::dao::base::DaoError;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The project has no resolvable admin; nothing was persisted.
    #[error("no resolvable admin for project {project_id}")]
    RecipientNotFound { project_id: ObjectId },
    #[error(transparent)]
    Persistence(#[from] DaoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Updated,
    Deleted,
}

impl ChangeAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectChange {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    Joined,
    Updated,
}

/// The typed fields of an expense/income ledger event.
#[derive(Debug, Clone)]
pub struct LedgerEvent {
    pub entry: LedgerEntry,
    pub amount: f64,
    pub category: String,
}

struct EventContext {
    recipient_id: ObjectId,
    actor_name: String,
    project_name: String,
}

/// Sole writer of notification records. One instance serves every
/// privilege level: the injected repo handle decides the store-access
/// capability, and the name resolver carries the fallback policy.
pub struct NotificationDispatcher {
    repo: Arc<dyn NotificationRepo>,
    names: NameResolver,
    recipients: RecipientResolver,
}

impl NotificationDispatcher {
    pub fn new(
        repo: Arc<dyn NotificationRepo>,
        names: NameResolver,
        recipients: RecipientResolver,
    ) -> Self {
        Self {
            repo,
            names,
            recipients,
        }
    }

    /// Persists one notification addressed to `recipient_id`. The write
    /// is not retried; callers decide whether a failed dispatch matters
    /// to the action that triggered it.
    pub async fn dispatch(
        &self,
        recipient_id: ObjectId,
        actor_id: &str,
        subject_id: Option<ObjectId>,
        kind: NotificationKind,
        title: String,
        message: String,
        payload: Document,
    ) -> Result<Notification, DispatchError> {
        let now = DateTime::now();
        let notification = Notification {
            id: None,
            recipient_id,
            actor_id: actor_id.to_string(),
            subject_id,
            kind,
            title,
            message,
            payload,
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        let persisted = self.repo.insert(notification).await?;
        debug!(id = ?persisted.id, kind = ?persisted.kind, "Notification dispatched");
        Ok(persisted)
    }

    // Recipient resolution runs first so an unowned project never costs
    // name lookups.
    async fn project_context(
        &self,
        actor_id: &str,
        project_id: ObjectId,
    ) -> Result<EventContext, DispatchError> {
        let recipient_id = self
            .recipients
            .resolve(project_id)
            .await?
            .ok_or(DispatchError::RecipientNotFound { project_id })?;
        let actor_name = self.names.resolve_user_name(actor_id).await;
        let project_name = self.names.resolve_project_name(project_id).await;
        Ok(EventContext {
            recipient_id,
            actor_name,
            project_name,
        })
    }

    pub async fn dispatch_expense_event(
        &self,
        actor_id: &str,
        project_id: ObjectId,
        action: ChangeAction,
        event: LedgerEvent,
    ) -> Result<Notification, DispatchError> {
        let ctx = self.project_context(actor_id, project_id).await?;
        let kind = ledger_kind(event.entry, action);
        let message = format!(
            "{} {} an {} of {} in {} on {}",
            ctx.actor_name,
            action.verb(),
            ledger_noun(event.entry),
            format_amount(event.amount),
            event.category,
            ctx.project_name,
        );
        let payload = doc! {
            "amount": event.amount,
            "category": &event.category,
            "actor_name": &ctx.actor_name,
            "project_name": &ctx.project_name,
        };
        self.dispatch(
            ctx.recipient_id,
            actor_id,
            Some(project_id),
            kind,
            kind.title().to_string(),
            message,
            payload,
        )
        .await
    }

    pub async fn dispatch_phase_event(
        &self,
        actor_id: &str,
        project_id: ObjectId,
        action: ChangeAction,
        phase_name: &str,
    ) -> Result<Notification, DispatchError> {
        let ctx = self.project_context(actor_id, project_id).await?;
        let kind = match action {
            ChangeAction::Added => NotificationKind::PhaseAdded,
            ChangeAction::Updated => NotificationKind::PhaseUpdated,
            ChangeAction::Deleted => NotificationKind::PhaseDeleted,
        };
        let message = format!(
            "{} {} the phase \"{}\" on {}",
            ctx.actor_name,
            action.verb(),
            phase_name,
            ctx.project_name,
        );
        let payload = doc! {
            "phase_name": phase_name,
            "actor_name": &ctx.actor_name,
            "project_name": &ctx.project_name,
        };
        self.dispatch(
            ctx.recipient_id,
            actor_id,
            Some(project_id),
            kind,
            kind.title().to_string(),
            message,
            payload,
        )
        .await
    }

    pub async fn dispatch_material_event(
        &self,
        actor_id: &str,
        project_id: ObjectId,
        action: ChangeAction,
        material_name: &str,
        quantity: f64,
        unit: &str,
    ) -> Result<Notification, DispatchError> {
        let ctx = self.project_context(actor_id, project_id).await?;
        let kind = match action {
            ChangeAction::Added => NotificationKind::MaterialAdded,
            ChangeAction::Updated => NotificationKind::MaterialUpdated,
            ChangeAction::Deleted => NotificationKind::MaterialDeleted,
        };
        let message = format!(
            "{} {} material \"{}\" ({} {}) on {}",
            ctx.actor_name,
            action.verb(),
            material_name,
            format_amount(quantity),
            unit,
            ctx.project_name,
        );
        let payload = doc! {
            "material_name": material_name,
            "quantity": quantity,
            "unit": unit,
            "actor_name": &ctx.actor_name,
            "project_name": &ctx.project_name,
        };
        self.dispatch(
            ctx.recipient_id,
            actor_id,
            Some(project_id),
            kind,
            kind.title().to_string(),
            message,
            payload,
        )
        .await
    }

    pub async fn dispatch_project_event(
        &self,
        actor_id: &str,
        project_id: ObjectId,
        change: ProjectChange,
        changed_fields: &[String],
    ) -> Result<Notification, DispatchError> {
        let ctx = self.project_context(actor_id, project_id).await?;
        let (kind, message) = match change {
            ProjectChange::Created => (
                NotificationKind::ProjectCreated,
                format!("{} created the project {}", ctx.actor_name, ctx.project_name),
            ),
            ProjectChange::Updated => {
                let what = if changed_fields.is_empty() {
                    "project details".to_string()
                } else {
                    changed_fields.join(", ")
                };
                (
                    NotificationKind::ProjectUpdated,
                    format!("{} updated {} on {}", ctx.actor_name, what, ctx.project_name),
                )
            }
        };
        let payload = doc! {
            "changed_fields": changed_fields.to_vec(),
            "actor_name": &ctx.actor_name,
            "project_name": &ctx.project_name,
        };
        self.dispatch(
            ctx.recipient_id,
            actor_id,
            Some(project_id),
            kind,
            kind.title().to_string(),
            message,
            payload,
        )
        .await
    }

    /// Account-level events have no project to resolve a recipient from;
    /// the caller addresses them explicitly.
    pub async fn dispatch_user_event(
        &self,
        recipient_id: ObjectId,
        actor_id: &str,
        action: AccountAction,
    ) -> Result<Notification, DispatchError> {
        let actor_name = self.names.resolve_user_name(actor_id).await;
        let (kind, message) = match action {
            AccountAction::Joined => (
                NotificationKind::UserJoined,
                format!("{} joined the workspace", actor_name),
            ),
            AccountAction::Updated => (
                NotificationKind::UserUpdated,
                format!("{} updated their account", actor_name),
            ),
        };
        let payload = doc! { "actor_name": &actor_name };
        self.dispatch(
            recipient_id,
            actor_id,
            None,
            kind,
            kind.title().to_string(),
            message,
            payload,
        )
        .await
    }
}

fn ledger_kind(entry: LedgerEntry, action: ChangeAction) -> NotificationKind {
    match (entry, action) {
        (LedgerEntry::Expense, ChangeAction::Added) => NotificationKind::ExpenseAdded,
        (LedgerEntry::Expense, ChangeAction::Updated) => NotificationKind::ExpenseUpdated,
        (LedgerEntry::Expense, ChangeAction::Deleted) => NotificationKind::ExpenseDeleted,
        (LedgerEntry::Income, ChangeAction::Added) => NotificationKind::IncomeAdded,
        (LedgerEntry::Income, ChangeAction::Updated) => NotificationKind::IncomeUpdated,
        (LedgerEntry::Income, ChangeAction::Deleted) => NotificationKind::IncomeDeleted,
    }
}

fn ledger_noun(entry: LedgerEntry) -> &'static str {
    match entry {
        LedgerEntry::Expense => "expense",
        LedgerEntry::Income => "income",
    }
}

/// Whole amounts render without a trailing ".0" in messages.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        amount.to_string()
    }
}
