use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::{Expense, LedgerEntry};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ExpenseDao {
    pub base: BaseDao<Expense>,
}

impl ExpenseDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Expense::COLLECTION),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        project_id: ObjectId,
        entry: LedgerEntry,
        amount: f64,
        category: String,
        note: Option<String>,
        created_by: String,
    ) -> DaoResult<Expense> {
        let now = DateTime::now();
        let expense = Expense {
            id: None,
            project_id,
            entry,
            amount,
            category,
            note,
            created_by,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&expense).await?;
        self.base.find_by_id(id).await
    }

    /// Scoped to the owning project so a row can never be addressed
    /// through another project's path.
    pub async fn find_in_project(
        &self,
        expense_id: ObjectId,
        project_id: ObjectId,
    ) -> DaoResult<Expense> {
        self.base
            .find_one(doc! { "_id": expense_id, "project_id": project_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list_for_project(&self, project_id: ObjectId) -> DaoResult<Vec<Expense>> {
        self.base
            .find_many(
                doc! { "project_id": project_id },
                Some(doc! { "created_at": -1 }),
                None,
            )
            .await
    }

    pub async fn update_amount(
        &self,
        expense_id: ObjectId,
        amount: f64,
        category: Option<String>,
    ) -> DaoResult<bool> {
        let mut update = doc! { "amount": amount };
        if let Some(category) = category {
            update.insert("category", category);
        }
        self.base
            .update_by_id(expense_id, doc! { "$set": update })
            .await
    }

    pub async fn delete(&self, expense_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "_id": expense_id }).await
    }
}
