use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::FindOptions,
    Client, Collection, Database,
};

use crate::error::ApiResult;
use crate::schemas::{Expense, Group, Member, Settlement};

const GROUPS: &str = "Groups";
const MEMBERS: &str = "Members";
const EXPENSES: &str = "Expenses";
const SETTLEMENTS: &str = "Settlements";

/// MongoDB access for every record the ledger keeps, scoped by group.
#[derive(Clone)]
pub struct Store {
    db: Database,
}

impl Store {
    pub fn new(client: &Client, database_name: &str) -> Self {
        Store {
            db: client.database(database_name),
        }
    }

    fn groups(&self) -> Collection<Group> {
        self.db.collection(GROUPS)
    }

    fn members(&self) -> Collection<Member> {
        self.db.collection(MEMBERS)
    }

    fn expenses(&self) -> Collection<Expense> {
        self.db.collection(EXPENSES)
    }

    fn settlements(&self) -> Collection<Settlement> {
        self.db.collection(SETTLEMENTS)
    }

    pub async fn insert_group(&self, group: &Group) -> ApiResult<()> {
        self.groups().insert_one(group, None).await?;
        Ok(())
    }

    pub async fn find_group(&self, group_id: &str) -> ApiResult<Option<Group>> {
        Ok(self.groups().find_one(doc! { "_id": group_id }, None).await?)
    }

    /// Removes the group together with every row that belongs to it.
    pub async fn delete_group(&self, group_id: &str) -> ApiResult<bool> {
        self.clear_ledger(group_id).await?;
        self.members().delete_many(doc! { "group_id": group_id }, None).await?;
        let result = self.groups().delete_one(doc! { "_id": group_id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Drops all expenses and settlements, keeping the group and its members.
    pub async fn clear_ledger(&self, group_id: &str) -> ApiResult<()> {
        self.expenses().delete_many(doc! { "group_id": group_id }, None).await?;
        self.settlements().delete_many(doc! { "group_id": group_id }, None).await?;
        Ok(())
    }

    pub async fn members_of(&self, group_id: &str) -> ApiResult<Vec<Member>> {
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = self.members().find(doc! { "group_id": group_id }, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn insert_member(&self, member: &Member) -> ApiResult<()> {
        self.members().insert_one(member, None).await?;
        Ok(())
    }

    pub async fn rename_member(
        &self,
        group_id: &str,
        member_id: &str,
        name: &str,
    ) -> ApiResult<bool> {
        let result = self
            .members()
            .update_one(
                doc! { "_id": member_id, "group_id": group_id },
                doc! { "$set": { "name": name } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn set_member_flags(
        &self,
        group_id: &str,
        member_id: &str,
        is_group_admin: bool,
        is_program_admin: bool,
    ) -> ApiResult<()> {
        self.members()
            .update_one(
                doc! { "_id": member_id, "group_id": group_id },
                doc! {
                    "$set": {
                        "is_group_admin": is_group_admin,
                        "is_program_admin": is_program_admin,
                    }
                },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn clear_group_admins(&self, group_id: &str) -> ApiResult<()> {
        self.members()
            .update_many(
                doc! { "group_id": group_id },
                doc! { "$set": { "is_group_admin": false } },
                None,
            )
            .await?;
        Ok(())
    }

    /// True while any expense, share or settlement still points at the member.
    pub async fn member_has_dependencies(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> ApiResult<bool> {
        let expenses = self
            .expenses()
            .count_documents(
                doc! {
                    "group_id": group_id,
                    "$or": [
                        { "payer_member_id": member_id },
                        { "shares.member_id": member_id },
                    ],
                },
                None,
            )
            .await?;
        let settlements = self
            .settlements()
            .count_documents(
                doc! {
                    "group_id": group_id,
                    "$or": [
                        { "from_member_id": member_id },
                        { "to_member_id": member_id },
                    ],
                },
                None,
            )
            .await?;
        Ok(expenses + settlements > 0)
    }

    pub async fn delete_member(&self, group_id: &str, member_id: &str) -> ApiResult<bool> {
        let result = self
            .members()
            .delete_one(doc! { "_id": member_id, "group_id": group_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn expenses_of(&self, group_id: &str) -> ApiResult<Vec<Expense>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let cursor = self.expenses().find(doc! { "group_id": group_id }, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_expense(
        &self,
        group_id: &str,
        expense_id: &str,
    ) -> ApiResult<Option<Expense>> {
        Ok(self
            .expenses()
            .find_one(doc! { "_id": expense_id, "group_id": group_id }, None)
            .await?)
    }

    pub async fn insert_expense(&self, expense: &Expense) -> ApiResult<()> {
        self.expenses().insert_one(expense, None).await?;
        Ok(())
    }

    /// Swaps the whole document, so the expense and its shares change together.
    pub async fn replace_expense(&self, expense: &Expense) -> ApiResult<bool> {
        let result = self
            .expenses()
            .replace_one(
                doc! { "_id": expense.id.as_str(), "group_id": expense.group_id.as_str() },
                expense,
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete_expense(&self, group_id: &str, expense_id: &str) -> ApiResult<bool> {
        let result = self
            .expenses()
            .delete_one(doc! { "_id": expense_id, "group_id": group_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn settlements_of(&self, group_id: &str) -> ApiResult<Vec<Settlement>> {
        let cursor = self.settlements().find(doc! { "group_id": group_id }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn insert_settlement(&self, settlement: &Settlement) -> ApiResult<()> {
        self.settlements().insert_one(settlement, None).await?;
        Ok(())
    }
}
