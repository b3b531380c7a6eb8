use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

use crate::models::account::{Entity as AccountEntity, Model as Account};

pub struct AccountsRepo {
    db: DatabaseConnection,
}

impl AccountsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Profile row for an account. Missing rows are `RecordNotFound`, never a default role.
    pub async fn get(&self, account_id: &str) -> Result<Account, DbErr> {
        AccountEntity::find_by_id(account_id.to_string())
            .one(&self.db)
            .await?
            .ok_or(DbErr::RecordNotFound(format!(
                "profile for account {}",
                account_id
            )))
    }
}
