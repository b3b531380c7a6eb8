use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::models::membership::{self, Entity as MembershipEntity, Model as Membership};

pub struct MembershipsRepo {
    db: DatabaseConnection,
}

impl MembershipsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Memberships of an account, oldest first.
    pub async fn get_for_account(&self, account_id: &str) -> Result<Vec<Membership>, DbErr> {
        MembershipEntity::find()
            .filter(membership::Column::AccountId.eq(account_id))
            .order_by_asc(membership::Column::CreatedAt)
            .order_by_asc(membership::Column::Id)
            .all(&self.db)
            .await
    }
}
