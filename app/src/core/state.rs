use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{
    config::config::Config,
    services::{approval::ApprovalService, audit::AuditTrail},
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    pub fn store_timeout(&self) -> Duration {
        self.config.store_timeout()
    }

    pub fn approvals(&self) -> ApprovalService {
        ApprovalService::new(self.database.clone(), self.store_timeout())
    }

    pub fn audit_trail(&self) -> AuditTrail {
        AuditTrail::new(self.database.clone(), self.store_timeout())
    }
}
