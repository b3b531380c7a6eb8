use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::try_join;
use tracing::{error, warn};

use crate::{
    core::{
        error::{bounded, CoreError, StoreCall},
        identity::Identity,
        state::AppState,
    },
    models::account::Model as Account,
    repos::accounts::AccountsRepo,
    services::{
        directory::{MembershipSource, StoreMembershipSource},
        roles::Capabilities,
    },
    utils::{jwt::verify_jwt, response::APIError},
};

/// Per-request view of the caller, rebuilt from the store on every request.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub capabilities: Arc<Capabilities>,
}

async fn load_session(state: &AppState, identity: &Identity) -> Result<Session, CoreError> {
    let timeout = state.config.store_timeout();
    let accounts = AccountsRepo::new(state.database.clone());
    let source = StoreMembershipSource::new(state.database.clone(), timeout);

    let profile = bounded(timeout, StoreCall::Read, async {
        accounts
            .get(&identity.account_id)
            .await
            .map_err(CoreError::from_load)
    });
    let (account, memberships) =
        try_join(profile, source.load_memberships(&identity.account_id)).await?;

    let capabilities = Capabilities::resolve(&account.id, account.global_role, &memberships);
    Ok(Session {
        account,
        capabilities: Arc::new(capabilities),
    })
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(tok) if tok.starts_with("Bearer ") => &tok[7..],
        _ => {
            warn!("Auth Failed, Missing or invalid authorization header");
            return APIError::UnAuthorized.into_response();
        }
    };

    let identity: Identity = match verify_jwt(token, &state.config.jwt_secret) {
        Ok(claims) => claims.into(),
        Err(e) => {
            warn!("Auth Failed, Invalid token: {}", e);
            return APIError::UnAuthorized.into_response();
        }
    };

    let session = match load_session(&state, &identity).await {
        Ok(session) => session,
        Err(CoreError::NotFound(what)) => {
            warn!("No {} yet, rejecting request", what);
            return APIError::UnAuthorized.into_response();
        }
        Err(e) => {
            error!("Failed to load session for {}: {}", identity.account_id, e);
            return APIError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}
