use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::config::Config,
    core::state::AppState,
    database::connect::{connect_database, run_migrations},
    routes::create_routers,
};

pub async fn create_server(config: Config) -> Result<(Router<()>, DatabaseConnection)> {
    let db_conn = connect_database(&config).await?;
    run_migrations(&db_conn).await?;

    let mut cors = CorsLayer::new();
    if let Some(origin) = &config.cors_origin {
        cors = cors
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    }

    let state = AppState {
        database: db_conn.clone(),
        config,
    };

    let app = create_routers(Arc::new(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok((app, db_conn))
}
