use std::str::FromStr;
use std::sync::Arc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal::{
    api,
    auth::AdminGate,
    config::Settings,
    service::ServiceContext,
    web,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting portal server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let connect_options = SqliteConnectOptions::from_str(&settings.database.url)?
        .create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect_with(connect_options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let admin_gate = Arc::new(AdminGate::new(settings.admin.password.clone()));

    tracing::info!(
        "Announcements: dismissals last {} days, {} shown inline",
        settings.announcements.dismiss_window_days,
        settings.announcements.inline_limit,
    );

    // Create service context
    let service_context = Arc::new(ServiceContext::new(admin_gate, db_pool.clone()));
    let settings = Arc::new(settings);

    // Create API app
    let api_app = api::create_app(service_context.clone(), settings.clone());

    // Create web app state separately
    let web_app_state = api::state::AppState::new(service_context, settings.clone());
    let web_app = web::create_web_routes(web_app_state);

    // Combine API and web routes
    let app = api_app.merge(web_app);

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
