use loan_ledger::{
    adapters::http::{HttpBookService, HttpUserService},
    adapters::memory::InMemoryLoanRepository,
    adapters::postgres::PostgresLoanRepository,
    api::{create_internal_router, create_router, handlers::AppState},
    application::loan::ServiceDependencies,
    config::{Config, StorageConfig},
    ports::LoanRepository,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_ledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Initialize the ledger
    let loan_repository: Arc<dyn LoanRepository> = match &config.storage {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory ledger; loans are lost on restart");
            Arc::new(InMemoryLoanRepository::new())
        }
        StorageConfig::Postgres(database_url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let repository = PostgresLoanRepository::new(pool);
            repository.migrate().await?;
            tracing::info!("Connected to PostgreSQL ledger");
            Arc::new(repository)
        }
    };

    // Initialize collaborators
    let user_service = Arc::new(HttpUserService::new(
        config.user_service_url.clone(),
        config.collaborator_timeout,
    )?);
    let book_service = Arc::new(HttpBookService::new(
        config.book_service_url.clone(),
        config.collaborator_timeout,
    )?);

    let service_deps = ServiceDependencies {
        loan_repository,
        user_service,
        book_service,
        return_period: config.book_return_period,
    };
    let app_state = Arc::new(AppState { service_deps });

    let public_app = create_router(app_state.clone());
    let internal_app = create_internal_router(app_state);

    let public_listener = tokio::net::TcpListener::bind(&config.public_addr).await?;
    let internal_listener = tokio::net::TcpListener::bind(&config.internal_addr).await?;

    tracing::info!("Public API listening on {}", config.public_addr);
    tracing::info!("Internal API listening on {}", config.internal_addr);

    let public_server = async {
        axum::serve(public_listener, public_app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };
    let internal_server = async {
        axum::serve(internal_listener, internal_app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };
    tokio::try_join!(public_server, internal_server)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
