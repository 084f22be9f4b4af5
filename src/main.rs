use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use contacts_rs::{
    handlers::create_router, init_tracing, repositories::DynamoDbContactRepository,
    services::ContactService, Config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;

    init_tracing(
        &config.observability.service_name,
        config.observability.enable_json_logging,
    )?;

    info!("Starting contacts-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB table: contacts={}",
        config.database.contacts_table_name
    );

    // Composition root: client, repository, service, router
    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());
    let contact_repository = Arc::new(DynamoDbContactRepository::new(
        dynamodb_client,
        config.database.contacts_table_name.clone(),
    ));
    let contact_service = Arc::new(ContactService::new(contact_repository));
    info!("Repository and service initialized successfully");

    let app = create_app(contact_service);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(contact_service: Arc<ContactService>) -> Router {
    create_router(contact_service).layer(TraceLayer::new_for_http())
}
