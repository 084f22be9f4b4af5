use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::handlers::health_check;
use crate::models::{Contact, RepositoryError, ServiceError};
use crate::services::ContactService;

/// Shared application state for the contact endpoints
#[derive(Clone)]
pub struct ApiState {
    pub contact_service: Arc<ContactService>,
}

/// Create the application router with all endpoint bindings
pub fn create_router(contact_service: Arc<ContactService>) -> Router {
    let state = ApiState { contact_service };

    Router::new()
        .route("/", get(health_check))
        .route("/contact", get(list_contacts).post(create_contact))
        .route(
            "/contact/:contact_id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .with_state(state)
}

/// List all contacts
#[instrument(skip(state))]
pub async fn list_contacts(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Contact>>, (StatusCode, Json<Value>)> {
    info!("Listing contacts");

    match state.contact_service.list_contacts().await {
        Ok(contacts) => {
            info!("Successfully listed {} contacts", contacts.len());
            Ok(Json(contacts))
        }
        Err(err) => {
            error!("Failed to list contacts: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Create a new contact
#[instrument(skip(state, body))]
pub async fn create_contact(
    State(state): State<ApiState>,
    Json(body): Json<Value>,
) -> Result<Json<Contact>, (StatusCode, Json<Value>)> {
    info!("Creating new contact");

    match state.contact_service.create_contact(body).await {
        Ok(contact) => {
            info!("Successfully created contact with ID: {}", contact.id);
            Ok(Json(contact))
        }
        Err(err) => {
            error!("Failed to create contact: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific contact by ID
#[instrument(skip(state))]
pub async fn get_contact(
    State(state): State<ApiState>,
    Path(contact_id): Path<String>,
) -> Result<Json<Contact>, (StatusCode, Json<Value>)> {
    info!("Getting contact with ID: {}", contact_id);

    match state.contact_service.get_contact(&contact_id).await {
        Ok(contact) => {
            info!("Successfully retrieved contact");
            Ok(Json(contact))
        }
        Err(err) => {
            error!("Failed to get contact {}: {}", contact_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Update an existing contact
#[instrument(skip(state, body))]
pub async fn update_contact(
    State(state): State<ApiState>,
    Path(contact_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Contact>, (StatusCode, Json<Value>)> {
    info!("Updating contact with ID: {}", contact_id);

    match state.contact_service.update_contact(&contact_id, body).await {
        Ok(contact) => {
            info!("Successfully updated contact");
            Ok(Json(contact))
        }
        Err(err) => {
            error!("Failed to update contact {}: {}", contact_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Delete a contact by ID
#[instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<ApiState>,
    Path(contact_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    info!("Deleting contact with ID: {}", contact_id);

    match state.contact_service.delete_contact(&contact_id).await {
        Ok(()) => {
            info!("Successfully deleted contact: {}", contact_id);
            Ok(Json(json!({
                "message": "Successfully deleted contact!"
            })))
        }
        Err(err) => {
            error!("Failed to delete contact {}: {}", contact_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Convert ServiceError to HTTP response
fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match err {
        ServiceError::ContactNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            RepositoryError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
