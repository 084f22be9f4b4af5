use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{Contact, RepositoryError, ServiceError, ServiceResult};
use crate::repositories::ContactRepository;

/// Service for managing contact records
///
/// Holds no per-request state; every operation is a single delegation to the
/// repository plus identifier assignment and error mapping.
pub struct ContactService {
    repository: Arc<dyn ContactRepository>,
}

impl ContactService {
    /// Create a new ContactService
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    /// List all contacts
    #[instrument(skip(self))]
    pub async fn list_contacts(&self) -> ServiceResult<Vec<Contact>> {
        info!("Listing contacts");

        let contacts = self.repository.find_all().await?;

        info!("Found {} contacts", contacts.len());
        Ok(contacts)
    }

    /// Get a specific contact by ID
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_contact(&self, id: &str) -> ServiceResult<Contact> {
        info!("Retrieving contact");

        if id.is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Contact ID cannot be empty".to_string(),
            });
        }

        match self.repository.find_by_id(id).await? {
            Some(contact) => {
                info!("Contact found");
                Ok(contact)
            }
            None => {
                warn!("Contact not found");
                Err(ServiceError::ContactNotFound { id: id.to_string() })
            }
        }
    }

    /// Create a new contact from an arbitrary JSON object body
    #[instrument(skip(self, body))]
    pub async fn create_contact(&self, body: Value) -> ServiceResult<Contact> {
        info!("Creating new contact");

        let fields = object_fields(body)?;
        let contact = Contact::new(fields);

        let created = self.repository.create(contact).await?;

        info!("Contact created with ID: {}", created.id);
        Ok(created)
    }

    /// Merge an update body into an existing contact and return the
    /// post-update document
    #[instrument(skip(self, body), fields(id = %id))]
    pub async fn update_contact(&self, id: &str, body: Value) -> ServiceResult<Contact> {
        info!("Updating contact");

        if id.is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Contact ID cannot be empty".to_string(),
            });
        }

        let mut updates = object_fields(body)?;
        updates.remove("id");

        // Nothing to write; the post-update document is the stored one.
        if updates.is_empty() {
            return self.get_contact(id).await;
        }

        match self.repository.update(id, updates).await {
            Ok(contact) => {
                info!("Contact updated");
                Ok(contact)
            }
            Err(RepositoryError::NotFound) => {
                warn!("Contact not found");
                Err(ServiceError::ContactNotFound { id: id.to_string() })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Delete a contact by ID
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_contact(&self, id: &str) -> ServiceResult<()> {
        info!("Deleting contact");

        if id.is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Contact ID cannot be empty".to_string(),
            });
        }

        match self.repository.delete(id).await {
            Ok(()) => {
                info!("Contact deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                warn!("Contact not found");
                Err(ServiceError::ContactNotFound { id: id.to_string() })
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn object_fields(body: Value) -> ServiceResult<Map<String, Value>> {
    match body {
        Value::Object(fields) => Ok(fields),
        other => Err(ServiceError::ValidationError {
            message: format!("Request body must be a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
