use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use contacts_rs::handlers::create_router;
use contacts_rs::models::{Contact, RepositoryError, RepositoryResult};
use contacts_rs::repositories::ContactRepository;
use contacts_rs::services::ContactService;

/// In-memory ContactRepository used to exercise the full HTTP surface
/// without a DynamoDB instance. Mirrors the conditional-write semantics of
/// the real implementation: create fails on duplicates, update and delete
/// fail with NotFound on missing identifiers.
#[derive(Default)]
pub struct InMemoryContactRepository {
    contacts: Mutex<HashMap<String, Contact>>,
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Contact>> {
        let contacts = self.contacts.lock().unwrap();
        Ok(contacts.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Contact>> {
        let contacts = self.contacts.lock().unwrap();
        Ok(contacts.get(id).cloned())
    }

    async fn create(&self, contact: Contact) -> RepositoryResult<Contact> {
        let mut contacts = self.contacts.lock().unwrap();
        if contacts.contains_key(&contact.id) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Contact already exists: {}", contact.id),
            });
        }
        contacts.insert(contact.id.clone(), contact.clone());
        Ok(contact)
    }

    async fn update(&self, id: &str, updates: Map<String, Value>) -> RepositoryResult<Contact> {
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.get_mut(id) {
            Some(contact) => {
                contact.merge_fields(&updates);
                Ok(contact.clone())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let repository = Arc::new(InMemoryContactRepository::default());
        let contact_service = Arc::new(ContactService::new(repository));
        let app = create_router(contact_service);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = Client::new();

        Self { client, base_url }
    }
}
