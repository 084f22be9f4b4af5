use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::models::{Contact, RepositoryError, RepositoryResult};

/// Trait defining the interface for contact data access operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Find all contacts in the collection
    async fn find_all(&self) -> RepositoryResult<Vec<Contact>>;

    /// Find a contact by its ID
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Contact>>;

    /// Create a new contact
    async fn create(&self, contact: Contact) -> RepositoryResult<Contact>;

    /// Merge the given top-level fields into an existing contact and return
    /// the post-update document
    async fn update(&self, id: &str, updates: Map<String, Value>) -> RepositoryResult<Contact>;

    /// Delete a contact by its ID
    async fn delete(&self, id: &str) -> RepositoryResult<()>;
}

/// Convert a JSON value to a DynamoDB attribute value
pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(key, value)| (key.clone(), json_to_attribute(value)))
                .collect(),
        ),
    }
}

/// Convert a DynamoDB attribute value back to JSON
///
/// String and number sets decode to arrays so documents written by other
/// clients stay readable. Binary attributes have no JSON representation and
/// are rejected.
pub fn attribute_to_json(value: &AttributeValue) -> RepositoryResult<Value> {
    match value {
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::L(list) => Ok(Value::Array(
            list.iter()
                .map(attribute_to_json)
                .collect::<RepositoryResult<Vec<_>>>()?,
        )),
        AttributeValue::M(map) => {
            let mut object = Map::new();
            for (key, value) in map {
                object.insert(key.clone(), attribute_to_json(value)?);
            }
            Ok(Value::Object(object))
        }
        AttributeValue::Ss(set) => Ok(Value::Array(
            set.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(set) => Ok(Value::Array(
            set.iter()
                .map(|n| parse_number(n))
                .collect::<RepositoryResult<Vec<_>>>()?,
        )),
        other => Err(RepositoryError::InvalidItem {
            message: format!("Unsupported attribute type: {:?}", other),
        }),
    }
}

fn parse_number(digits: &str) -> RepositoryResult<Value> {
    if let Ok(integer) = digits.parse::<i64>() {
        return Ok(Value::Number(integer.into()));
    }
    if let Ok(unsigned) = digits.parse::<u64>() {
        return Ok(Value::Number(unsigned.into()));
    }
    let float: f64 = digits.parse().map_err(|_| RepositoryError::InvalidItem {
        message: format!("Invalid numeric attribute: {}", digits),
    })?;
    serde_json::Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Non-finite numeric attribute: {}", digits),
        })
}

/// Convert a Contact to DynamoDB attribute values
pub fn contact_to_item(contact: &Contact) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("id".to_string(), AttributeValue::S(contact.id.clone()));
    for (key, value) in &contact.fields {
        if key == "id" {
            continue;
        }
        item.insert(key.clone(), json_to_attribute(value));
    }
    item
}

/// Convert a DynamoDB item to a Contact
pub fn item_to_contact(item: HashMap<String, AttributeValue>) -> RepositoryResult<Contact> {
    let mut id = None;
    let mut fields = Map::new();

    for (key, value) in item {
        if key == "id" {
            match value {
                AttributeValue::S(s) => id = Some(s),
                other => {
                    return Err(RepositoryError::InvalidItem {
                        message: format!("Attribute id is not a string: {:?}", other),
                    })
                }
            }
        } else {
            fields.insert(key, attribute_to_json(&value)?);
        }
    }

    let id = id.ok_or_else(|| RepositoryError::InvalidItem {
        message: "Missing id attribute".to_string(),
    })?;

    Ok(Contact { id, fields })
}

/// DynamoDB implementation of the ContactRepository trait
pub struct DynamoDbContactRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
}

impl DynamoDbContactRepository {
    /// Create a new DynamoDB contact repository
    pub fn new(client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        match error {
            DynamoDbError::ConditionalCheckFailedException(_) => {
                RepositoryError::ConstraintViolation {
                    message: "Condition expression failed".to_string(),
                }
            }
            DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
                table_name: self.table_name.clone(),
            },
            DynamoDbError::ProvisionedThroughputExceededException(_)
            | DynamoDbError::RequestLimitExceeded(_) => RepositoryError::RateLimitExceeded,
            other => {
                error!("DynamoDB error: {:?}", other);
                RepositoryError::AwsSdk {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl ContactRepository for DynamoDbContactRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Contact>> {
        info!("Scanning all contacts");

        let response = self
            .client
            .scan()
            .table_name(&self.table_name)
            .select(Select::AllAttributes)
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        let mut contacts = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match item_to_contact(item) {
                    Ok(contact) => contacts.push(contact),
                    Err(e) => {
                        warn!("Failed to parse contact item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} contacts", contacts.len());
        Ok(contacts)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Contact>> {
        info!("Finding contact by ID");

        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        match response.item {
            Some(item) => {
                let contact = item_to_contact(item)?;
                info!("Contact found");
                Ok(Some(contact))
            }
            None => {
                info!("Contact not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, contact), fields(table = %self.table_name, id = %contact.id))]
    async fn create(&self, contact: Contact) -> RepositoryResult<Contact> {
        info!("Creating new contact");

        let item = contact_to_item(&contact);

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        info!("Contact created successfully");
        Ok(contact)
    }

    #[instrument(skip(self, updates), fields(table = %self.table_name, id = %id))]
    async fn update(&self, id: &str, updates: Map<String, Value>) -> RepositoryResult<Contact> {
        info!("Updating contact");

        let mut assignments = Vec::new();
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for (index, (key, value)) in updates
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .enumerate()
        {
            let name = format!("#f{}", index);
            let placeholder = format!(":v{}", index);
            assignments.push(format!("{} = {}", name, placeholder));
            names.insert(name, key.clone());
            values.insert(placeholder, json_to_attribute(value));
        }

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)")
            .return_values(ReturnValue::AllNew);

        if !assignments.is_empty() {
            request = request
                .update_expression(format!("SET {}", assignments.join(", ")))
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values));
        }

        let response = request.send().await.map_err(|e| {
            match self.map_dynamodb_error(e.into()) {
                // The only condition on this request is attribute_exists(id)
                RepositoryError::ConstraintViolation { .. } => RepositoryError::NotFound,
                other => other,
            }
        })?;

        let attributes = response.attributes.ok_or_else(|| RepositoryError::InvalidItem {
            message: "Update returned no attributes".to_string(),
        })?;

        let contact = item_to_contact(attributes)?;
        info!("Contact updated successfully");
        Ok(contact)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        info!("Deleting contact");

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| match self.map_dynamodb_error(e.into()) {
                RepositoryError::ConstraintViolation { .. } => RepositoryError::NotFound,
                other => other,
            })?;

        info!("Contact deleted successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_contact() -> Contact {
        let body = json!({
            "name": "Alice",
            "phone": "555-1000",
            "age": 30,
            "tags": ["friend", "work"],
            "address": {"city": "Springfield", "zip": "12345"},
            "verified": true,
            "notes": null
        });
        match body {
            Value::Object(fields) => Contact::new(fields),
            _ => unreachable!(),
        }
    }

    fn offline_client() -> Arc<DynamoDbClient> {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        Arc::new(DynamoDbClient::from_conf(config))
    }

    #[test]
    fn test_contact_to_item_conversion() {
        let contact = test_contact();
        let item = contact_to_item(&contact);

        assert_eq!(
            item.get("id"),
            Some(&AttributeValue::S(contact.id.clone()))
        );
        assert_eq!(item.get("name"), Some(&AttributeValue::S("Alice".into())));
        assert_eq!(item.get("age"), Some(&AttributeValue::N("30".into())));
        assert_eq!(item.get("verified"), Some(&AttributeValue::Bool(true)));
        assert_eq!(item.get("notes"), Some(&AttributeValue::Null(true)));

        match item.get("tags") {
            Some(AttributeValue::L(tags)) => assert_eq!(tags.len(), 2),
            other => panic!("Expected list value for tags, got {:?}", other),
        }
        match item.get("address") {
            Some(AttributeValue::M(address)) => {
                assert_eq!(
                    address.get("city"),
                    Some(&AttributeValue::S("Springfield".into()))
                );
            }
            other => panic!("Expected map value for address, got {:?}", other),
        }
    }

    #[test]
    fn test_item_to_contact_round_trip() {
        let contact = test_contact();
        let item = contact_to_item(&contact);
        let converted = item_to_contact(item).unwrap();

        assert_eq!(converted, contact);
    }

    #[test]
    fn test_item_to_contact_missing_id() {
        let mut item = contact_to_item(&test_contact());
        item.remove("id");

        let result = item_to_contact(item);
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_item_to_contact_non_string_id() {
        let mut item = contact_to_item(&test_contact());
        item.insert("id".to_string(), AttributeValue::N("42".to_string()));

        let result = item_to_contact(item);
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_attribute_to_json_number_widths() {
        assert_eq!(
            attribute_to_json(&AttributeValue::N("42".to_string())).unwrap(),
            json!(42)
        );
        assert_eq!(
            attribute_to_json(&AttributeValue::N("18446744073709551615".to_string())).unwrap(),
            json!(18446744073709551615u64)
        );
        assert_eq!(
            attribute_to_json(&AttributeValue::N("2.5".to_string())).unwrap(),
            json!(2.5)
        );
        assert!(attribute_to_json(&AttributeValue::N("not-a-number".to_string())).is_err());
    }

    #[test]
    fn test_attribute_to_json_sets_decode_to_arrays() {
        let strings = AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(attribute_to_json(&strings).unwrap(), json!(["a", "b"]));

        let numbers = AttributeValue::Ns(vec!["1".to_string(), "2".to_string()]);
        assert_eq!(attribute_to_json(&numbers).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_attribute_to_json_rejects_binary() {
        let binary = AttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(vec![1, 2, 3]));
        assert!(matches!(
            attribute_to_json(&binary),
            Err(RepositoryError::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_repository_creation() {
        let repo = DynamoDbContactRepository::new(offline_client(), "test-table".to_string());
        assert_eq!(repo.table_name(), "test-table");
    }

    // Integration tests against a real DynamoDB instance live in the tests/
    // directory behind an in-memory repository; exercising this implementation
    // end to end requires LocalStack or testcontainers.
}
