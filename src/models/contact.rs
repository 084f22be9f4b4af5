use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single contact record.
///
/// The schema is deliberately open: beyond the store-assigned `id`, a contact
/// is whatever JSON object the client sent. All top-level fields other than
/// `id` live in the flattened map, so a contact serializes back to the same
/// flat object the client posted, plus the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Store-assigned unique identifier. Immutable after creation.
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Contact {
    /// Create a new contact from a request body, assigning a fresh identifier.
    ///
    /// Any `id` key in the incoming fields is discarded; identity is always
    /// assigned by the service.
    pub fn new(mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        Self {
            id: Uuid::new_v4().to_string(),
            fields,
        }
    }

    /// Merge an update body into this contact, overwriting top-level fields.
    ///
    /// Mirrors a find-one-and-update with the body's fields: existing keys
    /// are replaced, new keys are added, keys absent from the update are left
    /// untouched. The `id` field is never writable.
    pub fn merge_fields(&mut self, updates: &Map<String, Value>) {
        for (key, value) in updates {
            if key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Contact::new(fields(json!({"name": "Alice"})));
        let b = Contact::new(fields(json!({"name": "Bob"})));

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_new_discards_client_supplied_id() {
        let contact = Contact::new(fields(json!({"id": "forged", "name": "Alice"})));

        assert_ne!(contact.id, "forged");
        assert!(!contact.fields.contains_key("id"));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let contact = Contact::new(fields(json!({"name": "Alice", "phone": "555-1000"})));
        let value = serde_json::to_value(&contact).unwrap();

        assert_eq!(value["id"], json!(contact.id));
        assert_eq!(value["name"], json!("Alice"));
        assert_eq!(value["phone"], json!("555-1000"));
    }

    #[test]
    fn test_deserializes_from_flat_object() {
        let contact: Contact =
            serde_json::from_value(json!({"id": "c1", "name": "Alice", "age": 30})).unwrap();

        assert_eq!(contact.id, "c1");
        assert_eq!(contact.fields.get("name"), Some(&json!("Alice")));
        assert_eq!(contact.fields.get("age"), Some(&json!(30)));
    }

    #[test]
    fn test_merge_overwrites_and_adds_fields() {
        let mut contact = Contact::new(fields(json!({"name": "Alice", "phone": "555-1000"})));
        contact.merge_fields(&fields(json!({"phone": "555-2000", "email": "a@example.com"})));

        assert_eq!(contact.fields.get("name"), Some(&json!("Alice")));
        assert_eq!(contact.fields.get("phone"), Some(&json!("555-2000")));
        assert_eq!(contact.fields.get("email"), Some(&json!("a@example.com")));
    }

    #[test]
    fn test_merge_never_touches_id() {
        let mut contact = Contact::new(fields(json!({"name": "Alice"})));
        let original_id = contact.id.clone();
        contact.merge_fields(&fields(json!({"id": "forged"})));

        assert_eq!(contact.id, original_id);
        assert!(!contact.fields.contains_key("id"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut once = Contact::new(fields(json!({"name": "Alice", "phone": "555-1000"})));
        let updates = fields(json!({"phone": "555-2000"}));

        once.merge_fields(&updates);
        let mut twice = once.clone();
        twice.merge_fields(&updates);

        assert_eq!(once, twice);
    }
}
