//! Document store backed by the Firestore REST API. Upserts use `PATCH` with an
//! `updateMask` naming exactly the record's fields, which gives merge semantics:
//! the document is created when missing and untouched fields survive.

use super::{auth::FirebaseAuth, sanitize_body, FirebaseConfig};
use crate::{errors::StoreError, provider::DocumentStore, APP_USER_AGENT};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument};
use url::Url;

/// Supplies the bearer token for document writes.
pub trait TokenSource: Send + Sync {
    fn id_token(&self) -> Option<SecretString>;
}

impl TokenSource for FirebaseAuth {
    fn id_token(&self) -> Option<SecretString> {
        FirebaseAuth::id_token(self)
    }
}

pub struct Firestore {
    client: Client,
    base_url: String,
    project_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl Firestore {
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &FirebaseConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| StoreError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.firestore_url.trim().trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            tokens,
        })
    }

    fn document_url(&self, collection: &str, key: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| StoreError::Config(format!("invalid Firestore URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| StoreError::Config("Firestore URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
                key,
            ]);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    #[instrument(skip(self, record))]
    async fn upsert_merge(
        &self,
        collection: &str,
        key: &str,
        record: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        if collection.trim().is_empty() || key.trim().is_empty() {
            return Err(StoreError::Config(
                "collection and document key are required".to_string(),
            ));
        }
        // Without an update mask the PATCH replaces the whole document.
        if record.is_empty() {
            return Err(StoreError::InvalidRecord);
        }

        let mut url = self.document_url(collection, key)?;
        {
            let mut query = url.query_pairs_mut();
            for field in record.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(field));
            }
        }

        let mut request = self
            .client
            .patch(url)
            .json(&json!({ "fields": encode_fields(record) }));
        if let Some(token) = self.tokens.id_token() {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(collection, fields = record.len(), "profile record upserted");
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthenticated);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Field names outside `[A-Za-z_][A-Za-z0-9_]*` must be backtick-quoted in masks.
fn field_path(field: &str) -> String {
    static SIMPLE: OnceLock<Option<Regex>> = OnceLock::new();
    let simple = SIMPLE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(field));

    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_fields(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Encodes plain JSON as a Firestore typed value.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            // 64-bit integers travel as strings
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            if values.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}
