//! Resolving a principal id to a delivery address.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_parse, env_required};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{NotificationError, NotificationResult};
use crate::models::Contact;

#[async_trait]
pub trait ContactResolver: Send + Sync {
    /// `None` when the identity provider has no such user or no address for it.
    async fn resolve(&self, user_id: &str) -> NotificationResult<Option<Contact>>;
}

/// Identity provider user API settings.
#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// Base URL; users are fetched from `{base_url}/users/{id}`.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl FromEnv for ContactConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_required("IDENTITY_API_URL")?,
            api_key: env_required("IDENTITY_API_KEY")?,
            timeout: Duration::from_secs(env_parse("IDENTITY_API_TIMEOUT_SECS", 10u64)?),
        })
    }
}

#[derive(serde::Deserialize)]
struct UserRecord {
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Looks users up over HTTP with a bearer API key.
#[derive(Clone)]
pub struct HttpContactResolver {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpContactResolver {
    pub fn new(config: ContactConfig) -> NotificationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl ContactResolver for HttpContactResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, user_id: &str) -> NotificationResult<Option<Contact>> {
        let response = self
            .client
            .get(format!("{}/users/{}", self.base_url, user_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(NotificationError::Lookup(format!(
                    "identity provider answered {status}"
                )));
            }
            _ => {}
        }

        let user: UserRecord = response.json().await?;
        Ok(user
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|email| Contact {
                email,
                name: user.name,
            }))
    }
}

/// Fixed map of principal ids to contacts.
#[derive(Clone, Default)]
pub struct InMemoryContactResolver {
    contacts: Arc<RwLock<HashMap<String, Contact>>>,
}

impl InMemoryContactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: impl Into<String>, contact: Contact) {
        self.contacts.write().await.insert(user_id.into(), contact);
    }
}

#[async_trait]
impl ContactResolver for InMemoryContactResolver {
    async fn resolve(&self, user_id: &str) -> NotificationResult<Option<Contact>> {
        Ok(self.contacts.read().await.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Path, http::HeaderMap, routing::get};
    use serde_json::{Value, json};

    async fn user(Path(id): Path<String>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        match id.as_str() {
            "alice" => (
                StatusCode::OK,
                Json(json!({ "id": "alice", "email": "alice@example.com", "name": "Alice" })),
            ),
            "noemail" => (StatusCode::OK, Json(json!({ "id": "noemail", "email": null }))),
            "broken" => (StatusCode::BAD_GATEWAY, Json(json!({}))),
            _ => (StatusCode::NOT_FOUND, Json(json!({}))),
        }
    }

    async fn serve() -> String {
        let app = Router::new().route("/users/{id}", get(user));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn resolver(base_url: String, api_key: &str) -> HttpContactResolver {
        HttpContactResolver::new(ContactConfig {
            base_url,
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_resolver_maps_responses() {
        let base = serve().await;
        let resolver = resolver(base, "key");

        let alice = resolver.resolve("alice").await.unwrap().unwrap();
        assert_eq!(alice.email, "alice@example.com");
        assert_eq!(alice.name.as_deref(), Some("Alice"));

        assert!(resolver.resolve("ghost").await.unwrap().is_none());
        assert!(resolver.resolve("noemail").await.unwrap().is_none());
        assert!(matches!(
            resolver.resolve("broken").await,
            Err(NotificationError::Lookup(_))
        ));
    }

    #[tokio::test]
    async fn test_http_resolver_rejected_key_is_lookup_error() {
        let base = serve().await;
        let err = resolver(base, "wrong").resolve("alice").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_in_memory_resolver() {
        let resolver = InMemoryContactResolver::new();
        resolver
            .insert("bob", Contact::new("bob@example.com"))
            .await;
        assert_eq!(
            resolver.resolve("bob").await.unwrap(),
            Some(Contact::new("bob@example.com"))
        );
        assert!(resolver.resolve("alice").await.unwrap().is_none());
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("IDENTITY_API_URL", Some("https://id.example.com/api")),
                ("IDENTITY_API_KEY", Some("secret")),
                ("IDENTITY_API_TIMEOUT_SECS", None),
            ],
            || {
                let config = ContactConfig::from_env().unwrap();
                assert_eq!(config.base_url, "https://id.example.com/api");
                assert_eq!(config.timeout, Duration::from_secs(10));
            },
        );

        temp_env::with_var_unset("IDENTITY_API_URL", || {
            assert!(matches!(
                ContactConfig::from_env(),
                Err(ConfigError::MissingEnvVar(_))
            ));
        });
    }
}
