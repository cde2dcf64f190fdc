use crate::provider::firebase::{
    FirebaseConfig, DEFAULT_AUTH_URL, DEFAULT_FIRESTORE_URL, DEFAULT_TOKEN_URL,
};
use secrecy::SecretString;
use std::path::PathBuf;

/// Settings shared by every command.
#[derive(Clone)]
pub struct GlobalArgs {
    pub api_key: SecretString,
    pub project_id: String,
    pub auth_url: String,
    pub token_url: String,
    pub firestore_url: String,
    pub idp_token: Option<SecretString>,
    pub cache_path: PathBuf,
    pub collection: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_key: SecretString, project_id: String, cache_path: PathBuf) -> Self {
        Self {
            api_key,
            project_id,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            idp_token: None,
            cache_path,
            collection: crate::auth::USERS_COLLECTION.to_string(),
        }
    }

    #[must_use]
    pub fn firebase_config(&self) -> FirebaseConfig {
        let mut config = FirebaseConfig::new(self.api_key.clone(), self.project_id.clone());
        config.auth_url = trim_base(&self.auth_url);
        config.token_url = trim_base(&self.token_url);
        config.firestore_url = trim_base(&self.firestore_url);
        config.idp_token.clone_from(&self.idp_token);
        config
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("api_key", &"***")
            .field("project_id", &self.project_id)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("firestore_url", &self.firestore_url)
            .field("idp_token", &self.idp_token.as_ref().map(|_| "***"))
            .field("cache_path", &self.cache_path)
            .field("collection", &self.collection)
            .finish()
    }
}
