// Abstract store of per-user identity-provider OAuth tokens. The join policy
// needs the joining user's token for follow/subscribe checks and the lobby
// owner's token for the ban check.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, user: &str) -> Option<TokenSet>;
    async fn set(&self, user: &str, tokens: TokenSet);
}

/// Process-local token cache. A real deployment would back this with the
/// persistent user store; in-process is sufficient here since the engine
/// never needs tokens to outlive the process.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<String, TokenSet>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, user: &str) -> Option<TokenSet> {
        self.tokens.read().unwrap().get(user).cloned()
    }

    async fn set(&self, user: &str, tokens: TokenSet) {
        self.tokens.write().unwrap().insert(user.to_string(), tokens);
    }
}
