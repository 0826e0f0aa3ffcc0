use std::sync::Arc;

use crate::interface_adapters::clients::auth::AuthClient;
use crate::interface_adapters::clients::identity::HttpIdentityProvider;
use crate::interface_adapters::clients::user_store::UserStoreClient;
use crate::use_cases::join_policy::CachedIdentityProvider;
use crate::use_cases::LobbyRegistry;

#[derive(Clone)]
pub struct AppState {
    // Shared registry of active lobbies.
    pub lobby_registry: Arc<LobbyRegistry>,
    // Outbound auth service client used to verify join session tokens.
    pub auth_client: Arc<AuthClient>,
    // Follow/subscribe/ban checks, TTL-memoized.
    pub identity_provider: Arc<CachedIdentityProvider<HttpIdentityProvider>>,
    // Channel moderator lookups, used to flag admitted players as moderators.
    pub user_store: Arc<UserStoreClient>,
}
