// Use cases layer: application workflows for the lobby engine.

pub mod join_policy;
pub mod lobby;
pub mod registry;
pub mod types;

pub use lobby::Lobby;
pub use registry::LobbyRegistry;
