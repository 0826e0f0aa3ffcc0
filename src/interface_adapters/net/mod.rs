// Network adapter modules split by external client sockets vs internal HTTP routes.

pub mod client;
pub mod internal;

pub use client::ws_handler;
pub use internal::{create_lobby_handler, list_lobbies_handler, lobby_stats_handler};
