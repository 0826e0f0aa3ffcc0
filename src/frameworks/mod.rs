// Frameworks layer: process bootstrap, configuration, and the HTTP/WS server.

pub mod config;
pub mod server;
