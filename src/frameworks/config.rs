use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("GAME_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn auth_service_url() -> String {
    env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:3002".to_string())
}

pub fn auth_verify_timeout() -> Duration {
    let millis = env::var("AUTH_VERIFY_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub fn identity_provider_url() -> String {
    env::var("IDENTITY_PROVIDER_URL").unwrap_or_else(|_| "http://127.0.0.1:3003".to_string())
}

pub fn identity_provider_timeout() -> Duration {
    let millis = env::var("IDENTITY_PROVIDER_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub fn user_store_url() -> String {
    env::var("USER_STORE_URL").unwrap_or_else(|_| "http://127.0.0.1:3004".to_string())
}

pub fn user_store_timeout() -> Duration {
    let millis = env::var("USER_STORE_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}
