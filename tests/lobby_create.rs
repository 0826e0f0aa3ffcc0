mod support;

#[tokio::test]
async fn test_lobby_creation() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let creator_id = format!("creator-{}", uuid::Uuid::new_v4());
    let payload = serde_json::json!({ "creator_id": creator_id });

    let res = client.post(format!("{base_url}/lobbies")).json(&payload).send().await.expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.expect("response should be JSON");
    assert!(body.get("lobby_id").and_then(|v| v.as_str()).is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_lobby_creation_requires_creator_id() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let payload = serde_json::json!({ "creator_id": "" });

    let res = client.post(format!("{base_url}/lobbies")).json(&payload).send().await.expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registry_stats_reflect_created_lobby() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let creator_id = format!("creator-{}", uuid::Uuid::new_v4());
    let payload = serde_json::json!({ "creator_id": creator_id });

    client.post(format!("{base_url}/lobbies")).json(&payload).send().await.expect("create should succeed");

    let stats: serde_json::Value =
        client.get(format!("{base_url}/lobbies/stats")).send().await.expect("stats request should succeed").json().await.expect("stats should be JSON");

    assert!(stats.get("total_lobbies").and_then(|v| v.as_u64()).is_some_and(|n| n >= 1));
}

#[tokio::test]
async fn test_list_lobbies_includes_created_lobby() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();
    let creator_id = format!("creator-{}", uuid::Uuid::new_v4());
    let payload = serde_json::json!({
        "creator_id": creator_id,
        "settings": { "max_players": 12, "rounds": 3, "drawing_time": 120, "public": true, "custom_words_chance": 0, "language": "English" },
    });

    let created: serde_json::Value =
        client.post(format!("{base_url}/lobbies")).json(&payload).send().await.expect("create should succeed").json().await.expect("create response should be JSON");
    let lobby_id = created.get("lobby_id").and_then(|v| v.as_str()).expect("lobby_id present").to_string();

    let lobbies: Vec<serde_json::Value> =
        client.get(format!("{base_url}/lobbies")).send().await.expect("list request should succeed").json().await.expect("list should be JSON");

    assert!(lobbies.iter().any(|l| l.get("id").and_then(|v| v.as_str()) == Some(lobby_id.as_str())));
}
