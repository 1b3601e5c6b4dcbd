use std::time::Duration;

use serde_json::json;
use spoolman_vars::{BridgeError, NormalizedSpool, SpoolSource, SpoolmanClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SpoolmanClient {
    // Trailing slash mirrors how users paste the server URL.
    SpoolmanClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).expect("client build")
}

#[tokio::test]
async fn test_fetch_normalizes_filament() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "remaining_weight": 812.5,
            "filament": {
                "id": 9,
                "name": "Red",
                "material": "PLA",
                "settings_extruder_temp": 210,
                "settings_bed_temp": 60.5,
                "vendor": { "id": 1, "name": "Polymaker" },
                "color_hex": "FF0000"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spool = client(&server).fetch(42).await.expect("fetch");

    assert_eq!(
        spool,
        Some(NormalizedSpool {
            id: Some("9".into()),
            hotend_temp: Some("210".into()),
            bed_temp: Some("60.5".into()),
            material: Some("PLA".into()),
            name: Some("Red".into()),
            vendor: Some("Polymaker".into()),
        })
    );
    server.verify().await;
}

#[tokio::test]
async fn test_fetch_without_vendor_or_temps() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "filament": { "id": 3, "material": "PETG", "vendor": "unknown" }
        })))
        .mount(&server)
        .await;

    let spool = client(&server).fetch(5).await.expect("fetch").expect("filament");

    assert_eq!(spool.material.as_deref(), Some("PETG"));
    assert_eq!(spool.name, None);
    assert_eq!(spool.hotend_temp, None);
    assert_eq!(spool.vendor, None);
}

#[tokio::test]
async fn test_fetch_without_filament_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spool/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 2, "filament": {} })))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(client.fetch(1).await.expect("fetch"), None);
    assert_eq!(client.fetch(2).await.expect("fetch"), None);
}

#[tokio::test]
async fn test_fetch_without_filament_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "filament": { "material": "PLA", "name": "Red" }
        })))
        .mount(&server)
        .await;

    let spool = client(&server).fetch(42).await.expect("fetch").expect("filament");

    assert_eq!(
        spool,
        NormalizedSpool {
            material: Some("PLA".into()),
            name: Some("Red".into()),
            ..NormalizedSpool::default()
        }
    );
}

#[tokio::test]
async fn test_fetch_keeps_values_as_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "filament": {
                "id": 3,
                "settings_extruder_temp": "215",
                "settings_bed_temp": 60.0
            }
        })))
        .mount(&server)
        .await;

    let spool = client(&server).fetch(3).await.expect("fetch").expect("filament");

    assert_eq!(spool.id.as_deref(), Some("3"));
    assert_eq!(spool.hotend_temp.as_deref(), Some("215"));
    assert_eq!(spool.bed_temp.as_deref(), Some("60.0"));
}

#[tokio::test]
async fn test_fetch_falsy_filament_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 4, "filament": [] })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).fetch(4).await.expect("fetch"), None);
}

#[tokio::test]
async fn test_fetch_not_found_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "No spool with ID 404 found."
        })))
        .mount(&server)
        .await;

    let err = client(&server).fetch(404).await.expect_err("404");

    match err {
        BridgeError::Status { status, url } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/api/v1/spool/404"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fetch_malformed_body_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/spool/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    assert!(client(&server).fetch(3).await.is_err());
}
