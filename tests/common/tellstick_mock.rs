//! WireMock-based TellStick Local API mocking
//!
//! Simulates the controller's `/api/...` endpoints so the HTTP client and
//! the bridge can be tested without hardware.

use serde_json::{json, Value};
use std::time::Duration;
use tellstick_bridge::BridgeConfig;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use super::test_fixtures::no_pacing;

pub const TEST_TOKEN: &str = "test-token";

/// Mock TellStick controller for testing
pub struct MockTellstickServer {
    pub server: MockServer,
}

impl MockTellstickServer {
    /// Start a server with no endpoints mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Bridge configuration pointing at this server
    pub fn config(&self) -> BridgeConfig {
        BridgeConfig {
            ip: self.server.uri(),
            access_token: TEST_TOKEN.to_string(),
            timeout: Duration::from_secs(2),
            max_retries: 0,
            pacing: no_pacing(),
            ..Default::default()
        }
    }

    fn get(endpoint: &str) -> wiremock::MockBuilder {
        Mock::given(method("GET"))
            .and(path(format!("/api/{endpoint}")))
            .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
    }

    pub async fn mock_system_info(&self, product: &str, version: &str) {
        Self::get("system/info")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "product": product,
                "version": version,
                "time": "2024-01-01T12:00:00Z"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_sensor_list(&self, sensors: Value) {
        Self::get("sensors/list")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sensor": sensors })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_device_list(&self, devices: Value) {
        Self::get("devices/list")
            .and(query_param("supportedMethods", "1023"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "device": devices })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_sensor_info(&self, id: u64, body: Value) {
        Self::get("sensor/info")
            .and(query_param("id", id.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_device_info(&self, id: u64, body: Value) {
        Self::get("device/info")
            .and(query_param("id", id.to_string().as_str()))
            .and(query_param("supportedMethods", "1023"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Accept a command endpoint, expecting exactly `times` calls
    pub async fn mock_command(&self, endpoint: &str, query: &[(&str, &str)], times: u64) {
        let mut builder = Self::get(endpoint);
        for (key, value) in query {
            builder = builder.and(query_param(*key, *value));
        }
        builder
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Answer an endpoint with a controller error body
    pub async fn mock_error(&self, endpoint: &str, message: &str) {
        Self::get(endpoint)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": message })))
            .mount(&self.server)
            .await;
    }

    /// Answer an endpoint with a bare HTTP status
    pub async fn mock_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{endpoint}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}
