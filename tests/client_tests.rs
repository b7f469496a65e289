use hx_thermostat::{Error, HxClient};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/users/sign_in.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})),
        )
        .mount(server)
        .await;
}

async fn authed_client(server: &MockServer) -> HxClient {
    mount_sign_in(server).await;
    let client = HxClient::builder()
        .api_base(server.uri())
        .auth_base(server.uri())
        .build();
    client
        .login("me@example.com", "hunter2")
        .await
        .expect("login should succeed");
    client
}

#[tokio::test]
async fn login_sends_app_identity_and_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/sign_in.json"))
        .and(body_string_contains("JCI-iOS-Thermostat280-id"))
        .and(body_string_contains("me@example.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HxClient::builder()
        .api_base(server.uri())
        .auth_base(server.uri())
        .build();
    assert!(!client.is_authenticated());
    client.login("me@example.com", "hunter2").await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn calls_before_login_fail() {
    let server = MockServer::start().await;
    let client = HxClient::builder()
        .api_base(server.uri())
        .auth_base(server.uri())
        .build();
    let err = client.read_all_properties("AC1").await.unwrap_err();
    assert!(
        matches!(err, Error::NotAuthenticated),
        "expected NotAuthenticated, got {err:?}"
    );
}

#[tokio::test]
async fn requests_carry_auth_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices.json"))
        .and(header("Authorization", "auth_token tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    client.devices().await.expect("devices should succeed");
}

#[tokio::test]
async fn devices_parses_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"device": {
                "dsn": "AC000W000000001",
                "product_name": "Hallway",
                "model": "Hx3",
                "sw_version": "2.8.0",
                "hwsig": "ABC123",
                "connection_status": "Online"
            }}
        ])))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let devices = client.devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].dsn, "AC000W000000001");
    assert_eq!(devices[0].product_name, "Hallway");
    assert!(devices[0].online);
}

#[tokio::test]
async fn read_all_properties_parses_values_and_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dsns/AC1/properties.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"property": {"name": "TmpOvr1", "value": 18506, "key": 10}},
            {"property": {"name": "IDTmp1", "value": 71}}
        ])))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let properties = client.read_all_properties("AC1").await.unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0].name, "TmpOvr1");
    assert_eq!(properties[0].value, json!(18506));
    assert!(properties[0].key.is_some());
    assert!(properties[1].key.is_none());
}

#[tokio::test]
async fn read_all_properties_maps_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dsns/AC1/properties.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let err = client.read_all_properties("AC1").await.unwrap_err();
    assert!(
        matches!(err, Error::RemoteRead { ref dsn, .. } if dsn == "AC1"),
        "expected RemoteRead, got {err:?}"
    );
}

#[tokio::test]
async fn read_property_returns_single_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dsns/AC1/properties/IDTmp1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property": {"name": "IDTmp1", "value": 71}
        })))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let property = client.read_property("AC1", "IDTmp1").await.unwrap();
    assert_eq!(property.name, "IDTmp1");
    assert_eq!(property.value, json!(71));
}

#[tokio::test]
async fn write_datapoint_posts_body_and_returns_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dsns/AC1/properties/TmpOvr1/datapoints.json"))
        .and(body_string_contains("\"value\":18506"))
        .and(body_string_contains("metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datapoint": {"value": 18506, "metadata": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let result = client.write_datapoint("AC1", "TmpOvr1", 18506).await.unwrap();
    assert_eq!(result.confirmed_value, 18506);
}

#[tokio::test]
async fn write_datapoint_maps_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dsns/AC1/properties/TmpOvr1/datapoints.json"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let err = client.write_datapoint("AC1", "TmpOvr1", 18506).await.unwrap_err();
    assert!(
        matches!(err, Error::RemoteWrite { ref property, .. } if property == "TmpOvr1"),
        "expected RemoteWrite, got {err:?}"
    );
}

#[tokio::test]
async fn write_datapoint_rejects_malformed_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dsns/AC1/properties/TmpOvr1/datapoints.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let err = client.write_datapoint("AC1", "TmpOvr1", 18506).await.unwrap_err();
    assert!(matches!(err, Error::RemoteWrite { .. }));
}
