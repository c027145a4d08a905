use reqwest::Request;
use venstar::{
    ControlRequest, DEFAULT_USER_AGENT, Error, HttpClient, HttpResponse, SettingsRequest,
    Thermostat,
};
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn thermostat(server: &MockServer) -> Thermostat {
    let addr = server.address();
    Thermostat::builder(format!("{}:{}", addr.ip(), addr.port()))
        .build()
        .expect("client should build")
}

/// Answers every request with the same body, or fails the way a dead
/// network would.
struct FakeClient {
    body: Option<&'static str>,
}

impl HttpClient for FakeClient {
    async fn execute(&self, _request: Request) -> venstar::Result<HttpResponse> {
        match self.body {
            Some(body) => Ok(HttpResponse::json(body)),
            None => Err(Error::Client("this is an error".to_string())),
        }
    }
}

fn fake(body: Option<&'static str>) -> Thermostat<FakeClient> {
    Thermostat::builder("127.0.0.1")
        .build_with_client(FakeClient { body })
        .unwrap()
}

#[tokio::test]
async fn api_info_sends_user_agent_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "api_ver": 5,
            "type": "residential",
            "model": "COLORTOUCH",
            "firmware": "5.10"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = thermostat(&server).api_info().await.unwrap();
    assert_eq!(info.version, 5);
    assert_eq!(info.model, "COLORTOUCH");
    assert_eq!(info.firmware, "5.10");
    assert_eq!(info.device_type, "residential");
}

#[tokio::test]
async fn query_info_decodes_every_field() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "name": "Hallway",
        "mode": 3,
        "state": 1,
        "fan": 0,
        "fanstate": 1,
        "tempunits": 0,
        "schedule": 1,
        "schedulepart": 255,
        "away": 0,
        "holiday": 1,
        "override": 1,
        "overridetime": 90,
        "forceunocc": 0,
        "spacetemp": 71.5,
        "heattemp": 68.0,
        "cooltemp": 75.0,
        "cooltempmin": 35.0,
        "cooltempmax": 99.0,
        "heattempmin": 35.0,
        "heattempmax": 99.0,
        "activestage": 2,
        "hum_active": 1,
        "hum": 41,
        "hum_setpoint": 35,
        "dehum_setpoint": 60,
        "setpointdelta": 2.0,
        "availablemodes": 1
    });
    Mock::given(method("GET"))
        .and(path("/query/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let info = thermostat(&server).query_info().await.unwrap();
    assert_eq!(info.name, "Hallway");
    assert_eq!(info.mode.as_str(), "auto");
    assert_eq!(info.state.as_str(), "heating");
    assert_eq!(info.fan.as_str(), "auto");
    assert_eq!(info.fan_state.as_str(), "on");
    assert_eq!(info.temp_units.as_str(), "fahrenheit");
    assert_eq!(info.schedule.as_str(), "active");
    assert_eq!(info.schedule_part.as_str(), "inactive");
    assert_eq!(info.away.as_str(), "home");
    assert_eq!(info.holiday.as_str(), "observing");
    assert_eq!(info.override_active.as_str(), "on");
    assert_eq!(info.override_remaining.to_string(), "1h30m0s");
    assert_eq!(info.force_unoccupied.as_str(), "off");
    assert_eq!(info.space_temp, 71.5);
    assert_eq!(info.heat_temp, 68.0);
    assert_eq!(info.cool_temp, 75.0);
    assert_eq!(info.cool_temp_min, 35.0);
    assert_eq!(info.cool_temp_max, 99.0);
    assert_eq!(info.heat_temp_min, 35.0);
    assert_eq!(info.heat_temp_max, 99.0);
    assert_eq!(info.active_stage, 2);
    assert_eq!(info.humidity_enabled.as_str(), "enabled");
    assert_eq!(info.humidity, 41);
    assert_eq!(info.humidify_setpoint, 35);
    assert_eq!(info.dehumidify_setpoint, 60);
    assert_eq!(info.setpoint_delta, 2.0);
    assert_eq!(info.available_modes.as_str(), "heat/cool");
}

#[tokio::test]
async fn query_info_keeps_unmapped_codes() {
    let info = fake(Some(r#"{"mode": 5, "schedulepart": 11}"#))
        .query_info()
        .await
        .unwrap();
    assert_eq!(info.mode.code(), 5);
    assert_eq!(info.mode.to_string(), "");
    assert_eq!(info.schedule_part.code(), 11);
}

#[tokio::test]
async fn sensors_keep_order_and_zero_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query/sensors"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"sensors": [{"name": "Thermostat", "temp": 70.5}, {"name": "Outdoor", "temp": 0}, {}]}"#,
        ))
        .mount(&server)
        .await;

    let sensors = thermostat(&server).query_sensors().await.unwrap();
    assert_eq!(sensors.len(), 3);
    assert_eq!(sensors[0].name, "Thermostat");
    assert_eq!(sensors[0].temp, 70.5);
    assert_eq!(sensors[1].name, "Outdoor");
    assert_eq!(sensors[1].temp, 0.0);
    assert_eq!(sensors[2].name, "");
    assert_eq!(sensors[2].temp, 0.0);
}

#[tokio::test]
async fn alerts_decode() {
    let alerts = fake(Some(
        r#"{"alerts": [{"name": "Air Filter", "active": true}, {"name": "UV Lamp", "active": false}]}"#,
    ))
    .query_alerts()
    .await
    .unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].name, "Air Filter");
    assert!(alerts[0].active);
    assert_eq!(alerts[1].name, "UV Lamp");
    assert!(!alerts[1].active);
}

#[tokio::test]
async fn runtimes_decode_dynamic_stages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query/runtimes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"runtimes": [
                {"ts": 1600984738, "fc": 10, "ov": 20, "heat1": 10, "heat2": 20, "cool1": 10, "aux1": 10},
                {"ts": 1601071138, "cool1": 45, "cool2": 5}
            ]}"#,
        ))
        .mount(&server)
        .await;

    let runtimes = thermostat(&server).query_runtimes().await.unwrap();
    assert_eq!(runtimes.len(), 2);
    let first = &runtimes[0];
    assert_eq!(
        first.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "2020-09-24T21:58:58Z"
    );
    assert_eq!(first.free_cooling.num_seconds(), 600);
    assert_eq!(first.override_time.num_seconds(), 1200);
    assert_eq!(first.heaters.len(), 2);
    assert_eq!(first.coolers.len(), 1);
    assert_eq!(first.aux.len(), 1);
    assert!(runtimes[1].heaters.is_empty());
    assert_eq!(runtimes[1].coolers["2"].num_seconds(), 300);
}

#[tokio::test]
async fn runtime_float_is_decode_error() {
    let err = fake(Some(r#"{"runtimes": [{"float": 1.5}]}"#))
        .query_runtimes()
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.starts_with("processing query runtime request: decoding /query/runtimes response: decoding json: "),
        "got {msg}"
    );
    assert!(msg.contains("1.5"), "got {msg}");
}

#[tokio::test]
async fn network_errors_are_wrapped_per_operation() {
    let t = fake(None);
    let cases = [
        (t.api_info().await.err(), "processing api info request: requesting /: this is an error"),
        (t.query_info().await.err(), "processing query info request: requesting /query/info: this is an error"),
        (t.query_sensors().await.err(), "processing query sensors request: requesting /query/sensors: this is an error"),
        (t.query_runtimes().await.err(), "processing query runtime request: requesting /query/runtimes: this is an error"),
        (t.query_alerts().await.err(), "processing query alerts request: requesting /query/alerts: this is an error"),
        (
            t.update_controls(&ControlRequest::new()).await.err(),
            "processing update control request: requesting /control: this is an error",
        ),
        (
            t.update_settings(&SettingsRequest::new()).await.err(),
            "processing update settings request: requesting /settings: this is an error",
        ),
    ];
    for (err, want) in cases {
        assert_eq!(err.expect("error expected").to_string(), want);
    }
}

#[tokio::test]
async fn unreachable_device_is_http_error() {
    let t = Thermostat::builder("127.0.0.1:9").build().unwrap();
    let err = t.api_info().await.unwrap_err();
    assert!(matches!(err.root(), Error::Http(_)), "got {err:?}");
    assert!(err.to_string().starts_with("processing api info request: requesting /: "));
}

#[tokio::test]
async fn invalid_json_keeps_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query/info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = thermostat(&server).query_info().await.unwrap_err();
    assert!(
        err.to_string()
            .starts_with("processing query info request: decoding /query/info response: decoding json: "),
        "got {err}"
    );
    assert_eq!(err.raw_body(), Some("<html>oops</html>"));
}

#[tokio::test]
async fn update_controls_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .and(body_string("cooltemp=75&fan=1&heattemp=68&mode=3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = ControlRequest::new();
    req.auto(75, 68).fan_on();
    thermostat(&server).update_controls(&req).await.unwrap();
}

#[tokio::test]
async fn update_settings_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/settings"))
        .and(body_string("away=1&tempunits=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = SettingsRequest::new();
    req.celsius().away();
    thermostat(&server).update_settings(&req).await.unwrap();
}

#[tokio::test]
async fn pin_is_sent_with_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/settings"))
        .and(body_string_contains("pin=1597"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut t = thermostat(&server);
    t.set_pin("1597");
    let mut req = SettingsRequest::new();
    req.schedule_on();
    t.update_settings(&req).await.unwrap();
}

#[tokio::test]
async fn validation_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
        .expect(0)
        .mount(&server)
        .await;

    let mut req = ControlRequest::new();
    req.auto(68, 75);
    let err = thermostat(&server).update_controls(&req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "processing update control request: building /control update request: \
         CoolTemp must be greater than HeatTemp when Mode is Auto"
    );
    assert!(matches!(err.root(), Error::Validation(_)));
}

#[tokio::test]
async fn update_response_outcomes() {
    let declared = r#"{"error": true, "reason": "bad reason"}"#;
    let ambiguous = r#"{"success": false}"#;
    let ok = r#"{"success": true}"#;

    let err = fake(Some(declared)).update_controls(&ControlRequest::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Control Request update error: bad reason");
    let err = fake(Some(ambiguous)).update_controls(&ControlRequest::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Control Request unknown error");
    fake(Some(ok)).update_controls(&ControlRequest::new()).await.unwrap();

    let err = fake(Some(declared)).update_settings(&SettingsRequest::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Settings Request update error: bad reason");
    let err = fake(Some(ambiguous)).update_settings(&SettingsRequest::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Settings Request unknown error");
    fake(Some(ok)).update_settings(&SettingsRequest::new()).await.unwrap();
}

#[tokio::test]
async fn empty_update_reply_is_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = thermostat(&server)
        .update_controls(&ControlRequest::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Control Request unknown error");
}
