use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ResultExt;
use crate::request::{ControlRequest, SettingsRequest, UpdateRequest};
use crate::runtime::Runtime;
use crate::transport::{HttpClient, build_request, decode_body};
use crate::types::*;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_USER_AGENT: &str = concat!("venstar-rs/", env!("CARGO_PKG_VERSION"));

const PATH_API_INFO: &str = "/";
const PATH_QUERY_INFO: &str = "/query/info";
const PATH_QUERY_SENSORS: &str = "/query/sensors";
const PATH_QUERY_RUNTIMES: &str = "/query/runtimes";
const PATH_QUERY_ALERTS: &str = "/query/alerts";

pub struct ThermostatBuilder {
    host: String,
    scheme: String,
    timeout: Duration,
    user_agent: String,
    pin: Option<String>,
}

impl ThermostatBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: "http".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pin: None,
        }
    }

    pub fn scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Per-request timeout of the built-in reqwest client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    pub fn build(self) -> Result<Thermostat> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;
        self.build_with_client(http)
    }

    /// Build on top of any [`HttpClient`]. The timeout setting only applies
    /// to the built-in reqwest client.
    pub fn build_with_client<C: HttpClient>(self, client: C) -> Result<Thermostat<C>> {
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| Error::Config(format!("user agent {:?}: {e}", self.user_agent)))?;
        Ok(Thermostat {
            client,
            base_url: format!("{}://{}", self.scheme, self.host),
            host: self.host,
            user_agent,
            pin: self.pin,
        })
    }
}

/// Client for a single thermostat's local API.
pub struct Thermostat<C = reqwest::Client> {
    client: C,
    host: String,
    base_url: String,
    user_agent: HeaderValue,
    pin: Option<String>,
}

impl Thermostat {
    pub fn builder(host: impl Into<String>) -> ThermostatBuilder {
        ThermostatBuilder::new(host)
    }

    /// Plain-HTTP client for `host` with default settings.
    pub fn new(host: impl Into<String>) -> Result<Self> {
        ThermostatBuilder::new(host).build()
    }
}

impl<C: HttpClient> Thermostat<C> {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn pin(&self) -> Option<&str> {
        self.pin.as_deref()
    }

    /// Set the unlock code sent with every control and settings update.
    pub fn set_pin(&mut self, pin: impl Into<String>) {
        self.pin = Some(pin.into());
    }

    pub async fn api_info(&self) -> Result<ApiInfo> {
        let mut info = ApiInfo::default();
        self.get_json(PATH_API_INFO, &mut info)
            .await
            .context(|| "processing api info request")?;
        Ok(info)
    }

    pub async fn query_info(&self) -> Result<QueryInfo> {
        let mut info = QueryInfo::default();
        self.get_json(PATH_QUERY_INFO, &mut info)
            .await
            .context(|| "processing query info request")?;
        Ok(info)
    }

    pub async fn query_sensors(&self) -> Result<Vec<Sensor>> {
        let mut resp = QueryResponse::default();
        self.get_json(PATH_QUERY_SENSORS, &mut resp)
            .await
            .context(|| "processing query sensors request")?;
        Ok(resp.sensors)
    }

    pub async fn query_runtimes(&self) -> Result<Vec<Runtime>> {
        let mut resp = QueryResponse::default();
        self.get_json(PATH_QUERY_RUNTIMES, &mut resp)
            .await
            .context(|| "processing query runtime request")?;
        Ok(resp.runtimes)
    }

    pub async fn query_alerts(&self) -> Result<Vec<Alert>> {
        let mut resp = QueryResponse::default();
        self.get_json(PATH_QUERY_ALERTS, &mut resp)
            .await
            .context(|| "processing query alerts request")?;
        Ok(resp.alerts)
    }

    pub async fn update_controls(&self, request: &ControlRequest) -> Result<()> {
        self.update(request)
            .await
            .context(|| "processing update control request")?
            .check(ControlRequest::KIND)
    }

    pub async fn update_settings(&self, request: &SettingsRequest) -> Result<()> {
        self.update(request)
            .await
            .context(|| "processing update settings request")?
            .check(SettingsRequest::KIND)
    }

    // -- Helpers --

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, out: &mut T) -> Result<()> {
        let request = build_request(Method::GET, &self.url(path), &self.user_agent)
            .context(|| format!("building {path} request"))?;
        debug!(url = %request.url(), "GET");
        self.execute_json(path, request, out).await
    }

    async fn update<U: UpdateRequest>(&self, update: &U) -> Result<UpdateResponse> {
        let path = U::PATH;
        let mut request = build_request(Method::POST, &self.url(path), &self.user_agent)
            .context(|| format!("building {path} request"))?;
        let fields = update
            .build_request(&mut request, self.pin.as_deref())
            .context(|| format!("building {path} update request"))?;
        debug!(url = %request.url(), kind = U::KIND, fields, "POST");

        let mut resp = UpdateResponse::default();
        self.execute_json(path, request, &mut resp).await?;
        Ok(resp)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::Request,
        out: &mut T,
    ) -> Result<()> {
        let resp = self
            .client
            .execute(request)
            .await
            .context(|| format!("requesting {path}"))?;
        if !resp.status.is_success() {
            debug!(path, status = %resp.status, "device answered with non-success status");
        }
        decode_body(&resp, out).context(|| format!("decoding {path} response"))
    }
}

impl UpdateResponse {
    /// Turn the device's reply into an outcome for a request of `kind`.
    fn check(self, kind: &'static str) -> Result<()> {
        if self.error {
            return Err(Error::Update {
                kind,
                reason: self.reason.unwrap_or_default(),
            });
        }
        if !self.success {
            return Err(Error::UnknownUpdate { kind });
        }
        Ok(())
    }
}
