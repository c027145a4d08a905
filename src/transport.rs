use std::collections::BTreeMap;
use std::future::Future;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Body, Method, Request, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::{Error, Result};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A response as handed back by an [`HttpClient`].
///
/// The body is kept as raw bytes so a failed decode can still report what
/// the device actually sent. `None` means the response carried no body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: Option<Vec<u8>>) -> Self {
        Self { status, body }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, Some(body.into().into_bytes()))
    }

    pub fn empty() -> Self {
        Self::new(StatusCode::OK, None)
    }
}

/// The network capability a [`Thermostat`](crate::Thermostat) talks through.
///
/// `reqwest::Client` is the production implementation; tests plug in fakes
/// that never open a socket.
pub trait HttpClient: Send + Sync {
    fn execute(&self, request: Request) -> impl Future<Output = Result<HttpResponse>> + Send;
}

impl HttpClient for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<HttpResponse> {
        let resp = reqwest::Client::execute(self, request).await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        let body = if body.is_empty() {
            None
        } else {
            Some(body.to_vec())
        };
        Ok(HttpResponse { status, body })
    }
}

/// Build a bodiless request for `target` carrying the client identification
/// header.
pub fn build_request(method: Method, target: &str, user_agent: &HeaderValue) -> Result<Request> {
    let url = Url::parse(target).map_err(|e| Error::InvalidUrl {
        target: target.to_string(),
        reason: e.to_string(),
    })?;
    let mut request = Request::new(method, url);
    request.headers_mut().insert(USER_AGENT, user_agent.clone());
    Ok(request)
}

/// Decode the response body into `out`. A response without a body leaves
/// `out` untouched. Only the first JSON value is read; anything after it is
/// ignored.
pub fn decode_body<T: DeserializeOwned>(response: &HttpResponse, out: &mut T) -> Result<()> {
    let Some(raw) = response.body.as_deref() else {
        trace!(status = %response.status, "response has no body");
        return Ok(());
    };
    trace!(status = %response.status, bytes = raw.len(), "decoding response body");
    let mut de = serde_json::Deserializer::from_slice(raw);
    *out = T::deserialize(&mut de).map_err(|source| Error::Json {
        source,
        body: String::from_utf8_lossy(raw).into_owned(),
    })?;
    Ok(())
}

/// Form fields for a write request. Keys encode in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form(BTreeMap<&'static str, String>);

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl ToString) {
        self.0.insert(key, value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Write the encoded form onto `request` with matching content type and
    /// length headers.
    pub fn apply(&self, request: &mut Request) {
        let body = self.encode();
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        *request.body_mut() = Some(Body::from(body));
    }
}
