mod client;
mod error;
mod monitor;
mod request;
mod runtime;
mod transport;
mod types;

pub use client::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, Thermostat, ThermostatBuilder};
pub use error::{Error, Result};
pub use monitor::{DEFAULT_CAPACITY, DEFAULT_INTERVAL, MIN_INTERVAL, DeviceError, Monitor, MonitorBuilder, Results, StopHandle};
pub use request::{CONTROL_PATH, ControlRequest, SETTINGS_PATH, SettingsRequest, UpdateRequest};
pub use runtime::Runtime;
pub use transport::{FORM_CONTENT_TYPE, Form, HttpClient, HttpResponse, build_request, decode_body};
pub use types::*;
