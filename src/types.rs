use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runtime::Runtime;

/// Defines a raw integer code from `/query/info` together with its
/// canonical display string. Unmapped codes keep their value and render as
/// an empty string.
macro_rules! code {
    ($(#[$meta:meta])* $name:ident { $($value:literal => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            pub fn code(&self) -> i32 {
                self.0
            }

            pub fn as_str(&self) -> &'static str {
                match self.0 {
                    $($value => $label,)+
                    _ => "",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code!(
    /// Thermostat operating mode.
    Mode { 0 => "off", 1 => "heat", 2 => "cool", 3 => "auto" }
);
code!(State { 0 => "idle", 1 => "heating", 2 => "cooling", 3 => "lockout", 4 => "error" });
code!(Fan { 0 => "auto", 1 => "on" });
code!(FanState { 0 => "off", 1 => "on" });
code!(TempUnits { 0 => "fahrenheit", 1 => "celsius" });
code!(
    /// Whether the stored schedule is being followed.
    Schedule { 0 => "inactive", 1 => "active" }
);
code!(
    /// Active segment of the daily schedule. 255 means no schedule is running.
    SchedulePart { 0 => "morning", 1 => "day", 2 => "evening", 3 => "night", 255 => "inactive" }
);
code!(Away { 0 => "home", 1 => "away" });
code!(Holiday { 0 => "not observing", 1 => "observing" });
code!(Override { 0 => "off", 1 => "on" });
code!(ForceUnoccupied { 0 => "off", 1 => "on" });
code!(HumidityEnabled { 0 => "disabled", 1 => "enabled" });
code!(AvailableModes { 0 => "all", 1 => "heat/cool", 2 => "heat", 3 => "cool" });

/// Minutes left on a manual override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideRemaining(pub i64);

impl OverrideRemaining {
    pub fn minutes(&self) -> i64 {
        self.0
    }

    /// Remaining time, clamped at zero.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.0.max(0).unsigned_abs().saturating_mul(60))
    }
}

impl fmt::Display for OverrideRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        let minutes = Duration::from_secs(self.0.unsigned_abs().saturating_mul(60));
        f.write_str(&format_duration(minutes))
    }
}

/// Render a duration the way the device tooling prints them: `0s`, `45s`,
/// `10m0s`, `1h30m0s`. Sub-second precision is dropped.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Device identity returned by `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiInfo {
    #[serde(rename = "api_ver")]
    pub version: i32,
    pub model: String,
    pub firmware: String,
    #[serde(rename = "type")]
    pub device_type: String,
}

/// Live state returned by `GET /query/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryInfo {
    pub name: String,
    pub mode: Mode,
    pub state: State,
    pub fan: Fan,
    #[serde(rename = "fanstate")]
    pub fan_state: FanState,
    #[serde(rename = "tempunits")]
    pub temp_units: TempUnits,
    pub schedule: Schedule,
    #[serde(rename = "schedulepart")]
    pub schedule_part: SchedulePart,
    pub away: Away,
    pub holiday: Holiday,
    #[serde(rename = "override")]
    pub override_active: Override,
    #[serde(rename = "overridetime")]
    pub override_remaining: OverrideRemaining,
    #[serde(rename = "forceunocc")]
    pub force_unoccupied: ForceUnoccupied,
    #[serde(rename = "spacetemp")]
    pub space_temp: f64,
    #[serde(rename = "heattemp")]
    pub heat_temp: f64,
    #[serde(rename = "cooltemp")]
    pub cool_temp: f64,
    #[serde(rename = "cooltempmin")]
    pub cool_temp_min: f64,
    #[serde(rename = "cooltempmax")]
    pub cool_temp_max: f64,
    #[serde(rename = "heattempmin")]
    pub heat_temp_min: f64,
    #[serde(rename = "heattempmax")]
    pub heat_temp_max: f64,
    #[serde(rename = "activestage")]
    pub active_stage: i32,
    #[serde(rename = "hum_active")]
    pub humidity_enabled: HumidityEnabled,
    #[serde(rename = "hum")]
    pub humidity: i32,
    #[serde(rename = "hum_setpoint")]
    pub humidify_setpoint: i32,
    #[serde(rename = "dehum_setpoint")]
    pub dehumidify_setpoint: i32,
    #[serde(rename = "setpointdelta")]
    pub setpoint_delta: f64,
    #[serde(rename = "availablemodes")]
    pub available_modes: AvailableModes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sensor {
    pub name: String,
    pub temp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    pub name: String,
    pub active: bool,
}

/// Shared envelope for the sensor, runtime and alert queries. Each endpoint
/// fills only its own list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryResponse {
    pub sensors: Vec<Sensor>,
    pub runtimes: Vec<Runtime>,
    pub alerts: Vec<Alert>,
}

/// Reply to `POST /control` and `POST /settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateResponse {
    pub success: bool,
    pub error: bool,
    pub reason: Option<String>,
}
