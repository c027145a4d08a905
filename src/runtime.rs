use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

const KEY_TIMESTAMP: &str = "ts";
const KEY_FREE_COOLING: &str = "fc";
const KEY_OVERRIDE: &str = "ov";
const PREFIX_HEAT: &str = "heat";
const PREFIX_COOL: &str = "cool";
const PREFIX_AUX: &str = "aux";

/// One day of equipment runtime from `/query/runtimes`.
///
/// Stage maps are keyed by the numeric suffix the device uses, so a payload
/// with `heat1` and `heat2` yields heater ids `"1"` and `"2"`. Durations are
/// signed, as the device sends plain integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    pub timestamp: DateTime<Utc>,
    pub heaters: BTreeMap<String, TimeDelta>,
    pub coolers: BTreeMap<String, TimeDelta>,
    pub aux: BTreeMap<String, TimeDelta>,
    pub free_cooling: TimeDelta,
    pub override_time: TimeDelta,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            timestamp: DateTime::UNIX_EPOCH,
            heaters: BTreeMap::new(),
            coolers: BTreeMap::new(),
            aux: BTreeMap::new(),
            free_cooling: TimeDelta::zero(),
            override_time: TimeDelta::zero(),
        }
    }
}

impl Runtime {
    /// Build a record from the flat key/value form the device sends. Keys
    /// that aren't recognized are ignored.
    pub fn from_fields(fields: &HashMap<String, i64>) -> Result<Self, String> {
        let mut runtime = Runtime::default();
        for (key, &value) in fields {
            match key.as_str() {
                KEY_TIMESTAMP => {
                    runtime.timestamp = DateTime::from_timestamp(value, 0)
                        .ok_or_else(|| format!("timestamp {value} out of range"))?;
                }
                KEY_FREE_COOLING => runtime.free_cooling = minutes(key, value)?,
                KEY_OVERRIDE => runtime.override_time = minutes(key, value)?,
                _ => {
                    let (stages, id) = if let Some(id) = key.strip_prefix(PREFIX_HEAT) {
                        (&mut runtime.heaters, id)
                    } else if let Some(id) = key.strip_prefix(PREFIX_COOL) {
                        (&mut runtime.coolers, id)
                    } else if let Some(id) = key.strip_prefix(PREFIX_AUX) {
                        (&mut runtime.aux, id)
                    } else {
                        continue;
                    };
                    stages.insert(id.to_string(), minutes(key, value)?);
                }
            }
        }
        Ok(runtime)
    }

    pub fn total_heating(&self) -> TimeDelta {
        total(&self.heaters)
    }

    pub fn total_cooling(&self) -> TimeDelta {
        total(&self.coolers)
    }
}

fn total(stages: &BTreeMap<String, TimeDelta>) -> TimeDelta {
    stages
        .values()
        .fold(TimeDelta::zero(), |acc, d| acc.checked_add(d).unwrap_or(acc))
}

fn minutes(key: &str, value: i64) -> Result<TimeDelta, String> {
    TimeDelta::try_minutes(value).ok_or_else(|| format!("{key}: {value} minutes out of range"))
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = HashMap::<String, i64>::deserialize(deserializer)?;
        Runtime::from_fields(&fields).map_err(D::Error::custom)
    }
}
