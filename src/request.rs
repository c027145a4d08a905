use reqwest::Request;

use crate::transport::Form;
use crate::{Error, Result};

pub const CONTROL_PATH: &str = "/control";
pub const SETTINGS_PATH: &str = "/settings";

/// A write request that knows where it goes and how to put itself on the
/// wire.
pub trait UpdateRequest {
    /// Endpoint the request is posted to.
    const PATH: &'static str;
    /// Name used in error messages, e.g. `Control Request`.
    const KIND: &'static str;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Every field that has been set, without validation.
    fn fields(&self) -> Form;

    fn form(&self) -> Result<Form> {
        self.validate()?;
        Ok(self.fields())
    }

    /// Validate and write the form body onto `request`, adding the unlock
    /// code when one is given. Returns the number of fields sent.
    fn build_request(&self, request: &mut Request, pin: Option<&str>) -> Result<usize> {
        let mut form = self.form()?;
        if let Some(pin) = pin {
            form.set("pin", pin);
        }
        form.apply(request);
        Ok(form.len())
    }
}

/// Changes to mode, fan and setpoints. Fields left unset are not sent.
///
/// Whenever a mode is sent the device wants both setpoints with it, and in
/// auto mode cool must sit above heat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlRequest {
    pub mode: Option<i32>,
    pub fan: Option<i32>,
    pub heat_temp: Option<i32>,
    pub cool_temp: Option<i32>,
}

impl ControlRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 off, 1 heat, 2 cool, 3 auto.
    pub fn set_mode(&mut self, mode: i32) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    /// 0 auto, 1 on.
    pub fn set_fan(&mut self, fan: i32) -> &mut Self {
        self.fan = Some(fan);
        self
    }

    pub fn fan_auto(&mut self) -> &mut Self {
        self.set_fan(0)
    }

    pub fn fan_on(&mut self) -> &mut Self {
        self.set_fan(1)
    }

    pub fn set_heat_temp(&mut self, temp: i32) -> &mut Self {
        self.heat_temp = Some(temp);
        self
    }

    pub fn set_cool_temp(&mut self, temp: i32) -> &mut Self {
        self.cool_temp = Some(temp);
        self
    }

    pub fn off(&mut self, cool: i32, heat: i32) -> &mut Self {
        self.set_mode(0).set_cool_temp(cool).set_heat_temp(heat)
    }

    pub fn heat(&mut self, heat: i32, cool: i32) -> &mut Self {
        self.set_mode(1).set_heat_temp(heat).set_cool_temp(cool)
    }

    pub fn cool(&mut self, cool: i32, heat: i32) -> &mut Self {
        self.set_mode(2).set_cool_temp(cool).set_heat_temp(heat)
    }

    pub fn auto(&mut self, cool: i32, heat: i32) -> &mut Self {
        self.set_mode(3).set_cool_temp(cool).set_heat_temp(heat)
    }
}

impl UpdateRequest for ControlRequest {
    const PATH: &'static str = CONTROL_PATH;
    const KIND: &'static str = "Control Request";

    fn validate(&self) -> Result<()> {
        let Some(mode) = self.mode else {
            return Ok(());
        };
        let Some(heat) = self.heat_temp else {
            return Err(Error::Validation("HeatTemp must be defined when Mode is defined"));
        };
        let Some(cool) = self.cool_temp else {
            return Err(Error::Validation("CoolTemp must be defined when Mode is defined"));
        };
        // the device also enforces setpointdelta from /query/info, which we don't know here
        if mode == 3 && cool <= heat {
            return Err(Error::Validation(
                "CoolTemp must be greater than HeatTemp when Mode is Auto",
            ));
        }
        Ok(())
    }

    fn fields(&self) -> Form {
        let mut form = Form::new();
        if let Some(mode) = self.mode {
            form.set("mode", mode);
        }
        if let Some(fan) = self.fan {
            form.set("fan", fan);
        }
        if let Some(heat) = self.heat_temp {
            form.set("heattemp", heat);
        }
        if let Some(cool) = self.cool_temp {
            form.set("cooltemp", cool);
        }
        form
    }
}

/// Changes to units, occupancy, schedule and humidity. Fields left unset are
/// not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsRequest {
    pub temp_units: Option<i32>,
    pub away: Option<i32>,
    pub schedule: Option<i32>,
    pub humidify_setpoint: Option<i32>,
    pub dehumidify_setpoint: Option<i32>,
}

impl SettingsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 fahrenheit, 1 celsius.
    pub fn set_temp_units(&mut self, units: i32) -> &mut Self {
        self.temp_units = Some(units);
        self
    }

    pub fn fahrenheit(&mut self) -> &mut Self {
        self.set_temp_units(0)
    }

    pub fn celsius(&mut self) -> &mut Self {
        self.set_temp_units(1)
    }

    pub fn set_away(&mut self, away: bool) -> &mut Self {
        self.away = Some(i32::from(away));
        self
    }

    pub fn away(&mut self) -> &mut Self {
        self.set_away(true)
    }

    pub fn home(&mut self) -> &mut Self {
        self.set_away(false)
    }

    /// Whether the thermostat follows its stored schedule: 0 off, 1 on.
    pub fn set_schedule(&mut self, schedule: i32) -> &mut Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn schedule_off(&mut self) -> &mut Self {
        self.set_schedule(0)
    }

    pub fn schedule_on(&mut self) -> &mut Self {
        self.set_schedule(1)
    }

    /// Percent humidity to humidify to (device range 0-60).
    pub fn set_humidify_setpoint(&mut self, percent: i32) -> &mut Self {
        self.humidify_setpoint = Some(percent);
        self
    }

    /// Percent humidity to dehumidify to (device range 25-99).
    pub fn set_dehumidify_setpoint(&mut self, percent: i32) -> &mut Self {
        self.dehumidify_setpoint = Some(percent);
        self
    }
}

impl UpdateRequest for SettingsRequest {
    const PATH: &'static str = SETTINGS_PATH;
    const KIND: &'static str = "Settings Request";

    fn fields(&self) -> Form {
        let mut form = Form::new();
        if let Some(units) = self.temp_units {
            form.set("tempunits", units);
        }
        if let Some(away) = self.away {
            form.set("away", away);
        }
        if let Some(schedule) = self.schedule {
            form.set("schedule", schedule);
        }
        if let Some(hum) = self.humidify_setpoint {
            form.set("hum_setpoint", hum);
        }
        if let Some(dehum) = self.dehumidify_setpoint {
            form.set("dehum_setpoint", dehum);
        }
        form
    }
}
