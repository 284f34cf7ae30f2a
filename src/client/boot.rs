//! Rescue system activation and hardware resets.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::{nullable, Form, RobotClient, RobotError};

/// Reset types accepted by `POST /reset/{server-number}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    /// Send CTRL+ALT+DEL to the server.
    Software,
    /// Press the hardware reset button.
    Hardware,
    /// Order a manual power cycle by a technician.
    Manual,
    /// Press the power button.
    Power,
    /// Hold the power button.
    PowerLong,
}

impl ResetType {
    /// The `type` form value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetType::Software => "sw",
            ResetType::Hardware => "hw",
            ResetType::Manual => "man",
            ResetType::Power => "power",
            ResetType::PowerLong => "power_long",
        }
    }

    /// Whether the server is left powered off after this reset.
    pub fn powers_off(&self) -> bool {
        matches!(self, ResetType::Power | ResetType::PowerLong)
    }
}

impl fmt::Display for ResetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetType {
    type Err = RobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sw" => Ok(ResetType::Software),
            "hw" => Ok(ResetType::Hardware),
            "man" => Ok(ResetType::Manual),
            "power" => Ok(ResetType::Power),
            "power_long" => Ok(ResetType::PowerLong),
            other => Err(RobotError::InvalidInput(format!(
                "unknown reset type '{}'",
                other
            ))),
        }
    }
}

/// Result of activating the rescue system.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RescueActivation {
    /// Main IP of the server.
    #[serde(default, deserialize_with = "nullable")]
    pub server_ip: String,
    /// Root password of the rescue system. Empty when only keys were set.
    #[serde(default, deserialize_with = "nullable")]
    pub password: String,
}

impl fmt::Debug for RescueActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RescueActivation")
            .field("server_ip", &self.server_ip)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct RescueEnvelope {
    rescue: RescueActivation,
}

impl RobotClient {
    /// Activate the rescue system for the next boot.
    ///
    /// `ssh_keys` are key fingerprints already stored in Robot.
    pub async fn enable_rescue(
        &self,
        number: i64,
        os: &str,
        ssh_keys: &[String],
    ) -> Result<RescueActivation, RobotError> {
        let mut form: Form = vec![("os".to_string(), os.to_string())];
        form.extend(
            ssh_keys
                .iter()
                .map(|key| ("authorized_key[]".to_string(), key.clone())),
        );

        let envelope: RescueEnvelope = self
            .post_form(&format!("/boot/{}/rescue", number), &form)
            .await?;
        tracing::info!(
            server_number = number,
            os,
            keys = ssh_keys.len(),
            "Activated rescue system"
        );
        Ok(envelope.rescue)
    }

    /// Reset a server.
    ///
    /// `power` and `power_long` leave the server off, so after the configured
    /// power-on delay the power button is pressed once more.
    pub async fn reset_server(&self, number: i64, reset: ResetType) -> Result<(), RobotError> {
        let path = format!("/reset/{}", number);
        let form: Form = vec![("type".to_string(), reset.as_str().to_string())];
        self.post_form_unit(&path, &form).await?;
        tracing::info!(server_number = number, reset = %reset, "Reset server");

        if reset.powers_off() {
            let delay = self.config().power_on_delay;
            tracing::debug!(server_number = number, ?delay, "Waiting before power on");
            tokio::time::sleep(delay).await;

            // Robot powers on for any reset type while the server is off.
            let power_on: Form = vec![("type".to_string(), ResetType::Power.as_str().to_string())];
            self.post_form_unit(&path, &power_on).await?;
            tracing::info!(server_number = number, "Powered server back on");
        }
        Ok(())
    }
}
