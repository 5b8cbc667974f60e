//! Creation commands.
//!
//! The server accepts these fire-and-forget: a successful response only
//! means the command was queued, never which object it produced.

use crate::object::ObjectKind;
use serde::{Deserialize, Serialize};

/// Parameters for adding a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeviceParameters {
    /// Device name.
    pub name: String,
    /// IPv4 address or DNS name the device is monitored by.
    pub host: String,
}

impl NewDeviceParameters {
    /// Creates device parameters.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
        }
    }
}

/// Parameters for adding a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroupParameters {
    /// Group name.
    pub name: String,
}

impl NewGroupParameters {
    /// Creates group parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Parameters for adding a sensor.
///
/// With no `targets` the server creates a single sensor called `name`.
/// Otherwise the sensor type acts as a template and the server creates
/// one sensor per target, generating each name itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSensorParameters {
    /// Sensor name (ignored by the server for template sensors).
    pub name: String,
    /// Sensor type identifier, e.g. `ping` or `wmiservice`.
    pub sensor_type: String,
    /// Template targets (services, volumes, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

impl NewSensorParameters {
    /// Creates parameters for a single sensor.
    pub fn new(name: impl Into<String>, sensor_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sensor_type: sensor_type.into(),
            targets: Vec::new(),
        }
    }

    /// Adds a template target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Number of sensors the server should produce.
    pub fn expected_count(&self) -> usize {
        self.targets.len().max(1)
    }
}

/// Notification trigger type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Fires on a sensor state change.
    State,
    /// Fires when a channel crosses a threshold.
    Threshold,
    /// Fires on a speed limit.
    Speed,
    /// Fires on a volume limit.
    Volume,
    /// Fires when the object reports a change.
    Change,
}

impl TriggerType {
    /// Human readable label, as the server names new triggers.
    pub fn label(self) -> &'static str {
        match self {
            TriggerType::State => "State Trigger",
            TriggerType::Threshold => "Threshold Trigger",
            TriggerType::Speed => "Speed Trigger",
            TriggerType::Volume => "Volume Trigger",
            TriggerType::Change => "Change Trigger",
        }
    }
}

/// Parameters for adding a notification trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerParameters {
    /// Trigger type.
    pub trigger_type: TriggerType,
    /// Notification action to fire, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Seconds the condition must hold before firing.
    pub latency_secs: u32,
}

impl TriggerParameters {
    /// Creates trigger parameters with no action and a 60 second latency.
    pub fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            action: None,
            latency_secs: 60,
        }
    }

    /// Sets the notification action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the latency.
    pub fn with_latency(mut self, secs: u32) -> Self {
        self.latency_secs = secs;
        self
    }
}

/// A creation command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum CreateCommand {
    /// Add one or more sensors.
    AddSensor(NewSensorParameters),
    /// Add a device.
    AddDevice(NewDeviceParameters),
    /// Add a group.
    AddGroup(NewGroupParameters),
    /// Add a notification trigger.
    AddTrigger(TriggerParameters),
}

impl CreateCommand {
    /// Kind of object this command creates.
    pub fn kind(&self) -> ObjectKind {
        match self {
            CreateCommand::AddSensor(_) => ObjectKind::Sensor,
            CreateCommand::AddDevice(_) => ObjectKind::Device,
            CreateCommand::AddGroup(_) => ObjectKind::Group,
            CreateCommand::AddTrigger(_) => ObjectKind::NotificationTrigger,
        }
    }

    /// The name the caller asked for, if the command carries one.
    ///
    /// Template sensors and triggers are named by the server, so they
    /// carry no hint.
    pub fn name_hint(&self) -> Option<&str> {
        match self {
            CreateCommand::AddSensor(p) if p.targets.is_empty() => Some(&p.name),
            CreateCommand::AddSensor(_) => None,
            CreateCommand::AddDevice(p) => Some(&p.name),
            CreateCommand::AddGroup(p) => Some(&p.name),
            CreateCommand::AddTrigger(_) => None,
        }
    }
}
