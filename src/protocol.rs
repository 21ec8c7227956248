//! JSON messages exchanged with the Krad server.
//!
//! Inbound frames carry a JSON array of notifications, each tagged by `com`
//! (the component) and then by `cmd` or `info`. Outbound commands are single
//! JSON objects with the same tagging.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message batch is not a JSON array: {0}")]
    Batch(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "com")]
pub enum Inbound {
    #[serde(rename = "kradradio")]
    Radio(RadioInfo),
    #[serde(rename = "kradmixer")]
    Mixer(MixerEvent),
    #[serde(rename = "kradlink")]
    Link(LinkEvent),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "info", rename_all = "snake_case")]
pub enum RadioInfo {
    Sysname { infoval: String },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MixerEvent {
    AddPortgroup {
        portgroup_name: String,
        #[serde(default)]
        volume: f64,
        #[serde(default)]
        crossfade_name: String,
        #[serde(default)]
        crossfade: f64,
    },
    UpdatePortgroup {
        portgroup_name: String,
        control_name: String,
        value: f64,
    },
    RemovePortgroup {
        portgroup_name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum LinkEvent {
    AddLink(Link),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(deserialize_with = "whole_number")]
    pub link_num: u32,
    pub operation_mode: OperationMode,
    pub av_mode: AvMode,
    #[serde(default)]
    pub video_source: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "optional_whole_number")]
    pub port: Option<u16>,
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default, deserialize_with = "optional_whole_number")]
    pub opus_frame_size: Option<i64>,
    #[serde(default, deserialize_with = "optional_whole_number")]
    pub opus_bitrate: Option<i64>,
    #[serde(default, deserialize_with = "optional_whole_number")]
    pub opus_complexity: Option<i64>,
}

/// The server emits numbers as either integers or floats.
fn whole_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = f64::deserialize(deserializer)?;
    round_to(value).ok_or_else(|| D::Error::custom(format!("{value} is out of range")))
}

fn optional_whole_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(value) => round_to(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of range"))),
        None => Ok(None),
    }
}

fn round_to<T: TryFrom<i64>>(value: f64) -> Option<T> {
    if !value.is_finite() {
        return None;
    }
    T::try_from(value.round() as i64).ok()
}

impl Link {
    /// Opus tuning only applies to transmitted audio.
    pub fn has_opus_controls(&self) -> bool {
        self.operation_mode == OperationMode::Transmit
            && self.av_mode.has_audio()
            && self.audio_codec.as_deref() == Some("Opus")
    }

    pub fn stream_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.host.as_deref().unwrap_or_default(),
            self.port.map(|p| p.to_string()).unwrap_or_default(),
            self.mount.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationMode {
    Capture,
    Transmit,
    Other(String),
}

impl From<String> for OperationMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "capture" => OperationMode::Capture,
            "transmit" => OperationMode::Transmit,
            _ => OperationMode::Other(value),
        }
    }
}

impl From<OperationMode> for String {
    fn from(value: OperationMode) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Capture => f.write_str("capture"),
            OperationMode::Transmit => f.write_str("transmit"),
            OperationMode::Other(mode) => f.write_str(mode),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AvMode {
    AudioOnly,
    VideoOnly,
    AudioAndVideo,
    Other(String),
}

impl AvMode {
    pub fn has_audio(&self) -> bool {
        matches!(self, AvMode::AudioOnly | AvMode::AudioAndVideo)
    }

    pub fn has_video(&self) -> bool {
        matches!(self, AvMode::VideoOnly | AvMode::AudioAndVideo)
    }
}

impl From<String> for AvMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "audio only" => AvMode::AudioOnly,
            "video only" => AvMode::VideoOnly,
            "audio and video" => AvMode::AudioAndVideo,
            _ => AvMode::Other(value),
        }
    }
}

impl From<AvMode> for String {
    fn from(value: AvMode) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvMode::AudioOnly => f.write_str("audio only"),
            AvMode::VideoOnly => f.write_str("video only"),
            AvMode::AudioAndVideo => f.write_str("audio and video"),
            AvMode::Other(mode) => f.write_str(mode),
        }
    }
}

/// Link parameters the panel can tune.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkControl {
    OpusBitrate,
    OpusComplexity,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "com")]
pub enum Command {
    #[serde(rename = "kradmixer")]
    Mixer(MixerCommand),
    #[serde(rename = "kradlink")]
    Link(LinkCommand),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MixerCommand {
    UpdatePortgroup {
        portgroup_name: String,
        control_name: String,
        value: i64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum LinkCommand {
    UpdateLink {
        link_num: u32,
        control_name: LinkControl,
        value: i64,
    },
}

impl Command {
    pub fn update_portgroup(portgroup_name: &str, control_name: &str, value: i64) -> Self {
        Command::Mixer(MixerCommand::UpdatePortgroup {
            portgroup_name: portgroup_name.to_string(),
            control_name: control_name.to_string(),
            value,
        })
    }

    pub fn update_link(link_num: u32, control_name: LinkControl, value: i64) -> Self {
        Command::Link(LinkCommand::UpdateLink {
            link_num,
            control_name,
            value,
        })
    }
}

/// Splits a raw frame into messages, skipping entries this panel does not
/// understand.
pub fn parse_batch(raw: &str) -> Result<Vec<Inbound>, ProtocolError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut messages = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<Inbound>(entry) {
            Ok(msg) => messages.push(msg),
            Err(err) => tracing::debug!("Ignoring unrecognized message: {err}"),
        }
    }
    Ok(messages)
}
