// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Media service (`trt`): profiles, stream URIs, sources and encoders.

use super::{attr_or_default, non_empty, text_or_default, uint};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::normalize::Body;
use crate::soap::{Dispatcher, Message, Service};

/// Width x height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resolution {
    /// Horizontal pixels.
    pub width: u32,
    /// Vertical pixels.
    pub height: u32,
}

impl Resolution {
    fn from_body(body: Option<&Body>) -> Option<Self> {
        let body = body?;
        Some(Self {
            width: uint(body, "width")?,
            height: uint(body, "height")?,
        })
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Source window of a video source configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bounds {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Window width.
    pub width: i32,
    /// Window height.
    pub height: i32,
}

impl Bounds {
    fn from_body(body: Option<&Body>) -> Option<Self> {
        let body = body?;
        let get = |name: &str| body.attr(name).and_then(|v| v.trim().parse::<i32>().ok());
        Some(Self {
            x: get("x")?,
            y: get("y")?,
            width: get("width")?,
            height: get("height")?,
        })
    }
}

/// Physical video input.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VideoSource {
    pub token: String,
    /// Frames per second.
    pub framerate: Option<f64>,
    pub resolution: Option<Resolution>,
}

impl From<&Body> for VideoSource {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            framerate: body.f64("framerate"),
            resolution: Resolution::from_body(body.map("resolution")),
        }
    }
}

/// Binding of a video source to a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VideoSourceConfiguration {
    pub token: String,
    pub name: String,
    /// Number of profiles referencing this configuration.
    pub use_count: u32,
    /// Token of the bound [`VideoSource`].
    pub source_token: String,
    pub bounds: Option<Bounds>,
}

impl From<&Body> for VideoSourceConfiguration {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            name: text_or_default(body, "name"),
            use_count: uint(body, "use_count").unwrap_or_default(),
            source_token: text_or_default(body, "source_token"),
            bounds: Bounds::from_body(body.map("bounds")),
        }
    }
}

/// Video encoder settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VideoEncoderConfiguration {
    pub token: String,
    pub name: String,
    /// Number of profiles referencing this configuration.
    pub use_count: u32,
    /// `JPEG`, `MPEG4` or `H264`.
    pub encoding: String,
    pub resolution: Option<Resolution>,
    /// Relative quality, higher is better.
    pub quality: Option<f64>,
    /// Maximum frames per second.
    pub frame_rate_limit: Option<u32>,
    /// Encode every Nth frame.
    pub encoding_interval: Option<u32>,
    /// kbit/s.
    pub bitrate_limit: Option<u32>,
    /// H.264 or MPEG-4 GOV length.
    pub gov_length: Option<u32>,
}

impl From<&Body> for VideoEncoderConfiguration {
    fn from(body: &Body) -> Self {
        let rate = body.map("rate_control");
        let gov_length = body
            .map("h264")
            .or_else(|| body.map("mpeg4"))
            .and_then(|codec| uint(codec, "gov_length"));
        Self {
            token: attr_or_default(body, "token"),
            name: text_or_default(body, "name"),
            use_count: uint(body, "use_count").unwrap_or_default(),
            encoding: text_or_default(body, "encoding"),
            resolution: Resolution::from_body(body.map("resolution")),
            quality: body.f64("quality"),
            frame_rate_limit: rate.and_then(|r| uint(r, "frame_rate_limit")),
            encoding_interval: rate.and_then(|r| uint(r, "encoding_interval")),
            bitrate_limit: rate.and_then(|r| uint(r, "bitrate_limit")),
            gov_length,
        }
    }
}

/// Physical audio input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AudioSource {
    pub token: String,
    /// Number of audio channels.
    pub channels: u32,
}

impl From<&Body> for AudioSource {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            channels: uint(body, "channels").unwrap_or_default(),
        }
    }
}

/// Audio encoder settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AudioEncoderConfiguration {
    pub token: String,
    pub name: String,
    /// Number of profiles referencing this configuration.
    pub use_count: u32,
    /// `G711`, `G726` or `AAC`.
    pub encoding: String,
    /// kbit/s.
    pub bitrate: Option<u32>,
    /// kHz.
    pub sample_rate: Option<u32>,
}

impl From<&Body> for AudioEncoderConfiguration {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            name: text_or_default(body, "name"),
            use_count: uint(body, "use_count").unwrap_or_default(),
            encoding: text_or_default(body, "encoding"),
            bitrate: uint(body, "bitrate"),
            sample_rate: uint(body, "sample_rate"),
        }
    }
}

/// Media profile.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Profile {
    pub token: String,
    pub name: String,
    /// Fixed profiles cannot be deleted.
    pub fixed: bool,
    pub video_source_configuration: Option<VideoSourceConfiguration>,
    pub video_encoder_configuration: Option<VideoEncoderConfiguration>,
    pub audio_encoder_configuration: Option<AudioEncoderConfiguration>,
    /// Token of the bound PTZ configuration, if any.
    pub ptz_configuration_token: Option<String>,
    /// Full normalized profile (audio source, analytics, metadata...).
    pub raw: Body,
}

impl From<&Body> for Profile {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            name: text_or_default(body, "name"),
            fixed: body
                .attr("fixed")
                .is_some_and(|v| matches!(v.trim(), "true" | "1")),
            video_source_configuration: body
                .map("video_source_configuration")
                .map(VideoSourceConfiguration::from),
            video_encoder_configuration: body
                .map("video_encoder_configuration")
                .map(VideoEncoderConfiguration::from),
            audio_encoder_configuration: body
                .map("audio_encoder_configuration")
                .map(AudioEncoderConfiguration::from),
            ptz_configuration_token: body
                .map("ptz_configuration")
                .and_then(|p| p.attr("token"))
                .map(str::to_string),
            raw: body.clone(),
        }
    }
}

/// `GetStreamUri` / `GetSnapshotUri` result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MediaUri {
    /// Stream or snapshot URL.
    pub uri: String,
    /// The URI stops working once a client connects.
    pub invalid_after_connect: bool,
    /// The URI stops working after a device reboot.
    pub invalid_after_reboot: bool,
    /// `xs:duration`, e.g. `PT60S`; `PT0S` means no expiry.
    pub timeout: Option<String>,
}

impl From<&Body> for MediaUri {
    fn from(body: &Body) -> Self {
        Self {
            uri: text_or_default(body, "uri"),
            invalid_after_connect: body.bool("invalid_after_connect").unwrap_or(false),
            invalid_after_reboot: body.bool("invalid_after_reboot").unwrap_or(false),
            timeout: non_empty(body, "timeout"),
        }
    }
}

/// Transport of a media stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransportProtocol {
    Udp,
    Tcp,
    #[default]
    Rtsp,
    Http,
}

impl TransportProtocol {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportProtocol::Udp => "UDP",
            TransportProtocol::Tcp => "TCP",
            TransportProtocol::Rtsp => "RTSP",
            TransportProtocol::Http => "HTTP",
        }
    }
}

impl std::fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UDP" => Ok(TransportProtocol::Udp),
            "TCP" => Ok(TransportProtocol::Tcp),
            "RTSP" => Ok(TransportProtocol::Rtsp),
            "HTTP" => Ok(TransportProtocol::Http),
            other => Err(Error::InvalidArgument(format!(
                "unknown transport protocol '{}'",
                other
            ))),
        }
    }
}

/// Unicast or multicast RTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamType {
    #[default]
    RtpUnicast,
    RtpMulticast,
}

impl StreamType {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamType::RtpUnicast => "RTP-Unicast",
            StreamType::RtpMulticast => "RTP-Multicast",
        }
    }
}

/// Client for the media service.
#[derive(Debug, Clone)]
pub struct MediaClient {
    dispatcher: Dispatcher,
}

impl MediaClient {
    /// Client over HTTP for `endpoint` (e.g. `http://host/onvif/media_service`).
    pub fn new(endpoint: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_dispatcher(Dispatcher::new(
            endpoint,
            Service::Media,
            config,
        )?))
    }

    /// Client over an existing dispatcher.
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mutable dispatcher, to re-bind the endpoint or clock offset.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Every media profile, in reported order.
    pub fn get_profiles(&self) -> Result<Vec<Profile>> {
        let body = self.dispatcher.call("GetProfiles", None)?;
        Ok(body.maps("profiles").into_iter().map(Profile::from).collect())
    }

    /// Unicast stream URI for `profile_token` over `protocol`.
    pub fn get_stream_uri(
        &self,
        profile_token: &str,
        protocol: TransportProtocol,
    ) -> Result<MediaUri> {
        self.get_stream_uri_with(profile_token, StreamType::RtpUnicast, protocol)
    }

    /// Stream URI for `profile_token` with an explicit stream type.
    ///
    /// ```no_run
    /// use onvif::services::{MediaClient, StreamType, TransportProtocol};
    /// use onvif::ClientConfig;
    ///
    /// let media = MediaClient::new(
    ///     "http://192.168.1.100/onvif/media_service",
    ///     &ClientConfig::with_credentials("admin", "secret"),
    /// )?;
    /// let uri = media.get_stream_uri_with("Profile_1", StreamType::RtpMulticast, TransportProtocol::Udp)?;
    /// println!("{}", uri.uri);
    /// # Ok::<(), onvif::Error>(())
    /// ```
    pub fn get_stream_uri_with(
        &self,
        profile_token: &str,
        stream: StreamType,
        protocol: TransportProtocol,
    ) -> Result<MediaUri> {
        let setup = Message::new("tt")
            .field("stream", stream.as_str())
            .nested("transport", Message::new("tt").field("protocol", protocol));
        let msg = Message::new("trt")
            .nested("stream_setup", setup)
            .field("profile_token", profile_token);
        let body = self.dispatcher.call("GetStreamUri", Some(&msg))?;
        media_uri(&body)
    }

    /// JPEG snapshot URI for `profile_token`.
    pub fn get_snapshot_uri(&self, profile_token: &str) -> Result<MediaUri> {
        let msg = Message::new("trt").field("profile_token", profile_token);
        let body = self.dispatcher.call("GetSnapshotUri", Some(&msg))?;
        media_uri(&body)
    }

    /// Physical video inputs.
    pub fn get_video_sources(&self) -> Result<Vec<VideoSource>> {
        let body = self.dispatcher.call("GetVideoSources", None)?;
        Ok(body
            .maps("video_sources")
            .into_iter()
            .map(VideoSource::from)
            .collect())
    }

    /// Every video source configuration.
    pub fn get_video_source_configurations(&self) -> Result<Vec<VideoSourceConfiguration>> {
        let body = self.dispatcher.call("GetVideoSourceConfigurations", None)?;
        Ok(body
            .maps("configurations")
            .into_iter()
            .map(VideoSourceConfiguration::from)
            .collect())
    }

    /// Every video encoder configuration.
    pub fn get_video_encoder_configurations(&self) -> Result<Vec<VideoEncoderConfiguration>> {
        let body = self.dispatcher.call("GetVideoEncoderConfigurations", None)?;
        Ok(body
            .maps("configurations")
            .into_iter()
            .map(VideoEncoderConfiguration::from)
            .collect())
    }

    /// Audio inputs. Empty when the device has no audio.
    pub fn get_audio_sources(&self) -> Result<Vec<AudioSource>> {
        let Some(body) = self.call_audio("GetAudioSources")? else {
            return Ok(Vec::new());
        };
        Ok(body
            .maps("audio_sources")
            .into_iter()
            .map(AudioSource::from)
            .collect())
    }

    /// Audio encoders. Empty when the device has no audio.
    pub fn get_audio_encoder_configurations(&self) -> Result<Vec<AudioEncoderConfiguration>> {
        let Some(body) = self.call_audio("GetAudioEncoderConfigurations")? else {
            return Ok(Vec::new());
        };
        Ok(body
            .maps("configurations")
            .into_iter()
            .map(AudioEncoderConfiguration::from)
            .collect())
    }

    /// Audio queries only: "not supported" faults mean no audio.
    fn call_audio(&self, operation: &str) -> Result<Option<Body>> {
        match self.dispatcher.call(operation, None) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.is_action_not_supported() => {
                log::debug!("[SOAP] {} unsupported by device, no audio: {}", operation, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn media_uri(body: &Body) -> Result<MediaUri> {
    let uri = body
        .map("media_uri")
        .map(MediaUri::from)
        .filter(|u| !u.uri.is_empty())
        .ok_or_else(|| Error::UnexpectedFailure("response carries no MediaUri/Uri".into()))?;
    Ok(uri)
}
