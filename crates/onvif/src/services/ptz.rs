// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PTZ service (`tptz`, ver20).
//!
//! Vectors are expressed in the device's generic spaces unless a `space`
//! URI is set: pan/tilt and zoom in `[-1, 1]` for velocities and relative
//! translations, `[-1, 1]` / `[0, 1]` for absolute positions.

use super::{attr_or_default, non_empty, text_or_default, uint};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::normalize::Body;
use crate::soap::{Dispatcher, Message, Service};
use std::time::Duration;

/// Pan/tilt component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
    /// Coordinate space URI; the device default when `None`.
    pub space: Option<String>,
}

/// Zoom component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vector1D {
    pub x: f64,
    /// Coordinate space URI; the device default when `None`.
    pub space: Option<String>,
}

/// Position, velocity, translation or speed.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PtzVector {
    /// Pan (`x`) and tilt (`y`).
    pub pan_tilt: Option<Vector2D>,
    /// Zoom (`x`).
    pub zoom: Option<Vector1D>,
}

impl PtzVector {
    /// Pan/tilt only.
    pub fn pan_tilt(x: f64, y: f64) -> Self {
        Self {
            pan_tilt: Some(Vector2D { x, y, space: None }),
            zoom: None,
        }
    }

    /// Zoom only.
    pub fn zoom(x: f64) -> Self {
        Self {
            pan_tilt: None,
            zoom: Some(Vector1D { x, space: None }),
        }
    }

    /// Add a zoom component.
    pub fn with_zoom(mut self, x: f64) -> Self {
        self.zoom = Some(Vector1D { x, space: None });
        self
    }

    /// Whether neither axis is set.
    pub fn is_empty(&self) -> bool {
        self.pan_tilt.is_none() && self.zoom.is_none()
    }

    fn to_message(&self) -> Message {
        let pan_tilt = self.pan_tilt.as_ref().map(|pt| {
            let m = Message::new("tt").attr("x", pt.x).attr("y", pt.y);
            match &pt.space {
                Some(space) => m.attr("space", space),
                None => m,
            }
        });
        let zoom = self.zoom.as_ref().map(|z| {
            let m = Message::new("tt").attr("x", z.x);
            match &z.space {
                Some(space) => m.attr("space", space),
                None => m,
            }
        });
        Message::new("tt")
            .nested_optional("pan_tilt", pan_tilt)
            .nested_optional("zoom", zoom)
    }

    fn from_body(body: &Body) -> Self {
        let coord = |b: &Body, name: &str| b.attr(name).and_then(|v| v.trim().parse::<f64>().ok());
        let space = |b: &Body| b.attr("space").map(str::to_string);
        Self {
            pan_tilt: body.map("pan_tilt").and_then(|pt| {
                Some(Vector2D {
                    x: coord(pt, "x")?,
                    y: coord(pt, "y")?,
                    space: space(pt),
                })
            }),
            zoom: body.map("zoom").and_then(|z| {
                Some(Vector1D {
                    x: coord(z, "x")?,
                    space: space(z),
                })
            }),
        }
    }
}

/// PTZ configuration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PtzConfiguration {
    pub token: String,
    pub name: String,
    pub use_count: u32,
    /// Token of the PTZ node this configuration drives.
    pub node_token: String,
    /// `xs:duration` applied to continuous moves without an explicit timeout.
    pub default_timeout: Option<String>,
    /// Speed used when a move gives none.
    pub default_speed: Option<PtzVector>,
    /// Full normalized configuration (spaces, limits...).
    pub raw: Body,
}

impl From<&Body> for PtzConfiguration {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            name: text_or_default(body, "name"),
            use_count: uint(body, "use_count").unwrap_or_default(),
            node_token: text_or_default(body, "node_token"),
            default_timeout: non_empty(body, "default_ptz_timeout"),
            default_speed: body.map("default_ptz_speed").map(PtzVector::from_body),
            raw: body.clone(),
        }
    }
}

/// `GetStatus` result.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PtzStatus {
    /// Current position.
    pub position: Option<PtzVector>,
    /// `IDLE`, `MOVING` or `UNKNOWN`.
    pub pan_tilt_status: Option<String>,
    pub zoom_status: Option<String>,
    /// Device error text, if any.
    pub error: Option<String>,
    /// Device time of the status sample.
    pub utc_time: Option<String>,
}

impl PtzStatus {
    /// Whether any axis reports `MOVING`.
    pub fn is_moving(&self) -> bool {
        [&self.pan_tilt_status, &self.zoom_status]
            .iter()
            .any(|s| s.as_deref() == Some("MOVING"))
    }
}

impl From<&Body> for PtzStatus {
    fn from(body: &Body) -> Self {
        let moves = body.map("move_status");
        Self {
            position: body.map("position").map(PtzVector::from_body),
            pan_tilt_status: moves.and_then(|m| non_empty(m, "pan_tilt")),
            zoom_status: moves.and_then(|m| non_empty(m, "zoom")),
            error: non_empty(body, "error"),
            utc_time: non_empty(body, "utc_time"),
        }
    }
}

/// Stored position.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Preset {
    pub token: String,
    pub name: Option<String>,
    /// Stored pan/tilt/zoom, when the device reports it.
    pub position: Option<PtzVector>,
}

impl From<&Body> for Preset {
    fn from(body: &Body) -> Self {
        Self {
            token: attr_or_default(body, "token"),
            name: non_empty(body, "name"),
            position: body.map("ptz_position").map(PtzVector::from_body),
        }
    }
}

/// Render a duration as `xs:duration` (`PT1.5S`).
pub fn xs_duration(d: Duration) -> String {
    let millis = d.subsec_millis();
    if millis == 0 {
        format!("PT{}S", d.as_secs())
    } else {
        let frac = format!("{:03}", millis);
        format!("PT{}.{}S", d.as_secs(), frac.trim_end_matches('0'))
    }
}

fn require_motion(vector: &PtzVector, what: &str) -> Result<()> {
    if vector.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{} needs a pan/tilt or zoom component",
            what
        )));
    }
    Ok(())
}

/// Client for the PTZ service.
#[derive(Debug, Clone)]
pub struct PtzClient {
    dispatcher: Dispatcher,
}

impl PtzClient {
    /// Client over HTTP for `endpoint` (e.g. `http://host/onvif/ptz_service`).
    pub fn new(endpoint: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_dispatcher(Dispatcher::new(
            endpoint,
            Service::Ptz,
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

    fn profile(profile_token: &str) -> Message {
        Message::new("tptz").field("profile_token", profile_token)
    }

    /// Every PTZ configuration.
    pub fn get_configurations(&self) -> Result<Vec<PtzConfiguration>> {
        let body = self.dispatcher.call("GetConfigurations", None)?;
        Ok(body
            .maps("ptz_configuration")
            .into_iter()
            .map(PtzConfiguration::from)
            .collect())
    }

    /// One PTZ configuration by token.
    pub fn get_configuration(&self, token: &str) -> Result<PtzConfiguration> {
        let msg = Message::new("tptz").field("tptz:PTZConfigurationToken", token);
        let body = self.dispatcher.call("GetConfiguration", Some(&msg))?;
        body.map("ptz_configuration")
            .map(PtzConfiguration::from)
            .ok_or_else(|| {
                Error::UnexpectedFailure(format!("no PTZConfiguration returned for '{}'", token))
            })
    }

    /// Move at `velocity` until [`stop`](Self::stop) or `timeout`.
    pub fn continuous_move(
        &self,
        profile_token: &str,
        velocity: &PtzVector,
        timeout: Option<Duration>,
    ) -> Result<()> {
        require_motion(velocity, "ContinuousMove")?;
        let msg = Self::profile(profile_token)
            .nested("velocity", velocity.to_message())
            .optional("timeout", timeout.map(xs_duration));
        self.dispatcher.call("ContinuousMove", Some(&msg))?;
        Ok(())
    }

    /// Move to `position`, optionally at `speed`.
    pub fn absolute_move(
        &self,
        profile_token: &str,
        position: &PtzVector,
        speed: Option<&PtzVector>,
    ) -> Result<()> {
        require_motion(position, "AbsoluteMove")?;
        let msg = Self::profile(profile_token)
            .nested("position", position.to_message())
            .nested_optional("speed", speed.map(PtzVector::to_message));
        self.dispatcher.call("AbsoluteMove", Some(&msg))?;
        Ok(())
    }

    /// Move by `translation` from the current position.
    pub fn relative_move(
        &self,
        profile_token: &str,
        translation: &PtzVector,
        speed: Option<&PtzVector>,
    ) -> Result<()> {
        require_motion(translation, "RelativeMove")?;
        let msg = Self::profile(profile_token)
            .nested("translation", translation.to_message())
            .nested_optional("speed", speed.map(PtzVector::to_message));
        self.dispatcher.call("RelativeMove", Some(&msg))?;
        Ok(())
    }

    /// Stop the selected axes.
    pub fn stop(&self, profile_token: &str, pan_tilt: bool, zoom: bool) -> Result<()> {
        let msg = Self::profile(profile_token)
            .field("pan_tilt", pan_tilt)
            .field("zoom", zoom);
        self.dispatcher.call("Stop", Some(&msg))?;
        Ok(())
    }

    /// Position and move status of the profile's PTZ node.
    pub fn get_status(&self, profile_token: &str) -> Result<PtzStatus> {
        let body = self
            .dispatcher
            .call("GetStatus", Some(&Self::profile(profile_token)))?;
        Ok(body
            .map("ptz_status")
            .map(PtzStatus::from)
            .unwrap_or_default())
    }

    /// Move to the home position.
    pub fn goto_home_position(&self, profile_token: &str, speed: Option<&PtzVector>) -> Result<()> {
        let msg = Self::profile(profile_token)
            .nested_optional("speed", speed.map(PtzVector::to_message));
        self.dispatcher.call("GotoHomePosition", Some(&msg))?;
        Ok(())
    }

    /// Store the current position as home.
    pub fn set_home_position(&self, profile_token: &str) -> Result<()> {
        self.dispatcher
            .call("SetHomePosition", Some(&Self::profile(profile_token)))?;
        Ok(())
    }

    /// Stored presets, in reported order.
    pub fn get_presets(&self, profile_token: &str) -> Result<Vec<Preset>> {
        let body = self
            .dispatcher
            .call("GetPresets", Some(&Self::profile(profile_token)))?;
        Ok(body.maps("preset").into_iter().map(Preset::from).collect())
    }

    /// Store the current position. Passing `preset_token` overwrites that
    /// preset. Returns the token of the stored preset.
    pub fn set_preset(
        &self,
        profile_token: &str,
        preset_name: Option<&str>,
        preset_token: Option<&str>,
    ) -> Result<String> {
        let msg = Self::profile(profile_token)
            .optional("preset_name", preset_name)
            .optional("preset_token", preset_token);
        let body = self.dispatcher.call("SetPreset", Some(&msg))?;
        non_empty(&body, "preset_token")
            .ok_or_else(|| Error::UnexpectedFailure("SetPreset returned no PresetToken".into()))
    }

    /// Move to a stored preset.
    pub fn goto_preset(
        &self,
        profile_token: &str,
        preset_token: &str,
        speed: Option<&PtzVector>,
    ) -> Result<()> {
        let msg = Self::profile(profile_token)
            .field("preset_token", preset_token)
            .nested_optional("speed", speed.map(PtzVector::to_message));
        self.dispatcher.call("GotoPreset", Some(&msg))?;
        Ok(())
    }

    /// Delete a stored preset.
    pub fn remove_preset(&self, profile_token: &str, preset_token: &str) -> Result<()> {
        let msg = Self::profile(profile_token).field("preset_token", preset_token);
        self.dispatcher.call("RemovePreset", Some(&msg))?;
        Ok(())
    }
}
