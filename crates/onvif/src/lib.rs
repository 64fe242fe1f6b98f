// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # onvif - ONVIF camera client
//!
//! Find ONVIF IP cameras on the local network with WS-Discovery, then query
//! and control them through the Device, Media and PTZ SOAP services.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use onvif::{Camera, ClientConfig, Result};
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     for device in onvif::discover(Duration::from_secs(3), "0.0.0.0")? {
//!         let config = ClientConfig::with_credentials("admin", "password");
//!         let mut camera = Camera::from_descriptor(&device, config)?;
//!         camera.sync_clock()?;
//!         camera.resolve_services()?;
//!
//!         let info = camera.device().get_device_information()?;
//!         println!("{} {} at {}", info.manufacturer, info.model, device.address);
//!
//!         for profile in camera.media().get_profiles()? {
//!             let uri = camera
//!                 .media()
//!                 .get_stream_uri(&profile.token, onvif::services::TransportProtocol::Rtsp)?;
//!             println!("  {} -> {}", profile.name, uri.uri);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   Camera -> DeviceClient | MediaClient | PtzClient                  |
//! +---------------------------------------------------------------------+
//! |   Dispatcher: envelope + UsernameToken -> POST -> fault / Body      |
//! +---------------------------------------------------------------------+
//! |   Normalizer: XML -> Body (snake_case keys, lists for repeatables)  |
//! +---------------------------------------------------------------------+
//! |   discover(): UDP multicast Probe -> ProbeMatch -> DeviceDescriptor |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`discovery`] - WS-Discovery probe/response engine
//! - [`soap`] - envelope construction, WS-Security, dispatch and fault classification
//! - [`normalize`] - canonical response tree
//! - [`services`] - typed Device/Media/PTZ wrappers
//! - [`config`] - protocol constants and runtime configuration
//!
//! ## Features
//!
//! - `serde`: `Serialize` for descriptors, normalized bodies and result types.

pub mod camera;
pub mod config;
pub mod discovery;
pub mod error;
pub mod normalize;
pub mod services;
pub mod soap;
pub mod transport;

pub use camera::Camera;
pub use config::{ClientConfig, Credentials, DiscoveryConfig};
pub use discovery::{discover, discover_with, DeviceDescriptor, Scope};
pub use error::{Error, ErrorKind, Result};
pub use normalize::{Body, Value};
pub use services::{DeviceClient, MediaClient, PtzClient};
