// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One camera, three services.

use crate::config::{ClientConfig, Credentials};
use crate::discovery::DeviceDescriptor;
use crate::error::Result;
use crate::services::{CapabilityCategory, Capabilities, DeviceClient, MediaClient, PtzClient};
use crate::soap::{Dispatcher, HttpTransport, Service, SoapTransport};
use std::sync::Arc;

/// Device, Media and PTZ clients bound to one host.
///
/// The three clients share one HTTP transport. Media and PTZ start on the
/// conventional `/onvif/<service>` paths; [`Camera::resolve_services`]
/// re-binds them to the addresses the device advertises.
#[derive(Debug, Clone)]
pub struct Camera {
    host: String,
    port: u16,
    device: DeviceClient,
    media: MediaClient,
    ptz: PtzClient,
}

impl Camera {
    /// Camera at `host:port` over HTTP.
    pub fn new(host: &str, port: u16, config: ClientConfig) -> Result<Self> {
        let transport: Arc<dyn SoapTransport> = Arc::new(HttpTransport::new(config.http_timeout)?);
        Ok(Self::with_transport(host, port, config.credentials, transport))
    }

    /// Camera found by discovery. The device service uses the advertised XAddr.
    pub fn from_descriptor(descriptor: &DeviceDescriptor, config: ClientConfig) -> Result<Self> {
        let mut camera = Self::new(&descriptor.address, descriptor.port, config)?;
        camera
            .device
            .dispatcher_mut()
            .set_endpoint(descriptor.device_service_url());
        Ok(camera)
    }

    /// Camera over a caller-provided transport.
    pub fn with_transport(
        host: &str,
        port: u16,
        credentials: Option<Credentials>,
        transport: Arc<dyn SoapTransport>,
    ) -> Self {
        let dispatcher = |service: Service| {
            Dispatcher::with_transport(
                service.default_endpoint(host, port),
                service,
                credentials.clone(),
                Arc::clone(&transport),
            )
        };
        Self {
            host: host.to_string(),
            port,
            device: DeviceClient::with_dispatcher(dispatcher(Service::Device)),
            media: MediaClient::with_dispatcher(dispatcher(Service::Media)),
            ptz: PtzClient::with_dispatcher(dispatcher(Service::Ptz)),
        }
    }

    /// Host the camera was created for.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port the camera was created for.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Device management client.
    pub fn device(&self) -> &DeviceClient {
        &self.device
    }

    /// Media client.
    pub fn media(&self) -> &MediaClient {
        &self.media
    }

    /// PTZ client.
    pub fn ptz(&self) -> &PtzClient {
        &self.ptz
    }

    /// Ask the device where its services live and re-bind to those addresses.
    pub fn resolve_services(&mut self) -> Result<Capabilities> {
        let caps = self.device.get_capabilities(CapabilityCategory::All)?;
        if let Some(xaddr) = caps.media_xaddr() {
            log::debug!("[SOAP] media service at {}", xaddr);
            self.media.dispatcher_mut().set_endpoint(xaddr);
        }
        if let Some(xaddr) = caps.ptz_xaddr() {
            log::debug!("[SOAP] PTZ service at {}", xaddr);
            self.ptz.dispatcher_mut().set_endpoint(xaddr);
        }
        Ok(caps)
    }

    /// Align WS-Security timestamps with the device clock.
    ///
    /// Devices reject tokens whose `Created` is too far from their own
    /// clock. Returns the applied offset (device minus host); zero when the
    /// device does not report UTC.
    pub fn sync_clock(&mut self) -> Result<chrono::Duration> {
        let now = chrono::Utc::now();
        let offset = self
            .device
            .get_system_date_time()?
            .clock_offset(now)
            .unwrap_or_else(chrono::Duration::zero);
        log::debug!(
            "[SOAP] clock offset for {}: {}s",
            self.host,
            offset.num_seconds()
        );
        self.device.dispatcher_mut().set_clock_offset(offset);
        self.media.dispatcher_mut().set_clock_offset(offset);
        self.ptz.dispatcher_mut().set_clock_offset(offset);
        Ok(offset)
    }
}
