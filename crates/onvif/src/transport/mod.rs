// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP transport used by WS-Discovery.
//!
//! HTTP for SOAP calls lives in [`crate::soap::transport`].

pub mod multicast;
pub mod udp;

pub use udp::DiscoverySocket;
