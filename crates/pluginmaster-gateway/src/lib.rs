// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP registry endpoint for the pluginmaster manifest store.
//!
//! Clients fetch the whole document from a stable URL; it is rendered once
//! per store snapshot, so the handler only clones an `Arc` and compares
//! ETags. Publishers use the bearer-authenticated `/v1/plugins` routes.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{router, start_server, GatewayState, ServerConfig};
