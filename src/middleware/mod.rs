// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, device signatures, security headers).

pub mod auth;
pub mod device_auth;
pub mod security;

pub use auth::require_auth;
pub use device_auth::require_device_signature;
