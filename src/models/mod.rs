// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Data models for the application.

pub mod profile;
pub mod user;

pub use profile::{Gender, HealthProfile};
pub use user::{PublicUser, User};
