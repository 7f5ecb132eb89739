// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Clips Windows taskbars to rounded, margin-trimmed regions.
//!
//! Each tick samples every taskbar's visual extent through UI Automation,
//! decides whether its clip needs rebuilding, synthesizes the region as a
//! value and installs it in one call.

pub mod bounds;
pub mod bridge;
pub mod change;
pub mod engine;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod platform;
pub mod region;
pub mod registry;
pub mod settings;
pub mod validate;

#[cfg(windows)]
pub mod win32;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Engine, TickOutcome};
pub use error::{Error, Result};
pub use geometry::{Handle, Rect};
pub use platform::{Alignment, AutomationSession, Desktop};
pub use region::Region;
pub use settings::Settings;
