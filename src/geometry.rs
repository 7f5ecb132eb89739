// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Handles, rectangles and DPI scaling.

use std::fmt;

/// Opaque OS handle (window, monitor or region). Only compared, never decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(isize);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub const fn from_raw(raw: isize) -> Self {
        Handle(raw)
    }

    pub const fn raw(self) -> isize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `None` for the null handle.
    pub fn non_null(self) -> Option<Handle> {
        if self.is_null() { None } else { Some(self) }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0 as usize)
    }
}

/// Integer rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Fold seed: any real rectangle shrinks/grows it.
    pub const UNBOUNDED: Rect = Rect {
        left: i32::MAX,
        top: i32::MAX,
        right: i32::MIN,
        bottom: i32::MIN,
    };

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Rect { left, top, right, bottom }
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Rect::UNBOUNDED
    }

    /// Component-wise min(left, top) / max(right, bottom).
    pub fn include(self, other: Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }
}

/// Converts a configured value to device pixels, rounding half to even.
pub fn scale(value: f64, factor: f64) -> i32 {
    (value * factor).round_ties_even() as i32
}

/// DPI to scale factor; a failed (zero) DPI query counts as 96.
pub fn scale_factor_from_dpi(dpi: u32) -> f64 {
    let dpi = if dpi == 0 { 96 } else { dpi };
    f64::from(dpi) / 96.0
}
