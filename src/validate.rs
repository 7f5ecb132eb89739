// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Plausibility guard for dynamic-mode updates.
//!
//! The automation query can catch the task list mid-animation and report a
//! bounding rectangle that is momentarily wrong. Clipping to it would glitch
//! the taskbar, so such samples are dropped and the previous region stays.

use tracing::trace;

use crate::registry::{TaskbarRecord, TaskbarSample};

/// App lists narrower than this (device-independent units) are transient frames.
const MIN_APP_LIST_WIDTH: f64 = 20.0;

pub fn is_valid_dynamic_update(current: Option<&TaskbarRecord>, sampled: Option<&TaskbarSample>) -> bool {
    let (Some(current), Some(sampled)) = (current, sampled) else {
        return false;
    };
    if current.taskbar() != sampled.taskbar {
        return false;
    }

    let app_list = sampled.rects.app_list;
    let tray_left = sampled.rects.tray.left;
    let new_width = app_list.right - app_list.left;

    // App list reaching into the tray
    if app_list.right >= tray_left && tray_left != 0 {
        return false;
    }
    if new_width == tray_left && tray_left != 0 {
        return false;
    }
    // Zero width is a real empty list; tiny or oversized widths are not
    if new_width != 0 && f64::from(new_width) <= MIN_APP_LIST_WIDTH * current.scale_factor {
        return false;
    }
    if new_width != 0 && new_width >= sampled.rects.taskbar.width() {
        return false;
    }

    trace!(
        "validate: app list width {} -> {}",
        current.rects.app_list.width(),
        new_width
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Handle, Rect};
    use crate::registry::{enumerate, TaskbarRects};
    use crate::testing::FakeDesktop;
    use proptest::prelude::*;

    fn record() -> (FakeDesktop, TaskbarRecord) {
        let desktop = FakeDesktop::single_taskbar(Rect::new(0, 1040, 1920, 1080));
        let record = enumerate(&desktop).unwrap().remove(0);
        (desktop, record)
    }

    fn sample(record: &TaskbarRecord, tray: Rect, app_list: Rect) -> TaskbarSample {
        TaskbarSample {
            taskbar: record.taskbar(),
            tray: record.windows.tray,
            app_list: record.windows.app_list,
            rects: TaskbarRects { taskbar: Rect::new(0, 1040, 1920, 1080), tray, app_list },
        }
    }

    #[test]
    fn absent_inputs_are_invalid() {
        let (_desktop, record) = record();
        let s = sample(&record, Rect::default(), Rect::default());
        assert!(!is_valid_dynamic_update(None, Some(&s)));
        assert!(!is_valid_dynamic_update(Some(&record), None));
        assert!(!is_valid_dynamic_update(None, None));
    }

    #[test]
    fn stale_handle_is_invalid() {
        let (_desktop, record) = record();
        let mut s = sample(&record, Rect::new(1620, 1040, 1920, 1080), Rect::new(48, 1040, 600, 1080));
        s.taskbar = Handle::from_raw(0xDEAD);
        assert!(!is_valid_dynamic_update(Some(&record), Some(&s)));
    }

    #[test]
    fn plausible_update_is_valid() {
        let (_desktop, record) = record();
        let s = sample(&record, Rect::new(1620, 1040, 1920, 1080), Rect::new(48, 1040, 600, 1080));
        assert!(is_valid_dynamic_update(Some(&record), Some(&s)));
    }

    #[test]
    fn empty_app_list_without_tray_is_valid() {
        let (_desktop, record) = record();
        let s = sample(&record, Rect::default(), Rect::new(48, 1040, 48, 1080));
        assert!(is_valid_dynamic_update(Some(&record), Some(&s)));
    }

    #[test]
    fn width_equal_to_tray_left_is_invalid() {
        let (_desktop, record) = record();
        // width 700 == tray.left, right edge still short of the tray
        let s = sample(&record, Rect::new(700, 1040, 1920, 1080), Rect::new(-100, 1040, 600, 1080));
        assert!(!is_valid_dynamic_update(Some(&record), Some(&s)));
    }

    #[test]
    fn tiny_width_scales_with_dpi() {
        let (_desktop, mut record) = record();
        let s = sample(&record, Rect::new(1620, 1040, 1920, 1080), Rect::new(48, 1040, 73, 1080));
        assert!(is_valid_dynamic_update(Some(&record), Some(&s)));

        record.scale_factor = 1.5; // 25 <= 30
        assert!(!is_valid_dynamic_update(Some(&record), Some(&s)));
    }

    #[test]
    fn width_of_whole_taskbar_is_invalid() {
        let (_desktop, record) = record();
        let s = sample(&record, Rect::default(), Rect::new(0, 1040, 1920, 1080));
        assert!(!is_valid_dynamic_update(Some(&record), Some(&s)));
    }

    proptest! {
        #[test]
        fn prop_overlapping_tray_is_invalid(
            left in -2000i32..2000,
            width in 0i32..2000,
            tray_left in -3000i32..3000,
        ) {
            prop_assume!(tray_left != 0 && left + width >= tray_left);
            let (_desktop, record) = record();
            let s = sample(
                &record,
                Rect::new(tray_left, 1040, tray_left + 300, 1080),
                Rect::new(left, 1040, left + width, 1080),
            );
            prop_assert!(!is_valid_dynamic_update(Some(&record), Some(&s)));
        }
    }
}
