// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Win32 implementation of [`Desktop`].

mod uia;

use std::ffi::c_void;
use std::mem;

use tracing::{debug, trace};
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_CLOAKED};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::Registry::*;
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::WindowsAndMessaging::*;
use windows_core::PCWSTR;

use crate::error::{Error, Result};
use crate::geometry::{Handle, Rect};
use crate::platform::{Alignment, AutomationSession, Desktop};
use crate::region::Region;

pub use uia::UiaSession;

const EXPLORER_ADVANCED_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced";
const CURRENT_VERSION_KEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion";
const TRANSLUCENTTB_WINDOW: &str = "TTB_WorkerWindow";
const TRANSLUCENTTB_REFRESH: &str = "TTB_ForceRefreshTaskbar";

// ── Handle conversions ───────────────────────────────

fn hwnd(h: Handle) -> HWND {
    HWND(h.raw() as *mut c_void)
}

fn handle(p: *mut c_void) -> Handle {
    Handle::from_raw(p as isize)
}

fn rect(rc: RECT) -> Rect {
    Rect::new(rc.left, rc.top, rc.right, rc.bottom)
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

unsafe fn class_name(window: HWND) -> Option<String> {
    let mut buf = [0u16; 256];
    let len = GetClassNameW(window, &mut buf);
    if len <= 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len as usize]))
}

unsafe extern "system" fn enum_windows_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let vec = &mut *(lparam.0 as *mut Vec<Handle>);
    vec.push(handle(hwnd.0));
    TRUE
}

// ── Regions ──────────────────────────────────────────

/// GDI region for `region`. The caller owns the returned handle.
unsafe fn build_region(region: &Region) -> Result<HRGN> {
    match region {
        Region::RoundRect(r) => {
            let rgn = CreateRoundRectRgn(r.left, r.top, r.right, r.bottom, r.corner, r.corner);
            if rgn.0.is_null() {
                return Err(Error::Region("CreateRoundRectRgn".into()));
            }
            Ok(rgn)
        }
        Region::Union(a, b) => {
            let left = build_region(a)?;
            let right = match build_region(b) {
                Ok(rgn) => rgn,
                Err(e) => {
                    let _ = DeleteObject(left);
                    return Err(e);
                }
            };
            let kind = CombineRgn(left, left, right, RGN_OR);
            let _ = DeleteObject(right);
            if kind == RGN_ERROR {
                let _ = DeleteObject(left);
                return Err(Error::Region("CombineRgn".into()));
            }
            Ok(left)
        }
    }
}

// ── Registry ─────────────────────────────────────────

unsafe fn read_dword(root: HKEY, key: &str, value: &str) -> Option<u32> {
    let key = wide(key);
    let value = wide(value);
    let mut data: u32 = 0;
    let mut size = mem::size_of::<u32>() as u32;
    let status = RegGetValueW(
        root,
        PCWSTR(key.as_ptr()),
        PCWSTR(value.as_ptr()),
        RRF_RT_REG_DWORD,
        None,
        Some(&mut data as *mut u32 as *mut c_void),
        Some(&mut size),
    );
    (status == ERROR_SUCCESS).then_some(data)
}

unsafe fn read_string(root: HKEY, key: &str, value: &str) -> Option<String> {
    let key = wide(key);
    let value = wide(value);
    let mut buf = [0u16; 64];
    let mut size = mem::size_of_val(&buf) as u32;
    let status = RegGetValueW(
        root,
        PCWSTR(key.as_ptr()),
        PCWSTR(value.as_ptr()),
        RRF_RT_REG_SZ,
        None,
        Some(buf.as_mut_ptr() as *mut c_void),
        Some(&mut size),
    );
    if status != ERROR_SUCCESS {
        return None;
    }
    let chars = (size as usize / 2).min(buf.len());
    let text = String::from_utf16_lossy(&buf[..chars]);
    Some(text.trim_end_matches('\0').to_owned())
}

// ── Desktop ──────────────────────────────────────────

/// The live Windows desktop. Stateless; every call goes straight to the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Desktop;

impl Win32Desktop {
    pub fn new() -> Self {
        Self
    }
}

impl Desktop for Win32Desktop {
    fn find_window(&self, parent: Handle, after: Handle, class: &str) -> Option<Handle> {
        let class = wide(class);
        let found = unsafe { FindWindowExW(hwnd(parent), hwnd(after), PCWSTR(class.as_ptr()), PCWSTR::null()) };
        found.ok().map(|w| handle(w.0)).and_then(Handle::non_null)
    }

    fn window_rect(&self, window: Handle) -> Result<Rect> {
        let mut rc = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut rc) }
            .map_err(|e| Error::window_query(window, format!("GetWindowRect: {e}")))?;
        Ok(rect(rc))
    }

    fn dpi_for_window(&self, window: Handle) -> u32 {
        unsafe { GetDpiForWindow(hwnd(window)) }
    }

    fn monitor_from_window(&self, window: Handle) -> Handle {
        let monitor = unsafe { MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST) };
        handle(monitor.0)
    }

    fn monitor_rect(&self, monitor: Handle) -> Option<Rect> {
        let mut info = MONITORINFO { cbSize: mem::size_of::<MONITORINFO>() as u32, ..Default::default() };
        let ok = unsafe { GetMonitorInfoW(HMONITOR(monitor.raw() as *mut c_void), &mut info) };
        ok.as_bool().then(|| rect(info.rcMonitor))
    }

    fn set_window_region(&self, window: Handle, region: Option<&Region>) -> Result<()> {
        unsafe {
            let Some(region) = region else {
                if SetWindowRgn(hwnd(window), HRGN::default(), TRUE) == 0 {
                    return Err(Error::Region(format!("SetWindowRgn(null) on {window}")));
                }
                return Ok(());
            };
            let rgn = build_region(region)?;
            // On success the system owns the region
            if SetWindowRgn(hwnd(window), rgn, TRUE) == 0 {
                let _ = DeleteObject(rgn);
                return Err(Error::Region(format!("SetWindowRgn on {window}")));
            }
            trace!("win32: region installed on {window} ({} part(s))", region.parts().len());
            Ok(())
        }
    }

    fn window_region(&self, window: Handle) -> Handle {
        unsafe {
            let rgn = CreateRectRgn(0, 0, 0, 0);
            if rgn.0.is_null() {
                return Handle::NULL;
            }
            let kind = GetWindowRgn(hwnd(window), rgn);
            if kind == SIMPLEREGION || kind == COMPLEXREGION {
                return handle(rgn.0);
            }
            let _ = DeleteObject(rgn);
            Handle::NULL
        }
    }

    fn release_region(&self, region: Handle) {
        let _ = unsafe { DeleteObject(HRGN(region.raw() as *mut c_void)) };
    }

    fn top_level_windows(&self) -> Vec<Handle> {
        let mut windows: Vec<Handle> = Vec::new();
        unsafe {
            let _ = EnumWindows(Some(enum_windows_cb), LPARAM(&mut windows as *mut Vec<Handle> as isize));
        }
        windows
    }

    fn class_at_origin(&self) -> Option<String> {
        unsafe {
            let top = WindowFromPoint(POINT { x: 0, y: 0 });
            if top.0.is_null() {
                return None;
            }
            class_name(top)
        }
    }

    fn is_visible(&self, window: Handle) -> bool {
        unsafe { IsWindowVisible(hwnd(window)) }.as_bool()
    }

    fn is_cloaked(&self, window: Handle) -> bool {
        let mut cloaked: u32 = 0;
        let ok = unsafe {
            DwmGetWindowAttribute(
                hwnd(window),
                DWMWA_CLOAKED,
                &mut cloaked as *mut u32 as *mut c_void,
                mem::size_of::<u32>() as u32,
            )
        };
        ok.is_ok() && cloaked != 0
    }

    fn is_maximized(&self, window: Handle) -> bool {
        let mut placement = WINDOWPLACEMENT { length: mem::size_of::<WINDOWPLACEMENT>() as u32, ..Default::default() };
        let ok = unsafe { GetWindowPlacement(hwnd(window), &mut placement) };
        ok.is_ok() && placement.showCmd == SW_SHOWMAXIMIZED.0 as u32
    }

    fn taskbar_alignment(&self) -> Alignment {
        match unsafe { read_dword(HKEY_CURRENT_USER, EXPLORER_ADVANCED_KEY, "TaskbarAl") } {
            Some(1) => Alignment::Centred,
            _ => Alignment::Left,
        }
    }

    fn os_build(&self) -> Option<u32> {
        let build = unsafe { read_string(HKEY_LOCAL_MACHINE, CURRENT_VERSION_KEY, "CurrentBuildNumber") }?;
        build.trim().parse().ok()
    }

    fn refresh_composition(&self, taskbar: Handle) {
        let class = wide(TRANSLUCENTTB_WINDOW);
        let message = wide(TRANSLUCENTTB_REFRESH);
        unsafe {
            let Ok(worker) = FindWindowW(PCWSTR(class.as_ptr()), PCWSTR(class.as_ptr())) else {
                return;
            };
            let msg = RegisterWindowMessageW(PCWSTR(message.as_ptr()));
            if msg == 0 {
                return;
            }
            if PostMessageW(worker, msg, WPARAM(0), LPARAM(taskbar.raw())).is_err() {
                debug!("win32: TranslucentTB refresh not delivered for {taskbar}");
            }
        }
    }

    fn connect_automation(&self, taskbar: Handle) -> Result<Box<dyn AutomationSession>> {
        Ok(Box::new(UiaSession::connect(hwnd(taskbar))?))
    }
}
