// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory desktop for unit tests.
//!
//! Models a shell window tree (taskbars with start, tray and app-list
//! children), monitors, installed regions and automation sessions. Every
//! clone shares the same state, so a test keeps one handle while the code
//! under test holds another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::geometry::{Handle, Rect};
use crate::platform::{Alignment, AutomationSession, Desktop};
use crate::region::Region;
use crate::registry::{PRIMARY_TASKBAR_CLASS, SECONDARY_TASKBAR_CLASS, START_CLASS, TRAY_CLASS};

const START_WIDTH: i32 = 48;
const BUTTON_WIDTH: i32 = 44;
const TRAY_WIDTH: i32 = 300;

/// Window state the fill heuristic looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopLevel {
    pub visible: bool,
    pub cloaked: bool,
    pub maximized: bool,
}

impl TopLevel {
    pub const NORMAL: TopLevel = TopLevel { visible: true, cloaked: false, maximized: false };
    pub const MAXIMIZED: TopLevel = TopLevel { visible: true, cloaked: false, maximized: true };
}

#[derive(Debug, Clone)]
struct Window {
    handle: Handle,
    parent: Handle,
    class: String,
    rect: Rect,
    monitor: Handle,
    state: TopLevel,
}

#[derive(Debug, Default)]
struct State {
    next_handle: isize,
    windows: Vec<Window>,
    monitors: Vec<(Handle, Rect)>,
    primary_monitor: Handle,
    dpi: HashMap<Handle, u32>,
    buttons: HashMap<Handle, Vec<Rect>>,
    query_delay: HashMap<Handle, Duration>,
    installed: HashMap<Handle, Region>,
    recovery: HashMap<Handle, Handle>,
    released: Vec<Handle>,
    install_count: usize,
    connect_count: usize,
    composition_refreshes: usize,
    fail_installs: bool,
    fail_setup: bool,
    fail_queries: bool,
    class_at_origin: Option<String>,
    alignment: Option<Alignment>,
    os_build: Option<u32>,
}

impl State {
    fn allocate(&mut self) -> Handle {
        self.next_handle += 1;
        Handle::from_raw(0x100 + self.next_handle)
    }

    fn window(&self, handle: Handle) -> Option<&Window> {
        self.windows.iter().find(|w| w.handle == handle)
    }

    fn add_window(&mut self, parent: Handle, class: &str, rect: Rect, monitor: Handle) -> Handle {
        let handle = self.allocate();
        self.windows.push(Window {
            handle,
            parent,
            class: class.to_owned(),
            rect,
            monitor,
            state: TopLevel::NORMAL,
        });
        handle
    }

    fn child(&self, parent: Handle, class: &str) -> Option<Handle> {
        self.windows.iter().find(|w| w.parent == parent && w.class == class).map(|w| w.handle)
    }

    fn add_taskbar(&mut self, monitor: Handle, rect: Rect, primary: bool) -> Handle {
        let (class, host_class, list_class) = if primary {
            (PRIMARY_TASKBAR_CLASS, "ReBarWindow32", "MSTaskSwWClass")
        } else {
            (SECONDARY_TASKBAR_CLASS, "WorkerW", "MSTaskListWClass")
        };
        let Rect { left, top, right, bottom } = rect;
        let list_left = left + START_WIDTH;
        let list_right = list_left + 2 * BUTTON_WIDTH;

        let taskbar = self.add_window(Handle::NULL, class, rect, monitor);
        self.add_window(taskbar, START_CLASS, Rect::new(left, top, list_left, bottom), monitor);
        self.add_window(taskbar, TRAY_CLASS, Rect::new(right - TRAY_WIDTH, top, right, bottom), monitor);
        let host = self.add_window(taskbar, host_class, Rect::new(list_left, top, right - TRAY_WIDTH, bottom), monitor);
        self.add_window(host, list_class, Rect::new(list_left, top, list_right, bottom), monitor);
        self.buttons.insert(
            taskbar,
            vec![
                Rect::new(list_left, top, list_left + BUTTON_WIDTH, bottom),
                Rect::new(list_left + BUTTON_WIDTH, top, list_right, bottom),
            ],
        );
        taskbar
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDesktop {
    state: Arc<Mutex<State>>,
}

impl FakeDesktop {
    /// One monitor spanning the taskbar's width, with the primary taskbar on it.
    pub fn single_taskbar(taskbar: Rect) -> Self {
        let desktop = Self::default();
        {
            let mut state = desktop.lock();
            let monitor = state.allocate();
            state.monitors.push((monitor, Rect::new(taskbar.left, 0, taskbar.right, taskbar.bottom)));
            state.primary_monitor = monitor;
            state.os_build = Some(22631);
            state.add_taskbar(monitor, taskbar, true);
        }
        desktop
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    // ── Topology ─────────────────────────────────────

    pub fn primary(&self) -> Handle {
        let state = self.lock();
        state.child(Handle::NULL, PRIMARY_TASKBAR_CLASS).expect("no primary taskbar")
    }

    pub fn primary_monitor(&self) -> Handle {
        self.lock().primary_monitor
    }

    /// New primary taskbar on the primary monitor.
    pub fn add_primary(&self, taskbar: Rect) -> Handle {
        let mut state = self.lock();
        let monitor = state.primary_monitor;
        state.add_taskbar(monitor, taskbar, true)
    }

    /// New monitor carrying a secondary taskbar. Returns the taskbar.
    pub fn add_secondary(&self, monitor_rect: Rect, taskbar: Rect) -> Handle {
        let mut state = self.lock();
        let monitor = state.allocate();
        state.monitors.push((monitor, monitor_rect));
        state.add_taskbar(monitor, taskbar, false)
    }

    /// Removes `window` and everything under it.
    pub fn remove_window(&self, window: Handle) {
        let mut state = self.lock();
        let mut doomed = vec![window];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(state.windows.iter().filter(|w| w.parent == parent).map(|w| w.handle));
            i += 1;
        }
        state.windows.retain(|w| !doomed.contains(&w.handle));
    }

    pub fn monitor_of(&self, window: Handle) -> Handle {
        self.lock().window(window).map_or(Handle::NULL, |w| w.monitor)
    }

    pub fn add_top_level(&self, monitor: Handle, top: TopLevel) -> Handle {
        let mut state = self.lock();
        let rect = state.monitors.iter().find(|(m, _)| *m == monitor).map_or(Rect::default(), |(_, r)| *r);
        let handle = state.add_window(Handle::NULL, "ApplicationFrameWindow", rect, monitor);
        if let Some(w) = state.windows.iter_mut().find(|w| w.handle == handle) {
            w.state = top;
        }
        handle
    }

    // ── Children and rectangles ──────────────────────

    pub fn start_of(&self, taskbar: Handle) -> Handle {
        self.lock().child(taskbar, START_CLASS).expect("no start button")
    }

    pub fn tray_of(&self, taskbar: Handle) -> Handle {
        self.lock().child(taskbar, TRAY_CLASS).expect("no tray")
    }

    pub fn app_list_of(&self, taskbar: Handle) -> Handle {
        let state = self.lock();
        ["ReBarWindow32", "WorkerW"]
            .iter()
            .find_map(|host| state.child(taskbar, host))
            .and_then(|host| state.child(host, "MSTaskSwWClass").or_else(|| state.child(host, "MSTaskListWClass")))
            .expect("no app list")
    }

    pub fn rect_of(&self, window: Handle) -> Rect {
        self.lock().window(window).expect("unknown window").rect
    }

    pub fn set_rect(&self, window: Handle, rect: Rect) {
        if let Some(w) = self.lock().windows.iter_mut().find(|w| w.handle == window) {
            w.rect = rect;
        }
    }

    pub fn set_dpi(&self, window: Handle, dpi: u32) {
        self.lock().dpi.insert(window, dpi);
    }

    // ── Automation ───────────────────────────────────

    pub fn set_buttons(&self, taskbar: Handle, buttons: Vec<Rect>) {
        self.lock().buttons.insert(taskbar, buttons);
    }

    pub fn fail_automation_setup(&self, fail: bool) {
        self.lock().fail_setup = fail;
    }

    pub fn fail_automation_queries(&self, fail: bool) {
        self.lock().fail_queries = fail;
    }

    /// Makes every button query on `taskbar` block for `delay`.
    pub fn set_query_delay(&self, taskbar: Handle, delay: Duration) {
        self.lock().query_delay.insert(taskbar, delay);
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connect_count
    }

    // ── Regions ──────────────────────────────────────

    pub fn fail_installs(&self, fail: bool) {
        self.lock().fail_installs = fail;
    }

    pub fn installed_region(&self, window: Handle) -> Option<Region> {
        self.lock().installed.get(&window).cloned()
    }

    /// Successful `set_window_region` calls, removals included.
    pub fn install_count(&self) -> usize {
        self.lock().install_count
    }

    pub fn set_recovery_region(&self, window: Handle, region: Handle) {
        self.lock().recovery.insert(window, region);
    }

    pub fn released_regions(&self) -> Vec<Handle> {
        self.lock().released.clone()
    }

    // ── Shell state ──────────────────────────────────

    pub fn composition_refreshes(&self) -> usize {
        self.lock().composition_refreshes
    }

    pub fn set_class_at_origin(&self, class: Option<&str>) {
        self.lock().class_at_origin = class.map(str::to_owned);
    }

    pub fn set_alignment(&self, alignment: Alignment) {
        self.lock().alignment = Some(alignment);
    }

    pub fn set_os_build(&self, build: Option<u32>) {
        self.lock().os_build = build;
    }
}

impl Desktop for FakeDesktop {
    fn find_window(&self, parent: Handle, after: Handle, class: &str) -> Option<Handle> {
        let state = self.lock();
        let mut candidates = state.windows.iter().filter(|w| w.parent == parent && w.class == class);
        if !after.is_null() {
            candidates.by_ref().find(|w| w.handle == after)?;
        }
        candidates.next().map(|w| w.handle)
    }

    fn window_rect(&self, window: Handle) -> Result<Rect> {
        self.lock()
            .window(window)
            .map(|w| w.rect)
            .ok_or_else(|| Error::window_query(window, "GetWindowRect"))
    }

    fn dpi_for_window(&self, window: Handle) -> u32 {
        self.lock().dpi.get(&window).copied().unwrap_or(96)
    }

    fn monitor_from_window(&self, window: Handle) -> Handle {
        let state = self.lock();
        state.window(window).map_or(state.primary_monitor, |w| w.monitor)
    }

    fn monitor_rect(&self, monitor: Handle) -> Option<Rect> {
        self.lock().monitors.iter().find(|(m, _)| *m == monitor).map(|(_, r)| *r)
    }

    fn set_window_region(&self, window: Handle, region: Option<&Region>) -> Result<()> {
        let mut state = self.lock();
        if state.fail_installs {
            return Err(Error::Region("SetWindowRgn".into()));
        }
        match region {
            Some(region) => state.installed.insert(window, region.clone()),
            None => state.installed.remove(&window),
        };
        state.install_count += 1;
        Ok(())
    }

    fn window_region(&self, window: Handle) -> Handle {
        self.lock().recovery.get(&window).copied().unwrap_or(Handle::NULL)
    }

    fn release_region(&self, region: Handle) {
        self.lock().released.push(region);
    }

    fn top_level_windows(&self) -> Vec<Handle> {
        self.lock().windows.iter().filter(|w| w.parent.is_null()).map(|w| w.handle).collect()
    }

    fn class_at_origin(&self) -> Option<String> {
        self.lock().class_at_origin.clone()
    }

    fn is_visible(&self, window: Handle) -> bool {
        self.lock().window(window).is_some_and(|w| w.state.visible)
    }

    fn is_cloaked(&self, window: Handle) -> bool {
        self.lock().window(window).is_some_and(|w| w.state.cloaked)
    }

    fn is_maximized(&self, window: Handle) -> bool {
        self.lock().window(window).is_some_and(|w| w.state.maximized)
    }

    fn taskbar_alignment(&self) -> Alignment {
        self.lock().alignment.unwrap_or(Alignment::Left)
    }

    fn os_build(&self) -> Option<u32> {
        self.lock().os_build
    }

    fn refresh_composition(&self, _taskbar: Handle) {
        self.lock().composition_refreshes += 1;
    }

    fn connect_automation(&self, taskbar: Handle) -> Result<Box<dyn AutomationSession>> {
        let mut state = self.lock();
        if state.fail_setup {
            return Err(Error::AutomationInit { stage: "root element", reason: "E_FAIL".into() });
        }
        state.connect_count += 1;
        Ok(Box::new(FakeSession {
            source: Source::Live { state: Arc::clone(&self.state), taskbar },
        }))
    }
}

enum Source {
    Fixed(Vec<Rect>),
    Failing,
    Live { state: Arc<Mutex<State>>, taskbar: Handle },
}

/// Automation session reporting canned or live button rectangles.
pub struct FakeSession {
    source: Source,
}

impl FakeSession {
    pub fn new(buttons: Vec<Rect>) -> Self {
        Self { source: Source::Fixed(buttons) }
    }

    pub fn failing() -> Self {
        Self { source: Source::Failing }
    }
}

impl AutomationSession for FakeSession {
    fn task_button_rects(&self) -> Result<Vec<Rect>> {
        match &self.source {
            Source::Fixed(buttons) => Ok(buttons.clone()),
            Source::Failing => Err(Error::AutomationQuery("FindAll".into())),
            Source::Live { state, taskbar } => {
                let delay = {
                    let state = state.lock().unwrap();
                    if state.fail_queries {
                        return Err(Error::AutomationQuery("FindAll".into()));
                    }
                    state.query_delay.get(taskbar).copied().unwrap_or_default()
                };
                // Sleep outside the lock so other displays keep running
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                Ok(state.lock().unwrap().buttons.get(taskbar).cloned().unwrap_or_default())
            }
        }
    }
}
