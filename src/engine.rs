// roundedbar — Rounded taskbar clip regions through the accessibility layer
// Copyright (C) 2026  Martin Gehrken (IamLumae)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Poll-and-apply loop.
//!
//! Every display gets its own worker thread that owns the display's record
//! (and with it the automation session). The engine hands each idle worker
//! the tick's settings snapshot and waits for all of them up to a shared
//! deadline. A worker stuck in a blocking automation call misses the
//! deadline, is skipped until it answers, and never holds up the others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, error, info, trace, warn};

use crate::change::refresh_required;
use crate::error::{Error, Result};
use crate::fill::should_be_filled;
use crate::geometry::Handle;
use crate::platform::{is_windows11, Alignment, Desktop};
use crate::region::{reset_taskbar, update_taskbar};
use crate::registry::{discover, taskbar_topology_changed, TaskbarGeometry, TaskbarRecord, TaskbarWindows};
use crate::settings::Settings;
use crate::validate::is_valid_dynamic_update;

/// Result of one display's tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new region was installed and the sampled rects committed.
    Applied,
    Unchanged,
    /// Dynamic sample failed validation; previous region kept.
    Rejected,
    /// Unclipped because a maximized window shares the monitor.
    Filled,
    Ignored,
    /// Building, sampling or installation failed; retried next tick.
    Failed,
    /// Bridge setup failed; waits for re-enumeration.
    Disabled,
}

// ── Per-display state ────────────────────────────────

/// One display's record plus what was last applied to it.
#[derive(Debug)]
pub struct DisplayState {
    pub index: usize,
    pub record: TaskbarRecord,
    applied: Option<Arc<Settings>>,
    filled: bool,
    clipped: bool,
    /// Set once the engine has let go of this display; no further installs.
    retired: Arc<AtomicBool>,
}

impl DisplayState {
    pub fn new(index: usize, record: TaskbarRecord, retired: Arc<AtomicBool>) -> Self {
        Self { index, record, applied: None, filled: false, clipped: false, retired }
    }

    pub fn tick(&mut self, desktop: &dyn Desktop, settings: &Arc<Settings>) -> TickOutcome {
        let taskbar = self.record.taskbar();
        self.record.ignored = settings.is_display_ignored(self.index);
        if self.record.ignored {
            if self.clipped && reset_taskbar(desktop, taskbar, settings).is_ok() {
                self.clipped = false;
                self.applied = None;
            }
            return TickOutcome::Ignored;
        }

        if should_be_filled(desktop, taskbar, settings) {
            if !self.filled {
                if let Err(e) = reset_taskbar(desktop, taskbar, settings) {
                    warn!("display {}: unclip for fill failed: {e}", self.index);
                    return TickOutcome::Failed;
                }
                debug!("display {}: filled", self.index);
                self.filled = true;
                self.clipped = false;
            }
            return TickOutcome::Filled;
        }

        let sample = match self.record.sample(desktop) {
            Ok(sample) => sample,
            Err(e) => {
                debug!("display {}: sample failed: {e}", self.index);
                return TickOutcome::Failed;
            }
        };

        let settings_changed = !self.applied.as_ref().is_some_and(|a| Arc::ptr_eq(a, settings));
        let force = settings_changed || self.filled || !self.clipped;
        if !force && !refresh_required(&self.record.rects, &sample.rects, settings.is_dynamic) {
            return TickOutcome::Unchanged;
        }
        if settings.is_dynamic && !is_valid_dynamic_update(Some(&self.record), Some(&sample)) {
            trace!("display {}: dynamic sample rejected", self.index);
            return TickOutcome::Rejected;
        }

        if self.retired.load(Ordering::Acquire) {
            return TickOutcome::Failed;
        }
        let candidate = TaskbarGeometry { rects: sample.rects, ..self.record.geometry() };
        if let Err(e) = update_taskbar(desktop, &candidate, settings) {
            debug!("display {}: install failed: {e}", self.index);
            return TickOutcome::Failed;
        }
        // Only now does the record take the new rects
        self.record.rects = sample.rects;
        self.applied = Some(Arc::clone(settings));
        self.filled = false;
        self.clipped = true;
        TickOutcome::Applied
    }

    /// Restores the native shape and releases the record's resources.
    pub fn shutdown(&mut self, desktop: &dyn Desktop, settings: &Settings) {
        if self.clipped || self.filled {
            if let Err(e) = reset_taskbar(desktop, self.record.taskbar(), settings) {
                warn!("display {}: reset on shutdown failed: {e}", self.index);
            }
        }
        self.record.release(desktop);
    }
}

// ── Workers ──────────────────────────────────────────

enum Command {
    Tick(Arc<Settings>),
    /// `restore` resets the taskbar before the record is released.
    Shutdown { settings: Arc<Settings>, restore: bool },
}

struct DisplayWorker {
    index: usize,
    commands: Sender<Command>,
    outcomes: Receiver<TickOutcome>,
    busy: bool,
    retired: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

fn spawn_worker(index: usize, windows: TaskbarWindows, desktop: Arc<dyn Desktop>) -> Result<DisplayWorker> {
    let (commands, command_rx) = bounded::<Command>(1);
    let (outcome_tx, outcomes) = bounded::<TickOutcome>(1);
    let retired = Arc::new(AtomicBool::new(false));

    let worker_retired = Arc::clone(&retired);
    let thread = thread::Builder::new()
        .name(format!("taskbar-{index}"))
        .spawn(move || run_worker(index, windows, desktop, worker_retired, command_rx, outcome_tx))
        .map_err(|e| Error::WorkerSpawn { index, reason: e.to_string() })?;

    Ok(DisplayWorker {
        index,
        commands,
        outcomes,
        busy: false,
        retired,
        thread: Some(thread),
    })
}

/// A display's worker-side lifecycle.
enum Slot {
    /// Record not built yet; the last attempt failed transiently.
    Pending(TaskbarWindows),
    Ready(DisplayState),
    /// Bridge setup failed; waits for re-enumeration.
    Disabled,
}

impl Slot {
    fn build(index: usize, windows: TaskbarWindows, desktop: &dyn Desktop, retired: &Arc<AtomicBool>) -> Self {
        match TaskbarRecord::build(windows, desktop) {
            Ok(record) => Slot::Ready(DisplayState::new(index, record, Arc::clone(retired))),
            Err(e) if e.is_fatal_for_display() => {
                error!("display {index}: disabled until re-enumeration: {e}");
                Slot::Disabled
            }
            Err(e) => {
                debug!("display {index}: build failed, retrying next tick: {e}");
                Slot::Pending(windows)
            }
        }
    }

    fn tick(&mut self, index: usize, desktop: &dyn Desktop, settings: &Arc<Settings>, retired: &Arc<AtomicBool>) -> TickOutcome {
        if let Slot::Pending(windows) = *self {
            *self = Slot::build(index, windows, desktop, retired);
        }
        match self {
            Slot::Ready(state) => state.tick(desktop, settings),
            Slot::Pending(_) => TickOutcome::Failed,
            Slot::Disabled => TickOutcome::Disabled,
        }
    }
}

fn run_worker(
    index: usize,
    windows: TaskbarWindows,
    desktop: Arc<dyn Desktop>,
    retired: Arc<AtomicBool>,
    commands: Receiver<Command>,
    outcomes: Sender<TickOutcome>,
) {
    // The record is built here so its automation session lives on this thread
    let mut slot = Slot::build(index, windows, &*desktop, &retired);
    let mut last_settings: Option<Arc<Settings>> = None;
    let mut restore = true;

    // Runs until Shutdown or until the engine drops its sender
    for command in commands.iter() {
        match command {
            Command::Tick(settings) => {
                let outcome = slot.tick(index, &*desktop, &settings, &retired);
                trace!("display {index}: {outcome:?}");
                // A detached worker has no listener; keep going so Shutdown still runs
                let _ = outcomes.send(outcome);
                last_settings = Some(settings);
            }
            Command::Shutdown { settings, restore: r } => {
                last_settings = Some(settings);
                restore = r;
                break;
            }
        }
    }

    if let Slot::Ready(state) = &mut slot {
        match (restore, last_settings) {
            (true, Some(settings)) => state.shutdown(&*desktop, &settings),
            _ => state.record.release(&*desktop),
        }
    }
    debug!("display {index}: worker exit");
}

impl DisplayWorker {
    /// Idle workers always restore their taskbar; busy ones only with `force_restore`.
    fn stop(&mut self, settings: &Arc<Settings>, force_restore: bool) {
        self.retired.store(true, Ordering::Release);
        // A busy worker already took its Tick, so the slot is free
        let restore = force_restore || !self.busy;
        let _ = self.commands.try_send(Command::Shutdown { settings: Arc::clone(settings), restore });
        if let Some(thread) = self.thread.take() {
            if self.busy {
                debug!("display {}: detaching busy worker", self.index);
            } else if thread.join().is_err() {
                warn!("display {}: worker panicked", self.index);
            }
        }
    }
}

// ── Engine ───────────────────────────────────────────

pub struct Engine {
    desktop: Arc<dyn Desktop>,
    /// As configured; never mutated.
    settings: Arc<Settings>,
    /// Configured settings plus detected shell state, rebuilt when either changes.
    snapshot: Arc<Settings>,
    windows11: bool,
    primary: Handle,
    workers: Vec<DisplayWorker>,
}

impl Engine {
    pub fn new(desktop: Arc<dyn Desktop>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let windows11 = is_windows11(&*desktop);
        let settings = Arc::new(settings);
        let mut engine = Self {
            snapshot: Arc::clone(&settings),
            desktop,
            settings,
            windows11,
            primary: Handle::NULL,
            workers: Vec::new(),
        };
        engine.refresh_snapshot();
        engine.enumerate()?;
        Ok(engine)
    }

    pub fn display_count(&self) -> usize {
        self.workers.len()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swaps the configuration; every display re-renders on the next tick.
    pub fn set_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings = Arc::new(settings);
        self.snapshot = Arc::clone(&self.settings);
        self.refresh_snapshot();
        Ok(())
    }

    fn refresh_snapshot(&mut self) {
        let mut next = (*self.settings).clone();
        if next.detect_alignment {
            next.is_centred = self.desktop.taskbar_alignment() == Alignment::Centred;
        }
        if next.detect_windows11 {
            next.is_windows11 = self.windows11;
        }
        // Keep the same Arc while nothing changed so workers do not re-render
        if next != *self.snapshot {
            self.snapshot = Arc::new(next);
        }
    }

    fn enumerate(&mut self) -> Result<()> {
        // A busy worker's taskbar may live on under a new worker; leave its region alone
        self.stop_workers(false);
        let found = discover(&*self.desktop);
        self.primary = found.first().filter(|w| w.primary).map_or(Handle::NULL, |w| w.taskbar);
        for (index, windows) in found.into_iter().enumerate() {
            let worker = spawn_worker(index, windows, Arc::clone(&self.desktop))?;
            self.workers.push(worker);
        }
        info!("engine: {} display(s), primary {}", self.workers.len(), self.primary);
        Ok(())
    }

    /// `restoring` also resets taskbars whose worker is still busy.
    fn stop_workers(&mut self, restoring: bool) {
        for worker in &mut self.workers {
            worker.stop(&self.snapshot, restoring);
        }
        self.workers.clear();
    }

    /// One poll cycle. Entry `i` is `None` when display `i` timed out or was skipped.
    pub fn tick(&mut self) -> Result<Vec<Option<TickOutcome>>> {
        self.refresh_snapshot();
        if taskbar_topology_changed(&*self.desktop, self.workers.len(), self.primary) {
            info!("engine: taskbar topology changed, re-enumerating");
            self.enumerate()?;
        }

        let settings = Arc::clone(&self.snapshot);
        let mut outcomes = vec![None; self.workers.len()];

        for worker in &mut self.workers {
            // Late answer from a tick that timed out
            if worker.busy && worker.outcomes.try_recv().is_ok() {
                worker.busy = false;
            }
            if worker.busy {
                continue;
            }
            match worker.commands.try_send(Command::Tick(Arc::clone(&settings))) {
                Ok(()) => worker.busy = true,
                Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => warn!("display {}: worker gone", worker.index),
            }
        }

        let deadline = Instant::now() + settings.tick_timeout();
        for (slot, worker) in outcomes.iter_mut().zip(&mut self.workers) {
            if !worker.busy {
                continue;
            }
            match worker.outcomes.recv_deadline(deadline) {
                Ok(outcome) => {
                    worker.busy = false;
                    *slot = Some(outcome);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("display {}: tick timed out, skipping", worker.index);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    worker.busy = false;
                    warn!("display {}: worker gone", worker.index);
                }
            }
        }
        Ok(outcomes)
    }

    /// Ticks until `keep_running` returns false.
    pub fn run(&mut self, mut keep_running: impl FnMut() -> bool) -> Result<()> {
        while keep_running() {
            let started = Instant::now();
            self.tick()?;
            if let Some(rest) = self.settings.poll_interval().checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_workers(true);
    }
}
