//! Observable shared state written by the reader loop and read by the UI.
//!
//! [`Observable`] pairs a guarded value with change subscriptions delivered
//! over `crossbeam-channel`, so a presentation layer can react on its own
//! thread without ever being touched by the reader.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::debug;

use crate::STATE_TARGET;
use crate::classify::{LineClass, MissionStatus};

/// A value shared across threads that publishes every change.
#[derive(Debug)]
pub struct Observable<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T> Observable<T>
where
    T: Clone + PartialEq,
{
    /// Creates an observable holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        lock(&self.value).clone()
    }

    /// Stores `next` and notifies subscribers when it differs from the
    /// current value. Returns whether a change happened.
    pub fn set(&self, next: T) -> bool {
        let mut value = lock(&self.value);
        if *value == next {
            return false;
        }
        *value = next.clone();
        // Publish while the value lock is held so subscribers observe
        // changes in the order they were made.
        lock(&self.subscribers).retain(|subscriber| subscriber.send(next.clone()).is_ok());
        true
    }

    /// Subscribes to subsequent changes. The current value is not replayed;
    /// read it with [`Observable::get`] after subscribing.
    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = unbounded();
        lock(&self.subscribers).push(sender);
        receiver
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + PartialEq + Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mission state as last reported by the server.
///
/// One instance is shared (via `Arc`) between the reader loop, which applies
/// classified lines, and any number of readers.
#[derive(Debug, Default)]
pub struct MissionState {
    status: Observable<MissionStatus>,
    running: Observable<bool>,
    name: Observable<String>,
}

impl MissionState {
    /// Creates state with no mission known.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the effect of a classified line.
    pub fn apply(&self, class: &LineClass) {
        match class {
            LineClass::Load { mission } => {
                self.update(MissionStatus::Loaded, mission.clone());
            }
            LineClass::Unload => self.update(MissionStatus::NotLoaded, String::new()),
            LineClass::Ignore => {}
        }
    }

    /// Returns to the initial state.
    pub fn reset(&self) {
        self.update(MissionStatus::Unknown, String::new());
    }

    fn update(&self, status: MissionStatus, name: String) {
        self.name.set(name);
        if self.status.set(status) {
            debug!(target: STATE_TARGET, %status, "mission status changed");
        }
        self.running.set(status.is_running());
    }

    /// Last reported status.
    pub fn status(&self) -> MissionStatus {
        self.status.get()
    }

    /// Whether a mission is running.
    pub fn running(&self) -> bool {
        self.running.get()
    }

    /// Name of the running mission, empty when none is known.
    pub fn name(&self) -> String {
        self.name.get()
    }

    /// Subscribes to status transitions.
    pub fn subscribe_status(&self) -> Receiver<MissionStatus> {
        self.status.subscribe()
    }

    /// Subscribes to running/stopped transitions.
    pub fn subscribe_running(&self) -> Receiver<bool> {
        self.running.subscribe()
    }

    /// Subscribes to mission name changes.
    pub fn subscribe_name(&self) -> Receiver<String> {
        self.name.subscribe()
    }
}
