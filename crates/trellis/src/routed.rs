//! Pooled event data for the command-routing attached events.
//!
//! Raising a command walks the tree twice (tunnel then bubble) on the hot
//! input path, so the mutable event records are pooled rather than allocated
//! per raise. Checkout hands back a [`Pooled`] guard that resets the record
//! and returns it to the pool on drop, giving exactly-once release even when
//! a handler panics.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use crate::command::{Command, ParamValue};

/// Phase of a routed event: tunneling from the root toward the target, or
/// bubbling from the target back toward the root. Preview events tunnel,
/// main events bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingPass {
    /// Root-to-target (preview) phase.
    Tunnel,
    /// Target-to-root (main) phase.
    Bubble,
}

/// Event data for the `PreviewCanExecute`/`CanExecute` attached events.
#[derive(Debug, Default)]
pub struct CanExecuteEventData {
    /// Command being queried.
    command: Option<Arc<Command>>,
    /// Command parameter.
    parameter: ParamValue,
    /// Set when a handler has answered the query; stops further routing.
    handled: bool,
    /// Whether the command may execute.
    can_execute: bool,
    /// When set, the triggering input event is left unhandled so it can
    /// reach other listeners and command sources.
    continue_routing: bool,
}

impl CanExecuteEventData {
    /// Bind the record to a command and parameter for one raise.
    pub(crate) fn prime(&mut self, command: Arc<Command>, parameter: ParamValue) {
        self.command = Some(command);
        self.parameter = parameter;
    }

    /// The command being queried.
    pub fn command(&self) -> Option<&Arc<Command>> {
        self.command.as_ref()
    }

    /// The command parameter.
    pub fn parameter(&self) -> &ParamValue {
        &self.parameter
    }

    /// Has a handler answered the query?
    pub fn handled(&self) -> bool {
        self.handled
    }

    /// Mark the query as answered.
    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    /// May the command execute?
    pub fn can_execute(&self) -> bool {
        self.can_execute
    }

    /// Record whether the command may execute.
    pub fn set_can_execute(&mut self, can_execute: bool) {
        self.can_execute = can_execute;
    }

    /// Should the triggering input event continue routing?
    pub fn continue_routing(&self) -> bool {
        self.continue_routing
    }

    /// Request that the triggering input event be left unhandled.
    pub fn set_continue_routing(&mut self, continue_routing: bool) {
        self.continue_routing = continue_routing;
    }
}

/// Event data for the `PreviewExecuted`/`Executed` attached events.
#[derive(Debug, Default)]
pub struct ExecutedEventData {
    /// Command being executed.
    command: Option<Arc<Command>>,
    /// Command parameter.
    parameter: ParamValue,
    /// Set when a handler has run; stops further routing.
    handled: bool,
}

impl ExecutedEventData {
    /// Bind the record to a command and parameter for one raise.
    pub(crate) fn prime(&mut self, command: Arc<Command>, parameter: ParamValue) {
        self.command = Some(command);
        self.parameter = parameter;
    }

    /// The command being executed.
    pub fn command(&self) -> Option<&Arc<Command>> {
        self.command.as_ref()
    }

    /// The command parameter.
    pub fn parameter(&self) -> &ParamValue {
        &self.parameter
    }

    /// Has a handler run for this event?
    pub fn handled(&self) -> bool {
        self.handled
    }

    /// Mark the event as handled.
    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }
}

/// A record that can live in the event-data pool.
pub trait PoolItem: Default {
    /// Reset all fields to their defaults before the record is shelved.
    fn reset(&mut self);

    /// Take a free record from the shelves, if one is available.
    fn take(shelves: &mut Shelves) -> Option<Box<Self>>;

    /// Return a record to the shelves. Dropped instead when the shelf is at
    /// capacity, bounding pool growth.
    fn put(shelves: &mut Shelves, item: Box<Self>);
}

impl PoolItem for CanExecuteEventData {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn take(shelves: &mut Shelves) -> Option<Box<Self>> {
        shelves.can_execute.pop()
    }

    fn put(shelves: &mut Shelves, item: Box<Self>) {
        if shelves.can_execute.len() < MAX_POOLED {
            shelves.can_execute.push(item);
        }
    }
}

impl PoolItem for ExecutedEventData {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn take(shelves: &mut Shelves) -> Option<Box<Self>> {
        shelves.executed.pop()
    }

    fn put(shelves: &mut Shelves, item: Box<Self>) {
        if shelves.executed.len() < MAX_POOLED {
            shelves.executed.push(item);
        }
    }
}

/// Upper bound on retained records per shelf.
const MAX_POOLED: usize = 32;

/// Free-list storage behind the pool lock.
#[derive(Default)]
pub struct Shelves {
    /// Free can-execute records.
    can_execute: Vec<Box<CanExecuteEventData>>,
    /// Free executed records.
    executed: Vec<Box<ExecutedEventData>>,
}

/// Bounded-growth pool of routed event data records.
#[derive(Default)]
pub struct EventDataPool {
    /// Free lists, guarded by a single pool-level lock held only on
    /// checkout and release.
    shelves: Mutex<Shelves>,
}

impl EventDataPool {
    /// Construct an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a can-execute record.
    pub fn acquire_can_execute(&self) -> Pooled<'_, CanExecuteEventData> {
        self.acquire()
    }

    /// Check out an executed record.
    pub fn acquire_executed(&self) -> Pooled<'_, ExecutedEventData> {
        self.acquire()
    }

    /// Check out a record of the given type, allocating when the shelf is
    /// empty.
    fn acquire<T: PoolItem>(&self) -> Pooled<'_, T> {
        let item = {
            let mut shelves = self.lock_shelves();
            T::take(&mut shelves)
        };
        Pooled {
            pool: self,
            item: Some(item.unwrap_or_default()),
        }
    }

    /// Number of free can-execute records currently shelved.
    pub fn free_can_execute(&self) -> usize {
        self.lock_shelves().can_execute.len()
    }

    /// Number of free executed records currently shelved.
    pub fn free_executed(&self) -> usize {
        self.lock_shelves().executed.len()
    }

    /// Lock the shelves, recovering from a poisoned lock.
    ///
    /// A panic while the lock was held can only have interrupted a push or
    /// pop on a Vec, which leaves the shelves structurally sound.
    fn lock_shelves(&self) -> std::sync::MutexGuard<'_, Shelves> {
        self.shelves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Scoped checkout of a pooled event-data record.
///
/// Dereferences to the record; on drop the record is reset to defaults and
/// returned to the pool. Drop runs on unwind as well, so the release happens
/// exactly once on every path.
pub struct Pooled<'a, T: PoolItem> {
    /// Owning pool.
    pool: &'a EventDataPool,
    /// Checked-out record. Always `Some` until drop.
    item: Option<Box<T>>,
}

impl<T: PoolItem> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled item present until drop")
    }
}

impl<T: PoolItem> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled item present until drop")
    }
}

impl<T: PoolItem> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(mut item) = self.item.take() {
            item.reset();
            let mut shelves = self.pool.lock_shelves();
            T::put(&mut shelves, item);
        }
    }
}
