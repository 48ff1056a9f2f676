//! Fixed-capacity callback registries.
//!
//! Timer callbacks are indexed directly by timer id. GPIO callbacks live in
//! an unordered slot table keyed by (pin, port) and are found by linear scan.
//! Neither table ever grows, shrinks or compacts.

use tracing::{debug, info};

use crate::callback::Callback;
use crate::error::{EmberError, EmberResult};

/// Number of slots in each registry.
pub const CAPACITY: usize = 16;

/// Callbacks keyed by timer id in `[0, CAPACITY)`.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    slots: [Option<Callback>; CAPACITY],
}

impl TimerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index(id: i32) -> Option<usize> {
        usize::try_from(id).ok().filter(|&index| index < CAPACITY)
    }

    /// Store `callback` for `id`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::InvalidArgument`] if `id` is out of range or the
    /// callback is absent.
    pub fn register(&mut self, id: i32, callback: Option<Callback>) -> EmberResult<()> {
        let Some(index) = Self::index(id) else {
            return Err(EmberError::InvalidArgument(format!(
                "timer id {id} out of range (0-{})",
                CAPACITY.saturating_sub(1)
            )));
        };
        let Some(callback) = callback else {
            return Err(EmberError::InvalidArgument(format!(
                "timer callback is absent for id {id}"
            )));
        };

        self.slots[index] = Some(callback);
        info!(timer_id = id, "Timer callback registered");
        Ok(())
    }

    /// Clear the slot for `id`. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::InvalidArgument`] if `id` is out of range.
    pub fn unregister(&mut self, id: i32) -> EmberResult<()> {
        let index = Self::index(id).ok_or_else(|| {
            EmberError::InvalidArgument(format!("timer id {id} out of range"))
        })?;
        self.slots[index] = None;
        info!(timer_id = id, "Timer callback unregistered");
        Ok(())
    }

    /// Callback for `id`, if any. Out-of-range ids have none.
    #[must_use]
    pub fn lookup(&self, id: i32) -> Option<Callback> {
        Self::index(id).and_then(|index| self.slots[index].clone())
    }

    #[must_use]
    pub fn is_registered(&self, id: i32) -> bool {
        Self::index(id).is_some_and(|index| self.slots[index].is_some())
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// An occupied GPIO slot.
#[derive(Debug, Clone)]
struct GpioSlot {
    pin: i32,
    port: i32,
    callback: Callback,
}

impl GpioSlot {
    fn matches(&self, pin: i32, port: i32) -> bool {
        self.pin == pin && self.port == port
    }
}

/// Callbacks keyed by (pin, port), at most one per key.
#[derive(Debug, Default)]
pub struct GpioRegistry {
    slots: [Option<GpioSlot>; CAPACITY],
}

impl GpioRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback` for (pin, port).
    ///
    /// An existing entry for the same key is updated in place; otherwise the
    /// first free slot is taken. Returns the slot index used.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::InvalidArgument`] if the callback is absent or
    /// pin/port is negative, and [`EmberError::ResourceExhausted`] if the key
    /// is new and every slot is occupied.
    pub fn register(
        &mut self,
        pin: i32,
        port: i32,
        callback: Option<Callback>,
    ) -> EmberResult<usize> {
        let Some(callback) = callback else {
            return Err(EmberError::InvalidArgument(format!(
                "gpio callback is absent for pin {pin}, port {port}"
            )));
        };
        if pin < 0 || port < 0 {
            return Err(EmberError::InvalidArgument(format!(
                "gpio pin {pin}, port {port} must not be negative"
            )));
        }

        let slot = self
            .slot_of(pin, port)
            .or_else(|| self.slots.iter().position(Option::is_none))
            .ok_or(EmberError::ResourceExhausted { capacity: CAPACITY })?;

        self.slots[slot] = Some(GpioSlot {
            pin,
            port,
            callback,
        });
        info!(pin, port, slot, "GPIO callback registered");
        Ok(slot)
    }

    /// Remove the entry for (pin, port).
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::NotFound`] if no entry matches.
    pub fn unregister(&mut self, pin: i32, port: i32) -> EmberResult<()> {
        let slot = self
            .slot_of(pin, port)
            .ok_or_else(|| EmberError::NotFound(format!("gpio pin {pin}, port {port}")))?;
        self.slots[slot] = None;
        info!(pin, port, slot, "GPIO callback unregistered");
        Ok(())
    }

    /// Callback of the first slot, in table order, matching (pin, port).
    #[must_use]
    pub fn lookup_first(&self, pin: i32, port: i32) -> Option<Callback> {
        self.slots
            .iter()
            .flatten()
            .find(|slot| slot.matches(pin, port))
            .map(|slot| {
                debug!(pin, port, "Matched GPIO slot");
                slot.callback.clone()
            })
    }

    /// Index of the first slot holding (pin, port).
    #[must_use]
    pub fn slot_of(&self, pin: i32, port: i32) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.matches(pin, port)))
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
