//! Debounced digital inputs.
//!
//! A [`Debouncer`] is the pure state machine; [`DebouncedInput`] pairs it
//! with a pin and a button-bank bit:
//!
//! ```text
//! Settled(v) --sample != v--> Pending(!v, run) --policy met--> Settled(!v)
//!            <--sample == v--
//! ```
//!
//! Only the transition into `Settled` writes to the controller.

use embedded_hal::digital::InputPin;

use crate::config::DEFAULT_DEBOUNCE;
use crate::error::Error;
use crate::hid::controller::{PageId, ReportController, Transport};

/// When a changed level is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebouncePolicy {
    /// After this many consecutive samples at the new level.
    Samples(u8),
    /// After the new level has held for this many milliseconds.
    Millis(u32),
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        DEFAULT_DEBOUNCE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    Settled(bool),
    Pending {
        candidate: bool,
        run_length: u8,
        since_ms: u64,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    policy: DebouncePolicy,
    state: DebounceState,
}

impl Debouncer {
    /// Starts settled at "released".
    pub const fn new(policy: DebouncePolicy) -> Self {
        Self {
            policy,
            state: DebounceState::Settled(false),
        }
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Last settled value.
    pub fn value(&self) -> bool {
        match self.state {
            DebounceState::Settled(value) => value,
            DebounceState::Pending { candidate, .. } => !candidate,
        }
    }

    /// Feed one raw sample; returns the new value on a settled edge.
    pub fn update(&mut self, sample: bool, now_ms: u64) -> Option<bool> {
        let settled = self.value();
        let (run_length, since_ms) = match self.state {
            _ if sample == settled => {
                self.state = DebounceState::Settled(settled);
                return None;
            }
            DebounceState::Settled(_) => (1, now_ms),
            DebounceState::Pending {
                run_length,
                since_ms,
                ..
            } => (run_length.saturating_add(1), since_ms),
        };

        let accepted = match self.policy {
            DebouncePolicy::Samples(needed) => run_length >= needed,
            DebouncePolicy::Millis(ms) => now_ms.saturating_sub(since_ms) >= u64::from(ms),
        };
        if accepted {
            self.state = DebounceState::Settled(sample);
            Some(sample)
        } else {
            self.state = DebounceState::Pending {
                candidate: sample,
                run_length,
                since_ms,
            };
            None
        }
    }
}

/// A pin debounced into one button-bank bit.
pub struct DebouncedInput<P> {
    pin: P,
    /// Active-low wiring: a low pin reads as pressed.
    inverted: bool,
    debouncer: Debouncer,
    binding: Option<(PageId, u16)>,
}

impl<P: InputPin> DebouncedInput<P> {
    pub fn new(pin: P, policy: DebouncePolicy) -> Self {
        Self {
            pin,
            inverted: false,
            debouncer: Debouncer::new(policy),
            binding: None,
        }
    }

    /// Pressed when the pin is low (pull-up wiring).
    pub fn active_low(pin: P, policy: DebouncePolicy) -> Self {
        Self {
            inverted: true,
            ..Self::new(pin, policy)
        }
    }

    /// Wire this input to button `id` of `page`.
    pub fn bind<T: Transport, const D: usize>(
        &mut self,
        controller: &ReportController<T, D>,
        page: PageId,
        id: u16,
    ) -> Result<(), Error> {
        let bank = controller.buttons(page)?;
        if !bank.contains(id) {
            return Err(Error::ButtonOutOfRange {
                id,
                first: bank.first(),
                last: bank.last(),
            });
        }
        self.binding = Some((page, id));
        Ok(())
    }

    pub fn binding(&self) -> Option<(PageId, u16)> {
        self.binding
    }

    pub fn state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// Debounced logical value.
    pub fn value(&self) -> bool {
        self.debouncer.value()
    }

    /// Sample the pin once.
    ///
    /// Does nothing until bound.  On a settled edge the new value is
    /// written to the bound button and returned.
    pub fn poll<T: Transport, const D: usize>(
        &mut self,
        now_ms: u64,
        controller: &ReportController<T, D>,
    ) -> Result<Option<bool>, Error> {
        let Some((page, id)) = self.binding else {
            return Ok(None);
        };
        let Ok(high) = self.pin.is_high() else {
            warn!("button {}: pin read failed", id);
            return Ok(None);
        };
        let Some(pressed) = self.debouncer.update(high != self.inverted, now_ms) else {
            return Ok(None);
        };
        debug!("button {}: {}", id, if pressed { "pressed" } else { "released" });
        controller.set_button(page, id, pressed)?;
        Ok(Some(pressed))
    }
}
