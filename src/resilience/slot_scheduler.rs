use crate::{Error, ErrorContext, Result};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct SlotSchedulerSnapshot {
    pub min_interval: Duration,
    /// Time from now until the most recently allocated slot, if it lies in the future.
    pub backlog: Option<Duration>,
}

/// Hands out dispatch slots spaced `min_interval` apart.
///
/// - Slots are relative to the previously allocated slot, never to "now", so a
///   burst of enqueues is spread out instead of fired at once
/// - A zero interval disables rate limiting: every slot equals the origin
pub struct SlotScheduler {
    min_interval: Duration,
    last_slot: Mutex<Instant>,
}

impl SlotScheduler {
    /// Build a scheduler for at most `max_frequency` requests per second (0 = unlimited).
    pub fn from_frequency(max_frequency: f64) -> Result<Self> {
        let min_interval = min_interval_for(max_frequency)?;
        Ok(Self::with_origin(min_interval, Instant::now()))
    }

    pub fn with_origin(min_interval: Duration, origin: Instant) -> Self {
        Self {
            min_interval,
            last_slot: Mutex::new(origin),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Allocate the next slot.
    pub fn next_slot(&self) -> Instant {
        let mut last = self
            .last_slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let slot = *last + self.min_interval;
        *last = slot;
        slot
    }

    pub fn last_slot(&self) -> Instant {
        *self
            .last_slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SlotSchedulerSnapshot {
        let last = self.last_slot();
        let now = Instant::now();
        SlotSchedulerSnapshot {
            min_interval: self.min_interval,
            backlog: (last > now).then(|| last - now),
        }
    }
}

/// `1 / max_frequency`, or zero when the frequency is zero.
pub fn min_interval_for(max_frequency: f64) -> Result<Duration> {
    if !max_frequency.is_finite() || max_frequency < 0.0 {
        return Err(Error::configuration_with_context(
            "max_frequency must be a finite, non-negative number",
            ErrorContext::new()
                .with_field_path("max_frequency")
                .with_details(format!("got {}", max_frequency))
                .with_source("slot_scheduler"),
        ));
    }
    if max_frequency == 0.0 {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::from_secs_f64(1.0 / max_frequency))
}
