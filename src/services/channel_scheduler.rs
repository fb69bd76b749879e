//! Per-channel execution slots.
//!
//! At most one long-running command may occupy a channel. A slot is taken
//! with [`ChannelScheduler::try_acquire`], which is an atomic
//! check-and-insert under a single mutex, and handed back as a
//! [`SlotGuard`]. Dropping the guard releases the slot, so every exit path of
//! a command (success, error, cancellation, panic) returns the channel to
//! idle.
//!
//! Cancellation is cooperative: [`ChannelScheduler::cancel`] fires the
//! [`CancellationToken`] registered for the running task and the task is
//! expected to notice at its next suspension point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::errors::CommandError;
use crate::domain::models::ChannelId;

/// Observable state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Busy,
}

#[derive(Debug)]
struct Slot {
    task_id: Uuid,
    token: Option<CancellationToken>,
    cancel_requested: bool,
}

/// Owner of the channel -> slot map.
#[derive(Debug, Clone, Default)]
pub struct ChannelScheduler {
    slots: Arc<Mutex<HashMap<ChannelId, Slot>>>,
}

impl ChannelScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ChannelId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Occupy `channel`, failing with [`CommandError::Busy`] if a task holds it.
    pub fn try_acquire(&self, channel: &ChannelId) -> Result<SlotGuard, CommandError> {
        let mut slots = self.slots();
        if slots.contains_key(channel) {
            tracing::debug!(channel = %channel, "slot busy");
            return Err(CommandError::Busy(channel.clone()));
        }

        let task_id = Uuid::new_v4();
        slots.insert(
            channel.clone(),
            Slot {
                task_id,
                token: None,
                cancel_requested: false,
            },
        );
        drop(slots);

        tracing::debug!(channel = %channel, %task_id, "slot acquired");
        Ok(SlotGuard {
            scheduler: self.clone(),
            channel: channel.clone(),
            task_id,
            released: false,
        })
    }

    /// Attach the running task's cancellation token to its slot.
    ///
    /// Returns `false` if the guard no longer owns the slot. If a cancel
    /// arrived before registration, the token is cancelled immediately.
    pub fn register_task(&self, guard: &SlotGuard, token: CancellationToken) -> bool {
        let mut slots = self.slots();
        let Some(slot) = slots
            .get_mut(&guard.channel)
            .filter(|slot| slot.task_id == guard.task_id)
        else {
            return false;
        };

        if slot.cancel_requested {
            token.cancel();
        }
        slot.token = Some(token);
        true
    }

    /// Signal the task running in `channel` to stop.
    ///
    /// Returns `false` and changes nothing when the channel is idle. The slot
    /// stays busy until the task observes the signal and releases it.
    pub fn cancel(&self, channel: &ChannelId) -> bool {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(channel) else {
            return false;
        };

        slot.cancel_requested = true;
        if let Some(token) = &slot.token {
            token.cancel();
        }
        tracing::info!(channel = %channel, task_id = %slot.task_id, "cancellation delivered");
        true
    }

    /// Cancel every running task. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let mut slots = self.slots();
        for slot in slots.values_mut() {
            slot.cancel_requested = true;
            if let Some(token) = &slot.token {
                token.cancel();
            }
        }
        slots.len()
    }

    /// Free the slot held by `task_id`. A stale id leaves the slot alone.
    pub fn release(&self, channel: &ChannelId, task_id: Uuid) {
        let mut slots = self.slots();
        if slots.get(channel).is_some_and(|slot| slot.task_id == task_id) {
            slots.remove(channel);
            tracing::debug!(channel = %channel, %task_id, "slot released");
        }
    }

    pub fn state(&self, channel: &ChannelId) -> SlotState {
        if self.slots().contains_key(channel) {
            SlotState::Busy
        } else {
            SlotState::Idle
        }
    }

    pub fn is_busy(&self, channel: &ChannelId) -> bool {
        self.state(channel) == SlotState::Busy
    }

    /// Channels with a running task, sorted.
    pub fn busy_channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self.slots().keys().cloned().collect();
        channels.sort();
        channels
    }
}

/// Exclusive hold on a channel slot; releases it on drop.
#[derive(Debug)]
pub struct SlotGuard {
    scheduler: ChannelScheduler,
    channel: ChannelId,
    task_id: Uuid,
    released: bool,
}

impl SlotGuard {
    pub const fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub const fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Release explicitly. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.scheduler.release(&self.channel, self.task_id);
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
