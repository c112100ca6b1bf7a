use async_trait::async_trait;
use dashmap::DashMap;
use game_core::{RoomPhase, time_limit_for};
use game_persistence::RoomStore;
use game_types::ServerMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use crate::notifier::Notifier;
use crate::room_lock::RoomLocks;

pub const TICK: Duration = Duration::from_secs(1);

/// Receives a room's turn once its countdown has run out
#[async_trait]
pub trait TurnExpiry: Send + Sync {
    async fn turn_expired(&self, room_id: &str, player_id: &str);
}

struct TimerEntry {
    generation: u64,
    handle: AbortHandle,
}

struct Inner {
    store: Arc<dyn RoomStore>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<RoomLocks>,
    expiry: Weak<dyn TurnExpiry>,
    timers: DashMap<String, TimerEntry>,
    next_generation: AtomicU64,
}

impl Inner {
    fn is_registered(&self, room_id: &str, generation: u64) -> bool {
        self.timers
            .get(room_id)
            .is_some_and(|entry| entry.generation == generation)
    }

    fn unregister(&self, room_id: &str, generation: u64) {
        self.timers
            .remove_if(room_id, |_, entry| entry.generation == generation);
    }
}

/// Per-room turn countdowns.
///
/// `start` and `cancel` must be called while holding the room's lock, so a
/// countdown is never stopped halfway through a tick.
#[derive(Clone)]
pub struct TurnTimerScheduler {
    inner: Arc<Inner>,
}

impl TurnTimerScheduler {
    pub fn new(
        store: Arc<dyn RoomStore>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<RoomLocks>,
        expiry: Weak<dyn TurnExpiry>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                notifier,
                locks,
                expiry,
                timers: DashMap::new(),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start counting down the room's stored time limit, replacing any
    /// countdown already running for it.
    pub fn start(&self, room_id: &str) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let task = tokio::spawn(run_countdown(
            self.inner.clone(),
            room_id.to_string(),
            generation,
        ));

        let previous = self.inner.timers.insert(
            room_id.to_string(),
            TimerEntry {
                generation,
                handle: task.abort_handle(),
            },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        debug!(room_id, generation, "Turn timer started");
    }

    pub fn cancel(&self, room_id: &str) {
        if let Some((_, entry)) = self.inner.timers.remove(room_id) {
            entry.handle.abort();
            debug!(room_id, "Turn timer cancelled");
        }
    }

    pub fn is_running(&self, room_id: &str) -> bool {
        self.inner.timers.contains_key(room_id)
    }

    pub fn running_count(&self) -> usize {
        self.inner.timers.len()
    }
}

/// Broadcast the full limit as soon as the countdown begins
async fn announce_start(inner: &Inner, room_id: &str, generation: u64) {
    let _guard = inner.locks.lock(room_id).await;
    if !inner.is_registered(room_id, generation) {
        return;
    }

    match inner.store.get(room_id).await {
        Ok(Some(room)) if room.phase() == RoomPhase::InProgress => {
            inner
                .notifier
                .broadcast(
                    room_id,
                    ServerMessage::TimeUpdate {
                        room_id: room_id.to_string(),
                        time_left: room
                            .time_limit
                            .unwrap_or_else(|| time_limit_for(room.rules_completed)),
                        current_player: room.current_username(),
                    },
                )
                .await;
        }
        Ok(_) => {}
        Err(e) => warn!(room_id, "Failed to load room for timer start: {}", e),
    }
}

async fn run_countdown(inner: Arc<Inner>, room_id: String, generation: u64) {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    announce_start(&inner, &room_id, generation).await;

    // Within one countdown the limit only goes down, so the lower of the
    // stored and the last counted value wins.
    let mut counted: Option<u32> = None;

    loop {
        ticker.tick().await;

        let guard = inner.locks.lock(&room_id).await;
        if !inner.is_registered(&room_id, generation) {
            return;
        }

        let mut room = match inner.store.get(&room_id).await {
            Ok(Some(room)) if room.phase() == RoomPhase::InProgress => room,
            Ok(_) => {
                debug!(room_id = %room_id, "Room gone or no longer in progress, stopping timer");
                inner.unregister(&room_id, generation);
                return;
            }
            Err(e) => {
                warn!(room_id = %room_id, "Failed to load room for timer tick: {}", e);
                continue;
            }
        };

        let stored = room
            .time_limit
            .unwrap_or_else(|| time_limit_for(room.rules_completed));
        let remaining = counted.map_or(stored, |c| c.min(stored)).saturating_sub(1);
        counted = Some(remaining);
        room.time_limit = Some(remaining);

        // A failed save still counts the second
        if let Err(e) = inner.store.save(&room).await {
            warn!(room_id = %room_id, "Failed to save timer tick: {}", e);
        }

        let current = room.current_player().map(|p| (p.id.clone(), p.username.clone()));
        inner
            .notifier
            .broadcast(
                &room_id,
                ServerMessage::TimeUpdate {
                    room_id: room_id.clone(),
                    time_left: remaining,
                    current_player: current
                        .as_ref()
                        .map(|(_, username)| username.clone())
                        .unwrap_or_default(),
                },
            )
            .await;

        if remaining == 0 {
            inner.unregister(&room_id, generation);
            drop(guard);

            info!(room_id = %room_id, "Turn time ran out");
            if let (Some(expiry), Some((player_id, _))) = (inner.expiry.upgrade(), current) {
                expiry.turn_expired(&room_id, &player_id).await;
            }
            return;
        }
    }
}
