use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};
use tracing::debug;

/// Handle on a running game scheduler task.
pub struct ScheduleHandle {
    task: JoinHandle<()>,
    nudge: Arc<Notify>,
}

impl ScheduleHandle {
    /// Track `task`, woken early through `nudge`.
    pub fn new(task: JoinHandle<()>, nudge: Arc<Notify>) -> Self {
        Self { task, nudge }
    }

    /// Whether the task already returned or was aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Single writer for one room: serializes every read-modify-write on the room
/// and owns the scheduler tasks of its live games.
pub struct RoomAuthority {
    room_id: String,
    gate: Mutex<()>,
    schedules: DashMap<String, ScheduleHandle>,
    resumed: AtomicBool,
}

impl RoomAuthority {
    /// Authority with no scheduler tasks yet.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            gate: Mutex::new(()),
            schedules: DashMap::new(),
            resumed: AtomicBool::new(false),
        }
    }

    /// Run `work` while holding the room's write gate.
    pub async fn exclusive<F, Fut, T>(&self, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _gate = self.gate.lock().await;
        work().await
    }

    /// Whether a live scheduler task is tracked for `game_id`.
    pub fn is_scheduled(&self, game_id: &str) -> bool {
        self.schedules
            .get(game_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Track a scheduler for `game_id` unless a live one exists.
    ///
    /// `spawn` is only invoked when a new task is needed. Returns `true` if it was.
    pub fn schedule_with<F>(&self, game_id: &str, spawn: F) -> bool
    where
        F: FnOnce(Arc<Notify>) -> JoinHandle<()>,
    {
        let fresh = |spawn: F| {
            let nudge = Arc::new(Notify::new());
            let task = spawn(nudge.clone());
            ScheduleHandle::new(task, nudge)
        };
        match self.schedules.entry(game_id.to_owned()) {
            Entry::Occupied(entry) if !entry.get().is_finished() => false,
            Entry::Occupied(mut entry) => {
                entry.insert(fresh(spawn));
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(fresh(spawn));
                true
            }
        }
    }

    /// Forget the scheduler of `game_id`; called by the task when it stops.
    pub fn release_schedule(&self, game_id: &str) {
        self.schedules.remove(game_id);
    }

    /// Number of tracked scheduler tasks.
    pub fn scheduled_count(&self) -> usize {
        self.schedules.len()
    }

    /// Wake the scheduler of `game_id` so it re-evaluates now.
    pub fn nudge(&self, game_id: &str) {
        if let Some(handle) = self.schedules.get(game_id) {
            handle.nudge.notify_one();
        }
    }

    /// Returns `true` exactly once, for the first caller resuming this room's games.
    pub fn claim_resume(&self) -> bool {
        !self.resumed.swap(true, Ordering::AcqRel)
    }

    /// Give up a claim whose resume failed so a later caller retries.
    pub fn release_resume(&self) {
        self.resumed.store(false, Ordering::Release);
    }

    /// Stop every scheduler task.
    pub fn shutdown(&self) {
        let mut stopped = 0;
        for handle in self.schedules.iter() {
            handle.task.abort();
            stopped += 1;
        }
        self.schedules.clear();
        if stopped > 0 {
            debug!(room_id = %self.room_id, stopped, "game schedulers stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test]
    async fn exclusive_sections_do_not_interleave() {
        let authority = Arc::new(RoomAuthority::new("r1"));
        let inside = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8)
            .map(|_| {
                let authority = authority.clone();
                let inside = inside.clone();
                tokio::spawn(async move {
                    authority
                        .exclusive(|| async {
                            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                            tokio::task::yield_now().await;
                            inside.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn live_schedules_are_not_duplicated() {
        let authority = RoomAuthority::new("r1");
        let spawned = AtomicUsize::new(0);
        let spawn = |nudge: Arc<Notify>| {
            spawned.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move { nudge.notified().await })
        };

        assert!(authority.schedule_with("g1", spawn));
        assert!(!authority.schedule_with("g1", spawn));
        assert!(authority.is_scheduled("g1"));
        assert_eq!(spawned.load(Ordering::SeqCst), 1);

        authority.shutdown();
        assert!(!authority.is_scheduled("g1"));
    }

    #[tokio::test]
    async fn finished_schedules_are_replaced() {
        let authority = RoomAuthority::new("r1");
        assert!(authority.schedule_with("g1", |_| tokio::spawn(async {})));
        tokio::task::yield_now().await;
        while authority.is_scheduled("g1") {
            tokio::task::yield_now().await;
        }

        assert!(authority.schedule_with("g1", |nudge| {
            tokio::spawn(async move { nudge.notified().await })
        }));
        assert!(authority.is_scheduled("g1"));
    }

    #[tokio::test]
    async fn released_schedules_are_forgotten() {
        let authority = RoomAuthority::new("r1");
        authority.schedule_with("g1", |_| tokio::spawn(async {}));
        authority.schedule_with("g2", |nudge| tokio::spawn(async move { nudge.notified().await }));
        assert_eq!(authority.scheduled_count(), 2);

        authority.release_schedule("g1");
        assert_eq!(authority.scheduled_count(), 1);
        assert!(authority.is_scheduled("g2"));

        authority.shutdown();
        assert_eq!(authority.scheduled_count(), 0);
    }

    #[test]
    fn resume_is_claimed_once() {
        let authority = RoomAuthority::new("r1");
        assert!(authority.claim_resume());
        assert!(!authority.claim_resume());
        authority.release_resume();
        assert!(authority.claim_resume());
    }
}
