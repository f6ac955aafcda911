//! Exclusive access to the one bus all sensors share.

use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    mutex::{Mutex, MutexGuard},
};

/// Holding the guard returned by [`BusArbiter::acquire`] is holding the bus,
/// dropping it releases the bus to the next waiter.
pub type BusGuard<'a, M, B> = MutexGuard<'a, M, B>;

pub struct BusArbiter<M: RawMutex, B> {
    bus: Mutex<M, B>,
}

impl<M: RawMutex, B> BusArbiter<M, B> {
    pub const fn new(bus: B) -> Self {
        Self {
            bus: Mutex::new(bus),
        }
    }

    /// Waits until no other task holds the bus
    pub async fn acquire(&self) -> BusGuard<'_, M, B> {
        self.bus.lock().await
    }

    /// Takes the bus only if it's free right now
    pub fn try_acquire(&self) -> Option<BusGuard<'_, M, B>> {
        self.bus.try_lock().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_futures::{block_on, join::join, yield_now};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[derive(Default)]
    struct Tracker {
        active: Cell<u32>,
        max_active: Cell<u32>,
        polls: Cell<u32>,
    }

    async fn poll_step(arbiter: &BusArbiter<NoopRawMutex, ()>, tracker: &Tracker) {
        for _ in 0..5 {
            let _bus = arbiter.acquire().await;
            tracker.active.set(tracker.active.get() + 1);
            tracker
                .max_active
                .set(tracker.max_active.get().max(tracker.active.get()));
            // Give the other poller a chance to run mid-transaction
            yield_now().await;
            yield_now().await;
            tracker.polls.set(tracker.polls.get() + 1);
            tracker.active.set(tracker.active.get() - 1);
        }
    }

    #[test]
    fn poll_steps_never_overlap() {
        let arbiter = BusArbiter::<NoopRawMutex, ()>::new(());
        let tracker = Tracker::default();
        block_on(join(
            poll_step(&arbiter, &tracker),
            poll_step(&arbiter, &tracker),
        ));
        assert_eq!(tracker.max_active.get(), 1);
        assert_eq!(tracker.polls.get(), 10);
    }

    #[test]
    fn guard_drop_releases() {
        let arbiter = BusArbiter::<NoopRawMutex, u8>::new(7);
        {
            let mut bus = arbiter.try_acquire().unwrap();
            *bus += 1;
            assert!(arbiter.try_acquire().is_none());
        }
        assert_eq!(*arbiter.try_acquire().unwrap(), 8);
    }
}
