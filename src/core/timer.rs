//! Timer Queue: min-heap deadline dengan cancellation per timer.
//!
//! Dipakai event loop sebagai sumber event kedua (selain datagram).
//! Deadline terdekat menjadi timeout untuk `Poll::poll`.
//!
//! Cancel bersifat lazy: entry di heap tetap ada, tapi payload dihapus dari
//! `live` sehingga entry itu dilewati saat pop.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// Handle untuk satu timer yang di-arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, PartialEq, Eq)]
struct Scheduled {
    deadline: Instant,
    id: TimerId,
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap adalah max heap, dibalik supaya deadline terdekat di atas.
        // Deadline sama: timer yang di-arm lebih dulu keluar lebih dulu.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Priority queue timer, urut berdasarkan deadline
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Scheduled>,
    live: HashMap<TimerId, T>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_id: 0,
        }
    }

    /// Arm timer baru
    pub fn schedule(&mut self, deadline: Instant, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Scheduled { deadline, id });
        self.live.insert(id, payload);
        id
    }

    /// Cancel timer. Returns payload jika timer masih aktif.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.live.remove(&id)
    }

    /// Deadline aktif terdekat
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_cancelled();
        self.heap.peek().map(|s| s.deadline)
    }

    /// Ambil satu timer yang sudah jatuh tempo pada `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, T)> {
        self.discard_cancelled();
        match self.heap.peek() {
            Some(top) if top.deadline <= now => {
                let scheduled = self.heap.pop()?;
                let payload = self.live.remove(&scheduled.id)?;
                Some((scheduled.id, payload))
            }
            _ => None,
        }
    }

    /// Jumlah timer aktif
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.live.contains_key(&top.id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_earliest_first() {
        let now = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(now + Duration::from_millis(30), "c");
        timers.schedule(now + Duration::from_millis(10), "a");
        timers.schedule(now + Duration::from_millis(20), "b");

        let later = now + Duration::from_millis(100);
        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(later).map(|(_, p)| p)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_not_due_yet() {
        let now = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(now + Duration::from_secs(5), ());

        assert!(timers.pop_due(now).is_none());
        assert_eq!(timers.next_deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_cancel_only_affects_own_timer() {
        let now = Instant::now();
        let mut timers = TimerQueue::new();
        let a = timers.schedule(now, "a");
        let b = timers.schedule(now, "b");

        assert_eq!(timers.cancel(a), Some("a"));
        assert_eq!(timers.cancel(a), None);
        assert_eq!(timers.len(), 1);

        let (id, payload) = timers.pop_due(now).unwrap();
        assert_eq!((id, payload), (b, "b"));
        assert!(timers.pop_due(now).is_none());
    }

    #[test]
    fn test_cancelled_head_skipped_for_deadline() {
        let now = Instant::now();
        let mut timers = TimerQueue::new();
        let first = timers.schedule(now + Duration::from_millis(1), 1);
        timers.schedule(now + Duration::from_millis(50), 2);
        timers.cancel(first);

        assert_eq!(timers.next_deadline(), Some(now + Duration::from_millis(50)));
    }
}
