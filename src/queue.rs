//! Byte queue between the reception side and the shell.
//!
//! The receive path is the only producer and the shell is the only consumer.
//! `heapless::spsc` publishes a slot by storing the byte before advancing the
//! tail index, so the consumer never sees a half-written entry and no lock is
//! needed on either side.

use heapless::spsc::{Consumer, Producer, Queue};

use crate::RX_QUEUE_SIZE;

/// Queue type used by the firmware for received bytes.
pub type RxQueue = Queue<u8, RX_QUEUE_SIZE>;

/// Producer half of the byte queue.
pub trait ByteSink {
    /// Returns `false` when the queue is full; the byte is not stored.
    fn insert(&mut self, byte: u8) -> bool;
}

/// Consumer half of the byte queue.
pub trait ByteSource {
    fn pop(&mut self) -> Option<u8>;

    fn count(&self) -> usize;
}

impl<const N: usize> ByteSink for Producer<'_, u8, N> {
    fn insert(&mut self, byte: u8) -> bool {
        self.enqueue(byte).is_ok()
    }
}

impl<const N: usize> ByteSource for Consumer<'_, u8, N> {
    fn pop(&mut self) -> Option<u8> {
        self.dequeue()
    }

    fn count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_is_preserved() {
        let mut queue: RxQueue = Queue::new();
        let (mut tx, mut rx) = queue.split();

        for &byte in b"abc" {
            assert!(tx.insert(byte));
        }
        assert_eq!(rx.count(), 3);
        assert_eq!(rx.pop(), Some(b'a'));
        assert_eq!(rx.pop(), Some(b'b'));
        assert_eq!(rx.pop(), Some(b'c'));
        assert_eq!(rx.pop(), None);
        assert_eq!(rx.count(), 0);
    }

    #[test]
    fn full_queue_rejects_inserts() {
        let mut queue: RxQueue = Queue::new();
        let (mut tx, mut rx) = queue.split();

        let accepted = (0..RX_QUEUE_SIZE + 4).filter(|_| tx.insert(b'x')).count();

        assert_eq!(accepted, RX_QUEUE_SIZE - 1);
        assert_eq!(rx.count(), RX_QUEUE_SIZE - 1);
        assert!(!tx.insert(b'y'));

        assert_eq!(rx.pop(), Some(b'x'));
        assert!(tx.insert(b'y'));
    }
}
