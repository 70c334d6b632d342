use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

/// Creates a single-slot, most-recent-wins channel.
///
/// The producer never blocks: publishing into an occupied slot evicts the
/// queued item and adds one to `dropped`, which may be shared by several
/// slots. The consumer is a plain crossbeam [`Receiver`], so it blocks on
/// `recv` and sees disconnection once the sender is dropped.
pub fn latest_frame_slot<T>(dropped: Arc<AtomicU64>) -> (LatestSender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let sender = LatestSender {
        tx,
        evict: rx.clone(),
        dropped,
    };
    (sender, rx)
}

/// Producer half of [`latest_frame_slot`].
pub struct LatestSender<T> {
    tx: Sender<T>,
    // Shares the slot with the consumer; used to discard a stale item.
    evict: Receiver<T>,
    dropped: Arc<AtomicU64>,
}

impl<T> LatestSender<T> {
    /// Places `item` in the slot, replacing anything not yet taken.
    pub fn publish(&self, item: T) {
        let mut pending = item;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    match self.evict.try_recv() {
                        Ok(_stale) => {
                            self.dropped.fetch_add(1, Ordering::Relaxed);
                        }
                        // The consumer took it between our two calls.
                        Err(TryRecvError::Empty) => {}
                        Err(TryRecvError::Disconnected) => return,
                    }
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
