//! Coalescing redraw requests.
//!
//! Any thread may ask for a redraw. Only the first request after the display
//! thread last took the pending flag wakes the display thread, later ones
//! fold into the redraw already queued. The display thread clears the flag
//! with [`RedrawRequester::take`] *before* it paints, so a change landing
//! mid-paint queues one more pass instead of being lost.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

/// Wakes the display thread. Implementations post to the thread's queue.
pub trait RedrawWaker: Send + Sync {
    fn wake(&self);
}

impl<F> RedrawWaker for F
where
    F: Fn() + Send + Sync,
{
    fn wake(&self) {
        self()
    }
}

/// Message posted to a display queue built with [`channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMessage {
    Redraw,
}

struct ChannelWaker(Sender<DisplayMessage>);

impl RedrawWaker for ChannelWaker {
    fn wake(&self) {
        // receiver gone means the display thread is shutting down
        let _ = self.0.send(DisplayMessage::Redraw);
    }
}

struct Inner {
    pending: AtomicBool,
    requests: AtomicU64,
    wakes: AtomicU64,
    waker: Box<dyn RedrawWaker>,
}

#[derive(Clone)]
pub struct RedrawRequester {
    inner: Arc<Inner>,
}

impl RedrawRequester {
    pub fn new<W>(waker: W) -> Self
    where
        W: RedrawWaker + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                pending: AtomicBool::new(false),
                requests: AtomicU64::new(0),
                wakes: AtomicU64::new(0),
                waker: Box::new(waker),
            }),
        }
    }

    /// Fire and forget.
    pub fn request(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        if !self.inner.pending.swap(true, Ordering::AcqRel) {
            self.inner.wakes.fetch_add(1, Ordering::Relaxed);
            self.inner.waker.wake();
        }
    }

    /// Clears the pending flag, returns whether a redraw was pending.
    pub fn take(&self) -> bool {
        self.inner.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Total number of [`request`](Self::request) calls.
    pub fn requests(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }

    /// Number of requests that actually woke the display thread.
    pub fn wakes(&self) -> u64 {
        self.inner.wakes.load(Ordering::Relaxed)
    }
}

/// A requester whose wakes land on a channel, for display loops that are
/// not driven by a windowing event loop.
pub fn channel() -> (RedrawRequester, Receiver<DisplayMessage>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (RedrawRequester::new(ChannelWaker(tx)), rx)
}
