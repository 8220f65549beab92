use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::{RangeListener, VisibleRange};

pub type SharedCoalescer = Rc<RefCell<FrameCoalescer>>;

/// Work accumulated since the previous animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameWork {
    /// Latest visible range reported during the frame, if any.
    pub visible_range: Option<VisibleRange>,
    pub content_changed: bool,
    /// Number of range notifications folded into this frame.
    pub coalesced_notifications: u64,
}

/// Batches high-frequency visible-range notifications so geometry and
/// reconciliation run at most once per animation frame.
#[derive(Debug, Default)]
pub struct FrameCoalescer {
    visible_range: Option<VisibleRange>,
    content_changed: bool,
    notifications: u64,
}

impl FrameCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> SharedCoalescer {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Surface listener feeding `coalescer`. Holds a weak reference, so a
    /// dropped engine leaves a harmless no-op callback behind.
    #[must_use]
    pub fn listener(coalescer: &SharedCoalescer) -> RangeListener {
        let weak: Weak<RefCell<Self>> = Rc::downgrade(coalescer);
        Box::new(move |range| {
            if let Some(coalescer) = weak.upgrade() {
                coalescer.borrow_mut().notify_visible_range(range);
            }
        })
    }

    pub fn notify_visible_range(&mut self, range: VisibleRange) {
        self.visible_range = Some(range);
        self.notifications += 1;
    }

    pub fn invalidate_content(&mut self) {
        self.content_changed = true;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.content_changed || self.visible_range.is_some()
    }

    /// Drains pending work; `None` when nothing happened since the last frame.
    pub fn take(&mut self) -> Option<FrameWork> {
        if !self.is_pending() {
            return None;
        }
        let work = FrameWork {
            visible_range: self.visible_range.take(),
            content_changed: std::mem::take(&mut self.content_changed),
            coalesced_notifications: std::mem::take(&mut self.notifications),
        };
        trace!(notifications = work.coalesced_notifications, "frame work drained");
        Some(work)
    }
}
