//! Cancellable scheduling primitives shared by the demo engines.
//!
//! `IntervalClock` drives the discrete game tick; `FrameClock` wraps
//! `requestAnimationFrame` for the continuous renderers. Both are owned
//! objects that can be stopped individually, so page teardown can guarantee
//! that no callback outlives the page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

/// Fixed-period timer. `start` while running stops the prior run first, so a
/// single clock never has more than one live interval.
pub struct IntervalClock {
    handle: Option<i32>,
    // Retained until the next start or drop: a tick currently on the stack
    // must not free itself when it stops the clock.
    tick: Option<Closure<dyn FnMut()>>,
}

impl IntervalClock {
    pub fn new() -> Self {
        Self {
            handle: None,
            tick: None,
        }
    }

    pub fn start<F: FnMut() + 'static>(&mut self, period_ms: i32, on_tick: F) {
        self.stop();
        let Some(win) = window() else { return };
        let cb = Closure::wrap(Box::new(on_tick) as Box<dyn FnMut()>);
        match win
            .set_interval_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                period_ms,
            ) {
            Ok(id) => {
                self.handle = Some(id);
                self.tick = Some(cb);
            }
            Err(err) => log::warn!("interval timer unavailable: {err:?}"),
        }
    }

    /// Idempotent; safe to call from inside the tick callback itself.
    pub fn stop(&mut self) {
        if let Some(id) = self.handle.take() {
            if let Some(win) = window() {
                win.clear_interval_with_handle(id);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Self-rescheduling per-frame callback. The installed callback decides
/// continuation by calling [`FrameClock::request`] again from within itself;
/// `stop` cancels whatever frame is pending.
#[derive(Clone)]
pub struct FrameClock {
    inner: Rc<FrameClockInner>,
}

struct FrameClockInner {
    pending: Cell<Option<i32>>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(FrameClockInner {
                pending: Cell::new(None),
                frame: RefCell::new(None),
            }),
        }
    }

    /// Installs `on_frame` and requests the first frame. Must not be called
    /// from inside a running frame callback; use `request` there instead.
    pub fn start<F: FnMut(f64) + 'static>(&self, mut on_frame: F) {
        self.stop();
        let clock = self.clone();
        let cb = Closure::wrap(Box::new(move |timestamp: f64| {
            clock.inner.pending.set(None);
            on_frame(timestamp);
        }) as Box<dyn FnMut(f64)>);
        *self.inner.frame.borrow_mut() = Some(cb);
        self.request();
    }

    /// Schedules the next frame unless one is already pending. Safe to call
    /// from inside the frame callback.
    pub fn request(&self) {
        if self.inner.pending.get().is_some() {
            return;
        }
        let frame = self.inner.frame.borrow();
        let (Some(win), Some(cb)) = (window(), frame.as_ref()) else {
            return;
        };
        if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.inner.pending.set(Some(id));
        }
    }

    /// Cancels any pending frame. Idempotent; the installed callback stays
    /// registered, so a later `request` resumes the loop.
    pub fn stop(&self) {
        if let Some(id) = self.inner.pending.take() {
            if let Some(win) = window() {
                let _ = win.cancel_animation_frame(id);
            }
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.inner.pending.get().is_some()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
