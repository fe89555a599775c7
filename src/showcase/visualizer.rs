//! Frequency-bar visualizer fed by the audio session's analyser.
//!
//! Runs only while audio is playing: the frame callback re-checks the
//! session's live playback state before doing anything, and simply does not
//! reschedule itself once playback stops. The accent color is re-read from
//! the current track every frame so a mid-loop track switch repaints
//! correctly.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::audio::AudioSession;
use super::clock::FrameClock;

const TRAIL_FADE: &str = "rgba(10, 10, 10, 0.3)";
const BAR_SPREAD: f64 = 2.5;
const HEIGHT_SCALE: f64 = 0.8;

/// Horizontal advance per frequency bin on a surface `width` px wide.
pub fn bar_width(width: f64, bins: usize) -> f64 {
    if bins == 0 {
        return 0.0;
    }
    width / bins as f64 * BAR_SPREAD
}

/// Bar height for one byte-valued frequency sample.
pub fn bar_height(sample: u8, height: f64) -> f64 {
    f64::from(sample) / 255.0 * height * HEIGHT_SCALE
}

pub struct Visualizer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    frames: FrameClock,
    samples: Vec<u8>,
}

impl Visualizer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context on the visualizer canvas"))?
            .dyn_into()?;
        Ok(Self {
            canvas,
            ctx,
            frames: FrameClock::new(),
            samples: Vec::new(),
        })
    }

    /// Runs the bar loop while the session keeps reporting playback.
    pub fn run(viz: &Rc<RefCell<Visualizer>>, session: &Rc<RefCell<AudioSession>>) {
        let viz_handle = viz.clone();
        let session_handle = session.clone();
        let frames = viz.borrow().frames.clone();
        frames.start(move |_timestamp| {
            let mut v = viz_handle.borrow_mut();
            let s = session_handle.borrow();
            if !s.element_playing() {
                // No reschedule: the loop ends with playback.
                return;
            }
            let Some(analyser) = s.analyser() else {
                return;
            };
            let bins = analyser.frequency_bin_count() as usize;
            v.samples.resize(bins, 0);
            analyser.get_byte_frequency_data(&mut v.samples);
            let color = s.track_accent();
            v.draw_bars(color);
            v.frames.request();
        });
    }

    pub fn stop(&self) {
        self.frames.stop();
    }

    fn draw_bars(&self, color: &str) {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());
        self.ctx.set_fill_style_str(TRAIL_FADE);
        self.ctx.fill_rect(0.0, 0.0, w, h);

        let step = bar_width(w, self.samples.len());
        let mut x = 0.0;
        for &sample in &self.samples {
            let bar = bar_height(sample, h);
            let gradient = self.ctx.create_linear_gradient(0.0, h, 0.0, 0.0);
            let _ = gradient.add_color_stop(0.0, "transparent");
            let _ = gradient.add_color_stop(1.0, color);
            self.ctx.set_fill_style_canvas_gradient(&gradient);
            self.ctx.fill_rect(x, h - bar, step - 1.0, bar);
            x += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_width_spreads_bins_across_the_surface() {
        assert!((bar_width(400.0, 128) - 7.8125).abs() < 1e-12);
        assert_eq!(bar_width(400.0, 0), 0.0);
    }

    #[test]
    fn bar_height_scales_into_the_surface() {
        assert_eq!(bar_height(0, 120.0), 0.0);
        assert!((bar_height(255, 120.0) - 96.0).abs() < 1e-12);
        let mid = bar_height(128, 120.0);
        assert!(mid > 0.0 && mid < 96.0);
    }
}
