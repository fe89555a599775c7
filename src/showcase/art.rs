//! Flow Canvas: a decaying-particle field plus its canvas wrapper.
//!
//! Interaction points spawn small bursts whose hue sweeps slowly through the
//! color wheel; every frame the field advances and the surface repaints with
//! a translucent overlay instead of a clear, so motion leaves fading trails.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement, window};

use super::clock::FrameClock;
use super::rng::Lcg;

/// Particles spawned per interaction point.
pub const SPAWN_BATCH: usize = 3;

const START_HUE: f64 = 200.0;
const HUE_STEP: f64 = 1.0;
const DRAG: f64 = 0.98;
const SHRINK: f64 = 0.99;
const BACKGROUND: &str = "#0a0a0a";
const TRAIL_FADE: &str = "rgba(10, 10, 10, 0.02)";

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed_x: f64,
    pub speed_y: f64,
    pub hue: f64,
    pub life: f64,
    pub decay: f64,
}

/// Owns the particle collection and its advance step; rendering is the
/// surface's job so the two never interleave within a frame.
pub struct ParticleField {
    particles: Vec<Particle>,
    hue: f64,
    rng: Lcg,
}

impl ParticleField {
    pub fn new(seed: u32) -> Self {
        Self {
            particles: Vec::new(),
            hue: START_HUE,
            rng: Lcg::new(seed),
        }
    }

    /// Spawns a small burst at `(x, y)`. Off-surface coordinates are fine:
    /// such particles never render but still decay and get culled normally.
    pub fn spawn(&mut self, x: f64, y: f64) {
        for _ in 0..SPAWN_BATCH {
            self.particles.push(Particle {
                x,
                y,
                size: self.rng.unit() * 8.0 + 2.0,
                speed_x: self.rng.unit() * 4.0 - 2.0,
                speed_y: self.rng.unit() * 4.0 - 2.0,
                hue: self.hue,
                life: 1.0,
                decay: self.rng.unit() * 0.02 + 0.005,
            });
        }
        self.hue = (self.hue + HUE_STEP) % 360.0;
    }

    /// One integration step: drift, damp, age, shrink, cull the dead.
    pub fn advance(&mut self) {
        self.particles.retain_mut(|p| {
            p.x += p.speed_x;
            p.y += p.speed_y;
            p.speed_x *= DRAG;
            p.speed_y *= DRAG;
            p.life -= p.decay;
            p.size *= SHRINK;
            p.life > 0.0
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Canvas half of the flow demo: trail-fade rendering, clears, PNG export.
pub struct ArtSurface {
    field: ParticleField,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    frames: FrameClock,
}

impl ArtSurface {
    pub fn new(canvas: HtmlCanvasElement, seed: u32) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context on the art canvas"))?
            .dyn_into()?;
        let surface = Self {
            field: ParticleField::new(seed),
            canvas,
            ctx,
            frames: FrameClock::new(),
        };
        surface.paint_background();
        Ok(surface)
    }

    /// Starts the continuous advance/render loop for the page lifetime.
    pub fn start(surface: &Rc<RefCell<ArtSurface>>) {
        let handle = surface.clone();
        let frames = surface.borrow().frames.clone();
        frames.start(move |_timestamp| {
            let mut s = handle.borrow_mut();
            s.field.advance();
            s.render();
            s.frames.request();
        });
    }

    pub fn spawn(&mut self, x: f64, y: f64) {
        self.field.spawn(x, y);
    }

    fn render(&self) {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());
        self.ctx.set_fill_style_str(TRAIL_FADE);
        self.ctx.fill_rect(0.0, 0.0, w, h);
        for p in self.field.particles() {
            self.ctx.begin_path();
            if self.ctx.arc(p.x, p.y, p.size, 0.0, TAU).is_ok() {
                self.ctx
                    .set_fill_style_str(&format!("hsla({}, 80%, 60%, {})", p.hue, p.life));
                self.ctx.fill();
            }
        }
    }

    /// Empties the field and repaints the background; trails never survive a
    /// clear.
    pub fn clear(&mut self) {
        self.field.clear();
        self.paint_background();
    }

    /// Exports the current pixel content as a PNG download.
    pub fn save(&self) -> Result<(), JsValue> {
        let url = self.canvas.to_data_url()?;
        let doc = window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let link: HtmlAnchorElement = doc.create_element("a")?.dyn_into()?;
        link.set_download("flow-art.png");
        link.set_href(&url);
        link.click();
        Ok(())
    }

    pub fn stop(&self) {
        self.frames.stop();
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn paint_background(&self) {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, w, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_particle(life: f64, decay: f64) -> Particle {
        Particle {
            x: 0.0,
            y: 0.0,
            size: 4.0,
            speed_x: 0.0,
            speed_y: 0.0,
            hue: 200.0,
            life,
            decay,
        }
    }

    #[test]
    fn life_follows_linear_decay_until_culled() {
        let mut field = ParticleField::new(9);
        field.particles.push(still_particle(1.0, 0.25));
        for step in 1..=3 {
            field.advance();
            assert_eq!(field.len(), 1);
            let life = field.particles()[0].life;
            assert!((life - (1.0 - 0.25 * f64::from(step))).abs() < 1e-12);
        }
        // Fourth step brings life to exactly zero: removed, not rendered.
        field.advance();
        assert!(field.is_empty());
    }

    #[test]
    fn velocity_damps_and_size_shrinks() {
        let mut field = ParticleField::new(9);
        let mut p = still_particle(1.0, 0.01);
        p.speed_x = 2.0;
        p.size = 8.0;
        field.particles.push(p);
        field.advance();
        let p = &field.particles()[0];
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((p.speed_x - 2.0 * DRAG).abs() < 1e-12);
        assert!((p.size - 8.0 * SHRINK).abs() < 1e-12);
    }

    #[test]
    fn spawn_batches_and_hue_sweep() {
        let mut field = ParticleField::new(4);
        field.spawn(10.0, 20.0);
        assert_eq!(field.len(), SPAWN_BATCH);
        for p in field.particles() {
            assert!((2.0..10.0).contains(&p.size));
            assert!((-2.0..2.0).contains(&p.speed_x));
            assert!((-2.0..2.0).contains(&p.speed_y));
            assert!((0.005..0.025).contains(&p.decay));
            assert!((p.life - 1.0).abs() < f64::EPSILON);
            assert!((p.hue - 200.0).abs() < f64::EPSILON);
        }
        field.spawn(0.0, 0.0);
        assert!((field.particles()[SPAWN_BATCH].hue - 201.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hue_wraps_at_360() {
        let mut field = ParticleField::new(4);
        for _ in 0..200 {
            field.spawn(0.0, 0.0);
        }
        // 200 spawns starting at hue 200 wrap past 360 back into low hues.
        let last = field.particles().last().map(|p| p.hue).unwrap_or(-1.0);
        assert!((last - ((START_HUE + 199.0) % 360.0)).abs() < f64::EPSILON);
        assert!(field.particles().iter().all(|p| (0.0..360.0).contains(&p.hue)));
    }

    #[test]
    fn off_surface_spawn_is_not_an_error_and_decays_out() {
        let mut field = ParticleField::new(8);
        field.spawn(-50.0, 9999.0);
        assert_eq!(field.len(), SPAWN_BATCH);
        for _ in 0..250 {
            field.advance();
        }
        assert!(field.is_empty());
    }

    #[test]
    fn clear_discards_every_particle() {
        let mut field = ParticleField::new(6);
        field.spawn(5.0, 5.0);
        field.spawn(6.0, 6.0);
        assert!(!field.is_empty());
        field.clear();
        assert!(field.is_empty());
    }
}
