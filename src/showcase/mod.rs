//! Page controller for the landing-page demos.
//!
//! Builds the three engines as explicitly owned objects, wires user input to
//! them, and guarantees that every clock stops and the audio graph is
//! released when the page goes away. Engines never reach into one another;
//! everything flows through the handles created here.

pub mod art;
pub mod audio;
pub mod clock;
pub mod rng;
pub mod snake;
pub mod visualizer;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent,
    window,
};

use art::ArtSurface;
use audio::AudioSession;
use snake::{Direction, SnakeBoard};
use visualizer::Visualizer;

const SNAKE_CANVAS_ID: &str = "snake-canvas";
const FLOW_CANVAS_ID: &str = "flow-canvas";
const VISUALIZER_CANVAS_ID: &str = "audio-visualizer";

/// Mounts the showcase and hands it page lifetime. The listener
/// registrations must outlive this call, so the controller is deliberately
/// kept alive rather than dropped.
pub fn mount_page() -> Result<(), JsValue> {
    let controller = Showcase::mount()?;
    std::mem::forget(controller);
    Ok(())
}

/// Owns the three demo engines and every event registration on the page.
pub struct Showcase {
    snake: Rc<RefCell<SnakeBoard>>,
    art: Rc<RefCell<ArtSurface>>,
    audio: Rc<RefCell<AudioSession>>,
    visualizer: Rc<RefCell<Visualizer>>,
    listeners: Vec<ListenerHandle>,
}

impl Showcase {
    pub fn mount() -> Result<Self, JsValue> {
        let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
        let doc = win
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let seed = win.performance().map(|p| p.now()).unwrap_or(0.0) as u32;

        let snake_canvas = lookup_canvas(&doc, SNAKE_CANVAS_ID, 320, 320)?;
        let flow_canvas = lookup_canvas(&doc, FLOW_CANVAS_ID, 320, 320)?;
        let visualizer_canvas = lookup_canvas(&doc, VISUALIZER_CANVAS_ID, 400, 120)?;

        let snake = Rc::new(RefCell::new(SnakeBoard::new(snake_canvas, seed)?));
        let art = Rc::new(RefCell::new(ArtSurface::new(
            flow_canvas,
            seed.wrapping_add(1),
        )?));
        let audio = Rc::new(RefCell::new(AudioSession::new()));
        let visualizer = Rc::new(RefCell::new(Visualizer::new(visualizer_canvas)?));

        let mut controller = Self {
            snake,
            art,
            audio,
            visualizer,
            listeners: Vec::new(),
        };
        controller.wire_snake(&doc)?;
        controller.wire_art(&doc)?;
        controller.wire_audio(&doc)?;
        controller.wire_teardown()?;

        // The art loop runs for the whole page lifetime; the game tick and
        // the visualizer loop start from their respective controls.
        ArtSurface::start(&controller.art);

        log::info!("showcase mounted");
        Ok(controller)
    }

    /// Stops every clock and releases the audio graph. Listener
    /// registrations detach when the controller is dropped.
    pub fn shutdown(&self) {
        self.snake.borrow_mut().stop();
        self.art.borrow().stop();
        self.visualizer.borrow().stop();
        self.audio.borrow_mut().shutdown();
    }

    fn wire_snake(&mut self, doc: &Document) -> Result<(), JsValue> {
        // Keyboard: arrows + WASD. The engine ignores input while the game
        // is not running and drops reversal requests itself.
        let board = self.snake.clone();
        self.listen(doc.as_ref(), "keydown", move |evt: Event| {
            let Ok(key_evt) = evt.dyn_into::<KeyboardEvent>() else {
                return;
            };
            let dir = match key_evt.key().as_str() {
                "ArrowUp" | "w" => Direction::Up,
                "ArrowDown" | "s" => Direction::Down,
                "ArrowLeft" | "a" => Direction::Left,
                "ArrowRight" | "d" => Direction::Right,
                _ => return,
            };
            board.borrow_mut().queue_direction(dir);
        })?;

        let board = self.snake.clone();
        self.listen_button(doc, "snake-start", move || SnakeBoard::start(&board))?;
        let board = self.snake.clone();
        self.listen_button(doc, "snake-reset", move || board.borrow_mut().reset())?;
        Ok(())
    }

    fn wire_art(&mut self, doc: &Document) -> Result<(), JsValue> {
        let canvas = self.art.borrow().canvas().clone();

        let surface = self.art.clone();
        self.listen(canvas.as_ref(), "mousemove", move |evt| {
            let Ok(mouse) = evt.dyn_into::<MouseEvent>() else {
                return;
            };
            surface
                .borrow_mut()
                .spawn(f64::from(mouse.offset_x()), f64::from(mouse.offset_y()));
        })?;

        let canvas_for_touch = canvas.clone();
        let surface = self.art.clone();
        self.listen(canvas.as_ref(), "touchmove", move |evt| {
            let Ok(touch_evt) = evt.dyn_into::<TouchEvent>() else {
                return;
            };
            let Some(touch) = touch_evt.touches().get(0) else {
                return;
            };
            let rect = canvas_for_touch.get_bounding_client_rect();
            surface.borrow_mut().spawn(
                f64::from(touch.client_x()) - rect.left(),
                f64::from(touch.client_y()) - rect.top(),
            );
        })?;

        let surface = self.art.clone();
        self.listen_button(doc, "art-clear", move || surface.borrow_mut().clear())?;
        let surface = self.art.clone();
        self.listen_button(doc, "art-save", move || {
            if let Err(err) = surface.borrow().save() {
                log::warn!("art export failed: {err:?}");
            }
        })?;
        Ok(())
    }

    fn wire_audio(&mut self, doc: &Document) -> Result<(), JsValue> {
        // Element-side progress events feed the transport labels.
        let element = self.audio.borrow().element().cloned();
        if let Some(element) = element {
            let session = self.audio.clone();
            self.listen(element.as_ref(), "timeupdate", move |_evt| {
                let mut s = session.borrow_mut();
                s.refresh_position();
                publish_playback(&s);
            })?;
            let session = self.audio.clone();
            self.listen(element.as_ref(), "loadedmetadata", move |_evt| {
                let mut s = session.borrow_mut();
                s.refresh_duration();
                publish_playback(&s);
            })?;
            // The element is the source of truth for the playing flag: these
            // also catch native-control pauses and sources that fail to load.
            let session = self.audio.clone();
            self.listen(element.as_ref(), "play", move |_evt| {
                session.borrow_mut().sync_playing(true);
            })?;
            let session = self.audio.clone();
            self.listen(element.as_ref(), "pause", move |_evt| {
                session.borrow_mut().sync_playing(false);
            })?;
        }

        // Toggle: flips playback and (re)arms the visualizer loop.
        let session = self.audio.clone();
        let viz = self.visualizer.clone();
        self.listen_button(doc, "audio-toggle", move || {
            let session_after = session.clone();
            let viz_after = viz.clone();
            AudioSession::toggle(&session, move || {
                if session_after.borrow().element_playing() {
                    Visualizer::run(&viz_after, &session_after);
                }
                publish_playback(&session_after.borrow());
            });
        })?;

        // One selector button per track.
        for (index, track) in crate::TRACKS.iter().enumerate() {
            let session = self.audio.clone();
            let viz = self.visualizer.clone();
            let id = format!("audio-track-{}", track.id);
            self.listen_button(doc, &id, move || {
                {
                    let mut s = session.borrow_mut();
                    s.switch_track(index);
                    publish_playback(&s);
                }
                if session.borrow().element_playing() {
                    Visualizer::run(&viz, &session);
                }
            })?;
        }

        publish_playback(&self.audio.borrow());
        Ok(())
    }

    // Page teardown must leave no timer or animation frame pending.
    fn wire_teardown(&mut self) -> Result<(), JsValue> {
        let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
        let snake = self.snake.clone();
        let art = self.art.clone();
        let audio = self.audio.clone();
        let viz = self.visualizer.clone();
        self.listen(win.as_ref(), "pagehide", move |_evt| {
            log::debug!("page hidden; stopping clocks and releasing audio");
            snake.borrow_mut().stop();
            art.borrow().stop();
            viz.borrow().stop();
            audio.borrow_mut().shutdown();
        })
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        self.listeners
            .push(ListenerHandle::attach(target, event, callback)?);
        Ok(())
    }

    /// Buttons are optional page furniture: a missing id just leaves that
    /// control unwired.
    fn listen_button(
        &mut self,
        doc: &Document,
        id: &str,
        mut on_click: impl FnMut() + 'static,
    ) -> Result<(), JsValue> {
        let Some(el) = doc.get_element_by_id(id) else {
            log::debug!("button #{id} not present; control left unwired");
            return Ok(());
        };
        self.listen(el.as_ref(), "click", move |_evt| on_click())
    }
}

/// Listener registration that detaches itself when dropped.
struct ListenerHandle {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl ListenerHandle {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

fn lookup_canvas(
    doc: &Document,
    id: &str,
    width: u32,
    height: u32,
) -> Result<HtmlCanvasElement, JsValue> {
    if let Some(el) = doc.get_element_by_id(id) {
        return el
            .dyn_into()
            .map_err(|_| JsValue::from_str("element is not a canvas"));
    }
    let canvas: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
    canvas.set_id(id);
    canvas.set_width(width);
    canvas.set_height(height);
    doc.body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&canvas)?;
    Ok(canvas)
}

/// Mirrors playback state into the optional DOM sinks.
fn publish_playback(session: &AudioSession) {
    let transport = session.transport();
    set_text("audio-track-title", transport.track().title);
    set_text("audio-current", transport.elapsed());
    set_text("audio-total", transport.total());
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(el) = doc.get_element_by_id("audio-progress") {
            let style = format!("width:{:.1}%", transport.progress() * 100.0);
            let _ = el.set_attribute("style", &style);
        }
    }
}

/// Writes into an optional text sink; silently skips missing elements.
pub(crate) fn set_text(id: &str, text: &str) {
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }
}
