//! AI music player: pure transport bookkeeping plus the Web Audio session.
//!
//! The audio graph (element source to analyser to destination) is a
//! singleton per page lifetime. It is built lazily on the first
//! user-initiated play, since platforms gate audio output behind a user
//! gesture, and is reused across track switches, which only ever swap the
//! element's source URL.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    AnalyserNode, AudioContext, AudioContextState, HtmlAudioElement,
    MediaElementAudioSourceNode,
};

use crate::{TRACKS, TrackDesc};

/// Analyser resolution; half of this many frequency bins come back per frame.
pub const FFT_SIZE: u32 = 256;

const TIME_PLACEHOLDER: &str = "0:00";

/// Formats seconds as `M:SS`; malformed durations collapse to the
/// placeholder rather than a numeric error value.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return TIME_PLACEHOLDER.to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Position of a track id in the track table.
pub fn track_index(id: &str) -> Option<usize> {
    TRACKS.iter().position(|t| t.id == id)
}

/// Pure playback bookkeeping, shared by the browser session and host tests.
#[derive(Debug, Clone)]
pub struct Transport {
    playing: bool,
    graph_built: bool,
    graph_builds: u32,
    track: usize,
    progress: f64,
    elapsed: String,
    total: String,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            playing: false,
            graph_built: false,
            graph_builds: 0,
            track: 0,
            progress: 0.0,
            elapsed: TIME_PLACEHOLDER.to_string(),
            total: TIME_PLACEHOLDER.to_string(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, on: bool) {
        self.playing = on;
    }

    /// True until the audio graph has been wired once.
    pub fn needs_graph(&self) -> bool {
        !self.graph_built
    }

    pub fn mark_graph_built(&mut self) {
        self.graph_built = true;
        self.graph_builds += 1;
    }

    /// How many times the graph has actually been constructed. Stays at one
    /// for the whole page lifetime no matter how often playback toggles.
    pub fn graph_builds(&self) -> u32 {
        self.graph_builds
    }

    pub fn track(&self) -> &'static TrackDesc {
        &TRACKS[self.track]
    }

    pub fn track_index(&self) -> usize {
        self.track
    }

    /// Selects a track; returns whether playback should resume on the new
    /// source, which it does exactly when something was playing before the
    /// switch. Out-of-range indexes leave the selection unchanged.
    pub fn select_track(&mut self, index: usize) -> bool {
        if index < TRACKS.len() {
            self.track = index;
        }
        self.playing
    }

    /// Recomputes the progress ratio and elapsed label from the element
    /// position. An unavailable duration pins progress to zero.
    pub fn update_position(&mut self, current: f64, duration: f64) {
        self.progress = if duration.is_finite() && duration > 0.0 {
            (current / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.elapsed = format_clock(current);
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.total = format_clock(duration);
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn elapsed(&self) -> &str {
        &self.elapsed
    }

    pub fn total(&self) -> &str {
        &self.total
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser half: owns the media element and the singleton audio graph.
/// Every public operation no-ops gracefully when a resource is missing; the
/// page controller never sees an exception from here.
pub struct AudioSession {
    transport: Transport,
    element: Option<HtmlAudioElement>,
    context: Option<AudioContext>,
    analyser: Option<AnalyserNode>,
    source: Option<MediaElementAudioSourceNode>,
}

impl AudioSession {
    /// Creates the session around a fresh media element pointed at the first
    /// track. No graph yet, and no autoplay ever: playback only starts from
    /// an explicit user action.
    pub fn new() -> Self {
        let element = match HtmlAudioElement::new_with_src(TRACKS[0].url) {
            Ok(el) => {
                el.set_loop(true);
                el.set_cross_origin(Some("anonymous"));
                Some(el)
            }
            Err(err) => {
                log::warn!("audio element unavailable: {err:?}");
                None
            }
        };
        Self {
            transport: Transport::new(),
            element,
            context: None,
            analyser: None,
            source: None,
        }
    }

    /// Play/pause toggle. Builds the context lazily; a suspended context is
    /// resumed and that resumption is awaited before the graph is wired and
    /// playback flips.
    pub fn toggle(session: &Rc<RefCell<AudioSession>>, after: impl FnOnce() + 'static) {
        let resume = {
            let mut s = session.borrow_mut();
            if s.element.is_none() {
                return;
            }
            if let Err(err) = s.ensure_context() {
                log::warn!("audio context unavailable: {err:?}");
                return;
            }
            s.pending_resume()
        };
        let handle = session.clone();
        match resume {
            Some(promise) => spawn_local(async move {
                let _ = JsFuture::from(promise).await;
                handle.borrow_mut().finish_toggle();
                after();
            }),
            None => {
                handle.borrow_mut().finish_toggle();
                after();
            }
        }
    }

    /// Swaps only the element's source; the analyser graph survives the
    /// switch. Resumes playback exactly when something was playing before.
    pub fn switch_track(&mut self, index: usize) {
        let Some(element) = self.element.clone() else {
            return;
        };
        let _ = element.pause();
        let resume = self.transport.select_track(index);
        element.set_src(self.transport.track().url);
        element.load();
        if resume && element.play().is_err() {
            self.transport.set_playing(false);
        }
    }

    /// Re-derives progress and the elapsed label; called on `timeupdate`.
    pub fn refresh_position(&mut self) {
        if let Some(el) = &self.element {
            let (current, duration) = (el.current_time(), el.duration());
            self.transport.update_position(current, duration);
        }
    }

    /// Called on `loadedmetadata`.
    pub fn refresh_duration(&mut self) {
        if let Some(el) = &self.element {
            self.transport.set_duration(el.duration());
        }
    }

    /// Called on the element's own `play`/`pause` events, so the flag also
    /// tracks pauses from native media controls and failed source loads.
    pub fn sync_playing(&mut self, on: bool) {
        self.transport.set_playing(on);
    }

    /// Live playback query straight off the element, so pauses coming from
    /// native media controls are honored too.
    pub fn element_playing(&self) -> bool {
        self.element.as_ref().is_some_and(|el| !el.paused())
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Accent color of the currently selected track.
    pub fn track_accent(&self) -> &'static str {
        self.transport.track().color
    }

    pub fn element(&self) -> Option<&HtmlAudioElement> {
        self.element.as_ref()
    }

    pub fn analyser(&self) -> Option<&AnalyserNode> {
        self.analyser.as_ref()
    }

    /// Page teardown: silence the element and release the context.
    pub fn shutdown(&mut self) {
        if let Some(element) = &self.element {
            let _ = element.pause();
        }
        self.transport.set_playing(false);
        if let Some(context) = &self.context {
            let _ = context.close();
        }
    }

    fn ensure_context(&mut self) -> Result<(), JsValue> {
        if self.context.is_none() {
            let context = AudioContext::new()?;
            let analyser = context.create_analyser()?;
            analyser.set_fft_size(FFT_SIZE);
            self.context = Some(context);
            self.analyser = Some(analyser);
        }
        Ok(())
    }

    fn pending_resume(&self) -> Option<Promise> {
        let context = self.context.as_ref()?;
        if context.state() == AudioContextState::Suspended {
            context.resume().ok()
        } else {
            None
        }
    }

    // Wires element → analyser → destination exactly once per page lifetime.
    fn ensure_wiring(&mut self) -> Result<(), JsValue> {
        if !self.transport.needs_graph() {
            return Ok(());
        }
        let (Some(element), Some(context), Some(analyser)) =
            (&self.element, &self.context, &self.analyser)
        else {
            return Err(JsValue::from_str("audio graph prerequisites missing"));
        };
        let source = context.create_media_element_source(element)?;
        source.connect_with_audio_node(analyser)?;
        analyser.connect_with_audio_node(&context.destination())?;
        self.source = Some(source);
        self.transport.mark_graph_built();
        Ok(())
    }

    fn finish_toggle(&mut self) {
        if let Err(err) = self.ensure_wiring() {
            log::warn!("audio graph wiring failed: {err:?}");
            return;
        }
        let Some(element) = self.element.clone() else {
            return;
        };
        if element.paused() {
            if element.play().is_ok() {
                self.transport.set_playing(true);
            }
        } else {
            let _ = element.pause();
            self.transport.set_playing(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_builds_graph_once_and_ends_paused() {
        let mut t = Transport::new();
        for _ in 0..2 {
            if t.needs_graph() {
                t.mark_graph_built();
            }
            let playing = t.is_playing();
            t.set_playing(!playing);
        }
        assert!(!t.is_playing());
        assert_eq!(t.graph_builds(), 1);
    }

    #[test]
    fn track_switch_preserves_playing_flag() {
        let mut t = Transport::new();
        t.set_playing(true);
        assert!(t.select_track(1));
        assert!(t.is_playing());
        assert_eq!(t.track().id, "rain");
    }

    #[test]
    fn track_switch_while_paused_stays_paused() {
        let mut t = Transport::new();
        assert!(!t.select_track(2));
        assert!(!t.is_playing());
        assert_eq!(t.track().id, "pulse");
    }

    #[test]
    fn out_of_range_track_keeps_selection() {
        let mut t = Transport::new();
        t.select_track(1);
        t.select_track(99);
        assert_eq!(t.track_index(), 1);
    }

    #[test]
    fn format_clock_handles_malformed_durations() {
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(f64::INFINITY), "0:00");
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(59.9), "0:59");
        assert_eq!(format_clock(65.0), "1:05");
        assert_eq!(format_clock(600.0), "10:00");
    }

    #[test]
    fn progress_ratio_stays_in_unit_range() {
        let mut t = Transport::new();
        t.update_position(30.0, 120.0);
        assert!((t.progress() - 0.25).abs() < 1e-12);
        assert_eq!(t.elapsed(), "0:30");

        t.update_position(7.0, f64::NAN);
        assert_eq!(t.progress(), 0.0);
        assert_eq!(t.elapsed(), "0:07");

        t.update_position(500.0, 120.0);
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn track_index_resolves_known_ids() {
        assert_eq!(track_index("cosmic"), Some(0));
        assert_eq!(track_index("pulse"), Some(2));
        assert_eq!(track_index("nope"), None);
    }
}
