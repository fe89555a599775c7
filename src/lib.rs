//! SeaVerse showcase core crate.
//!
//! The real-time interactive demos embedded in the landing page: the Pixel
//! Snake mini-game, the Flow Canvas generative-art surface, and the AI music
//! player with its frequency-bar visualizer. Marketing chrome and the
//! record-keeping screens live in the host page; this crate only owns the
//! render loops, their clocks, and the audio graph.

use wasm_bindgen::prelude::*;

pub mod showcase;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}

// -----------------------------------------------------------------------------
// Track table for the music player. Configuration data, not engine state: the
// URLs are remote and may fail to load, which the audio session tolerates.
// -----------------------------------------------------------------------------

/// One selectable music track and the accent color its visualizer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackDesc {
    pub id: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    pub color: &'static str,
}

pub const TRACKS: &[TrackDesc] = &[
    TrackDesc {
        id: "cosmic",
        title: "Cosmic Drift",
        url: "https://image.cdn2.seaart.me/2025-12-01/d4mremde878c73ek3qdg/dc40ee311c17b54a184c42d52b2625a6.mp3",
        color: "#0071e3",
    },
    TrackDesc {
        id: "rain",
        title: "Rain",
        url: "https://image.cdn2.seaart.me/2025-12-01/d4mremde878c73fualeg/81e511e07b9380457b80e00723e460bf.mp3",
        color: "#5856d6",
    },
    TrackDesc {
        id: "pulse",
        title: "Pulse",
        url: "https://image.cdn2.seaart.me/2025-12-01/d4mremde878c73ek3qe0/2bba6892ffc3e529f5667f1b80d7ce8b.mp3",
        color: "#ff9500",
    },
];

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_showcase() -> Result<(), JsValue> {
    showcase::mount_page()
}
