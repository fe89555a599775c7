//! Pixel Snake: a pure grid state machine plus its canvas/DOM wrapper.
//!
//! The game logic (`SnakeGame`) never touches browser APIs, so it runs under
//! host `cargo test`; `SnakeBoard` adds the canvas painting and the 120 ms
//! interval clock around it.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::clock::IntervalClock;
use super::rng::Lcg;
use super::set_text;

/// Board edge in cells.
pub const GRID: i32 = 16;
/// Game tick period.
pub const TICK_MS: i32 = 120;

const CELL: f64 = 20.0;
const FOOD_POINTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
}

/// What a single tick did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate,
    Collided,
}

/// Grid state machine: `Idle → Running → Stopped`. Two direction fields:
/// `committed` is what the last step used; `pending` is the latest accepted
/// input and is applied at the start of the next step.
pub struct SnakeGame {
    body: Vec<Cell>,
    committed: Direction,
    pending: Direction,
    food: Cell,
    score: u32,
    phase: Phase,
    rng: Lcg,
}

impl SnakeGame {
    pub fn new(seed: u32) -> Self {
        let mut game = Self {
            body: Vec::new(),
            committed: Direction::Right,
            pending: Direction::Right,
            food: Cell { x: 0, y: 0 },
            score: 0,
            phase: Phase::Idle,
            rng: Lcg::new(seed),
        };
        game.reset();
        game
    }

    /// Back to the spawn layout: a 3-cell horizontal segment centered on the
    /// grid, heading right, score zero, fresh food.
    pub fn reset(&mut self) {
        self.body = vec![
            Cell { x: 8, y: 8 },
            Cell { x: 7, y: 8 },
            Cell { x: 6, y: 8 },
        ];
        self.committed = Direction::Right;
        self.pending = Direction::Right;
        self.score = 0;
        self.phase = Phase::Idle;
        self.place_food();
    }

    pub fn begin(&mut self) {
        self.phase = Phase::Running;
    }

    /// Records a direction request. Ignored while not running, and ignored
    /// when it is the exact reverse of the committed direction (an expected,
    /// legitimate input, not an error).
    pub fn queue_direction(&mut self, dir: Direction) {
        if self.phase != Phase::Running {
            return;
        }
        if dir != self.committed.reverse() {
            self.pending = dir;
        }
    }

    /// One tick. Returns `None` when the game is not running (nothing moves
    /// after a collision); collisions are a terminal transition, not an
    /// error.
    pub fn step(&mut self) -> Option<StepOutcome> {
        if self.phase != Phase::Running {
            return None;
        }
        // Commit the pending direction unless it would reverse the snake
        // into itself (two quick inputs can queue a reverse past the
        // input-time check).
        if self.pending != self.committed.reverse() {
            self.committed = self.pending;
        }
        let (dx, dy) = self.committed.delta();
        let head = self.body[0];
        let next = Cell {
            x: head.x + dx,
            y: head.y + dy,
        };

        let hit_wall = next.x < 0 || next.x >= GRID || next.y < 0 || next.y >= GRID;
        if hit_wall || self.body.iter().any(|&c| c == next) {
            self.phase = Phase::Stopped;
            return Some(StepOutcome::Collided);
        }

        self.body.insert(0, next);
        if next == self.food {
            // Tail stays: net growth of one cell.
            self.score += FOOD_POINTS;
            self.place_food();
            Some(StepOutcome::Ate)
        } else {
            self.body.pop();
            Some(StepOutcome::Moved)
        }
    }

    // Rejection sampling is fine here: the snake never comes close to
    // filling a 256-cell grid in practice.
    fn place_food(&mut self) {
        loop {
            let cand = Cell {
                x: self.rng.gen_below(GRID as u32) as i32,
                y: self.rng.gen_below(GRID as u32) as i32,
            };
            if !self.body.iter().any(|&c| c == cand) {
                self.food = cand;
                break;
            }
        }
    }

    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn direction(&self) -> Direction {
        self.committed
    }
}

/// Canvas and clock wrapper around the pure game. Owned by the page
/// controller; input handlers reach it through a shared handle.
pub struct SnakeBoard {
    game: SnakeGame,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    clock: IntervalClock,
}

impl SnakeBoard {
    pub fn new(canvas: HtmlCanvasElement, seed: u32) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context on the game canvas"))?
            .dyn_into()?;
        let board = Self {
            game: SnakeGame::new(seed),
            canvas,
            ctx,
            clock: IntervalClock::new(),
        };
        board.draw();
        board.publish_score();
        set_text("snake-status", "Press Play to Start");
        Ok(board)
    }

    /// Begins a fresh game. Always stops a previous run first, so two tick
    /// streams can never overlap even across restarts.
    pub fn start(board: &Rc<RefCell<SnakeBoard>>) {
        let handle = board.clone();
        let mut b = board.borrow_mut();
        b.clock.stop();
        b.game.reset();
        b.game.begin();
        b.draw();
        b.publish_score();
        set_text("snake-status", "");
        b.clock.start(TICK_MS, move || handle.borrow_mut().tick());
    }

    /// Stops any active run and repaints the spawn layout.
    pub fn reset(&mut self) {
        self.clock.stop();
        self.game.reset();
        self.draw();
        self.publish_score();
        set_text("snake-status", "Press Play to Start");
    }

    pub fn queue_direction(&mut self, dir: Direction) {
        self.game.queue_direction(dir);
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn score(&self) -> u32 {
        self.game.score()
    }

    fn tick(&mut self) {
        match self.game.step() {
            Some(StepOutcome::Collided) => {
                self.clock.stop();
                self.draw();
                self.draw_game_over();
                set_text(
                    "snake-status",
                    &format!("Game Over! Score: {}", self.game.score()),
                );
            }
            Some(StepOutcome::Ate) => {
                self.publish_score();
                self.draw();
            }
            Some(StepOutcome::Moved) => self.draw(),
            // A tick after the clock should have stopped: make sure it has.
            None => self.clock.stop(),
        }
    }

    fn draw(&self) {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());

        self.ctx.set_fill_style_str("#0a0a0a");
        self.ctx.fill_rect(0.0, 0.0, w, h);

        self.ctx.set_stroke_style_str("rgba(255,255,255,0.03)");
        self.ctx.set_line_width(1.0);
        for i in 0..=GRID {
            let f = f64::from(i) * CELL;
            line(&self.ctx, f, 0.0, f, h);
            line(&self.ctx, 0.0, f, w, f);
        }

        // Food: soft glow under a solid square.
        let food = self.game.food();
        let fx = f64::from(food.x) * CELL;
        let fy = f64::from(food.y) * CELL;
        if let Ok(gradient) = self.ctx.create_radial_gradient(
            fx + CELL / 2.0,
            fy + CELL / 2.0,
            0.0,
            fx + CELL / 2.0,
            fy + CELL / 2.0,
            CELL,
        ) {
            let _ = gradient.add_color_stop(0.0, "#ff3b30");
            let _ = gradient.add_color_stop(0.5, "rgba(255,59,48,0.5)");
            let _ = gradient.add_color_stop(1.0, "transparent");
            self.ctx.set_fill_style_canvas_gradient(&gradient);
            self.ctx
                .fill_rect(fx - CELL / 2.0, fy - CELL / 2.0, CELL * 2.0, CELL * 2.0);
        }
        self.ctx.set_fill_style_str("#ff3b30");
        self.ctx
            .fill_rect(fx + 2.0, fy + 2.0, CELL - 4.0, CELL - 4.0);

        // Snake: bright head, tail fading out.
        let body = self.game.body();
        let len = body.len() as f64;
        for (i, seg) in body.iter().enumerate() {
            if i == 0 {
                self.ctx.set_fill_style_str("#34c759");
            } else {
                let alpha = 1.0 - (i as f64 / len) * 0.5;
                self.ctx
                    .set_fill_style_str(&format!("rgba(52, 199, 89, {alpha})"));
            }
            self.ctx.fill_rect(
                f64::from(seg.x) * CELL + 1.0,
                f64::from(seg.y) * CELL + 1.0,
                CELL - 2.0,
                CELL - 2.0,
            );
        }
    }

    fn draw_game_over(&self) {
        let w = f64::from(self.canvas.width());
        let h = f64::from(self.canvas.height());
        self.ctx.set_fill_style_str("rgba(0,0,0,0.55)");
        self.ctx.fill_rect(0.0, 0.0, w, h);
        self.ctx.set_fill_style_str("#ffffff");
        self.ctx.set_text_align("center");
        self.ctx
            .set_font("28px -apple-system, 'Helvetica Neue', sans-serif");
        self.ctx.fill_text("Game Over", w / 2.0, h / 2.0).ok();
        self.ctx
            .set_font("14px -apple-system, 'Helvetica Neue', sans-serif");
        self.ctx
            .fill_text(
                &format!("Score: {}", self.game.score()),
                w / 2.0,
                h / 2.0 + 24.0,
            )
            .ok();
    }

    fn publish_score(&self) {
        set_text("snake-score", &format!("Score: {}", self.game.score()));
    }
}

fn line(ctx: &CanvasRenderingContext2d, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.begin_path();
    ctx.move_to(x1, y1);
    ctx.line_to(x2, y2);
    ctx.stroke();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_places_food_off_the_snake() {
        for seed in 0..64 {
            let game = SnakeGame::new(seed);
            assert_eq!(game.len(), 3);
            assert!(!game.body().iter().any(|&c| c == game.food()));
            let food = game.food();
            assert!((0..GRID).contains(&food.x));
            assert!((0..GRID).contains(&food.y));
        }
    }

    #[test]
    fn direction_input_ignored_unless_running() {
        let mut game = SnakeGame::new(5);
        game.queue_direction(Direction::Down);
        assert_eq!(game.pending, Direction::Right);
        assert_eq!(game.step(), None);
    }

    #[test]
    fn reverse_input_never_changes_pending() {
        let mut game = SnakeGame::new(2);
        game.begin();
        game.queue_direction(Direction::Left);
        assert_eq!(game.pending, Direction::Right);
        game.queue_direction(Direction::Up);
        assert_eq!(game.pending, Direction::Up);
    }

    #[test]
    fn reversed_pending_is_ignored_at_commit() {
        let mut game = SnakeGame::new(2);
        game.begin();
        // Force a reverse past the input-time check.
        game.pending = Direction::Left;
        let head_before = game.body[0];
        game.step();
        assert_eq!(game.committed, Direction::Right);
        assert_eq!(game.body[0], Cell { x: head_before.x + 1, y: head_before.y });
    }

    #[test]
    fn eating_grows_by_one_and_rerolls_food() {
        let mut game = SnakeGame::new(11);
        game.begin();
        game.food = Cell { x: 9, y: 8 };
        assert_eq!(game.step(), Some(StepOutcome::Ate));
        assert_eq!(game.len(), 4);
        assert_eq!(game.score(), 10);
        assert!(!game.body().iter().any(|&c| c == game.food()));
    }

    #[test]
    fn constant_length_without_food() {
        let mut game = SnakeGame::new(13);
        game.begin();
        game.food = Cell { x: 0, y: 0 }; // behind the snake; never eaten here
        for _ in 0..4 {
            assert_eq!(game.step(), Some(StepOutcome::Moved));
            assert_eq!(game.len(), 3);
        }
        // Body cells stay pairwise distinct while the game is active.
        for (i, a) in game.body().iter().enumerate() {
            for b in game.body().iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn wall_collision_stops_the_game_for_good() {
        let mut game = SnakeGame::new(1);
        game.begin();
        game.food = Cell { x: 0, y: 0 };
        // Head starts at x=8 heading right; the 8th step walks into the wall.
        for _ in 0..7 {
            assert_eq!(game.step(), Some(StepOutcome::Moved));
        }
        assert_eq!(game.step(), Some(StepOutcome::Collided));
        assert_eq!(game.phase(), Phase::Stopped);
        let frozen = game.body().to_vec();
        assert_eq!(game.step(), None);
        assert_eq!(game.body(), frozen.as_slice());
    }

    #[test]
    fn left_wall_is_fatal_at_minus_one() {
        let mut game = SnakeGame::new(4);
        game.begin();
        game.body = vec![
            Cell { x: 0, y: 3 },
            Cell { x: 0, y: 2 },
            Cell { x: 0, y: 1 },
        ];
        game.committed = Direction::Left;
        game.pending = Direction::Left;
        game.food = Cell { x: 9, y: 9 };
        assert_eq!(game.step(), Some(StepOutcome::Collided));
        assert_eq!(game.phase(), Phase::Stopped);
        assert_eq!(game.step(), None);
    }

    #[test]
    fn self_collision_is_terminal() {
        let mut game = SnakeGame::new(3);
        game.begin();
        game.body = vec![
            Cell { x: 5, y: 5 },
            Cell { x: 4, y: 5 },
            Cell { x: 4, y: 6 },
            Cell { x: 5, y: 6 },
            Cell { x: 6, y: 6 },
        ];
        game.food = Cell { x: 0, y: 0 };
        game.queue_direction(Direction::Down);
        assert_eq!(game.step(), Some(StepOutcome::Collided));
        assert_eq!(game.phase(), Phase::Stopped);
    }

    #[test]
    fn restart_after_collision_yields_fresh_game() {
        let mut game = SnakeGame::new(17);
        game.begin();
        game.food = Cell { x: 0, y: 0 };
        while game.step().is_some() {}
        assert_eq!(game.phase(), Phase::Stopped);
        game.reset();
        game.begin();
        assert_eq!(game.phase(), Phase::Running);
        assert_eq!(game.len(), 3);
        assert_eq!(game.score(), 0);
        assert_eq!(game.step(), Some(StepOutcome::Moved));
    }
}
