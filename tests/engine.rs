// Host-side integration tests for the showcase engines. These avoid
// wasm/browser APIs and exercise pure Rust logic so they can run under
// `cargo test` on the host.

use seaverse_showcase::showcase::art::{ParticleField, SPAWN_BATCH};
use seaverse_showcase::showcase::snake::{Direction, Phase, SnakeGame, StepOutcome};

#[test]
fn four_step_walk_keeps_running() {
    let mut game = SnakeGame::new(7);
    game.begin();
    let mut eaten: usize = 0;
    for dir in [
        Direction::Right,
        Direction::Right,
        Direction::Down,
        Direction::Down,
    ] {
        game.queue_direction(dir);
        match game.step() {
            Some(StepOutcome::Ate) => eaten += 1,
            Some(StepOutcome::Moved) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(game.phase(), Phase::Running);
    assert_eq!(game.len(), 3 + eaten);
    assert_eq!(game.score(), 10 * eaten as u32);
}

// Serpentine sweep across the board: long enough to cross food several times,
// short enough to never self-collide. The length ledger must hold throughout.
#[test]
fn growth_ledger_holds_across_a_long_walk() {
    let mut game = SnakeGame::new(99);
    game.begin();

    let mut dirs = vec![Direction::Right; 7];
    for row in 0..7 {
        dirs.push(Direction::Down);
        let horiz = if row % 2 == 0 {
            Direction::Left
        } else {
            Direction::Right
        };
        dirs.extend(std::iter::repeat(horiz).take(15));
    }

    let mut eaten: usize = 0;
    for dir in dirs {
        game.queue_direction(dir);
        match game.step() {
            Some(StepOutcome::Ate) => eaten += 1,
            Some(StepOutcome::Moved) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(game.len(), 3 + eaten);
        assert_eq!(game.score(), 10 * eaten as u32);
    }
    assert_eq!(game.phase(), Phase::Running);
}

#[test]
fn spawned_particles_decay_away_without_interaction() {
    let mut field = ParticleField::new(21);
    field.spawn(100.0, 100.0);
    field.spawn(120.0, 80.0);
    assert_eq!(field.len(), 2 * SPAWN_BATCH);
    for _ in 0..250 {
        field.advance();
    }
    assert!(field.is_empty());
}

#[test]
fn clear_empties_the_field_immediately() {
    let mut field = ParticleField::new(33);
    for i in 0..10 {
        field.spawn(f64::from(i) * 3.0, 50.0);
    }
    field.clear();
    assert!(field.is_empty());
    // A later advance stays empty; nothing lingers to be rendered.
    field.advance();
    assert!(field.is_empty());
}
