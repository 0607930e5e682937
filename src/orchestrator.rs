use rand::Rng;

use crate::config::{GameConfig, GridSize};
use crate::events::{EventKind, GameEvent};
use crate::game::GameEngine;
use crate::input::Direction;
use crate::snake::Position;

/// Session policy layered on top of the engine: apple respawn, growth and
/// score on capture, and restart on the first input after a failure.
#[derive(Debug, Clone)]
pub struct Orchestrator<R> {
    rng: R,
    growth_per_capture: u32,
    movement_started: bool,
    failed: bool,
}

impl<R: Rng> Orchestrator<R> {
    /// Creates the policy for `engine` and subscribes its capture growth.
    ///
    /// Growth is requested while the capturing tick is still running, so that
    /// tick already keeps its tail.
    pub fn new(config: &GameConfig, rng: R, engine: &mut GameEngine) -> Self {
        let growth = engine.growth_handle();
        let growth_per_capture = config.growth_per_capture;
        engine.on(EventKind::Captured, move |_| {
            growth.request(growth_per_capture);
        });

        Self {
            rng,
            growth_per_capture,
            movement_started: false,
            failed: false,
        }
    }

    /// Applies a direction input, restarting the game first if it has failed.
    pub fn handle_direction(&mut self, engine: &mut GameEngine, direction: Direction) {
        if self.failed {
            self.failed = false;
            engine.reset();
            engine.request_growth(self.growth_per_capture);
            log::info!("Restarting after failure");
        }
        if !self.movement_started {
            self.place_apple(engine);
            self.movement_started = true;
        }
        engine.set_direction(direction);
    }

    /// Advances the engine one tick and reacts to what happened.
    ///
    /// Returns the events emitted by the tick; nothing happens while a failure
    /// is waiting for the next direction input.
    pub fn tick(&mut self, engine: &mut GameEngine) -> Vec<GameEvent> {
        if self.failed {
            return Vec::new();
        }
        let emitted = engine.advance_one_step();
        for event in &emitted {
            match event {
                GameEvent::Captured { .. } => {
                    self.place_apple(engine);
                    engine.increment_score();
                }
                GameEvent::Failed => {
                    log::info!("Game over with score {}", engine.score());
                    self.movement_started = false;
                    self.failed = true;
                }
                _ => {}
            }
        }
        emitted
    }

    /// Returns true once a failure has been seen and no input has followed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn place_apple(&mut self, engine: &mut GameEngine) {
        let position = random_cell(&mut self.rng, engine.grid());
        log::debug!("Placing apple at {position:?}");
        engine.set_apple_position(position);
    }
}

/// Picks a uniformly random cell anywhere on the grid, snake cells included.
#[must_use]
pub fn random_cell<R: Rng + ?Sized>(rng: &mut R, bounds: GridSize) -> Position {
    Position {
        x: rng.gen_range(0..i32::from(bounds.width)),
        y: rng.gen_range(0..i32::from(bounds.height)),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use pretty_assertions::assert_eq;

    use super::{Orchestrator, random_cell};
    use crate::config::{GameConfig, GridSize};
    use crate::events::GameEvent;
    use crate::game::{GameEngine, LifeState};
    use crate::input::Direction;
    use crate::snake::{Position, Snake};

    fn setup(width: u16, height: u16) -> (GameEngine, Orchestrator<StdRng>) {
        let config = GameConfig {
            grid: GridSize { width, height },
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config.grid);
        let orchestrator = Orchestrator::new(&config, StdRng::seed_from_u64(7), &mut engine);
        (engine, orchestrator)
    }

    #[test]
    fn random_cells_stay_inside_the_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = GridSize {
            width: 4,
            height: 3,
        };

        for _ in 0..200 {
            assert!(random_cell(&mut rng, bounds).is_within_bounds(bounds));
        }
    }

    #[test]
    fn session_starts_without_growth() {
        let (mut engine, mut orchestrator) = setup(10, 10);
        orchestrator.handle_direction(&mut engine, Direction::Right);
        engine.set_apple_position(Position { x: 0, y: 0 });

        assert_eq!(engine.growth_credit(), 0);

        orchestrator.tick(&mut engine);
        assert_eq!(engine.snake().len(), 1);
    }

    #[test]
    fn first_direction_places_an_apple() {
        let (mut engine, mut orchestrator) = setup(10, 10);

        orchestrator.handle_direction(&mut engine, Direction::Up);

        let apple = engine.apple().unwrap();
        assert!(apple.is_within_bounds(engine.grid()));
        assert_eq!(engine.life_state(), LifeState::Running);

        orchestrator.handle_direction(&mut engine, Direction::Left);
        assert_eq!(engine.apple(), Some(apple));
    }

    #[test]
    fn capture_respawns_apple_grows_and_scores() {
        let (mut engine, mut orchestrator) = setup(10, 10);
        orchestrator.handle_direction(&mut engine, Direction::Right);
        engine.set_apple_position(Position { x: 6, y: 5 });

        let emitted = orchestrator.tick(&mut engine);

        assert_eq!(
            emitted[0],
            GameEvent::Captured {
                position: Position { x: 6, y: 5 }
            }
        );
        assert_eq!(engine.score(), 1);
        // The capturing tick already keeps its tail.
        assert_eq!(engine.snake().len(), 2);
        assert_eq!(engine.growth_credit(), 2);

        orchestrator.tick(&mut engine);
        assert_eq!(engine.snake().len(), 3);
    }

    #[test]
    fn failure_waits_for_input_then_restarts() {
        let config = GameConfig {
            grid: GridSize {
                width: 5,
                height: 5,
            },
            ..GameConfig::default()
        };
        let mut engine = GameEngine::with_snake(config.grid, Snake::new(Position { x: 4, y: 2 }));
        let mut orchestrator =
            Orchestrator::new(&config, StdRng::seed_from_u64(11), &mut engine);
        orchestrator.handle_direction(&mut engine, Direction::Right);
        engine.increment_score();

        let emitted = orchestrator.tick(&mut engine);
        assert!(emitted.contains(&GameEvent::Failed));
        assert!(orchestrator.is_failed());
        assert!(orchestrator.tick(&mut engine).is_empty());

        orchestrator.handle_direction(&mut engine, Direction::Up);

        assert!(!orchestrator.is_failed());
        assert_eq!(engine.life_state(), LifeState::Running);
        assert_eq!(engine.head(), Position { x: 2, y: 2 });
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.growth_credit(), 3);

        orchestrator.tick(&mut engine);
        assert_eq!(engine.head(), Position { x: 2, y: 1 });
        assert_eq!(engine.snake().len(), 2);
    }
}
