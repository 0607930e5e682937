use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::config::GridSize;
use crate::events::{EventBus, EventKind, GameEvent, SubscriptionId};
use crate::input::Direction;
use crate::snake::{Position, Snake};

/// Whether ticks currently move the snake.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum LifeState {
    /// No direction has been set since construction or the last reset.
    Idle,
    Running,
    /// An invalid move happened; only [`GameEngine::reset`] leaves this state.
    Failed,
}

/// Shared handle onto an engine's growth credit.
///
/// A subscriber holding a clone can request growth while the engine is still
/// delivering a tick's events; the tail check of that same tick sees it.
#[derive(Debug, Clone, Default)]
pub struct GrowthCredit(Rc<Cell<u32>>);

impl GrowthCredit {
    /// Adds `n` pending segments, saturating at `u32::MAX`.
    pub fn request(&self, n: u32) {
        self.0.set(self.0.get().saturating_add(n));
    }

    #[must_use]
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Spends one unit of credit; returns false when there was none.
    fn consume(&self) -> bool {
        match self.0.get() {
            0 => false,
            credit => {
                self.0.set(credit - 1);
                true
            }
        }
    }
}

/// Authoritative game state and the only mutating operations on it.
#[derive(Debug)]
pub struct GameEngine {
    grid: GridSize,
    snake: Snake,
    apple: Option<Position>,
    direction: Option<Direction>,
    growth_credit: GrowthCredit,
    score: u32,
    life: LifeState,
    bus: EventBus,
}

impl GameEngine {
    /// Creates an idle engine with a one-cell snake at the grid center.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self::with_snake(grid, Snake::new(grid.center()))
    }

    /// Creates an idle engine around an explicit snake body.
    #[must_use]
    pub fn with_snake(grid: GridSize, snake: Snake) -> Self {
        Self {
            grid,
            snake,
            apple: None,
            direction: None,
            growth_credit: GrowthCredit::default(),
            score: 0,
            life: LifeState::Idle,
            bus: EventBus::new(),
        }
    }

    /// Subscribes `callback` to events of `kind`.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe(kind, Box::new(callback))
    }

    /// Unsubscribes `id` from `kind`; unknown ids are ignored.
    pub fn off(&mut self, kind: EventKind, id: SubscriptionId) {
        let _ = self.bus.unsubscribe(kind, id);
    }

    /// Records the heading used from the next tick on.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
        if self.life == LifeState::Idle {
            self.life = LifeState::Running;
        }
    }

    /// Advances the snake by one cell and returns the events emitted.
    ///
    /// Does nothing until a direction is set, and nothing while failed.
    pub fn advance_one_step(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::new();
        let Some(direction) = self.direction else {
            return emitted;
        };
        if self.life == LifeState::Failed {
            return emitted;
        }

        let next_head = self.snake.head().stepped(direction);

        // Capture is reported before the move is validated, even when the
        // move turns out to be fatal.
        if self.apple == Some(next_head) {
            log::debug!("Apple captured at {next_head:?}");
            self.emit(GameEvent::Captured { position: next_head }, &mut emitted);
        }

        if !next_head.is_within_bounds(self.grid) || self.snake.occupies(next_head) {
            log::debug!("Invalid move to {next_head:?}, score {}", self.score);
            self.life = LifeState::Failed;
            self.emit(GameEvent::Failed, &mut emitted);
            return emitted;
        }

        self.snake.push_head(next_head);
        log::trace!("Head added at {next_head:?}");
        self.emit(GameEvent::HeadAdded { position: next_head }, &mut emitted);

        if self.growth_credit.consume() {
            log::trace!("Growth credit spent, {} left", self.growth_credit.get());
        } else if let Some(tail) = self.snake.pop_tail() {
            self.emit(GameEvent::TailRemoved { position: tail }, &mut emitted);
        }

        emitted
    }

    /// Queues `n` additional segments, added one per tick.
    pub fn request_growth(&mut self, n: u32) {
        self.growth_credit.request(n);
    }

    /// Returns a handle that shares this engine's growth credit.
    #[must_use]
    pub fn growth_handle(&self) -> GrowthCredit {
        self.growth_credit.clone()
    }

    /// Moves the apple to `position`. The cell is not checked against the
    /// snake body.
    pub fn set_apple_position(&mut self, position: Position) {
        self.apple = Some(position);
        self.bus.emit(&GameEvent::AppleMoved { position });
    }

    pub fn increment_score(&mut self) {
        self.score = self.score.saturating_add(1);
        self.bus.emit(&GameEvent::ScoreChanged { score: self.score });
    }

    /// Retracts every snake cell, then restores the starting body and a zero
    /// score and returns to [`LifeState::Idle`].
    ///
    /// Growth credit and the apple are left untouched.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::with_capacity(self.snake.len());
        let occupied: Vec<Position> = self.snake.segments().copied().collect();
        for position in occupied {
            self.emit(GameEvent::TailRemoved { position }, &mut emitted);
        }

        self.snake = Snake::new(self.grid.center());
        self.score = 0;
        self.direction = None;
        self.life = LifeState::Idle;
        log::debug!(
            "Game reset, {} cells retracted, growth credit {}",
            emitted.len(),
            self.growth_credit.get()
        );
        emitted
    }

    fn emit(&mut self, event: GameEvent, emitted: &mut Vec<GameEvent>) {
        self.bus.emit(&event);
        emitted.push(event);
    }

    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    #[must_use]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[must_use]
    pub fn head(&self) -> Position {
        self.snake.head()
    }

    #[must_use]
    pub fn apple(&self) -> Option<Position> {
        self.apple
    }

    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    #[must_use]
    pub fn growth_credit(&self) -> u32 {
        self.growth_credit.get()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn life_state(&self) -> LifeState {
        self.life
    }
}
