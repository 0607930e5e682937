use std::str::FromStr;

use thiserror::Error;

/// Canonical movement directions, one per unit axis vector.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the `(dx, dy)` unit vector; y grows downwards.
    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Maps a script character (`U/D/L/R` or compass `N/S/W/E`) to a direction.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' | 'N' => Some(Self::Up),
            'D' | 'S' => Some(Self::Down),
            'L' | 'W' => Some(Self::Left),
            'R' | 'E' => Some(Self::Right),
            _ => None,
        }
    }
}

/// Character in a move script meaning "no input on this tick".
pub const IDLE_STEP: char = '.';

/// A scripted sequence of per-tick inputs.
///
/// Each step is either a direction to apply before the tick or `None` to let
/// the snake keep its current heading.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MoveScript {
    steps: Vec<Option<Direction>>,
}

impl MoveScript {
    /// Parses a script such as `"RR.D LLU"`; whitespace is ignored.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::with_capacity(source.len());
        for (position, found) in source.chars().enumerate() {
            if found.is_whitespace() {
                continue;
            }
            if found == IDLE_STEP {
                steps.push(None);
                continue;
            }
            let direction =
                Direction::from_char(found).ok_or(ScriptError::UnknownMove { position, found })?;
            steps.push(Some(direction));
        }
        Ok(Self { steps })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the input for tick `index`, or `None` past the end of the script.
    #[must_use]
    pub fn step(&self, index: usize) -> Option<Option<Direction>> {
        self.steps.get(index).copied()
    }

    /// Returns true if any step at or after `index` carries a direction.
    #[must_use]
    pub fn has_direction_from(&self, index: usize) -> bool {
        self.steps.iter().skip(index).any(Option::is_some)
    }
}

impl FromStr for MoveScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, Error, Eq, PartialEq)]
pub enum ScriptError {
    #[error("unknown move {found:?} at position {position}")]
    UnknownMove { position: usize, found: char },
}
