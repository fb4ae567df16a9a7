//! Bounded zig-zag counter for cycle controls
//!
//! A cycle control walks from its current position up to `max`, then back
//! down to zero, and so on. Each button press advances the cursor by one
//! step and sends the new position.

/// Direction the cursor is currently moving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Towards `max`
    #[default]
    Forward,
    /// Towards zero
    Backward,
}

impl Direction {
    fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Oscillating counter over `[0, max]`
///
/// The value stays within range after construction and after every step.
///
/// ```rust
/// use bios_input::CycleCursor;
///
/// let cursor = CycleCursor::new(2, 4, 1);
/// let values: Vec<i32> = cursor.take(10).collect();
/// assert_eq!(values, vec![3, 4, 3, 2, 1, 0, 1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleCursor {
    current: i32,
    max: i32,
    step: i32,
    direction: Direction,
}

impl CycleCursor {
    /// Create a cursor at `current`, clamped into `[0, max]`
    ///
    /// A negative `max` is treated as zero.
    pub fn new(current: i32, max: i32, step: i32) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
            step,
            direction: Direction::Forward,
        }
    }

    /// Current position
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Upper bound
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Step size
    pub fn step(&self) -> i32 {
        self.step
    }

    /// Direction of the next step
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advance one step and return the new position
    pub fn advance(&mut self) -> i32 {
        if self.current >= self.max {
            self.direction = Direction::Backward;
        } else if self.current <= 0 {
            self.direction = Direction::Forward;
        }

        let delta = self.step.saturating_mul(self.direction.sign());
        self.current = self.current.saturating_add(delta).clamp(0, self.max);
        self.current
    }
}

impl Iterator for CycleCursor {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        Some(self.advance())
    }
}

impl std::fmt::Display for CycleCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "current: {} step: {} max value: {}",
            self.current, self.step, self.max
        )
    }
}
