//! Physical input keys
//!
//! Keys are named in configuration the same way the panel labels them:
//!
//! - `G<key>_M<mode>`: programmable G-key in a memory mode, e.g. `G3_M1`
//! - `M_<n>`: extra mouse button, e.g. `M_6`
//! - `ONE`, `TWO`, ... `MENU`: soft buttons under the LCD

use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;

/// Soft buttons next to the panel LCD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum LcdButton {
    One,
    Two,
    Three,
    Four,
    Left,
    Right,
    Ok,
    Cancel,
    Up,
    Down,
    Menu,
}

impl LcdButton {
    /// All soft buttons, mono layout first
    pub const ALL: [LcdButton; 11] = [
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Left,
        Self::Right,
        Self::Ok,
        Self::Cancel,
        Self::Up,
        Self::Down,
        Self::Menu,
    ];

    /// Configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Four => "FOUR",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Ok => "OK",
            Self::Cancel => "CANCEL",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Menu => "MENU",
        }
    }

    /// Look up a button by configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

/// How an input reports activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputClass {
    /// Separate down and up events
    Discrete,
    /// A single activation with no release
    Pulse,
}

/// Edge of a discrete input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transition {
    Pressed,
    Released,
}

impl Transition {
    /// Argument sent for a push button in this state
    pub fn key_state(&self) -> u8 {
        match self {
            Self::Pressed => 1,
            Self::Released => 0,
        }
    }
}

/// A bindable panel input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum InputKey {
    /// Programmable G-key in a memory mode
    GKey { key: u8, mode: u8 },
    /// Extra mouse button
    MouseButton(u8),
    /// LCD soft button
    LcdButton(LcdButton),
}

impl InputKey {
    /// How this key reports activation
    pub fn class(&self) -> InputClass {
        match self {
            Self::GKey { .. } | Self::MouseButton(_) => InputClass::Discrete,
            Self::LcdButton(_) => InputClass::Pulse,
        }
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GKey { key, mode } => write!(f, "G{}_M{}", key, mode),
            Self::MouseButton(n) => write!(f, "M_{}", n),
            Self::LcdButton(b) => f.write_str(b.name()),
        }
    }
}

/// Parse a positive decimal number with no sign or padding characters
fn parse_index(digits: &str) -> Option<u8> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

impl FromStr for InputKey {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || RequestError::UnknownKey(s.to_string());

        if let Some(button) = s.strip_prefix("M_") {
            return parse_index(button).map(Self::MouseButton).ok_or_else(unknown);
        }
        if let Some(rest) = s.strip_prefix('G') {
            let (key, mode) = rest.split_once("_M").ok_or_else(unknown)?;
            return match (parse_index(key), parse_index(mode)) {
                (Some(key), Some(mode)) => Ok(Self::GKey { key, mode }),
                _ => Err(unknown()),
            };
        }
        LcdButton::from_name(s)
            .map(Self::LcdButton)
            .ok_or_else(unknown)
    }
}

impl TryFrom<String> for InputKey {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InputKey> for String {
    fn from(key: InputKey) -> Self {
        key.to_string()
    }
}
