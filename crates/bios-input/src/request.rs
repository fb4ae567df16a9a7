//! Request grammar and command encoding
//!
//! A key binding is a request string of the form `"<CTRL> <ARGS>"`. The
//! string is classified once into a [`RequestSpec`] and then turned into
//! newline-terminated command frames each time the key is used:
//!
//! | Request                     | Frames on press                 |
//! |-----------------------------|---------------------------------|
//! | `CTRL PUSH_BUTTON`          | `CTRL 1` / `CTRL 0`             |
//! | `CTRL CYCLE <step> <max>`   | `CTRL <next cursor value>`      |
//! | `CTRL CUSTOM a\|b\|`        | `a`, `b`                        |
//! | `CTRL INC`, `CTRL -3200`, … | the request itself              |
//!
//! Only push buttons on discrete keys react to key release.

use tracing::trace;

use crate::cycle::CycleCursor;
use crate::error::RequestError;
use crate::key::{InputClass, InputKey, Transition};

const PUSH_BUTTON: &str = "PUSH_BUTTON";
const CYCLE: &str = "CYCLE";
const CUSTOM: &str = "CUSTOM";

/// Control name used for unbound keys
pub const EMPTY_CONTROL: &str = "EMPTY";

/// Direction of a fixed-step input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepDirection {
    Inc,
    Dec,
}

/// Classified request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestSpec {
    /// Unbound key; produces no frames
    #[default]
    Empty,
    /// Any other named request, sent verbatim
    Regular,
    /// `INC` / `DEC`
    FixedStep(StepDirection),
    /// Signed relative adjustment, e.g. `+3200`
    VariableStep(i32),
    /// Absolute position
    SetState(u32),
    /// Zig-zag through `[0, max]`; the cursor is seeded on first use
    Cycle {
        step: i32,
        max: i32,
        cursor: Option<CycleCursor>,
    },
    /// `|`-separated list of literal commands
    Custom(String),
    /// Momentary button tracking key down and up
    PushButton,
}

impl RequestSpec {
    /// Classify the part of a request after the control name
    ///
    /// `raw` is the whole request, used in error messages.
    fn from_args(args: &str, raw: &str) -> Result<Self, RequestError> {
        let mut tokens = args.split(' ');
        let spec = match tokens.next().unwrap_or_default() {
            PUSH_BUTTON => Self::PushButton,
            CYCLE => {
                let invalid = || RequestError::InvalidCycle(raw.to_string());
                let step = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
                let max = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
                if tokens.next().is_some() {
                    return Err(invalid());
                }
                Self::Cycle {
                    step,
                    max,
                    cursor: None,
                }
            }
            CUSTOM => Self::Custom(
                args.strip_prefix(CUSTOM)
                    .and_then(|rest| rest.strip_prefix(' '))
                    .unwrap_or_default()
                    .to_string(),
            ),
            "INC" => Self::FixedStep(StepDirection::Inc),
            "DEC" => Self::FixedStep(StepDirection::Dec),
            arg if arg.starts_with(['+', '-']) => match arg.parse() {
                Ok(delta) => Self::VariableStep(delta),
                Err(_) => Self::Regular,
            },
            arg => match arg.parse() {
                Ok(value) => Self::SetState(value),
                Err(_) => Self::Regular,
            },
        };
        Ok(spec)
    }
}

/// Validate a control name against `^[A-Z0-9_]+$`
pub fn validate_control_name(name: &str) -> Result<(), RequestError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(RequestError::InvalidControlName(name.to_string()))
    }
}

/// A key bound to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestModel {
    key: InputKey,
    ctrl_name: String,
    raw_request: String,
    spec: RequestSpec,
}

impl RequestModel {
    /// Parse a request string for `key`
    ///
    /// Blank requests produce an empty model.
    pub fn from_request(key: InputKey, request: &str) -> Result<Self, RequestError> {
        let request = request.trim();
        if request.is_empty() {
            return Ok(Self::empty(key));
        }

        let (ctrl_name, args) = request.split_once(' ').unwrap_or((request, ""));
        validate_control_name(ctrl_name)?;
        let spec = RequestSpec::from_args(args, request)?;

        Ok(Self {
            key,
            ctrl_name: ctrl_name.to_string(),
            raw_request: request.to_string(),
            spec,
        })
    }

    /// Model for a key with no binding
    pub fn empty(key: InputKey) -> Self {
        Self {
            key,
            ctrl_name: EMPTY_CONTROL.to_string(),
            raw_request: String::new(),
            spec: RequestSpec::Empty,
        }
    }

    pub fn key(&self) -> InputKey {
        self.key
    }

    pub fn ctrl_name(&self) -> &str {
        &self.ctrl_name
    }

    pub fn raw_request(&self) -> &str {
        &self.raw_request
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.spec, RequestSpec::Empty)
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self.spec, RequestSpec::Cycle { .. })
    }

    /// Forget the cycle position so the next press reseeds from live state
    pub fn reset_cycle(&mut self) {
        if let RequestSpec::Cycle { cursor, .. } = &mut self.spec {
            *cursor = None;
        }
    }

    /// Encode the command frames for one input event
    ///
    /// `transition` is `None` for inputs that only report activation.
    /// `live_value` is asked for the control's current position the first
    /// time a cycle request is used.
    pub fn frames<F>(&mut self, transition: Option<Transition>, live_value: F) -> Vec<Vec<u8>>
    where
        F: FnOnce(&str) -> i64,
    {
        let frames: Vec<String> = match (&mut self.spec, self.key.class(), transition) {
            (RequestSpec::Empty, _, _) => Vec::new(),
            (RequestSpec::PushButton, InputClass::Discrete, Some(t)) => {
                vec![format!("{} {}\n", self.ctrl_name, t.key_state())]
            }
            (RequestSpec::PushButton, InputClass::Discrete, None) => Vec::new(),
            (RequestSpec::PushButton, InputClass::Pulse, None | Some(Transition::Pressed)) => vec![
                format!("{} {}\n", self.ctrl_name, Transition::Pressed.key_state()),
                format!("{} {}\n", self.ctrl_name, Transition::Released.key_state()),
            ],
            (_, _, None | Some(Transition::Released)) => Vec::new(),
            (RequestSpec::Cycle { step, max, cursor }, _, _) => {
                let cursor = cursor.get_or_insert_with(|| {
                    let seed = live_value(&self.ctrl_name);
                    let seed = i32::try_from(seed).unwrap_or(if seed < 0 { 0 } else { *max });
                    CycleCursor::new(seed, *max, *step)
                });
                vec![format!("{} {}\n", self.ctrl_name, cursor.advance())]
            }
            (RequestSpec::Custom(template), _, _) => template
                .split('|')
                .filter(|segment| !segment.is_empty())
                .map(|segment| format!("{}\n", segment))
                .collect(),
            _ => vec![format!("{}\n", self.raw_request)],
        };

        trace!("{} {:?} -> {:?}", self.key, transition, frames);
        frames.into_iter().map(String::into_bytes).collect()
    }
}

impl std::fmt::Display for RequestModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.ctrl_name, self.raw_request)
    }
}
