//! Viewer Command Protocol
//!
//! Text commands sent from the viewer to the streaming server. Fields are
//! `+`-delimited with no escaping or versioning:
//!
//! | command            | wire form            |
//! |--------------------|----------------------|
//! | set quality        | `q <value>`          |
//! | set frame rate     | `f <value>`          |
//! | key up/down        | `2+<0\|1>+<code>`    |
//! | relative mouse     | `1+<dx>+<dy>`        |
//! | mouse button       | `3+<0\|1>+<0\|1>`    |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Mouse buttons the server understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteButton {
    Right = 0,
    Left = 1,
}

impl RemoteButton {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A command sent over the stream socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerCommand {
    /// Per-frame size ceiling in KB, labelled "quality" in the viewer.
    SetQuality(u32),
    /// Target frames per second.
    SetFrameRate(u32),
    /// Key press or release, `code` is a W3C `KeyboardEvent.code` name.
    Key { pressed: bool, code: String },
    /// Relative pointer movement.
    MouseMove { dx: i32, dy: i32 },
    /// Mouse button press or release.
    MouseButton { pressed: bool, button: RemoteButton },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("malformed {command} command: {message:?}")]
    Malformed {
        command: &'static str,
        message: String,
    },

    #[error("unknown mouse button code {0}")]
    UnknownButton(i32),
}

fn flag(on: bool) -> u8 {
    u8::from(on)
}

impl fmt::Display for ViewerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerCommand::SetQuality(value) => write!(f, "q {}", value),
            ViewerCommand::SetFrameRate(value) => write!(f, "f {}", value),
            ViewerCommand::Key { pressed, code } => write!(f, "2+{}+{}", flag(*pressed), code),
            ViewerCommand::MouseMove { dx, dy } => write!(f, "1+{}+{}", dx, dy),
            ViewerCommand::MouseButton { pressed, button } => {
                write!(f, "3+{}+{}", flag(*pressed), button.code())
            }
        }
    }
}

impl FromStr for ViewerCommand {
    type Err = ProtocolError;

    fn from_str(message: &str) -> Result<Self, Self::Err> {
        let malformed = |command: &'static str| ProtocolError::Malformed {
            command,
            message: message.to_string(),
        };

        if let Some(rest) = message.strip_prefix("q ") {
            let value = rest.trim().parse().map_err(|_| malformed("quality"))?;
            return Ok(ViewerCommand::SetQuality(value));
        }

        if let Some(rest) = message.strip_prefix("f ") {
            let value = rest.trim().parse().map_err(|_| malformed("frame rate"))?;
            return Ok(ViewerCommand::SetFrameRate(value));
        }

        if let Some(rest) = message.strip_prefix("2+") {
            let mut fields = rest.splitn(2, '+');
            let state = fields.next().ok_or_else(|| malformed("key"))?;
            let code = fields
                .next()
                .filter(|code| !code.is_empty())
                .ok_or_else(|| malformed("key"))?;
            // Anything other than "1" is a release, same as the server.
            return Ok(ViewerCommand::Key {
                pressed: state == "1",
                code: code.to_string(),
            });
        }

        if let Some(rest) = message.strip_prefix("1+") {
            let (dx, dy) = rest.split_once('+').ok_or_else(|| malformed("mouse move"))?;
            let dx = dx.parse().map_err(|_| malformed("mouse move"))?;
            let dy = dy.parse().map_err(|_| malformed("mouse move"))?;
            return Ok(ViewerCommand::MouseMove { dx, dy });
        }

        if let Some(rest) = message.strip_prefix("3+") {
            let (state, button) = rest
                .split_once('+')
                .ok_or_else(|| malformed("mouse button"))?;
            let state: i32 = state.parse().map_err(|_| malformed("mouse button"))?;
            let button: i32 = button.parse().map_err(|_| malformed("mouse button"))?;
            let button = match button {
                0 => RemoteButton::Right,
                1 => RemoteButton::Left,
                other => return Err(ProtocolError::UnknownButton(other)),
            };
            return Ok(ViewerCommand::MouseButton {
                pressed: state == 1,
                button,
            });
        }

        Err(ProtocolError::UnknownCommand(message.to_string()))
    }
}
