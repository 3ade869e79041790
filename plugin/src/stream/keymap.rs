//! Alternate control bindings.
//!
//! Keys are W3C `KeyboardEvent.code` names, which is also what the server
//! translates into native key symbols.

const ALTERNATE_BINDINGS: &[(&str, &str)] = &[
    ("KeyW", "ArrowUp"),
    ("KeyA", "ArrowLeft"),
    ("KeyS", "ArrowDown"),
    ("KeyD", "ArrowRight"),
    ("KeyH", "KeyZ"),
    ("KeyU", "KeyX"),
    ("Space", "ShiftLeft"),
    ("KeyM", "Space"),
    ("KeyQ", "Escape"),
];

/// Look up the alternate binding for a key code.
pub fn alternate_binding(code: &str) -> Option<&'static str> {
    ALTERNATE_BINDINGS
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| *to)
}

/// Resolve the key code to send to the server.
///
/// Returns `None` when the alternate layout is active and the key has no binding.
pub fn remote_key(code: &str, swap: bool) -> Option<&str> {
    if swap {
        alternate_binding(code)
    } else {
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_bindings() {
        assert_eq!(alternate_binding("KeyW"), Some("ArrowUp"));
        assert_eq!(alternate_binding("Space"), Some("ShiftLeft"));
        assert_eq!(alternate_binding("KeyM"), Some("Space"));
        assert_eq!(alternate_binding("KeyQ"), Some("Escape"));
        assert_eq!(alternate_binding("KeyZ"), None);
    }

    #[test]
    fn test_remote_key() {
        assert_eq!(remote_key("KeyZ", false), Some("KeyZ"));
        assert_eq!(remote_key("KeyH", true), Some("KeyZ"));
        assert_eq!(remote_key("Enter", true), None);
    }
}
