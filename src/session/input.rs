/// Keys the presentation reacts to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
    /// `0`-`9`: jump straight to the scene of that name.
    Digit(u8),
    /// Any other named key, looked up in the current scene's transition table.
    Other(String),
}

impl Key {
    /// Parse a key name as written in scripts and on the command line.
    ///
    /// Names are case-insensitive; `return`, `select` and `esc`/`back` are accepted aliases.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let key = match s.to_ascii_lowercase().as_str() {
            "up" => Self::Up,
            "down" => Self::Down,
            "enter" | "return" | "select" => Self::Enter,
            "escape" | "esc" | "back" => Self::Escape,
            d if d.len() == 1 && d.as_bytes()[0].is_ascii_digit() => {
                Self::Digit(d.as_bytes()[0] - b'0')
            }
            _ => Self::Other(s.to_string()),
        };
        Some(key)
    }

    /// Coordinator command this key maps to.
    pub fn command(&self) -> Command {
        match self {
            Self::Up => Command::MoveUp,
            Self::Down => Command::MoveDown,
            Self::Enter => Command::Transition("select".to_string()),
            Self::Escape => Command::Transition("back".to_string()),
            Self::Digit(d) => Command::Jump(d.to_string()),
            Self::Other(name) => Command::Transition(name.clone()),
        }
    }
}

/// Coordinator-level action.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Command {
    MoveUp,
    MoveDown,
    /// Resolve through `TransitionCoordinator::get_transition`.
    Transition(String),
    /// Switch forward to the named scene, bypassing the transition table.
    Jump(String),
}

#[cfg(test)]
#[path = "../../tests/unit/session/input.rs"]
mod tests;
