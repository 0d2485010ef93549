use crate::session::messages::Msg;

/// Keys the editor reacts to, independent of the windowing toolkit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Character(String),
    Escape,
    Delete,
    Backspace,
    Other,
}

impl Key {
    pub fn character(c: &str) -> Self {
        Key::Character(c.to_string())
    }

    fn is_char(&self, expected: &str) -> bool {
        matches!(self, Key::Character(c) if c.eq_ignore_ascii_case(expected))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub control: bool,
    /// Cmd on macOS, Super elsewhere
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        control: false,
        command: false,
        shift: false,
        alt: false,
    };

    pub fn ctrl() -> Self {
        Self {
            control: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            control: true,
            shift: true,
            ..Self::NONE
        }
    }

    pub fn cmd() -> Self {
        Self {
            command: true,
            ..Self::NONE
        }
    }

    /// Ctrl or Cmd: the platform's primary shortcut modifier
    pub fn primary(self) -> bool {
        self.control || self.command
    }
}

pub fn handle_key_event(key: &Key, modifiers: Modifiers, has_selection: bool) -> Option<Msg> {
    let primary = modifiers.primary();
    match key {
        Key::Escape => Some(Msg::cancel()),
        // Undo/redo shortcuts
        k if k.is_char("z") && primary && !modifiers.shift => Some(Msg::undo()),
        k if (k.is_char("z") && primary && modifiers.shift) || (k.is_char("y") && primary) => {
            Some(Msg::redo())
        }
        // Save/copy shortcuts
        k if k.is_char("s") && primary => Some(Msg::save()),
        k if k.is_char("c") && primary && modifiers.shift => Some(Msg::copy_to_clipboard()),
        // Only with an annotation selected, so Backspace in a text field is left alone
        Key::Delete | Key::Backspace if has_selection => Some(Msg::delete_selected()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_copy_accept_ctrl_or_cmd() {
        assert_eq!(
            handle_key_event(&Key::character("s"), Modifiers::ctrl(), false),
            Some(Msg::save())
        );
        assert_eq!(
            handle_key_event(&Key::character("s"), Modifiers::cmd(), false),
            Some(Msg::save())
        );
        assert_eq!(
            handle_key_event(&Key::character("C"), Modifiers::ctrl_shift(), false),
            Some(Msg::copy_to_clipboard())
        );
        assert_eq!(handle_key_event(&Key::character("c"), Modifiers::ctrl(), false), None);
    }

    #[test]
    fn undo_redo_bindings() {
        let z = Key::character("z");
        assert_eq!(handle_key_event(&z, Modifiers::ctrl(), false), Some(Msg::undo()));
        assert_eq!(handle_key_event(&z, Modifiers::ctrl_shift(), false), Some(Msg::redo()));
        assert_eq!(
            handle_key_event(&Key::character("y"), Modifiers::cmd(), false),
            Some(Msg::redo())
        );
        assert_eq!(handle_key_event(&z, Modifiers::NONE, false), None);
    }

    #[test]
    fn delete_needs_a_selection() {
        assert_eq!(handle_key_event(&Key::Backspace, Modifiers::NONE, false), None);
        assert_eq!(
            handle_key_event(&Key::Delete, Modifiers::NONE, true),
            Some(Msg::delete_selected())
        );
    }

    #[test]
    fn escape_always_cancels() {
        assert_eq!(
            handle_key_event(&Key::Escape, Modifiers::ctrl(), true),
            Some(Msg::cancel())
        );
    }
}
