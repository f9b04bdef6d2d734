use std::fmt;

/// Physical key identifier using the historical (DOM `keyCode` era) numbering.
///
/// Letters are their uppercase ASCII code and digits their ASCII code; the
/// named constants below are opaque identifiers and must not be reinterpreted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(13);
    pub const SHIFT: KeyCode = KeyCode(16);
    pub const CTRL: KeyCode = KeyCode(17);
    pub const ALT: KeyCode = KeyCode(18);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const PAGE_UP: KeyCode = KeyCode(33);
    pub const PAGE_DOWN: KeyCode = KeyCode(34);
    pub const END: KeyCode = KeyCode(35);
    pub const HOME: KeyCode = KeyCode(36);
    pub const LEFT: KeyCode = KeyCode(37);
    pub const UP: KeyCode = KeyCode(38);
    pub const RIGHT: KeyCode = KeyCode(39);
    pub const DOWN: KeyCode = KeyCode(40);
    pub const INSERT: KeyCode = KeyCode(45);
    pub const DELETE: KeyCode = KeyCode(46);
    pub const META: KeyCode = KeyCode(91);
    pub const F1: KeyCode = KeyCode(112);

    /// Named aliases accepted in chord descriptors.
    pub const ALIASES: [(&'static str, KeyCode); 8] = [
        ("left", KeyCode::LEFT),
        ("up", KeyCode::UP),
        ("right", KeyCode::RIGHT),
        ("down", KeyCode::DOWN),
        ("space", KeyCode::SPACE),
        ("pageup", KeyCode::PAGE_UP),
        ("pagedown", KeyCode::PAGE_DOWN),
        ("tab", KeyCode::TAB),
    ];

    /// Resolves a named alias (ASCII case-insensitive).
    pub fn from_alias(name: &str) -> Option<KeyCode> {
        Self::ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, code)| *code)
    }

    /// Key code of a printable character, case-insensitive for letters.
    pub fn from_char(c: char) -> KeyCode {
        let upper = c.to_uppercase().next().unwrap_or(c);
        KeyCode(upper as u32)
    }

    /// Letter key `A`..=`Z` by its ASCII letter.
    pub const fn letter(c: u8) -> KeyCode {
        KeyCode(c.to_ascii_uppercase() as u32)
    }

    pub const fn digit(d: u8) -> KeyCode {
        KeyCode(b'0' as u32 + (d % 10) as u32)
    }

    /// Function key `F1`..=`F12` (1-based).
    pub const fn function(n: u8) -> KeyCode {
        KeyCode(Self::F1.0 + n.saturating_sub(1) as u32)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((alias, _)) = Self::ALIASES.iter().find(|(_, c)| c == self) {
            return f.write_str(alias);
        }
        match char::from_u32(self.0) {
            Some(c) if c.is_ascii_alphanumeric() => write!(f, "{c}"),
            _ => write!(f, "#{}", self.0),
        }
    }
}
