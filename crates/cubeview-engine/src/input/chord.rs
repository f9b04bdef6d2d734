use std::fmt;
use std::str::FromStr;

use super::keycode::KeyCode;
use super::types::ModifierKey;

/// One `+`-separated token of a chord descriptor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChordPart {
    Modifier(ModifierKey),
    Key(KeyCode),
    /// Empty or unrecognized token. Never held.
    Unknown,
}

impl ChordPart {
    /// Resolves a single token: modifier name, then alias, then a single
    /// printable character.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();

        if let Some(m) = ModifierKey::from_name(token) {
            return ChordPart::Modifier(m);
        }
        if let Some(code) = KeyCode::from_alias(token) {
            return ChordPart::Key(code);
        }

        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() && !c.is_whitespace() => {
                ChordPart::Key(KeyCode::from_char(c))
            }
            _ => ChordPart::Unknown,
        }
    }
}

/// Parsed key-combination request, e.g. `"ctrl+up"` or `"Q"`.
///
/// A chord is held only when every part is held. More than one non-modifier
/// key is accepted (`"Q+W"` requires both).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Chord {
    parts: Vec<ChordPart>,
}

impl Chord {
    /// Parses a descriptor. Never fails; bad tokens become `ChordPart::Unknown`.
    pub fn parse(descriptor: &str) -> Self {
        Self {
            parts: descriptor.split('+').map(ChordPart::parse).collect(),
        }
    }

    pub fn parts(&self) -> &[ChordPart] {
        &self.parts
    }

    /// True when the chord contains a token that can never be held.
    pub fn is_unsatisfiable(&self) -> bool {
        self.parts.iter().any(|p| *p == ChordPart::Unknown)
    }

    /// Evaluates the chord with short-circuit AND over its parts.
    pub fn held_by(
        &self,
        mut modifier_down: impl FnMut(ModifierKey) -> bool,
        mut key_down: impl FnMut(KeyCode) -> bool,
    ) -> bool {
        self.parts.iter().all(|part| match *part {
            ChordPart::Modifier(m) => modifier_down(m),
            ChordPart::Key(code) => key_down(code),
            ChordPart::Unknown => false,
        })
    }
}

impl FromStr for Chord {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Chord::parse(s))
    }
}

impl From<&str> for Chord {
    fn from(s: &str) -> Self {
        Chord::parse(s)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            match part {
                ChordPart::Modifier(m) => write!(f, "{m}")?,
                ChordPart::Key(code) => write!(f, "{code}")?,
                ChordPart::Unknown => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_and_alias() {
        let c = Chord::parse("ctrl+up");
        assert_eq!(
            c.parts(),
            &[ChordPart::Modifier(ModifierKey::Ctrl), ChordPart::Key(KeyCode::UP)]
        );
    }

    #[test]
    fn single_letter_is_case_insensitive() {
        assert_eq!(Chord::parse("q"), Chord::parse("Q"));
        assert_eq!(Chord::parse("q").parts(), &[ChordPart::Key(KeyCode(81))]);
    }

    #[test]
    fn names_are_case_insensitive_and_trimmed() {
        assert_eq!(Chord::parse("Ctrl + PageUp"), Chord::parse("ctrl+pageup"));
    }

    #[test]
    fn empty_and_unknown_tokens() {
        assert_eq!(Chord::parse("").parts(), &[ChordPart::Unknown]);
        assert!(Chord::parse("ctrl+").is_unsatisfiable());
        assert!(Chord::parse("hyper+x").is_unsatisfiable());
        assert!(!Chord::parse("shift+alt+meta+x").is_unsatisfiable());
    }

    #[test]
    fn two_primary_keys_are_both_kept() {
        let c = Chord::parse("Q+W");
        assert_eq!(
            c.parts(),
            &[ChordPart::Key(KeyCode(81)), ChordPart::Key(KeyCode(87))]
        );
    }

    #[test]
    fn held_by_short_circuits() {
        let c = Chord::parse("ctrl+up");
        let mut key_queries = 0;
        let held = c.held_by(|_| false, |_| {
            key_queries += 1;
            true
        });
        assert!(!held);
        assert_eq!(key_queries, 0);
    }

    #[test]
    fn display_round_trips_names() {
        assert_eq!(Chord::parse("CTRL+left").to_string(), "ctrl+left");
        assert_eq!(Chord::parse("shift+q").to_string(), "shift+Q");
    }
}
