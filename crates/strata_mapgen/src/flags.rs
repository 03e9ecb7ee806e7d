//! # Flag Strings
//!
//! Named bit sets stored as comma-separated strings, e.g.
//! `"mountains, noridges, caverns"`.
//!
//! A name sets its bit, a `no`-prefixed name clears it. Names not in the
//! table are ignored with a warning, so settings written by a newer build
//! still load.

use tracing::warn;

/// Name to bit table.
pub type FlagDesc = &'static [(&'static str, u32)];

/// Parses `s` against `table`, returning `(set, clear)` masks.
///
/// A name that appears both plain and `no`-prefixed ends up in both masks;
/// [`apply_flags`] lets the clear win.
#[must_use]
pub fn parse_flags(s: &str, table: FlagDesc) -> (u32, u32) {
    let mut set = 0;
    let mut clear = 0;

    for word in s.split(',').map(str::trim).filter(|w| !w.is_empty()) {
        let word = word.to_ascii_lowercase();
        if let Some(&(_, bit)) = table.iter().find(|(name, _)| *name == word) {
            set |= bit;
            continue;
        }
        let negated = word
            .strip_prefix("no")
            .and_then(|rest| table.iter().find(|(name, _)| *name == rest));
        match negated {
            Some(&(_, bit)) => clear |= bit,
            None => warn!(flag = %word, "ignoring unknown flag"),
        }
    }

    (set, clear)
}

/// Applies the flag string `s` on top of `base`.
#[must_use]
pub fn apply_flags(base: u32, s: &str, table: FlagDesc) -> u32 {
    let (set, clear) = parse_flags(s, table);
    (base | set) & !clear
}

/// Writes every flag in `table`, unset ones prefixed with `no`.
#[must_use]
pub fn write_flags(bits: u32, table: FlagDesc) -> String {
    table
        .iter()
        .map(|&(name, bit)| {
            if bits & bit == bit {
                name.to_owned()
            } else {
                format!("no{name}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: FlagDesc = &[("mountains", 0x01), ("ridges", 0x02), ("floatlands", 0x04), ("caverns", 0x08)];

    #[test]
    fn test_parse_set_and_clear() {
        let (set, clear) = parse_flags("mountains, noridges,caverns", TABLE);
        assert_eq!(set, 0x09);
        assert_eq!(clear, 0x02);
    }

    #[test]
    fn test_apply_on_base() {
        assert_eq!(apply_flags(0x0F, "nofloatlands", TABLE), 0x0B);
        assert_eq!(apply_flags(0, "floatlands", TABLE), 0x04);
        assert_eq!(apply_flags(0x03, "", TABLE), 0x03);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        assert_eq!(apply_flags(0x01, "mountains, volcanoes, nodragons", TABLE), 0x01);
    }

    #[test]
    fn test_whitespace_and_case() {
        assert_eq!(apply_flags(0, "  Mountains ,  RIDGES ,, ", TABLE), 0x03);
    }

    #[test]
    fn test_write_then_apply() {
        let text = write_flags(0x05, TABLE);
        assert_eq!(text, "mountains, noridges, floatlands, nocaverns");
        assert_eq!(apply_flags(0x0A, &text, TABLE), 0x05);
    }
}
