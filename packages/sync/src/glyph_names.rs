//! Glyph names for code points and back.

/// Maps between code points and glyph names.
pub trait GlyphNames: Send + Sync {
    fn suggested_glyph_name(&self, code_point: u32) -> String;

    fn unicode_from_glyph_name(&self, glyph_name: &str) -> Option<u32>;
}

/// Production names for printable ASCII, `uniXXXX`/`uXXXXX` for the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGlyphNames;

const FIRST_PRINTABLE: u32 = 0x20;

const ASCII_NAMES: [&str; 95] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
    "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash",
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    "colon", "semicolon", "less", "equal", "greater", "question", "at",
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    "bracketleft", "backslash", "bracketright", "asciicircum", "underscore", "grave",
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    "braceleft", "bar", "braceright", "asciitilde",
];

impl GlyphNames for FallbackGlyphNames {
    fn suggested_glyph_name(&self, code_point: u32) -> String {
        if let Some(name) = code_point
            .checked_sub(FIRST_PRINTABLE)
            .and_then(|offset| ASCII_NAMES.get(offset as usize))
        {
            return name.to_string();
        }
        let hex = format!("{:04X}", code_point);
        if hex.len() == 4 {
            format!("uni{}", hex)
        } else {
            format!("u{}", hex)
        }
    }

    fn unicode_from_glyph_name(&self, glyph_name: &str) -> Option<u32> {
        // Suffixed names like "A.alt" have no code point of their own.
        if glyph_name.contains('.') {
            return None;
        }
        if let Some(position) = ASCII_NAMES.iter().position(|name| *name == glyph_name) {
            return Some(FIRST_PRINTABLE + position as u32);
        }
        let hex = match (glyph_name.strip_prefix("uni"), glyph_name.strip_prefix('u')) {
            (Some(hex), _) if hex.len() == 4 => hex,
            (_, Some(hex)) if (4..=6).contains(&hex.len()) => hex,
            _ => return None,
        };
        if !hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().filter(|code_point| char::from_u32(*code_point).is_some())
    }
}
