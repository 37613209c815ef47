//! DOS OEM code pages missing from the WHATWG encoding set.
//!
//! Both tables share ASCII for `0x00..=0x7F`; only the upper half is stored.

/// A single-byte OEM code page.
#[derive(Debug)]
pub struct OemTable {
    /// Canonical name.
    pub name: &'static str,
    labels: &'static [&'static str],
    high: [char; 128],
}

impl OemTable {
    /// Decodes one byte. Every byte is assigned.
    #[inline]
    #[must_use]
    pub fn decode_byte(&self, byte: u8) -> char {
        if byte < 0x80 {
            char::from(byte)
        } else {
            self.high[usize::from(byte - 0x80)]
        }
    }

    fn matches(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

/// Looks up an OEM table by label (`cp437`, `ibm850`, `850`, ...).
pub(crate) fn for_label(label: &str) -> Option<&'static OemTable> {
    [&CP437, &CP850].into_iter().find(|t| t.matches(label))
}

/// IBM PC code page 437 (OEM United States).
pub static CP437: OemTable = OemTable {
    name: "IBM437",
    labels: &["cp437", "ibm437", "437", "dos-437", "oem-us"],
    high: [
        'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
        'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
        'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
        '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
        '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
        '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
        'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
        '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
    ],
};

/// IBM PC code page 850 (OEM Multilingual Latin 1).
pub static CP850: OemTable = OemTable {
    name: "IBM850",
    labels: &["cp850", "ibm850", "850", "dos-850", "oem-multilingual"],
    high: [
        'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
        'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ', //
        'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»', //
        '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐', //
        '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤', //
        'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀', //
        'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´', //
        '\u{ad}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{a0}',
    ],
};
