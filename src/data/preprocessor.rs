// ============================================================
// Layer 4 — Sentence Preprocessor
// ============================================================
// Normalises one raw line of a corpus file into one sentence
// before tokenisation.
//
// Corpus dumps commonly carry:
//   - non-breaking spaces (U+00A0) and narrow NBSP (U+202F)
//   - zero-width spaces / joiners and byte order marks
//   - tabs and stray control characters
//   - runs of spaces left over from column layouts
//
// Left in, these become tokens of their own and shift every
// later position of the sentence.
//
// Cleaning steps (applied in order):
//   1. Map whitespace variants to a plain space, drop invisibles
//   2. Collapse runs of spaces
//   3. Trim both ends
//
// Letters are never touched: "ё" stays "ё".

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a single line. An all-whitespace line becomes "".
    pub fn clean(&self, line: &str) -> String {

        // ── Step 1: Normalise individual characters ───────────────────────────
        let mapped = line.chars().filter_map(|c| match c {
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => None,
            '\t' | '\u{00A0}' | '\u{202F}' => Some(' '),
            c if c.is_control() => Some(' '),
            c => Some(c),
        });

        // ── Step 2: Collapse multiple spaces ──────────────────────────────────
        let mut out        = String::with_capacity(line.len());
        let mut last_space = false;
        for c in mapped {
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // ── Step 3: Trim ──────────────────────────────────────────────────────
        out.trim().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("привет   мир"), "привет мир");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  привет мир \r"), "привет мир");
    }

    #[test]
    fn test_maps_nbsp_and_drops_zero_width() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("при\u{200B}вет\u{00A0}мир"), "привет мир");
        assert_eq!(p.clean("\u{FEFF}ёлка"), "ёлка");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello\x01world"), "hello world");
    }

    #[test]
    fn test_blank_line() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(" \t "), "");
    }
}
