//! Macro text splitting
//!
//! `AT MA MX 100;MY 100;CL` runs three commands. A backslash makes the
//! next character literal, so `KW \;` types a semicolon. The backslash
//! itself never reaches the sub-command.

use crate::device::MAX_KEYSTRING_LEN;

/// Iterator over the sub-commands of a macro, left to right.
///
/// Pieces longer than `MAX_KEYSTRING_LEN - 1` bytes are truncated; the
/// rest of that piece up to the next separator is dropped.
#[derive(Debug, Clone)]
pub struct MacroSplit<'a> {
    chars: std::str::Chars<'a>,
    finished: bool,
}

/// Split macro text on unescaped `;`
pub fn split_macro(text: &str) -> MacroSplit<'_> {
    MacroSplit {
        chars: text.chars(),
        finished: text.is_empty(),
    }
}

impl Iterator for MacroSplit<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        let mut piece = String::new();
        let mut escaped = false;
        let mut truncated = false;

        loop {
            match self.chars.next() {
                None => {
                    self.finished = true;
                    return Some(piece);
                }
                Some(';') if !escaped => return Some(piece),
                Some('\\') if !escaped => escaped = true,
                Some(c) => {
                    escaped = false;
                    if !truncated && piece.len() + c.len_utf8() < MAX_KEYSTRING_LEN {
                        piece.push(c);
                    } else {
                        truncated = true;
                    }
                }
            }
        }
    }
}
