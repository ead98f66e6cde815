//! Character classification used throughout the tokenizer.
//!
//! These are pure functions over `char`, kept free of any lexer state so
//! they can be unit-tested in isolation and reused by both the tokenizer
//! (component D) and the word expansion analyzer (component G).

/// A blank character: whitespace that is not a newline.
///
/// Only ASCII blanks are treated specially by shell grammar; other Unicode
/// whitespace is left as ordinary word content (matching the reference
/// tokenizer, which only special-cases space and tab outside a locale-aware
/// build).
#[must_use]
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// A character that can start or continue a shell operator (`|&;<>(){}`)
/// or end a word by itself: newline.
#[must_use]
pub fn is_shell_meta(c: char) -> bool {
    matches!(c, '|' | '&' | ';' | '<' | '>' | '(' | ')' | '\n')
}

/// A character that unconditionally breaks an unquoted word: a meta
/// character or a blank.
#[must_use]
pub fn is_shell_break(c: char) -> bool {
    is_shell_meta(c) || is_blank(c)
}

/// First character of an identifier (`[A-Za-z_]`).
#[must_use]
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Non-first character of an identifier (`[A-Za-z0-9_]`).
#[must_use]
pub fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `s` is a valid shell identifier (variable name), i.e. it
/// matches `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => {}
        _ => return false,
    }
    chars.all(is_identifier_continue)
}

/// Single-character special parameters: `@ * # ? - $ ! 0`.
#[must_use]
pub fn is_special_parameter(c: char) -> bool {
    matches!(c, '@' | '*' | '#' | '?' | '-' | '$' | '!' | '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_exclude_newline() {
        assert!(is_blank(' '));
        assert!(is_blank('\t'));
        assert!(!is_blank('\n'));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("foo_bar9"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("9x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn meta_characters_break_words() {
        for c in "|&;<>(){}\n".chars() {
            assert!(is_shell_meta(c), "{c:?} should be meta");
        }
        assert!(!is_shell_meta('a'));
    }
}
