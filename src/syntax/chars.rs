//! Character classes used by the lexer.
//!
//! Names are read with one of three alphabets, from narrowest to widest:
//!
//! | Class | Used for | Accepts |
//! |-------|----------|---------|
//! | identifier | inside expressions | letters, digits, `_` |
//! | name | ordinary statement lines | identifier + `# ! @ %` |
//! | instance | device lines | name + `+ - * /` |

/// Can start an identifier or name.
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Continues an identifier inside an expression.
pub fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Continues a node or model name on a statement line.
pub fn is_name_char(ch: char) -> bool {
    is_identifier_char(ch) || matches!(ch, '#' | '!' | '@' | '%')
}

/// Continues a name on a device line, where operator characters are literal.
pub fn is_instance_char(ch: char) -> bool {
    is_name_char(ch) || matches!(ch, '+' | '-' | '*' | '/')
}

/// Letter after the quote of a based literal (`8'hFF`).
pub fn is_base_specifier(ch: char) -> bool {
    matches!(ch, 'b' | 'B' | 'o' | 'O' | 'd' | 'D' | 'h' | 'H')
}

/// Digit of a based literal, including `x`/`z` logic values.
pub fn is_based_digit(ch: char) -> bool {
    ch.is_ascii_hexdigit() || matches!(ch, '_' | 'x' | 'X' | 'z' | 'Z' | '?')
}

/// Horizontal whitespace (never a line terminator).
pub fn is_blank(ch: char) -> bool {
    ch != '\n' && ch != '\r' && ch.is_whitespace()
}

/// Ends an unquoted include path.
pub fn ends_path(ch: char) -> bool {
    ch.is_whitespace()
}
