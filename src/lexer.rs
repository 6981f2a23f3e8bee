//! Forward-only tokenizer with one-token lookahead.
//!
//! The lexer never fails: any character it does not recognize becomes a
//! one-character token and the parsers decide whether it is acceptable.
//! Token classification (`is_identifier`, `is_number`, ...) is derived from
//! the token text on demand and never stored.

/// Characters that always form a token on their own.
const SYMBOLS: &[u8] = b"{}()/*;,<>.|@";

/// A single lexical unit borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text; empty for the end-of-stream token.
    pub text: &'a str,
    /// True for the end-of-stream token.
    pub eof: bool,
}

impl<'a> Token<'a> {
    const EOF: Token<'static> = Token { text: "", eof: true };

    /// Whether this token is exactly `keyword` (also used for symbols).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        !self.eof && self.text == keyword
    }

    /// Whether the text is `[A-Za-z_][A-Za-z0-9_:]*`.
    pub fn is_identifier(&self) -> bool {
        let bytes = self.text.as_bytes();
        match bytes.split_first() {
            Some((first, rest)) if !self.eof => {
                (first.is_ascii_alphabetic() || *first == b'_')
                    && rest.iter().all(|&b| is_ident_byte(b))
            }
            _ => false,
        }
    }

    /// Whether the text is a signed decimal or `0x` hexadecimal literal.
    pub fn is_number(&self) -> bool {
        if self.eof {
            return false;
        }
        let digits = self
            .text
            .strip_prefix(['+', '-'])
            .unwrap_or(self.text);
        if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
        }
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b':'
}

/// Tokenizer over preprocessed IDL text.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Consume and return the next token, or the end-of-stream token.
    pub fn next_token(&mut self) -> Token<'a> {
        let (token, end) = self.scan_at(self.position);
        self.position = end;
        token
    }

    /// Look at the next token without consuming it. `None` at end of stream.
    pub fn peek_token(&self) -> Option<Token<'a>> {
        let (token, _) = self.scan_at(self.position);
        (!token.eof).then_some(token)
    }

    /// Recognize the token starting at or after `start`; returns it with the
    /// position just past it.
    fn scan_at(&self, start: usize) -> (Token<'a>, usize) {
        let bytes = self.source.as_bytes();
        let mut pos = start;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return (Token::EOF, pos);
        }

        let first = bytes[pos];
        let end = if SYMBOLS.contains(&first) {
            pos + 1
        } else if first.is_ascii_alphabetic() || first == b'_' {
            scan_while(bytes, pos + 1, is_ident_byte)
        } else if first.is_ascii_digit() || first == b'+' || first == b'-' {
            scan_number(bytes, pos)
        } else {
            // Any other character, kept whole so multi-byte UTF-8 stays intact.
            let width = self.source[pos..].chars().next().map_or(1, char::len_utf8);
            pos + width
        };

        (
            Token {
                text: &self.source[pos..end],
                eof: false,
            },
            end,
        )
    }
}

fn scan_while(bytes: &[u8], mut pos: usize, pred: impl Fn(u8) -> bool) -> usize {
    while pos < bytes.len() && pred(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    if bytes[pos] == b'+' || bytes[pos] == b'-' {
        pos += 1;
    }

    // `0x` only starts a hex literal when a hex digit follows; a bare `0x`
    // lexes as `0` and leaves the `x` for the next token.
    let is_hex = bytes.get(pos) == Some(&b'0')
        && matches!(bytes.get(pos + 1), Some(b'x' | b'X'))
        && bytes.get(pos + 2).is_some_and(u8::is_ascii_hexdigit);
    if is_hex {
        return scan_while(bytes, pos + 2, |b| b.is_ascii_hexdigit());
    }

    scan_while(bytes, pos, |b| b.is_ascii_digit())
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        (!token.eof).then_some(token)
    }
}
