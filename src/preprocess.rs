//! Text preprocessing shared by the schema and type parsers.
//!
//! Comments are removed before lexing, and braced declaration bodies are
//! split into items with a nesting-aware splitter so that `map<K, V>` inside
//! a field line or `(...)` inside an enum item never splits early.

#[derive(Clone, Copy, PartialEq, Eq)]
enum CommentState {
    Normal,
    AfterSlash,
    LineComment,
    BlockComment,
    AfterStar,
}

/// Remove `// ...`, `# ...` and `/* ... */` comments.
///
/// Line comments keep their terminating newline. A `/` that does not open a
/// comment is preserved.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = CommentState::Normal;

    for c in input.chars() {
        state = match state {
            CommentState::Normal => match c {
                '/' => CommentState::AfterSlash,
                '#' => CommentState::LineComment,
                _ => {
                    out.push(c);
                    CommentState::Normal
                }
            },
            CommentState::AfterSlash => match c {
                '/' => CommentState::LineComment,
                '*' => CommentState::BlockComment,
                _ => {
                    out.push('/');
                    out.push(c);
                    CommentState::Normal
                }
            },
            CommentState::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    CommentState::Normal
                } else {
                    CommentState::LineComment
                }
            }
            CommentState::BlockComment => {
                if c == '*' {
                    CommentState::AfterStar
                } else {
                    CommentState::BlockComment
                }
            }
            CommentState::AfterStar => match c {
                '/' => CommentState::Normal,
                '*' => CommentState::AfterStar,
                _ => CommentState::BlockComment,
            },
        };
    }

    // A trailing lone slash is still a slash.
    if state == CommentState::AfterSlash {
        out.push('/');
    }

    out
}

/// Split `text` on `delimiter` at nesting depth zero.
///
/// Depth is tracked separately for `<>`, `()` and `{}`. Every piece is
/// trimmed and empty pieces are dropped.
pub fn split_respecting_nesting(text: &str, delimiter: char) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let (mut angle, mut paren, mut brace) = (0i32, 0i32, 0i32);

    for c in text.chars() {
        match c {
            '<' => angle += 1,
            '>' => angle -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            '{' => brace += 1,
            '}' => brace -= 1,
            _ => {}
        }

        if c == delimiter && angle == 0 && paren == 0 && brace == 0 {
            push_trimmed(&mut pieces, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_trimmed(&mut pieces, &current);

    pieces
}

fn push_trimmed(pieces: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}

/// Whether `text` starts (after leading whitespace) with `keyword` as a whole
/// word, i.e. followed by the end of the text, whitespace, or `<`.
pub fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    let Some(rest) = text.trim_start().strip_prefix(keyword) else {
        return false;
    };
    match rest.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || c == '<',
    }
}

/// Drop a leading `enum` keyword so `enum Status code;` reads as `Status code;`.
pub fn normalize_field_line(line: &str) -> &str {
    let line = line.trim();
    if starts_with_keyword(line, "enum") {
        line["enum".len()..].trim_start()
    } else {
        line
    }
}
