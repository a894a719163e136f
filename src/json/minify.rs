//! Whitespace and comment stripping.
//!
//! Removes spaces, tabs, carriage returns and newlines outside string
//! literals, along with `//` line comments and `/* */` block comments.
//! String literals are copied byte for byte, escapes included, without
//! being validated. Unterminated comments and strings run to the end of the
//! input. A block comment closes at the first `*/` after its opening `/`,
//! so `/*/` is a complete comment.
//!
//! Dropping bytes must never join an emitted `/` with a following `/` or `*`
//! into a new comment opener, so a single space is kept between them. This
//! makes minifying already minified text a no-op.

/// Compact `text` in place.
pub fn minify_in_place(text: &mut Vec<u8>) {
    let len = text.len();
    let mut read = 0;
    let mut write = 0;
    let mut dropped = false;

    while read < len {
        let byte = text[read];
        let next = text.get(read + 1).copied();
        match (byte, next) {
            (b' ' | b'\t' | b'\r' | b'\n', _) => {
                read += 1;
                dropped = true;
            }
            (b'/', Some(b'/')) => {
                while read < len && text[read] != b'\n' {
                    read += 1;
                }
                dropped = true;
            }
            (b'/', Some(b'*')) => {
                read += 1;
                while read < len && !(text[read] == b'*' && text.get(read + 1) == Some(&b'/')) {
                    read += 1;
                }
                read = (read + 2).min(len);
                dropped = true;
            }
            (b'"', _) => {
                dropped = false;
                text[write] = byte;
                write += 1;
                read += 1;
                while read < len && text[read] != b'"' {
                    if text[read] == b'\\' && read + 1 < len {
                        text[write] = text[read];
                        write += 1;
                        read += 1;
                    }
                    text[write] = text[read];
                    write += 1;
                    read += 1;
                }
                if read < len {
                    text[write] = text[read];
                    write += 1;
                    read += 1;
                }
            }
            _ => {
                // `write < read` whenever something was dropped.
                if dropped && matches!(byte, b'/' | b'*') && write > 0 && text[write - 1] == b'/' {
                    text[write] = b' ';
                    write += 1;
                }
                dropped = false;
                text[write] = byte;
                write += 1;
                read += 1;
            }
        }
    }

    text.truncate(write);
}

/// Minified copy of `text`.
pub fn minify(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    minify_in_place(&mut bytes);
    // Only ASCII bytes and whole comments are removed, so this stays UTF-8.
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
