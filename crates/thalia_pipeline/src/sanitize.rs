//! Output cleaning pass applied to every raw generator response before
//! validation.

/// Code points stripped from generated text: the miscellaneous-symbol and
/// dingbat blocks, the private use area, and everything above the BMP
/// (pictographs, emoji, and friends all live there).
fn is_banned_char(c: char) -> bool {
    let cp = c as u32;
    (0x2600..=0x27BF).contains(&cp) || (0xE000..=0xF8FF).contains(&cp) || cp >= 0x1_0000
}

/// Strip hashes, emoji/pictograph code points, and bracketed markers, then
/// collapse whitespace. The result may be shorter than the length bounds;
/// that is the validator's problem, not ours.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '#' | ']' => {}
            '[' => {
                // Drop a well-formed [..] span wholesale; a stray opening
                // bracket is dropped on its own.
                if chars.clone().any(|c| c == ']') {
                    for inner in chars.by_ref() {
                        if inner == ']' {
                            break;
                        }
                    }
                }
            }
            c if is_banned_char(c) => {}
            c => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, preferring the last sentence
/// terminator inside the window, then the last word boundary, then a hard
/// character cut.
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let window: String = text.chars().take(max_chars).collect();
    if let Some(pos) = window.rfind(['.', '!', '?']) {
        let end = pos + window[pos..].chars().next().map_or(1, |c| c.len_utf8());
        return window[..end].trim_end().to_string();
    }
    if let Some(pos) = window.rfind(' ') {
        return window[..pos].trim_end().to_string();
    }
    window
}
