//! ANSI escape handling for marker matching.
//!
//! Bridges and firmware color their output. Markers are matched against the
//! stripped text so a colored "Please power the target now" still counts;
//! the output log keeps the raw line.

/// Remove CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL|ST`) and two-byte
/// escape sequences.
pub fn strip_ansi_codes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('[') => {
                chars.next();
                // Parameters and intermediates end at a final byte in 0x40..=0x7E.
                for next in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&next) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(next) = chars.next() {
                    if next == '\x07' {
                        break;
                    }
                    if next == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        let line = "\x1b[32m[MP] \x1b[1mPlease power the target now\x1b[0m";
        assert_eq!(strip_ansi_codes(line), "[MP] Please power the target now");
    }

    #[test]
    fn strips_osc_title() {
        assert_eq!(strip_ansi_codes("\x1b]0;title\x07hello"), "hello");
        assert_eq!(strip_ansi_codes("\x1b]0;title\x1b\\hello"), "hello");
    }

    #[test]
    fn keeps_carriage_returns() {
        assert_eq!(strip_ansi_codes("12%\r\x1b[K34%"), "12%\r34%");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(strip_ansi_codes("Echoing input now"), "Echoing input now");
    }
}
