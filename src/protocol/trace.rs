//! Wire-level tracing: hex dumps of complete packets.
//!
//! Dumps go through the `log` facade at trace level; a session emits them
//! when its `trace` connect option is set, or when the process-wide
//! `HDB_TRACE` environment variable was set at startup.

use std::sync::OnceLock;

static ENV_TRACE: OnceLock<bool> = OnceLock::new();

/// Process-wide fallback, evaluated once.
pub fn env_trace_enabled() -> bool {
    *ENV_TRACE.get_or_init(|| {
        std::env::var("HDB_TRACE").map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"))
    })
}

pub fn trace_packet(direction: &str, bytes: &[u8]) {
    trace!("{} packet, {} bytes\n{}", direction, bytes.len(), hexdump(bytes));
}

// offset | hex columns | printable characters
pub fn hexdump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for (i, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:08x}  ", i * 16));
        for j in 0..16 {
            match chunk.get(j) {
                Some(b) => out.push_str(&format!("{b:02x} ")),
                None => out.push_str("   "),
            }
            if j == 7 {
                out.push(' ');
            }
        }
        out.push(' ');
        for b in chunk {
            out.push(if (0x20..0x7f).contains(b) {
                *b as char
            } else {
                '.'
            });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::hexdump;

    #[test]
    fn hexdump_lines_and_printables() {
        let dump = hexdump(b"Hello Python World, and some more bytes!");
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("00000000  48 65 6c 6c 6f "));
        assert!(lines[0].ends_with("Hello Python Wor"));
        assert!(lines[1].starts_with("00000010"));
    }
}
