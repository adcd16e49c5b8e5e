//! Progress banners printed around each trial.

use std::io::{self, Write};

/// Fixed-width rule printed between trials.
pub const SEPARATOR: &str = "-----------------------------------------";

/// Text identifying the trial within its block.
pub fn title(index: u32) -> String {
    format!("Simulation : {}", index)
}

/// Writes the banner preceding trial `index`.
pub fn write_header<W: Write>(out: &mut W, index: u32) -> io::Result<()> {
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "{}", title(index))?;
    writeln!(out, "{}", SEPARATOR)?;
    out.flush()
}

pub fn write_separator<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", SEPARATOR)?;
    out.flush()
}

#[test]
fn header_layout() {
    let mut buf = Vec::new();
    write_header(&mut buf, 7).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines, vec![SEPARATOR, "Simulation : 7", SEPARATOR]);
}
