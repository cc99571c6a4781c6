//! Example of detecting file encodings with `detect_encoding`
//!
//! Writes a few sample files, then detects each one with the default
//! configuration and with first-line sampling.

use std::fs;

use encoding_sniff::{detect_encoding, DetectError, DetectionConfig};

fn main() -> anyhow::Result<()> {
    println!("=== Encoding Detection Example ===\n");

    let dir = tempfile::tempdir()?;
    let samples: [(&str, &[u8]); 5] = [
        ("declared.py", b"# -*- coding: cp437 -*-\nprint('\x80')\n"),
        ("plain.txt", b"Plain ASCII text\n"),
        ("utf8.txt", "na\u{ef}ve caf\u{e9}\n".as_bytes()),
        ("western.txt", b"caf\xe9 au lait"),
        ("mixed.txt", b"na\xc3\xafve\ncaf\xe9 au lait\n"),
    ];
    for (name, data) in samples {
        fs::write(dir.path().join(name), data)?;
    }

    let whole = DetectionConfig::default().with_size_limit_mb(16.0);
    let sampled = whole.clone().with_full_check(false);

    println!("{:<14} {:<12} {:<12}", "file", "full check", "first line");
    for (name, _) in samples {
        let path = dir.path().join(name);
        let full = detect_encoding(&path, &whole)?;
        let first = detect_encoding(&path, &sampled)?;
        println!("{:<14} {:<12} {:<12}", name, full, first);
    }
    println!();

    // A declaration naming an unknown codec is an error, not a fallback
    let bogus = dir.path().join("bogus.py");
    fs::write(&bogus, b"# coding: klingon\n")?;
    match detect_encoding(&bogus, &whole) {
        Err(DetectError::Declaration(err)) => println!("bogus.py: {}", err),
        other => println!("bogus.py: unexpected result {:?}", other),
    }

    Ok(())
}
