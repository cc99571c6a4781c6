//! Encoding declaration scanner
//!
//! Looks at the first one or two lines of a file for a byte order mark or a
//! coding cookie in the usual comment form:
//!
//! ```text
//! # -*- coding: latin-1 -*-
//! # vim: set fileencoding=utf-8 :
//! ```
//!
//! The cookie is only honoured on line two when line one is blank or a
//! comment. A line that is not valid UTF-8 cannot carry a cookie, which ends
//! the scan without a declaration.

use std::io::BufRead;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::codec::{self, UTF16_BE_BOM, UTF16_LE_BOM, UTF32_BE_BOM, UTF32_LE_BOM, UTF8_BOM};
use crate::error::{DeclarationError, Result};

const UTF8: &str = "utf-8";
const UTF8_SIG: &str = "utf-8-sig";
const LATIN1: &str = "iso-8859-1";

/// Outcome of looking for a cookie on a single line
#[derive(Debug, PartialEq, Eq)]
enum Cookie {
    Declared(String),
    Absent,
    /// The line is not UTF-8, so no cookie can be read from it
    Undecodable,
}

fn cookie_regex() -> &'static Regex {
    static COOKIE: OnceLock<Regex> = OnceLock::new();
    COOKIE.get_or_init(|| {
        Regex::new(r"^[ \t\f]*#.*?coding[:=][ \t]*([-a-zA-Z0-9_.]+)")
            .expect("cookie pattern should compile")
    })
}

/// Scan the start of a stream for an encoding declaration
///
/// Returns `Ok(None)` when the stream carries no declaration, in which case
/// the caller falls back to trial decoding. A cookie naming an unknown codec,
/// or one contradicting a UTF-8 byte order mark, is an error.
pub fn scan_declaration<R: BufRead>(mut reader: R) -> Result<Option<String>> {
    let mut first = Vec::new();
    reader.read_until(b'\n', &mut first)?;

    if let Some(name) = unicode_bom(&first) {
        debug!(codec = name, "byte order mark found");
        return Ok(Some(name.to_string()));
    }

    let (first, bom_found) = match first.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, true),
        None => (&first[..], false),
    };
    let default = bom_found.then(|| UTF8_SIG.to_string());

    if first.is_empty() {
        return Ok(default);
    }

    match find_cookie(first, bom_found)? {
        Cookie::Declared(name) => return Ok(Some(name)),
        Cookie::Undecodable => return Ok(None),
        Cookie::Absent => {}
    }

    if !is_blank_or_comment(first) {
        return Ok(default);
    }

    let mut second = Vec::new();
    reader.read_until(b'\n', &mut second)?;
    if second.is_empty() {
        return Ok(default);
    }

    match find_cookie(&second, bom_found)? {
        Cookie::Declared(name) => Ok(Some(name)),
        Cookie::Undecodable => Ok(None),
        Cookie::Absent => Ok(default),
    }
}

/// UTF-32 and UTF-16 byte order marks identify the codec outright
fn unicode_bom(line: &[u8]) -> Option<&'static str> {
    if line.starts_with(UTF32_LE_BOM) || line.starts_with(UTF32_BE_BOM) {
        Some("utf-32")
    } else if line.starts_with(UTF16_LE_BOM) || line.starts_with(UTF16_BE_BOM) {
        Some("utf-16")
    } else {
        None
    }
}

fn find_cookie(line: &[u8], bom_found: bool) -> Result<Cookie> {
    let Ok(text) = std::str::from_utf8(line) else {
        debug!("leading line is not valid UTF-8, no declaration");
        return Ok(Cookie::Undecodable);
    };

    let Some(captures) = cookie_regex().captures(text) else {
        return Ok(Cookie::Absent);
    };
    let name = normal_name(&captures[1]);

    if !codec::is_known(&name) {
        return Err(DeclarationError::UnknownEncoding { name }.into());
    }

    if bom_found {
        if name != UTF8 {
            return Err(DeclarationError::BomMismatch { declared: name }.into());
        }
        debug!(codec = UTF8_SIG, "coding cookie found after byte order mark");
        return Ok(Cookie::Declared(UTF8_SIG.to_string()));
    }

    debug!(codec = %name, "coding cookie found");
    Ok(Cookie::Declared(name))
}

/// Fold the common spellings of UTF-8 and Latin-1 into one name each
///
/// Only the first 12 characters are considered. Other names are returned
/// as written.
fn normal_name(declared: &str) -> String {
    let folded: String = declared
        .chars()
        .take(12)
        .collect::<String>()
        .to_lowercase()
        .replace('_', "-");

    if folded == UTF8 || folded.starts_with("utf-8-") {
        return UTF8.to_string();
    }

    let latin1 = ["latin-1", "iso-8859-1", "iso-latin-1"];
    if latin1
        .iter()
        .any(|prefix| folded == *prefix || folded.starts_with(&format!("{prefix}-")))
    {
        return LATIN1.to_string();
    }

    declared.to_string()
}

fn is_blank_or_comment(line: &[u8]) -> bool {
    let rest = line
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | b'\x0c'))
        .map_or(&[][..], |start| &line[start..]);
    matches!(rest.first().copied(), None | Some(b'#' | b'\r' | b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectError;

    fn scan(input: &[u8]) -> Result<Option<String>> {
        scan_declaration(input)
    }

    #[test]
    fn test_emacs_cookie() {
        let found = scan(b"# -*- coding: utf-8 -*-\nprint('hi')\n").unwrap();
        assert_eq!(found.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_vim_cookie() {
        let found = scan(b"# vim: set fileencoding=cp1252 :\n").unwrap();
        assert_eq!(found.as_deref(), Some("cp1252"));
    }

    #[test]
    fn test_cookie_on_second_line_after_shebang() {
        let found = scan(b"#!/usr/bin/env python\n# coding: latin-1\n\xe9\n").unwrap();
        assert_eq!(found.as_deref(), Some("iso-8859-1"));
    }

    #[test]
    fn test_cookie_ignored_after_code_line() {
        let found = scan(b"import os\n# coding: latin-1\n").unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_no_cookie() {
        assert_eq!(scan(b"hello\nworld\n").unwrap(), None);
        assert_eq!(scan(b"").unwrap(), None);
        assert_eq!(scan(b"# just a comment\n\n").unwrap(), None);
    }

    #[test]
    fn test_undecodable_first_line_is_not_a_declaration() {
        let found = scan(b"caf\xe9\n# coding: utf-8\n").unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_unknown_encoding_is_fatal() {
        let err = scan(b"# coding: klingon\n").unwrap_err();
        assert!(matches!(
            err,
            DetectError::Declaration(DeclarationError::UnknownEncoding { ref name }) if name == "klingon"
        ));
    }

    #[test]
    fn test_dos_and_ebcdic_cookies() {
        let found = scan(b"# -*- coding: cp437 -*-\nx = 1\n").unwrap();
        assert_eq!(found.as_deref(), Some("cp437"));
        let found = scan(b"# coding=cp037\n").unwrap();
        assert_eq!(found.as_deref(), Some("cp037"));
    }

    #[test]
    fn test_cookie_for_codec_without_decoder() {
        assert_eq!(scan(b"# coding: utf-7\n").unwrap().as_deref(), Some("utf-7"));
        assert_eq!(scan(b"# coding: johab\n").unwrap().as_deref(), Some("johab"));
    }

    #[test]
    fn test_utf8_bom() {
        assert_eq!(scan(b"\xEF\xBB\xBFhello\n").unwrap().as_deref(), Some("utf-8-sig"));
        assert_eq!(scan(b"\xEF\xBB\xBF").unwrap().as_deref(), Some("utf-8-sig"));
        let found = scan(b"\xEF\xBB\xBF# coding: utf-8\n").unwrap();
        assert_eq!(found.as_deref(), Some("utf-8-sig"));
    }

    #[test]
    fn test_utf8_bom_conflicting_cookie() {
        let err = scan(b"\xEF\xBB\xBF# coding: cp1252\n").unwrap_err();
        assert!(matches!(
            err,
            DetectError::Declaration(DeclarationError::BomMismatch { .. })
        ));
    }

    #[test]
    fn test_utf16_and_utf32_bom() {
        assert_eq!(scan(b"\xFF\xFEh\x00i\x00").unwrap().as_deref(), Some("utf-16"));
        assert_eq!(scan(b"\xFE\xFF\x00h").unwrap().as_deref(), Some("utf-16"));
        assert_eq!(scan(b"\xFF\xFE\x00\x00h\x00\x00\x00").unwrap().as_deref(), Some("utf-32"));
        assert_eq!(scan(b"\x00\x00\xFE\xFF\x00\x00\x00h").unwrap().as_deref(), Some("utf-32"));
    }

    #[test]
    fn test_normal_name() {
        assert_eq!(normal_name("UTF_8"), "utf-8");
        assert_eq!(normal_name("utf-8-unix"), "utf-8");
        assert_eq!(normal_name("Latin_1"), "iso-8859-1");
        assert_eq!(normal_name("iso-latin-1-unix"), "iso-8859-1");
        assert_eq!(normal_name("Shift_JIS"), "Shift_JIS");
    }

    #[test]
    fn test_blank_or_comment() {
        assert!(is_blank_or_comment(b"\n"));
        assert!(is_blank_or_comment(b"  \t# comment\n"));
        assert!(is_blank_or_comment(b"\r\n"));
        assert!(is_blank_or_comment(b"   "));
        assert!(!is_blank_or_comment(b"x = 1\n"));
    }
}
