//! Candidate codecs and strict decoding
//!
//! The candidate list is the preference policy for trial decoding: earlier
//! entries win when several codecs accept the same bytes. Plain ASCII and the
//! Unicode transformation formats come first, then the CJK multi-byte codecs,
//! then single-byte code pages with `cp1252` leading. `latin-1` maps every
//! byte and therefore closes the list.

use std::borrow::Cow;

use encoding_rs::Encoding;
use thiserror::Error;

use crate::tables::{self, UNMAPPED};

// Byte order marks
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
pub const UTF16_LE_BOM: &[u8] = b"\xFF\xFE";
pub const UTF16_BE_BOM: &[u8] = b"\xFE\xFF";
pub const UTF32_LE_BOM: &[u8] = b"\xFF\xFE\x00\x00";
pub const UTF32_BE_BOM: &[u8] = b"\x00\x00\xFE\xFF";

// ISO-2022 control bytes
const ESC: u8 = 0x1B;
const SO: u8 = 0x0E;
const SI: u8 = 0x0F;
const KSC5601_DESIGNATION: &[u8] = b"\x1B$)C";

/// Byte order of a multi-byte Unicode encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// How a codec turns bytes into text
#[derive(Debug, Clone, Copy)]
enum Backend {
    /// 7-bit ASCII
    Ascii,
    /// UTF-8 that must start with a byte order mark
    Utf8Sig,
    /// UTF-16, byte order taken from a BOM when `None`
    Utf16(Option<Endian>),
    /// UTF-32, byte order taken from a BOM when `None`
    Utf32(Option<Endian>),
    /// ISO-8859-1, every byte is a code point
    Latin1,
    /// A single-byte code page from [`tables`]
    Table(&'static [u16; 256]),
    /// RFC 1843 HZ: GB2312 inside `~{` `~}` brackets
    Hz,
    /// RFC 1557 ISO-2022-KR: KS X 1001 between SO and SI
    Iso2022Kr,
    /// A WHATWG decoder from `encoding_rs`, used without replacement
    Whatwg(&'static Encoding),
}

/// A named text encoding that can attempt a strict decode
#[derive(Debug)]
pub struct Codec {
    name: &'static str,
    aliases: &'static [&'static str],
    backend: Backend,
}

/// Error returned when bytes are not valid for a codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {codec} byte sequence{}", offset_suffix(.position))]
pub struct DecodeError {
    /// Name of the codec that rejected the input
    pub codec: &'static str,
    /// Offset of the first rejected byte, when the backend reports it
    pub position: Option<usize>,
}

fn offset_suffix(position: &Option<usize>) -> String {
    position.map(|pos| format!(" at offset {pos}")).unwrap_or_default()
}

impl Codec {
    const fn new(name: &'static str, aliases: &'static [&'static str], backend: Backend) -> Self {
        Self { name, aliases, backend }
    }

    const fn whatwg(
        name: &'static str,
        aliases: &'static [&'static str],
        encoding: &'static Encoding,
    ) -> Self {
        Self::new(name, aliases, Backend::Whatwg(encoding))
    }

    const fn table(
        name: &'static str,
        aliases: &'static [&'static str],
        table: &'static [u16; 256],
    ) -> Self {
        Self::new(name, aliases, Backend::Table(table))
    }

    /// Canonical name, as reported by detection
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Alternative names accepted by [`lookup`]
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Decode `bytes`, failing on the first malformed sequence
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, DecodeError> {
        match self.backend {
            Backend::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(self.error_at(pos)),
                None => self.decode_utf8(bytes, 0),
            },
            Backend::Utf8Sig => match bytes.strip_prefix(UTF8_BOM) {
                Some(body) => self.decode_utf8(body, UTF8_BOM.len()),
                None => Err(self.error_at(0)),
            },
            Backend::Utf16(endian) => {
                let (body, endian) = match endian {
                    Some(endian) => (bytes, endian),
                    None => sniff_bom(bytes, UTF16_LE_BOM, UTF16_BE_BOM),
                };
                let encoding = match endian {
                    Endian::Little => encoding_rs::UTF_16LE,
                    Endian::Big => encoding_rs::UTF_16BE,
                };
                encoding
                    .decode_without_bom_handling_and_without_replacement(body)
                    .ok_or(self.error())
            }
            Backend::Utf32(endian) => {
                let (body, endian) = match endian {
                    Some(endian) => (bytes, endian),
                    None => sniff_bom(bytes, UTF32_LE_BOM, UTF32_BE_BOM),
                };
                self.decode_utf32(body, endian, bytes.len() - body.len())
            }
            Backend::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
            Backend::Table(table) => self.decode_table(bytes, table),
            Backend::Hz => self.decode_hz(bytes),
            Backend::Iso2022Kr => self.decode_iso2022_kr(bytes),
            Backend::Whatwg(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or(self.error()),
        }
    }

    /// Check whether `bytes` decode cleanly with this codec
    ///
    /// Decode failures are the expected outcome for most candidates and are
    /// reported as `false`, never as an error.
    pub fn attempt_decode(&self, bytes: &[u8]) -> bool {
        self.decode(bytes).is_ok()
    }

    fn decode_utf8<'a>(&self, bytes: &'a [u8], offset: usize) -> Result<Cow<'a, str>, DecodeError> {
        std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| self.error_at(offset + e.valid_up_to()))
    }

    fn decode_utf32<'a>(
        &self,
        body: &[u8],
        endian: Endian,
        offset: usize,
    ) -> Result<Cow<'a, str>, DecodeError> {
        let chunks = body.chunks_exact(4);
        if !chunks.remainder().is_empty() {
            return Err(self.error_at(offset + body.len() - chunks.remainder().len()));
        }

        let mut text = String::with_capacity(body.len() / 4);
        for (index, chunk) in chunks.enumerate() {
            let unit = [chunk[0], chunk[1], chunk[2], chunk[3]];
            let value = match endian {
                Endian::Little => u32::from_le_bytes(unit),
                Endian::Big => u32::from_be_bytes(unit),
            };
            let c = char::from_u32(value).ok_or(self.error_at(offset + index * 4))?;
            text.push(c);
        }
        Ok(Cow::Owned(text))
    }

    fn decode_table<'a>(&self, bytes: &[u8], table: &[u16; 256]) -> Result<Cow<'a, str>, DecodeError> {
        let mut text = String::with_capacity(bytes.len());
        for (pos, &b) in bytes.iter().enumerate() {
            let c = match table[usize::from(b)] {
                UNMAPPED => None,
                unit => char::from_u32(u32::from(unit)),
            };
            text.push(c.ok_or(self.error_at(pos))?);
        }
        Ok(Cow::Owned(text))
    }

    fn decode_hz<'a>(&self, bytes: &[u8]) -> Result<Cow<'a, str>, DecodeError> {
        let mut text = String::with_capacity(bytes.len());
        let mut gb_mode = false;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'~' {
                match (bytes.get(i + 1).copied(), gb_mode) {
                    (Some(b'~'), false) => text.push('~'),
                    // Line continuation
                    (Some(b'\n'), false) => {}
                    (Some(b'{'), false) => gb_mode = true,
                    (Some(b'}'), true) => gb_mode = false,
                    _ => return Err(self.error_at(i)),
                }
                i += 2;
            } else if !b.is_ascii() {
                return Err(self.error_at(i));
            } else if gb_mode {
                let trail = bytes.get(i + 1).copied().ok_or(self.error_at(i))?;
                text.push_str(&self.decode_pair(encoding_rs::GBK, b, trail, i)?);
                i += 2;
            } else {
                text.push(char::from(b));
                i += 1;
            }
        }
        Ok(Cow::Owned(text))
    }

    fn decode_iso2022_kr<'a>(&self, bytes: &[u8]) -> Result<Cow<'a, str>, DecodeError> {
        let mut text = String::with_capacity(bytes.len());
        // G1 starts out designated to KS X 1001
        let mut shifted = false;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                ESC if bytes[i..].starts_with(KSC5601_DESIGNATION) => {
                    i += KSC5601_DESIGNATION.len();
                }
                ESC => return Err(self.error_at(i)),
                SO => {
                    shifted = true;
                    i += 1;
                }
                SI => {
                    shifted = false;
                    i += 1;
                }
                0x80..=0xFF => return Err(self.error_at(i)),
                0x21..=0x7E if shifted => {
                    let trail = bytes.get(i + 1).copied().ok_or(self.error_at(i))?;
                    text.push_str(&self.decode_pair(encoding_rs::EUC_KR, b, trail, i)?);
                    i += 2;
                }
                _ => {
                    text.push(char::from(b));
                    i += 1;
                }
            }
        }
        Ok(Cow::Owned(text))
    }

    /// Decode a 7-bit double-byte pair through its 8-bit EUC form
    fn decode_pair(
        &self,
        encoding: &'static Encoding,
        lead: u8,
        trail: u8,
        pos: usize,
    ) -> Result<String, DecodeError> {
        let graphic = 0x21..=0x7E;
        if !graphic.contains(&lead) || !graphic.contains(&trail) {
            return Err(self.error_at(pos));
        }
        encoding
            .decode_without_bom_handling_and_without_replacement(&[lead | 0x80, trail | 0x80])
            .map(Cow::into_owned)
            .ok_or(self.error_at(pos))
    }

    fn error(&self) -> DecodeError {
        DecodeError { codec: self.name, position: None }
    }

    fn error_at(&self, position: usize) -> DecodeError {
        DecodeError { codec: self.name, position: Some(position) }
    }
}

/// Split off a byte order mark, defaulting to little-endian without one
fn sniff_bom<'a>(bytes: &'a [u8], le_bom: &[u8], be_bom: &[u8]) -> (&'a [u8], Endian) {
    if let Some(body) = bytes.strip_prefix(le_bom) {
        (body, Endian::Little)
    } else if let Some(body) = bytes.strip_prefix(be_bom) {
        (body, Endian::Big)
    } else {
        (bytes, Endian::Little)
    }
}

/// Candidate codecs in priority order
pub static CANDIDATES: &[Codec] = &[
    Codec::new("ascii", &["us-ascii", "646", "us"], Backend::Ascii),
    Codec::new("utf-8-sig", &["utf8-sig"], Backend::Utf8Sig),
    Codec::whatwg("utf-8", &["utf8", "u8", "utf", "cp65001"], &encoding_rs::UTF_8_INIT),
    Codec::new("utf-16", &["utf16", "u16"], Backend::Utf16(None)),
    Codec::new("utf-16-be", &["utf-16be", "utf16be"], Backend::Utf16(Some(Endian::Big))),
    Codec::new("utf-16-le", &["utf-16le", "utf16le"], Backend::Utf16(Some(Endian::Little))),
    Codec::new("utf-32", &["utf32", "u32"], Backend::Utf32(None)),
    Codec::new("utf-32-be", &["utf-32be", "utf32be"], Backend::Utf32(Some(Endian::Big))),
    Codec::new("utf-32-le", &["utf-32le", "utf32le"], Backend::Utf32(Some(Endian::Little))),
    // CJK multi-byte
    Codec::whatwg("big5", &["big5-tw", "csbig5"], &encoding_rs::BIG5_INIT),
    Codec::whatwg("big5hkscs", &["big5-hkscs", "hkscs"], &encoding_rs::BIG5_INIT),
    Codec::whatwg(
        "cp932",
        &["932", "ms932", "mskanji", "ms-kanji", "windows-31j"],
        &encoding_rs::SHIFT_JIS_INIT,
    ),
    Codec::whatwg("cp949", &["949", "ms949", "uhc"], &encoding_rs::EUC_KR_INIT),
    Codec::whatwg("cp950", &["950", "ms950"], &encoding_rs::BIG5_INIT),
    Codec::whatwg("euc-jp", &["eucjp", "ujis", "u-jis"], &encoding_rs::EUC_JP_INIT),
    Codec::whatwg(
        "euc-kr",
        &["euckr", "korean", "ksc5601", "ks-c-5601", "ks-c-5601-1987", "ksx1001", "ks-x-1001"],
        &encoding_rs::EUC_KR_INIT,
    ),
    Codec::whatwg(
        "gb2312",
        &["chinese", "euc-cn", "euccn", "eucgb2312-cn", "gb2312-1980", "gb2312-80", "iso-ir-58"],
        &encoding_rs::GBK_INIT,
    ),
    Codec::whatwg("gbk", &["936", "cp936", "ms936"], &encoding_rs::GBK_INIT),
    Codec::whatwg("gb18030", &["gb18030-2000"], &encoding_rs::GB18030_INIT),
    Codec::whatwg(
        "iso2022-jp",
        &["iso-2022-jp", "iso2022jp", "csiso2022jp"],
        &encoding_rs::ISO_2022_JP_INIT,
    ),
    Codec::new("iso2022-kr", &["iso-2022-kr", "iso2022kr", "csiso2022kr"], Backend::Iso2022Kr),
    Codec::new("hz", &["hzgb", "hz-gb", "hz-gb-2312"], Backend::Hz),
    Codec::whatwg(
        "shift-jis",
        &["shiftjis", "sjis", "s-jis", "csshiftjis"],
        &encoding_rs::SHIFT_JIS_INIT,
    ),
    // Windows code pages
    Codec::whatwg("cp1252", &["windows-1252", "1252"], &encoding_rs::WINDOWS_1252_INIT),
    Codec::whatwg("cp1250", &["windows-1250", "1250"], &encoding_rs::WINDOWS_1250_INIT),
    Codec::whatwg("cp1251", &["windows-1251", "1251"], &encoding_rs::WINDOWS_1251_INIT),
    Codec::whatwg("cp1253", &["windows-1253", "1253"], &encoding_rs::WINDOWS_1253_INIT),
    Codec::whatwg("cp1254", &["windows-1254", "1254"], &encoding_rs::WINDOWS_1254_INIT),
    Codec::whatwg("cp1255", &["windows-1255", "1255"], &encoding_rs::WINDOWS_1255_INIT),
    Codec::whatwg("cp1256", &["windows-1256", "1256"], &encoding_rs::WINDOWS_1256_INIT),
    Codec::whatwg("cp1257", &["windows-1257", "1257"], &encoding_rs::WINDOWS_1257_INIT),
    Codec::whatwg("cp1258", &["windows-1258", "1258"], &encoding_rs::WINDOWS_1258_INIT),
    Codec::whatwg("cp874", &["windows-874", "874"], &encoding_rs::WINDOWS_874_INIT),
    // DOS code pages
    Codec::table("cp437", &["437", "ibm437"], &tables::CP437),
    Codec::table("cp720", &[], &tables::CP720),
    Codec::table("cp737", &[], &tables::CP737),
    Codec::table("cp775", &["775", "ibm775"], &tables::CP775),
    Codec::table("cp850", &["850", "ibm850"], &tables::CP850),
    Codec::table("cp852", &["852", "ibm852"], &tables::CP852),
    Codec::table("cp855", &["855", "ibm855"], &tables::CP855),
    Codec::table("cp856", &[], &tables::CP856),
    Codec::table("cp857", &["857", "ibm857"], &tables::CP857),
    Codec::table("cp858", &["858", "ibm858"], &tables::CP858),
    Codec::table("cp860", &["860", "ibm860"], &tables::CP860),
    Codec::table("cp861", &["861", "ibm861", "cp-is"], &tables::CP861),
    Codec::table("cp862", &["862", "ibm862"], &tables::CP862),
    Codec::table("cp863", &["863", "ibm863"], &tables::CP863),
    Codec::table("cp864", &["864", "ibm864"], &tables::CP864),
    Codec::table("cp865", &["865", "ibm865"], &tables::CP865),
    Codec::whatwg("cp866", &["866", "ibm866", "csibm866"], &encoding_rs::IBM866_INIT),
    Codec::table("cp869", &["869", "ibm869", "cp-gr"], &tables::CP869),
    Codec::table("cp1125", &["1125", "ibm1125", "cp866u", "ruscii"], &tables::CP1125),
    // ISO 8859
    Codec::whatwg("iso8859-2", &["iso-8859-2", "latin2", "l2"], &encoding_rs::ISO_8859_2_INIT),
    Codec::whatwg("iso8859-3", &["iso-8859-3", "latin3", "l3"], &encoding_rs::ISO_8859_3_INIT),
    Codec::whatwg("iso8859-4", &["iso-8859-4", "latin4", "l4"], &encoding_rs::ISO_8859_4_INIT),
    Codec::whatwg("iso8859-5", &["iso-8859-5", "cyrillic"], &encoding_rs::ISO_8859_5_INIT),
    Codec::whatwg("iso8859-6", &["iso-8859-6", "arabic"], &encoding_rs::ISO_8859_6_INIT),
    Codec::whatwg("iso8859-7", &["iso-8859-7", "greek", "greek8"], &encoding_rs::ISO_8859_7_INIT),
    Codec::whatwg("iso8859-8", &["iso-8859-8", "hebrew"], &encoding_rs::ISO_8859_8_INIT),
    Codec::table("iso8859-9", &["iso-8859-9", "latin5", "l5"], &tables::ISO8859_9),
    Codec::whatwg("iso8859-10", &["iso-8859-10", "latin6", "l6"], &encoding_rs::ISO_8859_10_INIT),
    Codec::table("iso8859-11", &["iso-8859-11", "thai"], &tables::ISO8859_11),
    Codec::whatwg("iso8859-13", &["iso-8859-13", "latin7", "l7"], &encoding_rs::ISO_8859_13_INIT),
    Codec::whatwg("iso8859-14", &["iso-8859-14", "latin8", "l8"], &encoding_rs::ISO_8859_14_INIT),
    Codec::whatwg("iso8859-15", &["iso-8859-15", "latin9", "l9"], &encoding_rs::ISO_8859_15_INIT),
    Codec::whatwg("iso8859-16", &["iso-8859-16", "latin10", "l10"], &encoding_rs::ISO_8859_16_INIT),
    // Cyrillic, Kazakh and Urdu
    Codec::whatwg("koi8-r", &["koi8r", "cskoi8r"], &encoding_rs::KOI8_R_INIT),
    Codec::table("koi8-t", &[], &tables::KOI8_T),
    Codec::whatwg("koi8-u", &["koi8u"], &encoding_rs::KOI8_U_INIT),
    Codec::table("kz1048", &["kz-1048", "rk1048", "strk1048-2002"], &tables::KZ1048),
    Codec::table("ptcp154", &["pt154", "cp154", "cyrillic-asian", "csptcp154"], &tables::PTCP154),
    Codec::table("cp1006", &[], &tables::CP1006),
    // Macintosh
    Codec::whatwg("mac-cyrillic", &["maccyrillic"], &encoding_rs::X_MAC_CYRILLIC_INIT),
    Codec::table("mac-greek", &["macgreek"], &tables::MAC_GREEK),
    Codec::table("mac-iceland", &["maciceland"], &tables::MAC_ICELAND),
    Codec::table(
        "mac-latin2",
        &["maclatin2", "maccentraleurope", "mac-centeuro"],
        &tables::MAC_LATIN2,
    ),
    Codec::whatwg("mac-roman", &["macroman", "macintosh"], &encoding_rs::MACINTOSH_INIT),
    Codec::table("mac-turkish", &["macturkish"], &tables::MAC_TURKISH),
    // EBCDIC
    Codec::table(
        "cp037",
        &["037", "ibm037", "ibm039", "ebcdic-cp-us", "ebcdic-cp-ca", "ebcdic-cp-nl", "csibm037"],
        &tables::CP037,
    ),
    Codec::table("cp273", &["273", "ibm273", "csibm273"], &tables::CP273),
    Codec::table("cp424", &["424", "ibm424", "ebcdic-cp-he", "csibm424"], &tables::CP424),
    Codec::table(
        "cp500",
        &["500", "ibm500", "ebcdic-cp-be", "ebcdic-cp-ch", "csibm500"],
        &tables::CP500,
    ),
    Codec::table("cp875", &[], &tables::CP875),
    Codec::table("cp1026", &["1026", "ibm1026"], &tables::CP1026),
    Codec::table("cp1140", &["1140", "ibm1140"], &tables::CP1140),
    // Total: accepts any input
    Codec::new(
        "latin-1",
        &["latin1", "latin", "l1", "iso-8859-1", "iso8859-1", "8859", "cp819", "iso-ir-100"],
        Backend::Latin1,
    ),
];

/// Find a candidate codec by name or alias
///
/// Matching ignores ASCII case and treats `_` like `-`. Labels that only the
/// WHATWG Encoding Standard knows (e.g. `csmacintosh`) resolve to the first
/// candidate backed by the same decoder.
pub fn lookup(label: &str) -> Option<&'static Codec> {
    let label = normalize_label(label);

    let by_name = CANDIDATES
        .iter()
        .find(|codec| codec.name == label || codec.aliases.contains(&label.as_str()));
    if by_name.is_some() {
        return by_name;
    }

    let encoding = Encoding::for_label(label.as_bytes())?;
    CANDIDATES
        .iter()
        .find(|codec| matches!(codec.backend, Backend::Whatwg(e) if e == encoding))
}

/// Codecs a declaration may name but trial decoding never tries
///
/// `utf-7` accepts only ASCII, which `ascii` claims first. The others are
/// JIS X 0213 and Johab variants with no strict decoder here.
pub static DECLARATION_ONLY: &[&str] = &[
    "utf-7",
    "utf7",
    "u7",
    "unicode-1-1-utf-7",
    "johab",
    "cp1361",
    "ms1361",
    "euc-jis-2004",
    "euc-jis2004",
    "eucjis2004",
    "euc-jisx0213",
    "eucjisx0213",
    "jisx0213",
    "iso2022-jp-1",
    "iso-2022-jp-1",
    "iso2022jp-1",
    "iso2022-jp-2",
    "iso-2022-jp-2",
    "iso2022jp-2",
    "csiso2022jp2",
    "iso2022-jp-2004",
    "iso-2022-jp-2004",
    "iso2022jp-2004",
    "iso2022-jp-3",
    "iso-2022-jp-3",
    "iso2022jp-3",
    "iso2022-jp-ext",
    "iso-2022-jp-ext",
    "iso2022jp-ext",
    "shift-jis-2004",
    "shiftjis2004",
    "sjis-2004",
    "s-jis-2004",
    "shift-jisx0213",
    "shiftjisx0213",
    "sjisx0213",
    "s-jisx0213",
];

/// Whether `label` names a codec a declaration may use
///
/// True for every candidate label accepted by [`lookup`] and for the
/// [`DECLARATION_ONLY`] names.
pub fn is_known(label: &str) -> bool {
    if lookup(label).is_some() {
        return true;
    }
    DECLARATION_ONLY.contains(&normalize_label(label).as_str())
}

fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn codec(name: &str) -> &'static Codec {
        CANDIDATES.iter().find(|c| c.name() == name).unwrap()
    }

    #[test]
    fn test_candidates_start_with_ascii() {
        assert_eq!(CANDIDATES[0].name(), "ascii");
        assert_eq!(CANDIDATES.last().unwrap().name(), "latin-1");
        assert_eq!(CANDIDATES.len(), 86);
    }

    #[test]
    fn test_candidate_names_unique() {
        let mut seen = HashSet::new();
        for c in CANDIDATES {
            assert!(seen.insert(c.name()), "duplicate name {}", c.name());
            for alias in c.aliases() {
                assert!(seen.insert(*alias), "duplicate alias {}", alias);
            }
        }
    }

    #[test]
    fn test_lookup_normalizes_label() {
        assert_eq!(lookup("UTF_8").unwrap().name(), "utf-8");
        assert_eq!(lookup("Windows-1252").unwrap().name(), "cp1252");
        assert_eq!(lookup("ms_kanji").unwrap().name(), "cp932");
    }

    #[test]
    fn test_lookup_prefers_registry_aliases() {
        // WHATWG would map this label to windows-1252
        assert_eq!(lookup("iso-8859-1").unwrap().name(), "latin-1");
        assert_eq!(lookup("latin-1").unwrap().name(), "latin-1");
    }

    #[test]
    fn test_lookup_whatwg_fallback() {
        assert_eq!(lookup("csmacintosh").unwrap().name(), "mac-roman");
        assert_eq!(lookup("x-mac-cyrillic").unwrap().name(), "mac-cyrillic");
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("no-such-codec").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        let err = codec("ascii").decode(b"abc\x80").unwrap_err();
        assert_eq!(err.position, Some(3));
        assert!(codec("ascii").attempt_decode(b"plain text\n"));
    }

    #[test]
    fn test_utf8_sig_requires_bom() {
        assert!(!codec("utf-8-sig").attempt_decode("na\u{ef}ve".as_bytes()));
        let decoded = codec("utf-8-sig").decode(b"\xEF\xBB\xBFhi").unwrap();
        assert_eq!(decoded, "hi");
    }

    #[test]
    fn test_utf8_keeps_bom_as_character() {
        let decoded = codec("utf-8").decode(b"\xEF\xBB\xBFhi").unwrap();
        assert_eq!(decoded, "\u{feff}hi");
    }

    #[test]
    fn test_utf16_rejects_odd_length() {
        assert!(!codec("utf-16").attempt_decode(b"abc"));
        assert!(!codec("utf-16-le").attempt_decode(b"abc"));
    }

    #[test]
    fn test_utf16_honours_bom() {
        assert_eq!(codec("utf-16").decode(b"\xFE\xFF\x00A").unwrap(), "A");
        assert_eq!(codec("utf-16").decode(b"\xFF\xFEA\x00").unwrap(), "A");
        assert_eq!(codec("utf-16").decode(b"A\x00").unwrap(), "A");
    }

    #[test]
    fn test_utf16_rejects_lone_surrogate() {
        assert!(!codec("utf-16-le").attempt_decode(b"\x00\xD8"));
    }

    #[test]
    fn test_utf32_validation() {
        assert_eq!(codec("utf-32-be").decode(b"\x00\x00\x00A").unwrap(), "A");
        assert_eq!(codec("utf-32").decode(b"\x00\x00\xFE\xFF\x00\x00\x00A").unwrap(), "A");

        let err = codec("utf-32-le").decode(b"A\x00\x00\x00\x00\xD8\x00\x00").unwrap_err();
        assert_eq!(err.position, Some(4));
        assert!(!codec("utf-32-le").attempt_decode(b"\x00\x00\x11\x00"));
        assert!(!codec("utf-32").attempt_decode(b"abcde"));
    }

    #[test]
    fn test_shift_jis_decode() {
        let data: &[u8] = &[0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA];
        assert_eq!(codec("shift-jis").decode(data).unwrap(), "日本語");
    }

    #[test]
    fn test_single_byte_unmapped_fails() {
        // 0xA5 has no assignment in ISO-8859-3
        assert!(!codec("iso8859-3").attempt_decode(b"\xA5"));
        assert!(codec("iso8859-2").attempt_decode(b"\xA5"));
    }

    #[test]
    fn test_latin1_accepts_everything() {
        let all: Vec<u8> = (0..=255).collect();
        let decoded = codec("latin-1").decode(&all).unwrap();
        assert_eq!(decoded.chars().count(), 256);
        assert_eq!(decoded.chars().last(), Some('\u{ff}'));
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError { codec: "ascii", position: Some(7) };
        assert_eq!(err.to_string(), "invalid ascii byte sequence at offset 7");

        let err = DecodeError { codec: "utf-16", position: None };
        assert_eq!(err.to_string(), "invalid utf-16 byte sequence");
    }

    #[test]
    fn test_decode_error_is_std_error() {
        let err: Box<dyn std::error::Error> = codec("ascii").decode(b"\xff").unwrap_err().into();
        assert_eq!(err.to_string(), "invalid ascii byte sequence at offset 0");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_every_legacy_codec_name_is_known() {
        const NAMES: &[&str] = &[
            "ascii", "utf-7", "utf-8-sig", "utf-8", "utf-16", "utf-16-be", "utf-16-le", "utf-32",
            "utf-32-be", "utf-32-le", "big5", "big5hkscs", "cp037", "cp273", "cp424", "cp437",
            "cp500", "cp720", "cp737", "cp775", "cp850", "cp852", "cp855", "cp856", "cp857",
            "cp858", "cp860", "cp861", "cp862", "cp863", "cp864", "cp865", "cp866", "cp869",
            "cp874", "cp875", "cp932", "cp949", "cp950", "cp1006", "cp1026", "cp1125", "cp1140",
            "cp1250", "cp1251", "cp1252", "cp1253", "cp1254", "cp1255", "cp1256", "cp1257",
            "cp1258", "cp65001", "euc-jp", "euc-jis-2004", "euc-jisx0213", "euc-kr", "gb2312",
            "gbk", "gb18030", "hz", "iso2022-jp", "iso2022-jp-1", "iso2022-jp-2",
            "iso2022-jp-2004", "iso2022-jp-3", "iso2022-jp-ext", "iso2022-kr", "latin-1",
            "iso8859-2", "iso8859-3", "iso8859-4", "iso8859-5", "iso8859-6", "iso8859-7",
            "iso8859-8", "iso8859-9", "iso8859-10", "iso8859-11", "iso8859-13", "iso8859-14",
            "iso8859-15", "iso8859-16", "johab", "koi8-r", "koi8-t", "koi8-u", "kz1048",
            "mac-cyrillic", "mac-greek", "mac-iceland", "mac-latin2", "mac-roman", "mac-turkish",
            "ptcp154", "shift-jis", "shift-jis-2004", "shift-jisx0213",
        ];
        for name in NAMES {
            assert!(is_known(name), "{name} should be known");
            assert!(is_known(&name.replace('-', "_").to_uppercase()), "{name} in another spelling");
        }
    }

    #[test]
    fn test_declaration_only_names_are_not_candidates() {
        assert!(is_known("utf-7"));
        assert!(is_known("JOHAB"));
        assert!(is_known("shift_jisx0213"));
        assert!(lookup("utf-7").is_none());
        assert!(lookup("johab").is_none());
        assert!(!is_known("klingon"));
    }

    #[test]
    fn test_lookup_table_codecs() {
        assert_eq!(lookup("IBM437").unwrap().name(), "cp437");
        assert_eq!(lookup("ebcdic-cp-us").unwrap().name(), "cp037");
        // WHATWG would map this label to windows-1254
        assert_eq!(lookup("iso-8859-9").unwrap().name(), "iso8859-9");
        // and these to the replacement decoder
        assert_eq!(lookup("iso-2022-kr").unwrap().name(), "iso2022-kr");
        assert_eq!(lookup("hz-gb-2312").unwrap().name(), "hz");
    }

    #[test]
    fn test_table_decode() {
        assert_eq!(codec("cp437").decode(b"\x80a").unwrap(), "\u{c7}a");
        assert_eq!(codec("cp037").decode(b"\xC1\xC2").unwrap(), "AB");
        assert_eq!(codec("iso8859-9").decode(b"\xD0").unwrap(), "\u{11e}");
        assert_eq!(codec("mac-greek").decode(b"\xC1").unwrap(), "\u{39d}");
    }

    #[test]
    fn test_table_unmapped_byte_fails() {
        let err = codec("cp856").decode(b"ok\x9B").unwrap_err();
        assert_eq!(err, DecodeError { codec: "cp856", position: Some(2) });
        assert!(codec("cp850").attempt_decode(b"ok\x9B"));
    }

    #[test]
    fn test_total_tables_accept_every_byte() {
        let all: Vec<u8> = (0..=255).collect();
        for name in ["cp437", "cp850", "cp037", "cp1140", "mac-iceland", "ptcp154"] {
            assert!(codec(name).attempt_decode(&all), "{name} should map every byte");
        }
    }

    #[test]
    fn test_hz_decode() {
        let data = b"~{<:Ky2;S{#,NpJ)l6HK!#~}Bye.";
        assert_eq!(codec("hz").decode(data).unwrap(), "己所不欲，勿施於人。Bye.");
        assert_eq!(codec("hz").decode(b"a~\nb~~c").unwrap(), "ab~c");
    }

    #[test]
    fn test_hz_rejects_bad_escape_and_high_bytes() {
        assert_eq!(codec("hz").decode(b"a~x").unwrap_err().position, Some(1));
        assert_eq!(codec("hz").decode(b"ab\xB0").unwrap_err().position, Some(2));
        assert!(!codec("hz").attempt_decode(b"~{<"));
    }

    #[test]
    fn test_iso2022_kr_decode() {
        let data = b"\x1B$)C\x0EGQ19\x0F!";
        assert_eq!(codec("iso2022-kr").decode(data).unwrap(), "한국!");
        assert!(!codec("iso2022-kr").attempt_decode(b"\x1B$(D"));
        assert!(!codec("iso2022-kr").attempt_decode(b"\xA1\xA1"));
    }
}
