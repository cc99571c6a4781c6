//! Encoding detection entry points

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::codec::{Codec, CANDIDATES};
use crate::declaration::scan_declaration;
use crate::error::{DetectError, Result};
use crate::trial::trial_decode;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Configuration for encoding detection
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Trial-decode the whole file; when false only the first line is sampled
    pub full_check: bool,
    /// Refuse files of this many megabytes or more
    ///
    /// The size is rounded to four decimal places before the comparison, so
    /// a file exactly at the limit is refused.
    pub size_limit_mb: Option<f64>,
    /// Report every decode attempt at `info` level
    pub verbose: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            full_check: true,
            size_limit_mb: None,
            verbose: false,
        }
    }
}

impl DetectionConfig {
    pub fn with_full_check(mut self, full_check: bool) -> Self {
        self.full_check = full_check;
        self
    }

    pub fn with_size_limit_mb(mut self, limit: f64) -> Self {
        self.size_limit_mb = Some(limit);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// File size in megabytes, rounded to four decimal places
pub fn size_in_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 10_000.0).round() / 10_000.0
}

/// Detects the encoding of files or buffers
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectionConfig,
}

impl Detector {
    /// Create a detector with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect the encoding of the file at `path`
    ///
    /// The size limit is enforced before the file is opened. A declaration in
    /// the leading lines is trusted as is; otherwise the file is read again
    /// (whole or first line only) and trial-decoded against [`CANDIDATES`].
    pub fn detect_path(&self, path: &Path) -> Result<String> {
        self.check_size(fs::metadata(path)?.len())?;

        let declared = scan_declaration(BufReader::new(fs::File::open(path)?))?;
        if let Some(name) = declared {
            debug!(path = %path.display(), codec = %name, "encoding declared");
            return Ok(name);
        }

        if self.config.verbose {
            info!(path = %path.display(), "no encoding declaration, starting decode attempts");
        }

        let contents = if self.config.full_check {
            fs::read(path)?
        } else {
            let mut line = Vec::new();
            BufReader::new(fs::File::open(path)?).read_until(b'\n', &mut line)?;
            line
        };

        self.brute_force(&contents, CANDIDATES)
    }

    /// Detect the encoding of an in-memory buffer
    pub fn detect_bytes(&self, bytes: &[u8]) -> Result<String> {
        self.check_size(bytes.len() as u64)?;

        if let Some(name) = scan_declaration(bytes)? {
            debug!(codec = %name, "encoding declared");
            return Ok(name);
        }

        if self.config.verbose {
            info!("no encoding declaration, starting decode attempts");
        }

        let sample = if self.config.full_check {
            bytes
        } else {
            first_line(bytes)
        };

        self.brute_force(sample, CANDIDATES)
    }

    fn check_size(&self, len: u64) -> Result<()> {
        let Some(limit_mb) = self.config.size_limit_mb else {
            return Ok(());
        };

        let size_mb = size_in_mb(len);
        if size_mb >= limit_mb {
            warn!(size_mb, limit_mb, "file exceeds size limit");
            return Err(DetectError::SizeLimitExceeded { size_mb, limit_mb });
        }
        Ok(())
    }

    fn brute_force(&self, content: &[u8], candidates: &[Codec]) -> Result<String> {
        trial_decode(content, candidates, self.config.verbose)
            .map(|codec| codec.name().to_string())
            .ok_or(DetectError::Undetectable {
                candidates: candidates.len(),
            })
    }
}

/// The first line of `bytes`, including its newline
fn first_line(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(end) => &bytes[..=end],
        None => bytes,
    }
}

/// Detect the encoding of the file at `path`
pub fn detect_encoding(path: impl AsRef<Path>, config: &DetectionConfig) -> Result<String> {
    Detector::with_config(config.clone()).detect_path(path.as_ref())
}

/// Detect the encoding of an in-memory buffer
pub fn detect_bytes(bytes: &[u8], config: &DetectionConfig) -> Result<String> {
    Detector::with_config(config.clone()).detect_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeclarationError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Valid UTF-8 on line one, a bare cp1252 byte on line two
    const MIXED: &[u8] = b"na\xc3\xafve\ncaf\xe9 au lait\n";

    fn temp_file(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    fn detect(data: &[u8], config: &DetectionConfig) -> Result<String> {
        let file = temp_file(data);
        detect_encoding(file.path(), config)
    }

    #[test]
    fn test_declared_utf8() {
        let result = detect(b"# -*- coding: utf-8 -*-\nx = 1\n", &DetectionConfig::default()).unwrap();
        assert_eq!(result, "utf-8");
    }

    #[test]
    fn test_declaration_wins_over_contents() {
        // The cookie is trusted without looking at the body
        let result = detect(b"# coding: cp1252\n\xff\xfe\xfd\n", &DetectionConfig::default()).unwrap();
        assert_eq!(result, "cp1252");
    }

    #[test]
    fn test_ascii_without_declaration() {
        let result = detect(b"hello\nworld\n", &DetectionConfig::default()).unwrap();
        assert_eq!(result, "ascii");
    }

    #[test]
    fn test_cp1252_without_declaration() {
        let result = detect(b"caf\xe9 au lait", &DetectionConfig::default()).unwrap();
        assert_eq!(result, "cp1252");
    }

    #[test]
    fn test_empty_file() {
        let result = detect(b"", &DetectionConfig::default()).unwrap();
        assert_eq!(result, "ascii");
    }

    #[test]
    fn test_full_check_divergence() {
        let file = temp_file(MIXED);

        let sampled = DetectionConfig::default().with_full_check(false);
        assert_eq!(detect_encoding(file.path(), &sampled).unwrap(), "utf-8");

        let whole = DetectionConfig::default();
        assert_eq!(detect_encoding(file.path(), &whole).unwrap(), "cp1252");
    }

    #[test]
    fn test_full_check_divergence_in_memory() {
        let sampled = DetectionConfig::default().with_full_check(false);
        assert_eq!(detect_bytes(MIXED, &sampled).unwrap(), "utf-8");
        assert_eq!(detect_bytes(MIXED, &DetectionConfig::default()).unwrap(), "cp1252");
    }

    #[test]
    fn test_idempotent() {
        let file = temp_file(MIXED);
        let detector = Detector::new();
        let first = detector.detect_path(file.path()).unwrap();
        let second = detector.detect_path(file.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_size_limit_checked_before_reading() {
        // The unknown cookie would fail if the file were scanned
        let mut data = b"# coding: klingon\n".to_vec();
        data.resize(2048, b'x');
        let config = DetectionConfig::default().with_size_limit_mb(0.001);

        let err = detect(&data, &config).unwrap_err();
        assert!(matches!(err, DetectError::SizeLimitExceeded { limit_mb, .. } if limit_mb == 0.001));
    }

    #[test]
    fn test_size_within_limit() {
        let config = DetectionConfig::default().with_size_limit_mb(1.0);
        assert_eq!(detect(b"small\n", &config).unwrap(), "ascii");
    }

    #[test]
    fn test_size_at_limit_is_refused() {
        let data = vec![b'a'; 1_048_576];
        let config = DetectionConfig::default().with_size_limit_mb(1.0);

        let err = detect_bytes(&data, &config).unwrap_err();
        assert!(matches!(
            err,
            DetectError::SizeLimitExceeded { size_mb, limit_mb } if size_mb == 1.0 && limit_mb == 1.0
        ));

        let config = DetectionConfig::default().with_size_limit_mb(1.0001);
        assert_eq!(detect_bytes(&data, &config).unwrap(), "ascii");
    }

    #[test]
    fn test_size_in_mb() {
        assert_eq!(size_in_mb(0), 0.0);
        assert_eq!(size_in_mb(1_048_576), 1.0);
        assert_eq!(size_in_mb(2048), 0.002);
    }

    #[test]
    fn test_declared_dos_code_page() {
        let data = b"# -*- coding: cp437 -*-\nx = 1\n";
        assert_eq!(detect(data, &DetectionConfig::default()).unwrap(), "cp437");
        assert_eq!(detect_bytes(data, &DetectionConfig::default()).unwrap(), "cp437");
    }

    #[test]
    fn test_unknown_declaration_propagates() {
        let err = detect(b"# coding: klingon\n", &DetectionConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DetectError::Declaration(DeclarationError::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = detect_encoding(dir.path().join("missing.txt"), &DetectionConfig::default())
            .unwrap_err();
        assert!(matches!(err, DetectError::Io(_)));
    }

    #[test]
    fn test_undetectable_after_single_pass() {
        let detector = Detector::new();
        let err = detector.brute_force(b"\xff", &CANDIDATES[..1]).unwrap_err();
        assert!(matches!(err, DetectError::Undetectable { candidates: 1 }));
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line(b"one\ntwo\n"), b"one\n");
        assert_eq!(first_line(b"no newline"), b"no newline");
        assert_eq!(first_line(b""), b"");
    }
}
