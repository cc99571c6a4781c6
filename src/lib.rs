//! # encoding-sniff
//!
//! Identify the character encoding of a text file that does not come with
//! one.
//!
//! ## Detection Rules
//!
//! Detection runs in order:
//! 1. A declaration in the leading bytes wins: a UTF-8, UTF-16 or UTF-32 byte
//!    order mark, or a coding cookie on line one (or line two, when line one
//!    is blank or a comment):
//!
//! ```text
//! # -*- coding: latin-1 -*-
//! ```
//!
//! 2. Otherwise the content is trial-decoded against the fixed
//!    [`CANDIDATES`] list and the first codec that decodes it without error
//!    is reported. There is no scoring; the list order is the preference.
//!
//! ## Configuration
//!
//! [`DetectionConfig`] controls how much of the file is sampled
//! (`full_check`), an optional size ceiling in megabytes, and whether every
//! decode attempt is reported at `info` level.
//!
//! ```
//! use encoding_sniff::{detect_encoding, DetectionConfig};
//!
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("notes.txt");
//! std::fs::write(&path, b"caf\xe9 au lait")?;
//!
//! let config = DetectionConfig::default().with_size_limit_mb(64.0);
//! assert_eq!(detect_encoding(&path, &config)?, "cp1252");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Sampling only the first line is faster on large files but may pick a
//! codec that fails further down.

pub mod codec;
pub mod declaration;
pub mod detect;
pub mod error;
pub mod tables;
pub mod trial;

pub use codec::{is_known, lookup, Codec, DecodeError, CANDIDATES};
pub use declaration::scan_declaration;
pub use detect::{detect_bytes, detect_encoding, size_in_mb, DetectionConfig, Detector};
pub use error::{DeclarationError, DetectError, Result};
pub use trial::trial_decode;
