//! Tasar `.tsr` model artifact format
//!
//! This module provides loading, inspection, and writing for pre-trained
//! regression models in tasar's native `.tsr` format (Magic: `TSR\0`).
//!
//! ## Format Structure (TSR v1, 64-byte header)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header (64 bytes)                                           │
//! │   - Magic: "TSR\0" (4 bytes)                                │
//! │   - Version: major.minor (2 bytes)                          │
//! │   - Flags (2 bytes)                                         │
//! │   - Coefficient count (4 bytes)                             │
//! │   - Metadata offset (8 bytes)                               │
//! │   - Metadata size (4 bytes)                                 │
//! │   - Data offset (8 bytes)                                   │
//! │   - Checksum (4 bytes, reserved)                            │
//! │   - Reserved (28 bytes)                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ JSON Metadata (padded to 8-byte boundary)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Coefficient Data (f32 LE: intercept, then one per feature)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The metadata carries the column schema the model was trained on,
//! including the vocabulary of every categorical column. Categorical
//! encoding therefore lives entirely inside the artifact; callers hand the
//! model raw column values and never see the one-hot layout.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tasar::artifact::Artifact;
//!
//! let artifact = Artifact::load("final_medcost_model.tsr")?;
//! println!("columns: {}", artifact.metadata().columns.len());
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TasarError};

/// Magic bytes identifying a `.tsr` file
pub const MAGIC: [u8; 4] = *b"TSR\0";

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 64;

/// Current format major version
pub const VERSION_MAJOR: u8 = 1;

/// Current format minor version
pub const VERSION_MINOR: u8 = 0;

// ============================================================================
// Model data storage
// ============================================================================

/// Raw artifact bytes, either memory-mapped from disk or heap-allocated.
///
/// Memory mapping keeps artifact loading zero-copy; the heap variant backs
/// in-memory parsing (tests, network-delivered artifacts).
#[derive(Debug)]
pub enum ModelData {
    /// Memory-mapped file (kernel-managed paging)
    Mmap {
        /// Mapped region
        mmap: memmap2::Mmap,
        /// Original file path, kept for diagnostics
        path: PathBuf,
    },
    /// Heap-allocated bytes
    Heap(Vec<u8>),
}

impl ModelData {
    /// Open a file with memory mapping.
    ///
    /// The file must not be truncated or modified while mapped; the map is
    /// read-only and closed when the artifact is dropped.
    #[allow(unsafe_code)]
    pub fn open_mmap(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|e| TasarError::IoError {
            message: format!("Failed to open file '{}': {e}", path_ref.display()),
        })?;

        // SAFETY: the file is opened read-only and we document the
        // single-writer assumption above.
        let mmap = unsafe {
            memmap2::MmapOptions::new()
                .map(&file)
                .map_err(|e| TasarError::IoError {
                    message: format!("Failed to mmap file '{}': {e}", path_ref.display()),
                })?
        };

        Ok(Self::Mmap {
            mmap,
            path: path_ref.to_path_buf(),
        })
    }

    /// Create from heap-allocated bytes
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::Heap(data)
    }

    /// View the full byte range
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Mmap { mmap, .. } => mmap,
            Self::Heap(data) => data,
        }
    }

    /// Total length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True when no bytes are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Header
// ============================================================================

/// TSR file header (64 bytes)
#[derive(Debug, Clone)]
pub struct TsrHeader {
    /// Magic number (`TSR\0`)
    pub magic: [u8; 4],
    /// Format version (major, minor)
    pub version: (u8, u8),
    /// Feature flags (bit 0 = compressed, reserved)
    pub flags: u16,
    /// Number of f32 values in the data section (intercept included)
    pub coefficient_count: u32,
    /// Offset to the metadata section
    pub metadata_offset: u64,
    /// Size of the metadata section
    pub metadata_size: u32,
    /// Offset to the coefficient data
    pub data_offset: u64,
    /// Reserved checksum field, written as zero
    pub checksum: u32,
}

impl TsrHeader {
    const FLAG_COMPRESSED: u16 = 1;

    /// Parse a header from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(TasarError::FormatError {
                reason: format!(
                    ".tsr header too small: {} bytes (need {})",
                    data.len(),
                    HEADER_SIZE
                ),
            });
        }

        let magic: [u8; 4] = data[0..4].try_into().map_err(|_| TasarError::FormatError {
            reason: "Failed to read magic bytes".to_string(),
        })?;

        if magic != MAGIC {
            return Err(TasarError::FormatError {
                reason: format!("Invalid .tsr magic: expected {:?}, got {:?}", MAGIC, magic),
            });
        }

        let version = (data[4], data[5]);
        if version.0 != VERSION_MAJOR {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Unsupported .tsr version {}.{} (supported: {}.x)",
                    version.0, version.1, VERSION_MAJOR
                ),
            });
        }

        let flags = u16::from_le_bytes([data[6], data[7]]);
        if flags & Self::FLAG_COMPRESSED != 0 {
            return Err(TasarError::FormatError {
                reason: "Compressed .tsr files not yet supported".to_string(),
            });
        }

        let coefficient_count = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let metadata_offset = u64::from_le_bytes([
            data[12], data[13], data[14], data[15], data[16], data[17], data[18], data[19],
        ]);
        let metadata_size = u32::from_le_bytes([data[20], data[21], data[22], data[23]]);
        let data_offset = u64::from_le_bytes([
            data[24], data[25], data[26], data[27], data[28], data[29], data[30], data[31],
        ]);
        let checksum = u32::from_le_bytes([data[32], data[33], data[34], data[35]]);

        Ok(Self {
            magic,
            version,
            flags,
            coefficient_count,
            metadata_offset,
            metadata_size,
            data_offset,
            checksum,
        })
    }

    /// Serialize the header to its 64-byte form
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic);
        out[4] = self.version.0;
        out[5] = self.version.1;
        out[6..8].copy_from_slice(&self.flags.to_le_bytes());
        out[8..12].copy_from_slice(&self.coefficient_count.to_le_bytes());
        out[12..20].copy_from_slice(&self.metadata_offset.to_le_bytes());
        out[20..24].copy_from_slice(&self.metadata_size.to_le_bytes());
        out[24..32].copy_from_slice(&self.data_offset.to_le_bytes());
        out[32..36].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// One column of the model's input schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSpec {
    /// Numeric column, consumed as a single feature
    Numeric {
        /// Column name, matched case-sensitively against row cells
        name: String,
    },
    /// Categorical column, one-hot encoded over its vocabulary
    Categorical {
        /// Column name, matched case-sensitively against row cells
        name: String,
        /// Values seen during training, in coefficient order
        vocab: Vec<String>,
    },
}

impl ColumnSpec {
    /// Column name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ColumnSpec::Numeric { name } | ColumnSpec::Categorical { name, .. } => name,
        }
    }

    /// Number of features this column contributes to the encoded vector
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            ColumnSpec::Numeric { .. } => 1,
            ColumnSpec::Categorical { vocab, .. } => vocab.len(),
        }
    }
}

/// Model metadata from a `.tsr` file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Model type (e.g. `linear_regression`)
    #[serde(default)]
    pub model_type: String,
    /// Human-readable model name
    #[serde(default)]
    pub name: Option<String>,
    /// Input schema, in training column order
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    /// Additional metadata fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ArtifactMetadata {
    /// Width of the encoded feature vector (numeric columns count one,
    /// categorical columns count one per vocabulary entry)
    #[must_use]
    pub fn encoded_width(&self) -> usize {
        self.columns.iter().map(ColumnSpec::width).sum()
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// A parsed `.tsr` model artifact
///
/// Coefficients are decoded eagerly; the artifact is small enough that
/// holding them on the heap beats re-reading the mapped file per request.
#[derive(Debug, Clone)]
pub struct Artifact {
    header: TsrHeader,
    metadata: ArtifactMetadata,
    intercept: f32,
    coefficients: Vec<f32>,
}

impl Artifact {
    /// Assemble an artifact from parts, validating coefficient count
    /// against the schema width.
    pub fn new(
        metadata: ArtifactMetadata,
        intercept: f32,
        coefficients: Vec<f32>,
    ) -> Result<Self> {
        let width = metadata.encoded_width();
        if coefficients.len() != width {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Coefficient count {} does not match schema width {}",
                    coefficients.len(),
                    width
                ),
            });
        }

        let total = u32::try_from(coefficients.len() + 1).map_err(|_| TasarError::FormatError {
            reason: "Coefficient count exceeds u32 range".to_string(),
        })?;

        Ok(Self {
            header: TsrHeader {
                magic: MAGIC,
                version: (VERSION_MAJOR, VERSION_MINOR),
                flags: 0,
                coefficient_count: total,
                metadata_offset: 0,
                metadata_size: 0,
                data_offset: 0,
                checksum: 0,
            },
            metadata,
            intercept,
            coefficients,
        })
    }

    /// Load an artifact from a `.tsr` file using memory mapping
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = ModelData::open_mmap(path)?;
        Self::parse(&data)
    }

    /// Parse an artifact from heap bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::parse(&ModelData::from_vec(bytes))
    }

    fn parse(data: &ModelData) -> Result<Self> {
        let bytes = data.as_slice();
        let header = TsrHeader::from_bytes(bytes)?;

        let metadata = Self::parse_metadata(bytes, &header)?;
        let (intercept, coefficients) = Self::parse_coefficients(bytes, &header)?;

        let width = metadata.encoded_width();
        if coefficients.len() != width {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Data section holds {} coefficients but schema width is {}",
                    coefficients.len(),
                    width
                ),
            });
        }

        Ok(Self {
            header,
            metadata,
            intercept,
            coefficients,
        })
    }

    fn parse_metadata(bytes: &[u8], header: &TsrHeader) -> Result<ArtifactMetadata> {
        if header.metadata_size == 0 {
            return Ok(ArtifactMetadata::default());
        }

        let start = usize::try_from(header.metadata_offset).map_err(|_| range_error())?;
        let end = start
            .checked_add(header.metadata_size as usize)
            .ok_or_else(range_error)?;
        if end > bytes.len() {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Metadata range {start}..{end} exceeds file size {}",
                    bytes.len()
                ),
            });
        }

        serde_json::from_slice(&bytes[start..end]).map_err(|e| TasarError::FormatError {
            reason: format!("Invalid metadata JSON: {e}"),
        })
    }

    fn parse_coefficients(bytes: &[u8], header: &TsrHeader) -> Result<(f32, Vec<f32>)> {
        if header.coefficient_count == 0 {
            return Err(TasarError::FormatError {
                reason: "Data section must hold at least the intercept".to_string(),
            });
        }

        let start = usize::try_from(header.data_offset).map_err(|_| range_error())?;
        let byte_len = header.coefficient_count as usize * 4;
        let end = start.checked_add(byte_len).ok_or_else(range_error)?;
        if end > bytes.len() {
            return Err(TasarError::FormatError {
                reason: format!(
                    "Data range {start}..{end} exceeds file size {}",
                    bytes.len()
                ),
            });
        }

        let mut values = Vec::with_capacity(header.coefficient_count as usize);
        for chunk in bytes[start..end].chunks_exact(4) {
            values.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        let intercept = values[0];
        let coefficients = values.split_off(1);
        Ok((intercept, coefficients))
    }

    /// Serialize the artifact to `.tsr` bytes
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let metadata_json =
            serde_json::to_vec(&self.metadata).expect("metadata serialization is infallible");

        let metadata_offset = HEADER_SIZE as u64;
        let metadata_size = metadata_json.len() as u32;
        // Data section starts on the next 8-byte boundary after the metadata.
        let data_offset = (metadata_offset + u64::from(metadata_size) + 7) & !7;

        let header = TsrHeader {
            magic: MAGIC,
            version: (VERSION_MAJOR, VERSION_MINOR),
            flags: 0,
            coefficient_count: self.header.coefficient_count,
            metadata_offset,
            metadata_size,
            data_offset,
            checksum: 0,
        };

        let mut out = Vec::with_capacity(
            data_offset as usize + self.header.coefficient_count as usize * 4,
        );
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&metadata_json);
        out.resize(data_offset as usize, 0);
        out.extend_from_slice(&self.intercept.to_le_bytes());
        for coef in &self.coefficients {
            out.extend_from_slice(&coef.to_le_bytes());
        }
        out
    }

    /// Write the artifact to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ref = path.as_ref();
        std::fs::write(path_ref, self.to_bytes()).map_err(|e| TasarError::IoError {
            message: format!("Failed to write '{}': {e}", path_ref.display()),
        })
    }

    /// Parsed header
    #[must_use]
    pub fn header(&self) -> &TsrHeader {
        &self.header
    }

    /// Model metadata
    #[must_use]
    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// Regression intercept
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Coefficients in schema order, intercept excluded
    #[must_use]
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }
}

fn range_error() -> TasarError {
    TasarError::FormatError {
        reason: "Section offset exceeds addressable range".to_string(),
    }
}
