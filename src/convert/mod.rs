/*!
# CSV → UTF-8-sig conversion

Read a CSV file, classify its encoding and, unless it already carries a
byte-order mark, save a BOM-prefixed copy next to a sink of the caller's
choice.

## Usage

```rust,ignore
use csv_utf8sig::convert::{Converter, DirectorySink};

let converter = Converter::new(DirectorySink::new("./out"));
let report = converter.convert_file("./Downloads/data.csv")?;
println!("{}", report.message());
```
*/

pub mod encoding;
pub mod naming;
pub mod sink;

pub use encoding::{
    classify, classify_text, convert, decode_lossy, prepend_bom, Conversion, EncodingClass,
    BOM_CHAR, CSV_MIME, UTF8_BOM,
};
pub use naming::{derive_output_name, is_csv_name, SIG_SUFFIX};
pub use sink::{DirectorySink, DownloadSink, MemorySink, OutputFile};

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::{base_name, read_file_bytes, ConvertError, ConvertResult, StatusLevel};

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Input already carries the BOM; nothing was saved
    AlreadyMarked,
    /// A BOM-prefixed copy was saved
    Converted { output_name: String, saved_to: PathBuf },
}

/// Result of converting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub filename: String,
    pub class: EncodingClass,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

impl ConversionReport {
    pub fn is_converted(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Converted { .. })
    }

    pub fn level(&self) -> StatusLevel {
        match self.outcome {
            ConversionOutcome::AlreadyMarked => StatusLevel::Info,
            ConversionOutcome::Converted { .. } => StatusLevel::Success,
        }
    }

    /// User-facing status line
    pub fn message(&self) -> String {
        match (&self.outcome, self.class) {
            (ConversionOutcome::AlreadyMarked, _) => format!(
                "{} is already UTF-8-sig; Excel will display it correctly, no conversion needed",
                self.filename
            ),
            (ConversionOutcome::Converted { output_name, .. }, EncodingClass::ValidUtf8) => {
                format!("Converted UTF-8 → UTF-8 with BOM (sig): {}", output_name)
            }
            (ConversionOutcome::Converted { output_name, .. }, _) => {
                format!("Converted to UTF-8 with BOM (sig): {}", output_name)
            }
        }
    }
}

/// Classification of a file without converting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub class: EncodingClass,
    pub size: u64,
    pub output_name: Option<String>,
}

/// Inspect a file and report what a conversion would do.
pub fn inspect_file(path: &Path) -> ConvertResult<InspectReport> {
    let bytes = read_file_bytes(path)?;
    let class = classify(&bytes);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(InspectReport {
        path: path.to_path_buf(),
        class,
        size: bytes.len() as u64,
        output_name: class.needs_conversion().then(|| derive_output_name(&name)),
    })
}

/// Runs the read → classify → convert → save pipeline against a sink
pub struct Converter<S: DownloadSink> {
    sink: S,
}

impl<S: DownloadSink> Converter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Convert a file on disk. Read failures are reported, never retried.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> ConvertResult<ConversionReport> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| base_name(&path.to_string_lossy()).to_string());

        if !is_csv_name(&filename) {
            return Err(ConvertError::NotCsv(filename));
        }

        tracing::debug!("Reading {}", path.display());
        let bytes = read_file_bytes(path)?;
        self.convert_bytes(&filename, &bytes)
    }

    /// Convert in-memory content that came from a file called `filename`.
    pub fn convert_bytes(&self, filename: &str, content: &[u8]) -> ConvertResult<ConversionReport> {
        let filename = base_name(filename).to_string();

        match convert(content) {
            Conversion::AlreadyMarked => {
                tracing::info!("{} already has a UTF-8 BOM, skipping", filename);
                Ok(ConversionReport {
                    filename,
                    class: EncodingClass::AlreadyMarked,
                    outcome: ConversionOutcome::AlreadyMarked,
                })
            }
            Conversion::Converted { from, bytes } => {
                if from == EncodingClass::Undecodable {
                    tracing::warn!(
                        "{} is not valid UTF-8; adding the BOM to lossily decoded content",
                        filename
                    );
                }

                let output = OutputFile {
                    filename: derive_output_name(&filename),
                    mime: CSV_MIME,
                    bytes,
                };
                let saved_to = self.sink.save(&output)?;
                // the sink may have renamed the file to avoid a clash
                let output_name = saved_to
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or(output.filename);

                Ok(ConversionReport {
                    filename,
                    class: from,
                    outcome: ConversionOutcome::Converted {
                        output_name,
                        saved_to,
                    },
                })
            }
        }
    }
}
