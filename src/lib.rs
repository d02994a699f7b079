/*!
# csv-utf8sig

Re-encodes CSV files as UTF-8 with a byte-order mark ("UTF-8-sig") so Excel
shows Korean and other non-ASCII text correctly instead of mojibake.

## Architecture

```text
csv-utf8sig
├── Core        - Conversion errors, raw file reading
├── Convert     - Encoding classification, BOM conversion, naming, sinks
├── Config      - User settings (TOML/YAML)
├── Downloads   - Download observer, origin whitelist, recent download slot
├── Service     - Request/response front for UI layers
└── CLI common  - Logging setup and output formatting
```

## Usage

### CLI
```bash
# Convert files next to the originals
csv-utf8sig convert ./Downloads/sales.csv

# Report encodings in a directory
csv-utf8sig check ./Downloads --recursive --format json

# Restrict download offers to some origins
csv-utf8sig settings whitelist trusted-hosts.txt
```

### Library
```rust
use csv_utf8sig::convert::{classify, convert, Conversion, EncodingClass};

assert_eq!(classify(b"a,b\n1,2\n"), EncodingClass::ValidUtf8);
match convert(b"a,b\n1,2\n") {
    Conversion::Converted { bytes, .. } => assert!(bytes.starts_with(b"\xEF\xBB\xBF")),
    Conversion::AlreadyMarked => unreachable!(),
}
```
*/

pub mod cli_common;
pub mod config;
pub mod convert;
pub mod core;
pub mod downloads;
pub mod service;

pub use config::{Settings, SettingsPatch};
pub use convert::{
    classify, convert, derive_output_name, ConversionReport, Converter, DirectorySink,
    DownloadSink, EncodingClass, MemorySink,
};
pub use crate::core::{ConvertError, ConvertResult};
pub use downloads::{DownloadItem, DownloadObserver, RecentDownload, RecentDownloadStore};
pub use service::{ConversionService, Request, Response};

use std::path::Path;

/// Convert a single CSV file, writing the result next to it
pub fn convert_file<P: AsRef<Path>>(path: P) -> ConvertResult<ConversionReport> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Converter::new(DirectorySink::new(dir)).convert_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_convert_file_next_to_original() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("data.csv");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();

        let report = convert_file(&input).unwrap();
        assert!(report.is_converted());
        assert!(temp_dir.path().join("data_utf8sig.csv").exists());
    }

    #[test]
    fn test_convert_file_never_replaces_input() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("report_utf8sig.csv");
        std::fs::write(&input, [0xC0, 0xCC, 0xB8, 0xA7, b'\n']).unwrap();

        let report = convert_file(&input).unwrap();
        assert!(report.is_converted());
        assert_eq!(
            std::fs::read(&input).unwrap(),
            vec![0xC0, 0xCC, 0xB8, 0xA7, b'\n']
        );
        assert!(temp_dir.path().join("report_utf8sig (1).csv").exists());
    }
}
