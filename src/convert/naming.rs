//! Output file naming for converted CSV files

/// Marker inserted before the `.csv` extension of converted files
pub const SIG_SUFFIX: &str = "_utf8sig";

const CSV_EXTENSION: &str = ".csv";

/// Whether `name` ends with `.csv` (ASCII case-insensitive)
pub fn is_csv_name(name: &str) -> bool {
    split_csv_extension(name).is_some()
}

fn split_csv_extension(name: &str) -> Option<&str> {
    let cut = name.len().checked_sub(CSV_EXTENSION.len())?;
    let (stem, ext) = (name.get(..cut)?, name.get(cut..)?);
    ext.eq_ignore_ascii_case(CSV_EXTENSION).then_some(stem)
}

/// Derive the name of the converted file.
///
/// `data.csv` becomes `data_utf8sig.csv`. A name that already carries the
/// marker keeps a single one: `data_utf8sig.csv` stays `data_utf8sig.csv`.
pub fn derive_output_name(filename: &str) -> String {
    let stem = split_csv_extension(filename).unwrap_or(filename);
    let mut name = format!("{stem}{SIG_SUFFIX}{CSV_EXTENSION}");

    let doubled = SIG_SUFFIX.repeat(2);
    while name.contains(&doubled) {
        name = name.replace(&doubled, SIG_SUFFIX);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        assert_eq!(derive_output_name("data.csv"), "data_utf8sig.csv");
    }

    #[test]
    fn test_duplicate_marker_collapses() {
        assert_eq!(derive_output_name("data_utf8sig.csv"), "data_utf8sig.csv");
        assert_eq!(
            derive_output_name("data_utf8sig_utf8sig.csv"),
            "data_utf8sig.csv"
        );
    }

    #[test]
    fn test_uppercase_extension() {
        assert_eq!(derive_output_name("REPORT.CSV"), "REPORT_utf8sig.csv");
        assert!(is_csv_name("REPORT.CSV"));
    }

    #[test]
    fn test_only_trailing_extension_is_replaced() {
        assert_eq!(
            derive_output_name("export.csv.backup.csv"),
            "export.csv.backup_utf8sig.csv"
        );
    }

    #[test]
    fn test_name_without_extension() {
        assert_eq!(derive_output_name("download"), "download_utf8sig.csv");
        assert!(!is_csv_name("download"));
        assert!(!is_csv_name("csv"));
    }

    #[test]
    fn test_non_ascii_names() {
        assert_eq!(derive_output_name("매출 보고서.csv"), "매출 보고서_utf8sig.csv");
        // multi-byte char right before where the extension would be
        assert!(!is_csv_name("가나"));
    }
}
