/*!
# Core Module

Error types and file system helpers shared by the converter, the download
observer and the CLI.
*/

pub mod errors;
pub mod fs_utils;

pub use errors::{ConvertError, ConvertResult, StatusLevel};
pub use fs_utils::{base_name, read_file_bytes};
