//! Upload, row, text and filename limits applied before anything reaches
//! the synthesis API. Oversized input is rejected, never trimmed to fit.

pub const MAX_CSV_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_DF_ROWS: usize = 1000;
pub const MAX_TEXT_LENGTH: usize = 10_000;
pub const MAX_FILENAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_upload_bytes: usize,
    pub max_rows: usize,
    pub max_text_chars: usize,
    pub max_filename_chars: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_CSV_SIZE,
            max_rows: MAX_DF_ROWS,
            max_text_chars: MAX_TEXT_LENGTH,
            max_filename_chars: MAX_FILENAME_LENGTH,
        }
    }
}

pub fn validate_csv_file_size(size_bytes: usize, max_size: usize) -> bool {
    size_bytes <= max_size
}

pub fn validate_dataframe_rows(row_count: usize, max_rows: usize) -> bool {
    row_count <= max_rows
}

/// Column names: ASCII letters, digits and underscores only.
pub fn validate_column_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Length is counted in characters, not bytes.
pub fn validate_text_length(text: &str, max_length: usize) -> bool {
    text.chars().count() <= max_length
}
