pub mod record_csv_file;
pub mod record_ndjson_file;

pub use record_csv_file::RecordCsvFileSource;
pub use record_ndjson_file::RecordNdjsonFileSource;
