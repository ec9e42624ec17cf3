mod file;

#[cfg(test)]
pub(crate) use file::sample_file;
pub use file::{File, FileStatus, SavedChart, FILE_COLUMNS, FILE_SUMMARY_COLUMNS};
