mod flat_file;

pub use flat_file::{format_record, parse_line, FlatFileIndex, FlatFileIndexWriter};
