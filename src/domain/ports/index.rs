use crate::domain::{errors::DomainError, IndexRecord};

/// Destination for records produced by an index build.
pub trait IndexWriter {
    fn append(&mut self, record: &IndexRecord) -> Result<(), DomainError>;
    fn flush(&mut self) -> Result<(), DomainError>;
}

impl IndexWriter for Vec<IndexRecord> {
    fn append(&mut self, record: &IndexRecord) -> Result<(), DomainError> {
        self.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DomainError> {
        Ok(())
    }
}
