use crate::records::row::Row;

/// A group of rows delivered to a sink in a single call.
pub type Batch = Vec<Row>;
