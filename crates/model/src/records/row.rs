use crate::core::value::Value;

/// An ordered record of field values. The engine never inspects field contents.
pub type Row = Vec<Value>;

/// Result of running a row through the transform stage.
///
/// Kept separate from `Row` so that control signals can never collide with
/// real row contents.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Continue with this (possibly rewritten) row.
    Value(Row),
    /// Drop this row and keep streaming.
    Skip,
    /// Drop this row and end the stream. Rows already batched are kept.
    Stop,
}

impl From<Row> for RowOutcome {
    fn from(row: Row) -> Self {
        RowOutcome::Value(row)
    }
}

/// Builds a `Row` from anything convertible into `Value`.
#[macro_export]
macro_rules! row {
    () => { $crate::records::row::Row::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::core::value::Value::from($value)),+]
    };
}
