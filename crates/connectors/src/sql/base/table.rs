use crate::{args::FactoryArgs, error::AdapterError};

/// A table and the columns a select reads or an insert writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<String>,
}

impl TableRef {
    /// Reads `schema` (optional), `table` and `columns` (comma separated).
    pub fn from_args(args: &FactoryArgs, scope: &'static str) -> Result<Self, AdapterError> {
        let name = args.require("table", scope)?.to_string();
        let columns = args
            .require("columns", scope)?
            .split(',')
            .map(|column| column.trim().to_string())
            .collect::<Vec<_>>();
        if let Some(blank) = columns.iter().position(String::is_empty) {
            return Err(AdapterError::invalid(
                "columns",
                format!("column {} has an empty name", blank + 1),
            ));
        }
        Ok(TableRef {
            schema: args.get("schema").map(str::to_string),
            name,
            columns,
        })
    }
}
