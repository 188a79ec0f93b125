use crate::error::AdapterError;
use serde::Serialize;
use std::collections::HashMap;

/// Factory arguments given as a query string, e.g. `table=users&columns=id,name`.
///
/// When a key repeats, the first value wins. Keys with empty values are ignored.
#[derive(Debug, Clone, Default)]
pub struct FactoryArgs {
    raw: String,
    values: HashMap<String, String>,
}

impl FactoryArgs {
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut values = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            values
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        FactoryArgs {
            raw: query.to_string(),
            values,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Looks up an argument that must be present. `scope` names the argument
    /// set in the error message ("input", "output", ...).
    pub fn require(&self, key: &str, scope: &'static str) -> Result<&str, AdapterError> {
        self.get(key).ok_or_else(|| AdapterError::MissingArgument {
            name: key.to_string(),
            scope,
            args: self.raw.clone(),
        })
    }

    pub fn parse_value<T>(&self, key: &str) -> Result<Option<T>, AdapterError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|text| {
                text.trim()
                    .parse::<T>()
                    .map_err(|err| AdapterError::invalid(key, format!("{text:?}: {err}")))
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Computed run settings handed to every factory so range-aware adapters can
/// push the window down (e.g. as `OFFSET`/`LIMIT`).
///
/// Indexes are zero-based, ordinals one-based; both ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandArgs {
    pub start_row_index: Option<u64>,
    pub start_row_ordinal: Option<u64>,
    pub end_row_index: Option<u64>,
    pub end_row_ordinal: Option<u64>,
    pub start_end_row_diff: Option<u64>,
    pub batch_size: usize,
}

impl Default for CommandArgs {
    fn default() -> Self {
        CommandArgs {
            start_row_index: None,
            start_row_ordinal: None,
            end_row_index: None,
            end_row_ordinal: None,
            start_end_row_diff: None,
            batch_size: 1000,
        }
    }
}

/// Everything a source, sink or counter factory receives.
#[derive(Debug, Clone, Default)]
pub struct AdapterRequest {
    pub uri: String,
    pub query: String,
    pub args: String,
    pub cmd_args: CommandArgs,
}

impl AdapterRequest {
    pub fn new(
        uri: impl Into<String>,
        query: impl Into<String>,
        args: impl Into<String>,
        cmd_args: CommandArgs,
    ) -> Self {
        AdapterRequest {
            uri: uri.into(),
            query: query.into(),
            args: args.into(),
            cmd_args,
        }
    }

    pub fn factory_args(&self) -> FactoryArgs {
        FactoryArgs::parse(&self.args)
    }
}

/// Extracts the filesystem path from a URI. Plain paths are returned as is.
pub fn uri_path(uri: &str) -> String {
    match url::Url::parse(uri) {
        // Single-letter schemes are Windows drive letters, not URIs.
        Ok(parsed) if parsed.scheme().len() > 1 => parsed.path().to_string(),
        _ => uri.to_string(),
    }
}
