use crate::{args::FactoryArgs, codec::Codec, error::AdapterError, file::csv::error::FileError};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    All,
    Minimal,
    NonNumeric,
    None,
}

impl Quoting {
    fn parse(name: &str) -> Result<Self, AdapterError> {
        match name {
            "QUOTE_ALL" => Ok(Quoting::All),
            "QUOTE_MINIMAL" => Ok(Quoting::Minimal),
            "QUOTE_NONNUMERIC" => Ok(Quoting::NonNumeric),
            "QUOTE_NONE" => Ok(Quoting::None),
            other => Err(AdapterError::invalid(
                "quoting",
                format!(
                    "{other:?} is not one of QUOTE_ALL, QUOTE_MINIMAL, QUOTE_NONNUMERIC, QUOTE_NONE"
                ),
            )),
        }
    }

    fn style(self) -> QuoteStyle {
        match self {
            Quoting::All => QuoteStyle::Always,
            Quoting::Minimal => QuoteStyle::Necessary,
            Quoting::NonNumeric => QuoteStyle::NonNumeric,
            Quoting::None => QuoteStyle::Never,
        }
    }
}

impl fmt::Display for Quoting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quoting::All => "QUOTE_ALL",
            Quoting::Minimal => "QUOTE_MINIMAL",
            Quoting::NonNumeric => "QUOTE_NONNUMERIC",
            Quoting::None => "QUOTE_NONE",
        };
        f.write_str(name)
    }
}

/// Dialect settings shared by the CSV reader and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSettings {
    pub encoding: String,
    pub codec: Codec,
    pub line_terminator: String,
    pub delimiter: u8,
    pub quote_char: u8,
    pub quoting: Quoting,
}

impl Default for CsvSettings {
    fn default() -> Self {
        CsvSettings {
            encoding: "utf-8".to_string(),
            codec: Codec::utf8(),
            line_terminator: "\n".to_string(),
            delimiter: b',',
            quote_char: b'"',
            quoting: Quoting::All,
        }
    }
}

impl CsvSettings {
    pub fn from_args(args: &FactoryArgs) -> Result<Self, AdapterError> {
        let defaults = CsvSettings::default();

        let encoding = args.get_or("encoding", &defaults.encoding).to_string();
        let codec = Codec::for_label(&encoding)
            .ok_or_else(|| FileError::UnsupportedEncoding(encoding.clone()))?;

        let line_terminator = args
            .get_or("lineterminator", &defaults.line_terminator)
            .to_string();
        if line_terminator != "\r\n" && line_terminator.len() != 1 {
            return Err(AdapterError::invalid(
                "lineterminator",
                format!("{line_terminator:?} must be a single byte or \"\\r\\n\""),
            ));
        }

        let delimiter = match args.get("delimiter") {
            Some(text) => single_byte("delimiter", text)?,
            None => defaults.delimiter,
        };
        let quote_char = match args.get("quotechar") {
            Some(text) => single_byte("quotechar", text)?,
            None => defaults.quote_char,
        };
        let quoting = match args.get("quoting") {
            Some(name) => Quoting::parse(name)?,
            None => defaults.quoting,
        };

        Ok(CsvSettings {
            encoding,
            codec,
            line_terminator,
            delimiter,
            quote_char,
            quoting,
        })
    }

    fn terminator(&self) -> Terminator {
        match self.line_terminator.as_bytes() {
            [byte] => Terminator::Any(*byte),
            _ => Terminator::CRLF,
        }
    }

    /// Reader that treats every record as data and tolerates ragged rows.
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote_char)
            .quoting(self.quoting != Quoting::None)
            .terminator(self.terminator());
        builder
    }

    pub fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote_char)
            .quote_style(self.quoting.style())
            .terminator(self.terminator());
        builder
    }

    /// Bytes a field may not contain when it is written unquoted.
    pub fn unquotable_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.delimiter, self.quote_char, b'\r', b'\n'];
        bytes.extend(self.line_terminator.bytes());
        bytes.sort_unstable();
        bytes.dedup();
        bytes
    }

    pub(crate) fn log(&self) {
        info!(
            encoding = %self.encoding,
            codec = self.codec.name(),
            lineterminator = ?self.line_terminator,
            delimiter = ?(self.delimiter as char),
            quotechar = ?(self.quote_char as char),
            quoting = %self.quoting,
            "CSV dialect"
        );
    }
}

fn single_byte(name: &str, text: &str) -> Result<u8, AdapterError> {
    match text.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(AdapterError::invalid(
            name,
            format!("{text:?} must be a single byte"),
        )),
    }
}
