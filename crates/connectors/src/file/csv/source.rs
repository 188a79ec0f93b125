use crate::{
    adapter::{RowSource, SourceFactory, SourceOutput},
    args::{AdapterRequest, uri_path},
    error::AdapterError,
    file::csv::{STDIO_URI, error::FileError, settings::CsvSettings},
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use std::{fs::File, io};
use tracing::info;

/// Reads positional rows from a CSV file or stdin. Every field is a string.
pub struct CsvSource {
    records: csv::StringRecordsIntoIter<Box<dyn io::Read + Send>>,
    rows_read: u64,
}

impl CsvSource {
    pub fn open(uri: &str, settings: &CsvSettings) -> Result<Self, FileError> {
        let input: Box<dyn io::Read + Send> = if uri == STDIO_URI {
            Box::new(io::stdin())
        } else {
            let path = uri_path(uri);
            Box::new(File::open(&path).map_err(|err| FileError::open(&path, err))?)
        };
        Ok(Self::from_reader(input, settings))
    }

    /// Reads `input` as text in the configured encoding.
    pub fn from_reader(input: Box<dyn io::Read + Send>, settings: &CsvSettings) -> Self {
        let input = settings.codec.reader(input);
        CsvSource {
            records: settings.reader_builder().from_reader(input).into_records(),
            rows_read: 0,
        }
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}

#[async_trait]
impl RowSource for CsvSource {
    async fn next_row(&mut self) -> Result<Option<Row>, AdapterError> {
        match self.records.next() {
            Some(Ok(record)) => {
                self.rows_read += 1;
                Ok(Some(record.iter().map(Value::from).collect()))
            }
            Some(Err(err)) => Err(FileError::CsvError(err).into()),
            None => Ok(None),
        }
    }
}

/// `csv::reader`
pub struct CsvReaderFactory;

#[async_trait]
impl SourceFactory for CsvReaderFactory {
    async fn create(&self, request: &AdapterRequest) -> Result<SourceOutput, AdapterError> {
        info!(uri = %request.uri, "Input");
        let settings = CsvSettings::from_args(&request.factory_args())?;
        settings.log();
        let source = CsvSource::open(&request.uri, &settings)?;
        Ok(SourceOutput::direct(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FactoryArgs;
    use model::row;
    use std::io::Write;

    fn source_over(text: &str, args: &str) -> CsvSource {
        let settings = CsvSettings::from_args(&FactoryArgs::parse(args)).unwrap();
        CsvSource::from_reader(Box::new(io::Cursor::new(text.as_bytes().to_vec())), &settings)
    }

    #[tokio::test]
    async fn first_record_is_data_and_rows_may_be_ragged() {
        let mut source = source_over("a,b\n\"c,d\",e,f\ng\n", "");
        assert_eq!(source.next_row().await.unwrap(), Some(row!["a", "b"]));
        assert_eq!(source.next_row().await.unwrap(), Some(row!["c,d", "e", "f"]));
        assert_eq!(source.next_row().await.unwrap(), Some(row!["g"]));
        assert_eq!(source.next_row().await.unwrap(), None);
        assert_eq!(source.rows_read(), 3);
    }

    #[tokio::test]
    async fn honours_delimiter() {
        let mut source = source_over("1\t2\n", "delimiter=%09");
        assert_eq!(source.next_row().await.unwrap(), Some(row!["1", "2"]));
    }

    #[tokio::test]
    async fn decodes_latin1_input() {
        let settings = CsvSettings::from_args(&FactoryArgs::parse("encoding=latin-1")).unwrap();
        let bytes = b"\"caf\xe9\",\"na\xefve\"\n".to_vec();
        let mut source = CsvSource::from_reader(Box::new(io::Cursor::new(bytes)), &settings);
        assert_eq!(source.next_row().await.unwrap(), Some(row!["café", "naïve"]));
    }

    #[tokio::test]
    async fn factory_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,1").unwrap();
        let request = AdapterRequest {
            uri: file.path().to_string_lossy().into_owned(),
            ..Default::default()
        };

        let acquired = CsvReaderFactory.create(&request).await.unwrap().classify();
        assert!(!acquired.native_range_filtering);
        let mut scope = acquired.scope;
        scope.enter().await.unwrap();
        let source = scope.resource().unwrap();
        assert_eq!(source.next_row().await.unwrap(), Some(row!["x", "1"]));
        scope.exit().await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let request = AdapterRequest {
            uri: "/definitely/not/here.csv".into(),
            ..Default::default()
        };
        let err = CsvReaderFactory.create(&request).await.err().unwrap();
        assert!(matches!(err, AdapterError::File(FileError::NotFound(_))));
    }
}
