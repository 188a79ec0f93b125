#[cfg(test)]
mod tests {
    use crate::utils::run_pipeline;
    use connectors::{error::AdapterError, file::csv::error::FileError};
    use engine_core::{
        error::PipelineError,
        options::{CountSpec, PipelineOptions},
    };
    use engine_runtime::registry::AdapterRegistry;
    use std::{fs, path::Path};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    const INPUT: &str = "a,1\nb,2\nc,3\nd,4\n";

    fn csv_options(dir: &TempDir) -> PipelineOptions {
        let input = dir.path().join("in.csv");
        fs::write(&input, INPUT).unwrap();
        PipelineOptions {
            input_uri: path_text(&input),
            input_factory: "csv::reader".into(),
            output_uri: path_text(&dir.path().join("out.csv")),
            output_factory: "csv::writer".into(),
            ..Default::default()
        }
    }

    fn path_text(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn output(dir: &TempDir) -> String {
        fs::read_to_string(dir.path().join("out.csv")).unwrap()
    }

    #[traced_test]
    #[tokio::test]
    async fn tc01_copies_rows_with_minimal_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            output_args: "quoting=QUOTE_MINIMAL".into(),
            convert_args: ",i".into(),
            batch_size: 3,
            ..csv_options(&dir)
        };
        let summary = run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();

        assert_eq!(output(&dir), INPUT);
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.batches, 2);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc02_window_and_projection_with_default_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            only_columns: Some("2".into()),
            start_row: Some(1),
            end_row: Some(3),
            ..csv_options(&dir)
        };
        run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();
        assert_eq!(output(&dir), "\"2\"\n\"3\"\n");
    }

    #[traced_test]
    #[tokio::test]
    async fn tc03_line_counter_respects_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            count_factory: Some(CountSpec::Factory("count::lines".into())),
            start_row: Some(1),
            end_row: Some(3),
            ..csv_options(&dir)
        };
        run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();
        assert!(logs_contain("Count:              2 rows"));
        assert!(logs_contain("Total: 2 rows"));
    }

    #[traced_test]
    #[tokio::test]
    async fn tc04_missing_input_fails_while_creating_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            input_uri: path_text(&dir.path().join("missing.csv")),
            ..csv_options(&dir)
        };
        let failure = run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap_err();

        assert_eq!(failure.step, "Get input object");
        assert!(matches!(
            failure.error,
            PipelineError::Adapter(AdapterError::File(FileError::NotFound(_)))
        ));
        assert!(!dir.path().join("out.csv").exists());
    }

    #[traced_test]
    #[tokio::test]
    async fn tc05_unsupported_encoding_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            output_args: "encoding=klingon".into(),
            ..csv_options(&dir)
        };
        let failure = run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap_err();
        assert_eq!(failure.step, "Get output object");
        assert!(failure.error.is_configuration());
    }

    #[traced_test]
    #[tokio::test]
    async fn tc06_latin1_to_utf16_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let latin1 = dir.path().join("latin1.csv");
        let utf16 = dir.path().join("utf16.csv");
        let back = dir.path().join("back.csv");
        fs::write(&latin1, b"caf\xe9,1\nna\xefve,2\n").unwrap();

        let options = PipelineOptions {
            input_uri: path_text(&latin1),
            input_factory: "csv::reader".into(),
            input_args: "encoding=latin-1".into(),
            output_uri: path_text(&utf16),
            output_factory: "csv::writer".into(),
            output_args: "encoding=utf-16&quoting=QUOTE_MINIMAL".into(),
            ..Default::default()
        };
        run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();

        let mut expected = vec![0xff, 0xfe];
        expected.extend("café,1\nnaïve,2\n".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(fs::read(&utf16).unwrap(), expected);

        let options = PipelineOptions {
            input_uri: path_text(&utf16),
            input_args: "encoding=utf-16".into(),
            output_uri: path_text(&back),
            output_args: "encoding=latin-1&quoting=QUOTE_MINIMAL".into(),
            ..options
        };
        run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();
        assert_eq!(fs::read(&back).unwrap(), fs::read(&latin1).unwrap());
    }

    #[traced_test]
    #[tokio::test]
    async fn tc07_unquoted_output_rejects_a_field_with_the_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("quoted.csv");
        fs::write(&input, "\"a,b\",c\n").unwrap();
        let options = PipelineOptions {
            input_uri: path_text(&input),
            output_args: "quoting=QUOTE_NONE".into(),
            ..csv_options(&dir)
        };
        let failure = run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap_err();

        assert_eq!(failure.step, "Process data");
        assert!(matches!(
            failure.error,
            PipelineError::Adapter(AdapterError::File(FileError::WriteError(_)))
        ));
    }
}
