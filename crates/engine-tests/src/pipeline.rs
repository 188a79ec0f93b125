#[cfg(test)]
mod tests {
    use crate::utils::{
        RANGED_INPUT, SKIP_X, STOP_AT_5, batch_sizes, flattened, memory_options, numbered_rows,
        run_pipeline, test_registry,
    };
    use engine_core::{
        error::PipelineError,
        options::{CountSpec, PipelineOptions},
    };
    use model::{core::value::Value, row};
    use tracing_test::traced_test;

    fn ordinals(rows: &[Vec<Value>]) -> Vec<String> {
        rows.iter()
            .map(|row| row[0].to_text().unwrap_or_default())
            .collect()
    }

    #[traced_test]
    #[tokio::test]
    async fn tc01_sink_receives_ceil_n_over_b_batches() {
        for (n, batch_size) in [(0, 3), (1, 3), (6, 3), (7, 3), (10, 1), (5, 1000)] {
            let (registry, batches) = test_registry(numbered_rows(n));
            let options = PipelineOptions {
                batch_size,
                ..memory_options()
            };
            let summary = run_pipeline(&registry, &options).await.unwrap();

            let sizes = batch_sizes(&batches);
            assert_eq!(sizes.len(), n.div_ceil(batch_size), "n={n} b={batch_size}");
            if let Some((last, full)) = sizes.split_last() {
                assert!(full.iter().all(|size| *size == batch_size));
                let rest = n % batch_size;
                assert_eq!(*last, if rest == 0 { batch_size } else { rest });
            }
            assert_eq!(sizes.iter().sum::<usize>(), n);
            assert_eq!(summary.rows, n as u64);
        }
        assert!(logs_contain("Total: 0 row,"));
    }

    #[traced_test]
    #[tokio::test]
    async fn tc02_engine_enforces_the_row_window() {
        let (registry, batches) = test_registry(numbered_rows(10));
        let options = PipelineOptions {
            start_row: Some(2),
            end_row: Some(5),
            ..memory_options()
        };
        run_pipeline(&registry, &options).await.unwrap();
        assert_eq!(ordinals(&flattened(&batches)), vec!["3", "4", "5"]);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc03_native_range_source_is_not_filtered_again() {
        let (registry, batches) = test_registry(numbered_rows(10));
        let options = PipelineOptions {
            input_factory: RANGED_INPUT.into(),
            start_row: Some(2),
            end_row: Some(5),
            ..memory_options()
        };
        let summary = run_pipeline(&registry, &options).await.unwrap();

        assert_eq!(ordinals(&flattened(&batches)), vec!["3", "4", "5"]);
        assert_eq!(summary.metrics.rows_pulled, 3);
        assert!(logs_contain("Range control is done by the input adapter"));
    }

    #[traced_test]
    #[tokio::test]
    async fn tc04_limit_rows_tightens_the_end_row() {
        let (registry, batches) = test_registry(numbered_rows(10));
        let options = PipelineOptions {
            start_row: Some(0),
            end_row: Some(100),
            limit_rows: Some(3),
            ..memory_options()
        };
        run_pipeline(&registry, &options).await.unwrap();
        assert_eq!(ordinals(&flattened(&batches)), vec!["1", "2", "3"]);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc05_skip_drops_rows_and_keeps_order() {
        let rows = vec![
            row!["a", "1"],
            row!["x", "2"],
            row!["b", "3"],
            row!["x", "4"],
            row!["c", "5"],
        ];
        let (registry, batches) = test_registry(rows);
        let options = PipelineOptions {
            convert_factory: SKIP_X.into(),
            batch_size: 2,
            ..memory_options()
        };
        let summary = run_pipeline(&registry, &options).await.unwrap();

        assert_eq!(
            flattened(&batches),
            vec![row!["a", "1"], row!["b", "3"], row!["c", "5"]]
        );
        assert_eq!(batch_sizes(&batches), vec![2, 1]);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.metrics.rows_skipped, 2);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc06_stop_flushes_earlier_rows_and_pulls_no_more() {
        let (registry, batches) = test_registry(numbered_rows(10));
        let options = PipelineOptions {
            convert_factory: STOP_AT_5.into(),
            batch_size: 3,
            ..memory_options()
        };
        let summary = run_pipeline(&registry, &options).await.unwrap();

        assert_eq!(batch_sizes(&batches), vec![3, 1]);
        assert_eq!(ordinals(&flattened(&batches)), vec!["1", "2", "3", "4"]);
        assert_eq!(summary.metrics.rows_pulled, 5);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc07_identity_converters_are_a_passthrough() {
        let rows = vec![row!["a", "1"], row!["b", None::<&str>]];
        let (registry, batches) = test_registry(rows.clone());
        let options = PipelineOptions {
            convert_args: ",".into(),
            ..memory_options()
        };
        run_pipeline(&registry, &options).await.unwrap();
        assert_eq!(flattened(&batches), rows);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc08_field_converters_with_batches_of_two() {
        let rows = vec![row!["a", "1"], row!["b", "2"], row!["c", "3"]];
        let (registry, batches) = test_registry(rows);
        let options = PipelineOptions {
            convert_args: ",i".into(),
            batch_size: 2,
            ..memory_options()
        };
        run_pipeline(&registry, &options).await.unwrap();

        assert_eq!(
            *batches.lock().unwrap(),
            vec![
                vec![row!["a", 1i64], row!["b", 2i64]],
                vec![row!["c", 3i64]]
            ]
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn tc09_projection_out_of_range_aborts_the_run() {
        let (registry, batches) = test_registry(vec![row!["a", "b"]]);
        let options = PipelineOptions {
            only_columns: Some("2,3".into()),
            ..memory_options()
        };
        let failure = run_pipeline(&registry, &options).await.unwrap_err();

        assert_eq!(failure.step, "Process data");
        assert!(matches!(
            failure.error,
            PipelineError::Projection {
                position: 3,
                len: 2
            }
        ));
        assert!(batches.lock().unwrap().is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn tc10_projection_reorders_before_conversion() {
        let (registry, batches) = test_registry(vec![row!["7", "x"], row!["8", "y"]]);
        let options = PipelineOptions {
            only_columns: Some("2,1".into()),
            convert_args: "s,i".into(),
            ..memory_options()
        };
        run_pipeline(&registry, &options).await.unwrap();
        assert_eq!(
            flattened(&batches),
            vec![row!["x", 7i64], row!["y", 8i64]]
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn tc11_counter_adapter_reports_the_expected_total() {
        let (registry, _) = test_registry(numbered_rows(4));
        let options = PipelineOptions {
            count_factory: Some(CountSpec::Factory("count::fixed".into())),
            count_args: "count=4".into(),
            batch_size: 2,
            ..memory_options()
        };
        run_pipeline(&registry, &options).await.unwrap();

        assert!(logs_contain("Count:              4 rows"));
        assert!(logs_contain("need"));
        assert!(logs_contain("Total: 4 rows"));
    }

    #[traced_test]
    #[tokio::test]
    async fn tc12_counter_argument_errors_name_the_step() {
        let (registry, _) = test_registry(numbered_rows(1));
        let options = PipelineOptions {
            count_factory: Some(CountSpec::Factory("count::fixed".into())),
            ..memory_options()
        };
        let failure = run_pipeline(&registry, &options).await.unwrap_err();
        assert_eq!(failure.step, "Get count factory");
        assert!(failure.error.is_configuration());
    }

    #[traced_test]
    #[tokio::test]
    async fn tc13_default_empty_adapters_with_a_limit() {
        let (registry, _) = test_registry(Vec::new());
        let options = PipelineOptions {
            limit_rows: Some(5),
            batch_size: 2,
            ..Default::default()
        };
        let summary = run_pipeline(&registry, &options).await.unwrap();
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.batches, 3);
    }

    #[traced_test]
    #[tokio::test]
    async fn tc14_converter_failure_is_a_transform_error() {
        let (registry, batches) = test_registry(vec![row!["a", "1"], row!["b", "two"]]);
        let options = PipelineOptions {
            convert_args: ",i".into(),
            ..memory_options()
        };
        let failure = run_pipeline(&registry, &options).await.unwrap_err();
        assert!(matches!(failure.error, PipelineError::Transform(_)));
        assert!(batches.lock().unwrap().is_empty());
    }
}
