#[cfg(test)]
mod tests {
    use crate::{TEST_MYSQL_URL, TEST_PG_URL, utils::run_pipeline};
    use connectors::sql::{
        Driver,
        base::{adapter::SqlAdapter, table::TableRef},
        dialect::Dialect,
    };
    use engine_core::options::PipelineOptions;
    use engine_runtime::registry::AdapterRegistry;
    use model::{records::row::Row, row};
    use tracing_test::traced_test;

    /// Recreates `table` with two text columns and the given rows.
    async fn seed(uri: &str, table: &str, rows: &[(&str, &str)]) {
        let mut adapter = Driver::from_uri(uri).unwrap().connect(uri).await.unwrap();
        let dialect = adapter.dialect();
        let name = dialect.quote_identifier(table);
        adapter
            .exec_in_transaction(&format!("DROP TABLE IF EXISTS {name}"))
            .await
            .unwrap();
        adapter
            .exec_in_transaction(&format!(
                "CREATE TABLE {name} ({} VARCHAR(32), {} VARCHAR(32))",
                dialect.quote_identifier("name"),
                dialect.quote_identifier("qty"),
            ))
            .await
            .unwrap();
        if !rows.is_empty() {
            let target = TableRef {
                schema: None,
                name: table.to_string(),
                columns: vec!["name".into(), "qty".into()],
            };
            let rows = rows
                .iter()
                .map(|(label, qty)| row![*label, *qty])
                .collect::<Vec<_>>();
            adapter.insert_rows(&target, &rows).await.unwrap();
        }
        adapter.close().await.unwrap();
    }

    async fn read_rows(uri: &str, table: &str) -> Vec<Row> {
        let mut adapter = Driver::from_uri(uri).unwrap().connect(uri).await.unwrap();
        let sql = format!(
            "SELECT * FROM {}",
            adapter.dialect().quote_identifier(table)
        );
        adapter.open_query(&sql, 100).await.unwrap();
        let mut all = Vec::new();
        loop {
            let rows = adapter.fetch_rows().await.unwrap();
            if rows.is_empty() {
                break;
            }
            all.extend(rows);
        }
        adapter.close().await.unwrap();
        all
    }

    /// Values with quotes and backslashes arrive byte for byte.
    async fn copy_awkward_text(uri: &str) {
        let rows = [(r"a\b", "it's"), (r"\'", "--;"), ("tab\there", r#""q""#)];
        seed(uri, "pour_text_src", &rows).await;
        seed(uri, "pour_text_dst", &[]).await;

        let options = PipelineOptions {
            input_uri: uri.into(),
            input_factory: "db::select".into(),
            input_args: "table=pour_text_src&columns=name,qty".into(),
            output_uri: uri.into(),
            output_factory: "db::insert".into(),
            output_args: "table=pour_text_dst&columns=name,qty".into(),
            ..Default::default()
        };
        run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();

        let mut copied = read_rows(uri, "pour_text_dst").await;
        copied.sort_by_key(|row| row[0].to_text());
        let mut expected = rows
            .iter()
            .map(|(label, qty)| row![*label, *qty])
            .collect::<Vec<_>>();
        expected.sort_by_key(|row| row[0].to_text());
        assert_eq!(copied, expected);
    }

    async fn copy_table(uri: &str) {
        let rows = [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5")];
        seed(uri, "pour_src", &rows).await;
        seed(uri, "pour_dst", &[]).await;

        let options = PipelineOptions {
            input_uri: uri.into(),
            input_factory: "db::select".into(),
            input_args: "table=pour_src&columns=name,qty".into(),
            output_uri: uri.into(),
            output_factory: "db::insert".into(),
            output_args: "table=pour_dst&columns=name,qty".into(),
            start_row: Some(1),
            limit_rows: Some(3),
            batch_size: 2,
            ..Default::default()
        };
        let summary = run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.batches, 2);
        assert_eq!(read_rows(uri, "pour_dst").await.len(), 3);
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "Needs the PostgreSQL test database on localhost."]
    async fn tc01_postgres_table_copy_with_pushed_down_range() {
        copy_table(TEST_PG_URL).await;
        assert!(logs_contain("Range control is done by the input adapter"));
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "Needs the MySQL test database on localhost."]
    async fn tc02_mysql_table_copy_with_pushed_down_range() {
        copy_table(TEST_MYSQL_URL).await;
    }

    #[traced_test]
    #[tokio::test]
    async fn tc03_insert_requires_columns() {
        let options = PipelineOptions {
            output_uri: TEST_PG_URL.into(),
            output_factory: "db::insert".into(),
            output_args: "table=pour_dst".into(),
            limit_rows: Some(1),
            ..Default::default()
        };
        let failure = run_pipeline(&AdapterRegistry::builtin(), &options)
            .await
            .unwrap_err();
        assert_eq!(failure.step, "Get output object");
        assert!(
            failure
                .error
                .to_string()
                .contains("\"columns\" argument is not specified in output arguments")
        );
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "Needs the PostgreSQL test database on localhost."]
    async fn tc04_postgres_insert_binds_quotes_and_backslashes() {
        copy_awkward_text(TEST_PG_URL).await;
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "Needs the MySQL test database on localhost."]
    async fn tc05_mysql_insert_binds_quotes_and_backslashes() {
        copy_awkward_text(TEST_MYSQL_URL).await;
    }
}
