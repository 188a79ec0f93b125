//! Database-specific SQL rendering.

use crate::sql::base::{error::DbError, table::TableRef};
use model::records::row::Row;

/// Largest number of bind parameters one statement may carry, the limit of
/// both the PostgreSQL and the MySQL wire protocols.
pub const MAX_BIND_PARAMS: usize = 65_535;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Bind marker of the `index`-th (1-based) parameter.
    fn placeholder(&self, index: usize) -> String;

    /// Renders the `LIMIT`/`OFFSET` tail of a select, or an empty string.
    fn range_clause(&self, offset: Option<u64>, limit: Option<u64>) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> &'static str;

    fn qualified_table(&self, table: &TableRef) -> String {
        match &table.schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(&table.name)
            ),
            None => self.quote_identifier(&table.name),
        }
    }

    fn column_list(&self, table: &TableRef) -> String {
        table
            .columns
            .iter()
            .map(|column| self.quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn select_statement(
        &self,
        table: &TableRef,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.column_list(table),
            self.qualified_table(table)
        );
        let range = self.range_clause(offset, limit);
        if !range.is_empty() {
            sql.push(' ');
            sql.push_str(&range);
        }
        sql
    }

    /// Multi-row `INSERT` with one placeholder per value. `casts` is either
    /// empty or holds one suffix per column, appended to its placeholders.
    fn insert_statement(
        &self,
        table: &TableRef,
        row_count: usize,
        casts: &[String],
    ) -> Result<String, DbError> {
        let width = table.columns.len();
        if row_count == 0 {
            return Err(DbError::QueryBuildError("no rows to insert".to_string()));
        }
        if !casts.is_empty() && casts.len() != width {
            return Err(DbError::QueryBuildError(format!(
                "{} casts given for {width} columns",
                casts.len()
            )));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            self.qualified_table(table),
            self.column_list(table)
        );
        for row in 0..row_count {
            if row > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for column in 0..width {
                if column > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&self.placeholder(row * width + column + 1));
                if let Some(cast) = casts.get(column) {
                    sql.push_str(cast);
                }
            }
            sql.push(')');
        }
        Ok(sql)
    }
}

/// Fails on the first row whose width differs from the targeted columns.
pub fn check_row_widths(table: &TableRef, rows: &[Row]) -> Result<(), DbError> {
    match rows
        .iter()
        .position(|row| row.len() != table.columns.len())
    {
        Some(index) => Err(DbError::QueryBuildError(format!(
            "row {} has {} fields but {} columns are targeted",
            index + 1,
            rows[index].len(),
            table.columns.len()
        ))),
        None => Ok(()),
    }
}

/// Splits `rows` so no statement exceeds [`MAX_BIND_PARAMS`].
pub fn insert_chunks(rows: &[Row], width: usize) -> std::slice::Chunks<'_, Row> {
    rows.chunks((MAX_BIND_PARAMS / width.max(1)).max(1))
}

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn range_clause(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MySql;

/// MySQL has no bare `OFFSET`; this is the documented "all rows" limit.
const MYSQL_MAX_LIMIT: u64 = u64::MAX;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn range_clause(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("LIMIT {MYSQL_MAX_LIMIT} OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn name(&self) -> &'static str {
        "MySQL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::row;

    fn users() -> TableRef {
        TableRef {
            schema: Some("app".into()),
            name: "users".into(),
            columns: vec!["id".into(), "name".into()],
        }
    }

    #[test]
    fn select_pushes_down_range() {
        assert_eq!(
            Postgres.select_statement(&users(), Some(2), Some(3)),
            r#"SELECT "id", "name" FROM "app"."users" LIMIT 3 OFFSET 2"#
        );
        assert_eq!(
            MySql.select_statement(&users(), Some(2), None),
            "SELECT `id`, `name` FROM `app`.`users` LIMIT 18446744073709551615 OFFSET 2"
        );
        assert_eq!(
            Postgres.select_statement(&users(), None, None),
            r#"SELECT "id", "name" FROM "app"."users""#
        );
    }

    #[test]
    fn insert_binds_every_value() {
        let sql = MySql.insert_statement(&users(), 2, &[]).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `app`.`users` (`id`, `name`) VALUES (?, ?), (?, ?)"
        );

        let casts = vec!["::text::int8".to_string(), "::text::text".to_string()];
        let sql = Postgres.insert_statement(&users(), 2, &casts).unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"INSERT INTO "app"."users" ("id", "name") VALUES "#,
                "($1::text::int8, $2::text::text), ($3::text::int8, $4::text::text)"
            )
        );
        assert_eq!(Postgres.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn insert_rejects_empty_batches_and_wrong_casts() {
        assert!(Postgres.insert_statement(&users(), 0, &[]).is_err());
        let casts = vec!["::text::int8".to_string()];
        assert!(matches!(
            Postgres.insert_statement(&users(), 1, &casts),
            Err(DbError::QueryBuildError(_))
        ));
    }

    #[test]
    fn row_widths_must_match_columns() {
        assert!(check_row_widths(&users(), &[row![1i64, "a"]]).is_ok());
        let err = check_row_widths(&users(), &[row![1i64, "a"], row!["only one"]]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Query build error: row 2 has 1 fields but 2 columns are targeted"
        );
    }

    #[test]
    fn chunks_stay_under_the_parameter_limit() {
        let rows = vec![row![1i64, "a"]; 40_000];
        let sizes = insert_chunks(&rows, 2).map(<[Row]>::len).collect::<Vec<_>>();
        assert_eq!(sizes, vec![32_767, 7_233]);
        assert!(sizes.iter().all(|size| size * 2 <= MAX_BIND_PARAMS));
    }
}
