use crate::sql::{
    base::error::ConnectorError,
    dialect::{Dialect, Postgres},
};
use model::{core::value::Value, records::row::Row};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::fmt::Write;
use tokio_postgres::{Client, Config, NoTls, SimpleQueryMessage, config::SslMode, types::Type};
use tracing::{error, warn};

pub(crate) async fn connect_client(url: &str) -> Result<Client, ConnectorError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
    let ssl_mode = config.get_ssl_mode();

    match ssl_mode {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Require => connect_with_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

async fn connect_with_tls(config: Config) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

/// Keeps the data rows of a simple-query response, every field as text.
pub(crate) fn text_rows(messages: Vec<SimpleQueryMessage>) -> Vec<Row> {
    messages
        .into_iter()
        .filter_map(|message| match message {
            SimpleQueryMessage::Row(row) => Some(
                (0..row.len())
                    .map(|idx| Value::from(row.get(idx)))
                    .collect::<Row>(),
            ),
            _ => None,
        })
        .collect()
}

/// Text form of a value as bound to a `$n::text` parameter. The server parses
/// it with the input function of the column type, so bytes use the `bytea`
/// hex format.
pub(crate) fn text_param(value: &Value) -> Option<String> {
    match value {
        Value::Bytes(bytes) => {
            let mut text = String::with_capacity(2 + bytes.len() * 2);
            text.push_str("\\x");
            for byte in bytes {
                let _ = write!(text, "{byte:02x}");
            }
            Some(text)
        }
        other => other.to_text(),
    }
}

/// `::text::"schema"."type"` for one insert column.
pub(crate) fn cast_suffix(ty: &Type) -> String {
    format!(
        "::text::{}.{}",
        Postgres.quote_identifier(ty.schema()),
        Postgres.quote_identifier(ty.name())
    )
}

/// Strips trailing semicolons so the statement can be embedded in `DECLARE`.
pub(crate) fn bare_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_statement_drops_terminators() {
        assert_eq!(bare_statement(" SELECT 1 ;; \n"), "SELECT 1");
        assert_eq!(bare_statement("SELECT ';'"), "SELECT ';'");
    }

    #[test]
    fn params_keep_text_verbatim() {
        assert_eq!(text_param(&Value::from(r"it's a\b")).as_deref(), Some(r"it's a\b"));
        assert_eq!(text_param(&Value::Null), None);
        assert_eq!(text_param(&Value::Int(-4)).as_deref(), Some("-4"));
        assert_eq!(text_param(&Value::Bytes(vec![0, 255])).as_deref(), Some(r"\x00ff"));
    }

    #[test]
    fn casts_name_the_column_type() {
        assert_eq!(cast_suffix(&Type::INT8), r#"::text::"pg_catalog"."int8""#);
        assert_eq!(cast_suffix(&Type::VARCHAR), r#"::text::"pg_catalog"."varchar""#);
    }
}
