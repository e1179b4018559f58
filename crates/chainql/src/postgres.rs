//! PostgreSQL driver over `tokio-postgres`.
//!
//! Statements are sent with the simple query protocol: the builder produces
//! fully interpolated SQL, and rows come back as text, which is exactly what
//! [`Row`] holds.
//!
//! ```ignore
//! let client = chainql::postgres::connect(&std::env::var("DATABASE_URL")?).await?;
//! let mut qb = QueryBuilder::new(client);
//! qb.where_eq("id", 1).get_from("users").await?;
//! ```

use crate::driver::{Driver, RawResult};
use crate::error::{DbError, DbResult};
use crate::escape::{double_quote, escape_quote_doubling};
use crate::row::Row;
use tokio_postgres::{NoTls, SimpleQueryMessage, SimpleQueryRow};

/// Open a connection without TLS and drive it on a background task.
pub async fn connect(database_url: &str) -> DbResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            #[cfg(feature = "tracing")]
            tracing::error!(target: "chainql.postgres", error = %e, "connection closed with error");
            #[cfg(not(feature = "tracing"))]
            eprintln!("[chainql] connection closed with error: {e}");
        }
    });

    Ok(client)
}

/// Run `sql` on `client` and collect the outcome.
///
/// A statement that describes columns is a row result even when it matched
/// nothing; otherwise the last command tag's row count is reported.
pub(crate) async fn simple_execute(
    client: &tokio_postgres::Client,
    sql: &str,
) -> DbResult<RawResult> {
    let messages = client
        .simple_query(sql)
        .await
        .map_err(DbError::from_db_error)?;

    let mut rows = Vec::new();
    let mut returns_rows = false;
    let mut affected = 0;
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(_) => returns_rows = true,
            SimpleQueryMessage::Row(row) => {
                returns_rows = true;
                rows.push(text_row(&row)?);
            }
            SimpleQueryMessage::CommandComplete(count) => affected = count,
            _ => {}
        }
    }

    if returns_rows {
        Ok(RawResult::rows(rows))
    } else {
        Ok(RawResult::Done(affected))
    }
}

fn text_row(row: &SimpleQueryRow) -> DbResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = row
            .try_get(idx)
            .map_err(|e| DbError::decode(column.name(), e.to_string()))?;
        out.push(column.name(), value.map(str::to_string));
    }
    Ok(out)
}

impl Driver for tokio_postgres::Client {
    async fn execute(&self, sql: &str) -> DbResult<RawResult> {
        simple_execute(self, sql).await
    }

    fn escape(&self, value: &str) -> String {
        escape_quote_doubling(value)
    }

    fn quote_identifier(&self, column: &str) -> String {
        double_quote(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryBuilder;

    #[test]
    fn postgres_dialect_rendering() {
        // Rendering only needs the dialect rules, not a live connection.
        fn assert_driver<D: Driver>() {}
        assert_driver::<tokio_postgres::Client>();

        assert_eq!(escape_quote_doubling("O'Brien"), "O''Brien");
        assert_eq!(double_quote("order"), "\"order\"");
    }

    #[tokio::test]
    async fn select_roundtrip_when_database_is_available() -> DbResult<()> {
        let _ = dotenvy::dotenv();
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is not set; skipping select_roundtrip_when_database_is_available");
            return Ok(());
        };

        let client = connect(&database_url).await?;
        let mut qb = QueryBuilder::new(client);

        let mut cursor = qb
            .query("SELECT 1 AS one, NULL AS nothing, 'it''s' AS quoted")
            .await?
            .into_cursor()
            .ok_or_else(|| DbError::not_found("expected one row"))?;
        let row = cursor.row_at(0)?;
        assert_eq!(row.get("one"), Some("1"));
        assert_eq!(row.get("nothing"), None);
        assert!(row.contains("nothing"));
        assert_eq!(row.get("quoted"), Some("it's"));

        let outcome = qb.query("SELECT 1 WHERE false").await?;
        assert!(matches!(outcome, crate::builder::Outcome::Empty));
        Ok(())
    }
}
