//! # chainql
//!
//! A fluent SQL statement accumulator.
//!
//! ## Features
//!
//! - **Chained clauses**: `select`, `from`, `join`, `and_where`/`or_where`,
//!   `group_by`, `having`, `order_by`, `limit` build up one statement
//! - **Verbatim overrides**: text that starts with a clause's keyword replaces the clause
//! - **Reusable builder**: every terminal call (`get`, `insert`, `update`, `delete`) resets state
//! - **Escaping through the driver**: values are escaped by the [`Driver`] they run on
//! - **Cursor results**: [`ResultCursor`] drains a row handle once and navigates the buffer
//! - **Hooks**: observe every executed statement and optionally refuse it
//!
//! ## Example
//!
//! ```ignore
//! use chainql::{Filter, QueryBuilder};
//!
//! let client = chainql::postgres::connect(&database_url).await?;
//! let mut qb = QueryBuilder::new(client);
//!
//! // SELECT * FROM users WHERE "age" >= '30' ORDER BY name ASC LIMIT 10
//! let users = qb
//!     .and_where(Filter::cmp("age", ">=", 30))
//!     .order_by("name", Some("asc"))
//!     .limit(10)
//!     .get_from("users")
//!     .await?;
//!
//! // INSERT INTO users (name,age) VALUES ('Ann','30')
//! qb.set("name", "Ann").set("age", 30).insert_into("users").await?;
//!
//! // UPDATE users SET age = '31' WHERE "name" = 'Ann'
//! qb.set("age", 31).where_eq("name", "Ann").update_table("users").await?;
//!
//! // DELETE FROM users WHERE "name" = 'Ann'
//! qb.where_eq("name", "Ann").delete_from("users").await?;
//! ```

pub mod builder;
pub mod clause;
pub mod config;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod escape;
pub mod fields;
pub mod filter;
pub mod hook;
pub mod memory;
pub mod postgres;
pub mod prelude;
pub mod row;

pub use builder::{Aggregate, Outcome, QueryBuilder};
pub use clause::{Clause, Clauses, Fragment, Joiner, Keyword};
pub use config::{BuilderConfig, DangerousDmlPolicy, SqlPolicy};
pub use cursor::ResultCursor;
pub use driver::{Driver, RawResult, RawRows, VecRows};
pub use error::{DbError, DbResult};
pub use fields::Fields;
pub use filter::{Conjunction, Filter};
pub use hook::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};
pub use memory::MemoryDriver;
pub use row::{FromRow, Row, RowExt};

#[cfg(feature = "tracing")]
pub use hook::TracingSqlHook;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
