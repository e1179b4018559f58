//! Convenient imports for typical `chainql` usage.
//!
//! ```ignore
//! use chainql::prelude::*;
//! ```

pub use crate::{
    DbError, DbResult, Driver, Fields, Filter, FromRow, Outcome, QueryBuilder, ResultCursor, Row,
    RowExt,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
