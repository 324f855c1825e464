mod postgres_connect;
mod schema;

pub use schema::{updated_at_trigger_sql, SqlxSchema};
