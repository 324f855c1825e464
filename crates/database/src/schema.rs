use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// Trait to define the schema of a database object for PostgreSQL.
///
/// Every persisted type carries its own DDL so that `init_databases!` can
/// bootstrap the tables, triggers and indexes in registration order.
pub trait SqlxSchema:
    for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + Clone + std::fmt::Debug
{
    /// The name of the database table.
    const TABLE_NAME: &'static str;
    /// The name of the primary key column.
    const ID_COLUMN_NAME: &'static str;
    /// Index statements applied after table creation.
    const INDEXES_SQL: &'static [&'static str];

    fn table_name() -> &'static str { Self::TABLE_NAME }
    fn id_column_name() -> &'static str { Self::ID_COLUMN_NAME }
    fn indexes_sql() -> &'static [&'static str] { Self::INDEXES_SQL }

    /// Generates the SQL query string for creating the table.
    fn create_table_sql() -> String;

    /// Generates the SQL query string for dropping the table.
    fn drop_table_sql() -> String;

    /// Trigger statements keeping `updated_at` fresh; empty when the table
    /// has no such column.
    fn trigger_sql() -> String;
}

/// Standard `updated_at` maintenance trigger for a table, paired with the
/// `set_updated_at_unix_timestamp()` helper installed by `init_databases!`.
pub fn updated_at_trigger_sql(table: &str) -> String {
    format!(
        "DROP TRIGGER IF EXISTS set_updated_at_on_{table} ON {table};\
         CREATE TRIGGER set_updated_at_on_{table} BEFORE UPDATE ON {table} \
         FOR EACH ROW EXECUTE FUNCTION set_updated_at_unix_timestamp();"
    )
}
