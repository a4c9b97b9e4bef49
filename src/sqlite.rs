//! SQLite engine handle: typed parameters, schema bootstrap and statement execution.

use std::collections::HashMap;

use futures::lock::Mutex;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, OptionalExtension, Result, Row, ToSql};
use tracing::debug;

use crate::error::StoreError;

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl ToSql for Value {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(v) => ToSqlOutput::from(*v),
            Value::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Named parameter bindings for SQL queries.
///
/// Names are stored with their `:` prefix so they match the placeholders in the statement.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: HashMap<String, Value>,
}

impl Params {
    /// Create a new Params object
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = if name.starts_with(':') {
            name.to_string()
        } else {
            format!(":{name}")
        };
        self.values.insert(name, value.into());
        self
    }

    fn bind(&self) -> Vec<(&str, &dyn ToSql)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

/// SQL Query with typed parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Params,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Params::new(),
        }
    }

    /// Shorthand for adding one named parameter.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params = self.params.with_value(name, value);
        self
    }
}

/// Schema definition for the SQLite database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// DDL creating every table that does not exist yet.
    pub fn create_statements(&self) -> String {
        self.tables
            .iter()
            .map(TableDefinition::create_statement)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn create_statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDefinition::to_sql)
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({});", self.name, columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
    pub default_value: Option<DefaultValue>,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraints: Vec::new(),
            default_value: None,
        }
    }

    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_default(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        if let Some(default_value) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default_value.to_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType {
    Integer,
    Text,
}

impl DataType {
    fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
        }
    }
}

/// Column constraints, rendered in declaration order.
///
/// `AutoIncrement` is only valid right after `PrimaryKey` on an INTEGER column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnConstraint {
    PrimaryKey,
    AutoIncrement,
    NotNull,
}

impl ColumnConstraint {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::AutoIncrement => "AUTOINCREMENT",
            ColumnConstraint::NotNull => "NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Text(String),
}

impl DefaultValue {
    fn to_sql(&self) -> String {
        match self {
            DefaultValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }
}

/// SQLite Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteConfig {
    /// Path to the SQLite database file
    pub db_path: String,
    /// Schema definition for the database
    pub schema: Schema,
}

impl SqliteConfig {
    /// Create a new SQLite config with path and schema
    pub fn new(db_path: impl Into<String>, schema: Schema) -> Self {
        Self {
            db_path: db_path.into(),
            schema,
        }
    }
}

/// Owner of the single SQLite connection.
///
/// The connection is closed when the service is dropped; [`SqliteService::close`]
/// does the same but reports failures.
pub struct SqliteService {
    config: SqliteConfig,
    connection: Mutex<Connection>,
}

impl SqliteService {
    /// Open (or create) the database file and bootstrap the configured schema.
    pub fn open(config: SqliteConfig) -> std::result::Result<Self, StoreError> {
        debug!(path = %config.db_path, "opening sqlite database");
        let connection = Connection::open(&config.db_path).map_err(|source| StoreError::Open {
            path: config.db_path.clone(),
            source,
        })?;
        Self::with_connection(config, connection)
    }

    /// Private in-memory database, gone once the service is dropped.
    pub fn open_in_memory(schema: Schema) -> std::result::Result<Self, StoreError> {
        let config = SqliteConfig::new(":memory:", schema);
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: config.db_path.clone(),
            source,
        })?;
        Self::with_connection(config, connection)
    }

    fn with_connection(
        config: SqliteConfig,
        connection: Connection,
    ) -> std::result::Result<Self, StoreError> {
        initialize_schema(&connection, &config.schema)
            .map_err(StoreError::persistence("initialize schema"))?;
        Ok(Self {
            config,
            connection: Mutex::new(connection),
        })
    }

    /// Run a statement and return the number of rows it changed.
    pub async fn execute(&self, query: &SqlQuery) -> Result<usize> {
        let conn = self.connection.lock().await;
        debug!(statement = %query.statement, "execute");
        conn.execute(&query.statement, query.params.bind().as_slice())
    }

    /// Run an INSERT and return the rowid it produced.
    ///
    /// The rowid is read under the same lock as the insert.
    pub async fn insert(&self, query: &SqlQuery) -> Result<i64> {
        let conn = self.connection.lock().await;
        debug!(statement = %query.statement, "insert");
        conn.execute(&query.statement, query.params.bind().as_slice())?;
        Ok(conn.last_insert_rowid())
    }

    /// Run a query and map every returned row.
    pub async fn query_map<T, F>(&self, query: &SqlQuery, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> Result<T> + Send,
        T: Send,
    {
        let conn = self.connection.lock().await;
        debug!(statement = %query.statement, "query");
        let mut stmt = conn.prepare(&query.statement)?;
        let rows = stmt.query_map(query.params.bind().as_slice(), map)?;
        rows.collect()
    }

    /// Run a query expected to return at most one row.
    pub async fn query_one<T, F>(&self, query: &SqlQuery, map: F) -> Result<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> Result<T> + Send,
        T: Send,
    {
        let conn = self.connection.lock().await;
        debug!(statement = %query.statement, "query one");
        conn.query_row(&query.statement, query.params.bind().as_slice(), map)
            .optional()
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> std::result::Result<(), StoreError> {
        debug!(path = %self.config.db_path, "closing sqlite database");
        self.connection
            .into_inner()
            .close()
            .map_err(|(_, source)| StoreError::Persistence {
                context: "close database",
                source,
            })
    }
}

fn initialize_schema(conn: &Connection, schema: &Schema) -> Result<()> {
    conn.execute_batch(&schema.create_statements())
}
