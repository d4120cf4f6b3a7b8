use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, StoreError>;

// JSON parse errors are sticky data problems.
impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> StoreError {
        StoreError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

/// Express whether the error seems to be happening in the store or the data.
#[derive(Debug)]
pub enum ErrorLayer {
    /// The request itself has structural issues, like a pipeline string that
    /// doesn't parse or a relation name that no converter claims.  This should
    /// not be used for cases where well-formed input simply matches nothing.
    BadInput,
    /// The error seems to involve store plumbing, like an unreadable table
    /// file, so it may or may not be an issue with the underlying data.
    StoreLayer,
    /// The error seems to be related to the stored rows themselves, like a
    /// record that lacks its id field.
    DataLayer,
    /// We're not sure if it was a store issue or a data issue.
    UnknownLayer,
}

/// StoreError payload to provide details about what went wrong for
/// investigation purposes.  In the future, this could wrap the
/// underlying errors we've seen.
#[derive(Debug)]
pub struct ErrorDetails {
    /// Attempt to distinguish failures due to store bugs from failures due to
    /// bad data.
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

/// Unified error type for everything downstream of the store boundary.
///
/// The sticky/transient split mirrors whether a retry could make sense; no
/// layer in this crate actually retries, but callers embedding the pipeline
/// may want to make that call themselves.
#[derive(Debug)]
pub enum StoreError {
    /// A lookup miss on something the caller named explicitly: a `--root` id
    /// that is in no row, a table file that doesn't exist.  Reported
    /// distinctly because these are the only failures the core algorithms
    /// promise to surface.
    NotFound(ErrorDetails),
    /// An error that will persist for at least this store state.
    StickyProblem(ErrorDetails),
    /// An error that might go away if retried later.
    TransientProblem(ErrorDetails),
}

/// How wide a relation field fans out; drives edge styling in the schema
/// graph.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ForeignKey,
    OneToOne,
    ManyToMany,
}

/// One relation-bearing field on a table, pointing at another table by
/// qualified name.
#[derive(Clone, Debug, Deserialize)]
pub struct RelationField {
    pub to: String,
    pub kind: RelationKind,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TableDescription {
    /// Qualified name, like `core.MusicAlbum`; unique across the schema.
    pub name: String,
    /// Bare object name used as the display label.
    pub object: String,
    /// Grouping tag, like the owning app label.
    pub group: String,
    #[serde(default)]
    pub relations: Vec<RelationField>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableDescription>,
}

/// Unified exposure for interacting with a relational snapshot.  The current
/// implementation is a directory of exported table files, but the trait is
/// what the pipeline commands are written against, so a server-backed store
/// can slot in without touching the algorithms.
#[async_trait]
pub trait AbstractStore {
    /// Retrieve every row of the named table as JSON objects.  Row order is
    /// whatever the export produced; the consuming algorithms must not depend
    /// on it beyond preserving it.
    async fn fetch_table(&self, table: &str) -> Result<Vec<Value>>;

    /// Retrieve the table/relation-field description of the whole store.
    async fn fetch_schema(&self) -> Result<SchemaDescription>;
}
