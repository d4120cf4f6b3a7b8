use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use serde_json::{from_str, Value};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::store_interface::{
    AbstractStore, ErrorDetails, ErrorLayer, Result, SchemaDescription, StoreError,
};

/// IO errors are almost always a missing or unreadable table file, which is a
/// sticky problem for this store state.
impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> StoreError {
        StoreError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::StoreLayer,
            message: err.to_string(),
        })
    }
}

/// Read newline-delimited JSON that's been gzip-compressed.
///
/// We read the entirety to a buffer because
/// https://github.com/serde-rs/json/issues/160 suggests that the buffered
/// reader performance is likely to be much worse.
async fn read_gzipped_ndjson_from_file(path: &str) -> Result<Vec<Value>> {
    let mut f = File::open(path).await?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer).await?;

    let mut gz = GzDecoder::new(&buffer[..]);

    let mut raw_str = String::new();
    gz.read_to_string(&mut raw_str)?;

    raw_str
        .lines()
        .map(|s| from_str(s).map_err(StoreError::from))
        .collect()
}

/// Store over an on-disk export: `tables/{name}.ndjson.gz` for rows,
/// `schema.json` for the schema description.
#[derive(Debug)]
struct LocalStore {
    root: PathBuf,
}

#[async_trait]
impl AbstractStore for LocalStore {
    async fn fetch_table(&self, table: &str) -> Result<Vec<Value>> {
        let full_path = self.root.join("tables").join(format!("{}.ndjson.gz", table));
        if !full_path.is_file() {
            return Err(StoreError::NotFound(ErrorDetails {
                layer: ErrorLayer::DataLayer,
                message: format!("no such table: {}", table),
            }));
        }
        read_gzipped_ndjson_from_file(&full_path.to_string_lossy()).await
    }

    async fn fetch_schema(&self) -> Result<SchemaDescription> {
        let full_path = self.root.join("schema.json");
        if !full_path.is_file() {
            return Err(StoreError::NotFound(ErrorDetails {
                layer: ErrorLayer::DataLayer,
                message: "store has no schema.json".to_string(),
            }));
        }
        let mut f = File::open(full_path).await?;
        let mut raw_str = String::new();
        f.read_to_string(&mut raw_str).await?;
        let schema: SchemaDescription = from_str(&raw_str)?;
        Ok(schema)
    }
}

pub fn make_local_store(root: &str) -> Result<Box<dyn AbstractStore + Send + Sync>> {
    let root = PathBuf::from(root);
    if !root.is_dir() {
        return Err(StoreError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::BadInput,
            message: format!("bad store root: {}", root.display()),
        }));
    }
    Ok(Box::new(LocalStore { root }))
}
