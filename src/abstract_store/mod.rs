mod local_store;
mod store_interface;

pub use local_store::make_local_store;
pub use store_interface::{
    AbstractStore, ErrorDetails, ErrorLayer, RelationField, RelationKind, Result,
    SchemaDescription, StoreError, TableDescription,
};
