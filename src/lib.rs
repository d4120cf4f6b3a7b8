extern crate serde;
extern crate serde_json;

pub mod abstract_store;
pub mod cmd_pipeline;
pub mod logging;
pub mod utils;
