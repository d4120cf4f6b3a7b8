pub mod builder;
pub mod hierarchy;
pub mod interface;
pub mod parser;
pub mod relations;
pub mod vis_network;

mod cmd_assemble_graph;
mod cmd_build_hierarchy;
mod cmd_collect_mass;
mod cmd_schema_graph;

pub use builder::build_pipeline;
pub use interface::{PipelineCommand, PipelineValues};
