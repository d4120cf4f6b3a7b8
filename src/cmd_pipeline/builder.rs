use clap::Parser;
use tracing::trace_span;

use crate::abstract_store::{make_local_store, ErrorDetails, ErrorLayer, Result, StoreError};

use super::cmd_assemble_graph::AssembleGraphCommand;
use super::cmd_build_hierarchy::BuildHierarchyCommand;
use super::cmd_collect_mass::CollectMassCommand;
use super::cmd_schema_graph::SchemaGraphCommand;
use super::interface::{PipelineCommand, StorePipeline};
use super::parser::{Command, OutputFormat, ToolOpts};

pub fn fab_command_from_opts(opts: ToolOpts) -> Result<Box<dyn PipelineCommand + Send + Sync>> {
    match opts.cmd {
        Command::AssembleGraph(ag) => Ok(Box::new(AssembleGraphCommand { args: ag })),

        Command::BuildHierarchy(bh) => Ok(Box::new(BuildHierarchyCommand { args: bh })),

        Command::CollectMass(cm) => Ok(Box::new(CollectMassCommand { args: cm })),

        Command::SchemaGraph(sg) => Ok(Box::new(SchemaGraphCommand { args: sg })),
    }
}

/// Build a command pipeline from a shell-y string where we use pipe boundaries
/// to delineate the separate pipeline steps.
///
/// The shell-words module is used to parse `arg_str` into shell words, which we
/// then break into separate sub-commands whenever we see a `|`.  We then pass
/// these sub-commands to the clap parser, taking care to stuff our binary name
/// into the first arg.  The store and output format come from the first
/// segment; later segments may repeat `--store` (the env fallback makes that
/// the common case) but their values are ignored.
pub fn build_pipeline(bin_name: &str, arg_str: &str) -> Result<(StorePipeline, OutputFormat)> {
    let span = trace_span!("build_pipeline", arg_str);
    let _span_guard = span.enter();

    let all_args = match shell_words::split(arg_str) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(StoreError::StickyProblem(ErrorDetails {
                layer: ErrorLayer::BadInput,
                message: err.to_string(),
            }));
        }
    };

    let mut store = None;
    let mut output_format = OutputFormat::Concise;
    let mut first_time = true;

    let mut commands: Vec<Box<dyn PipelineCommand + Send + Sync>> = vec![];

    for arg_slices in all_args.split(|v| v == "|") {
        let mut fake_args = vec![bin_name.to_string()];
        fake_args.extend(arg_slices.iter().cloned());

        let opts = match ToolOpts::try_parse_from(fake_args) {
            Ok(opts) => opts,
            Err(err) => {
                return Err(StoreError::StickyProblem(ErrorDetails {
                    layer: ErrorLayer::BadInput,
                    message: err.to_string(),
                }));
            }
        };

        if first_time {
            store = Some(make_local_store(&opts.store)?);
            output_format = opts.output_format.clone();
            first_time = false;
        }

        commands.push(fab_command_from_opts(opts)?);
    }

    let store = match store {
        Some(store) => store,
        None => {
            return Err(StoreError::StickyProblem(ErrorDetails {
                layer: ErrorLayer::BadInput,
                message: "empty pipeline".to_string(),
            }));
        }
    };

    Ok((StorePipeline { store, commands }, output_format))
}
