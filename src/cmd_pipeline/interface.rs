use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::to_string_pretty;
use tracing::{trace, trace_span, Instrument};

pub use crate::abstract_store::{AbstractStore, Result};

use super::hierarchy::HierarchyForest;
use super::vis_network::VisNetwork;

/// The input and output of each pipeline segment.
#[derive(Serialize)]
pub enum PipelineValues {
    HierarchyForest(HierarchyForest),
    VisNetwork(VisNetwork),
    Void,
}

/// A command that takes a single input and produces a single output.  At the
/// start of the pipeline, the input may be ignored / expected to be void.
#[async_trait]
pub trait PipelineCommand: Debug {
    async fn execute(
        &self,
        store: &Box<dyn AbstractStore + Send + Sync>,
        input: PipelineValues,
    ) -> Result<PipelineValues>;
}

/// Multiple-use linear pipeline sequence.
pub struct StorePipeline {
    pub store: Box<dyn AbstractStore + Send + Sync>,
    pub commands: Vec<Box<dyn PipelineCommand + Send + Sync>>,
}

impl StorePipeline {
    pub async fn run(&self, traced: bool) -> Result<PipelineValues> {
        let mut cur_values = PipelineValues::Void;

        for cmd in &self.commands {
            let span = trace_span!("run_pipeline_step", cmd = ?cmd);

            match cmd
                .execute(&self.store, cur_values)
                .instrument(span.clone())
                .await
            {
                Ok(next_values) => {
                    cur_values = next_values;
                }
                Err(err) => {
                    trace!(err = ?err);
                    return Err(err);
                }
            }

            let _span_guard = span.entered();
            if traced {
                let value_str = to_string_pretty(&cur_values).unwrap();
                trace!(output_json = %value_str);
            }
        }

        Ok(cur_values)
    }
}
