use async_trait::async_trait;
use clap::Args;

use super::hierarchy::{build_hierarchy, HierarchyConfig, OrphanPolicy};
use super::interface::{PipelineCommand, PipelineValues};

use crate::abstract_store::{AbstractStore, Result};

/// Reconstruct the parent/child forest of a self-referential table,
/// annotating every reachable record with its depth.
#[derive(Debug, Args)]
pub struct BuildHierarchy {
    /// Table whose rows reference each other.
    pub table: String,

    /// Field holding each row's unique identifier.
    #[clap(long, default_value = "id")]
    pub id_key: String,

    /// Field referencing the parent row; null marks a root.
    #[clap(long, default_value = "parent_id")]
    pub parent_key: String,

    /// Output field for the nested child list.
    #[clap(long, default_value = "children")]
    pub child_key: String,

    /// Output field for the computed depth.
    #[clap(long, default_value = "depth")]
    pub depth_key: String,

    /// Re-root the forest at this record instead of the natural roots; the
    /// record also gains an upward parent chain.
    #[clap(long)]
    pub root: Option<String>,

    /// Emit the flat BFS-ordered list instead of the nested forest.
    #[clap(long)]
    pub flat: bool,

    /// What to do with records whose parent never shows up.
    #[clap(long, value_enum, default_value = "drop")]
    pub orphans: OrphanPolicy,
}

#[derive(Debug)]
pub struct BuildHierarchyCommand {
    pub args: BuildHierarchy,
}

#[async_trait]
impl PipelineCommand for BuildHierarchyCommand {
    async fn execute(
        &self,
        store: &Box<dyn AbstractStore + Send + Sync>,
        _input: PipelineValues,
    ) -> Result<PipelineValues> {
        let rows = store.fetch_table(&self.args.table).await?;
        let forest = build_hierarchy(
            rows,
            HierarchyConfig {
                id_key: self.args.id_key.clone(),
                parent_key: self.args.parent_key.clone(),
                child_key: self.args.child_key.clone(),
                depth_key: self.args.depth_key.clone(),
                root_id: self.args.root.clone(),
                flatten: self.args.flat,
                orphan_policy: self.args.orphans,
            },
        )?;
        Ok(PipelineValues::HierarchyForest(forest))
    }
}
