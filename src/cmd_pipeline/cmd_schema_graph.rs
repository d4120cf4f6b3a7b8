use async_trait::async_trait;
use clap::Args;

use super::interface::{PipelineCommand, PipelineValues};
use super::vis_network::{VisEdge, VisEdgeColor, VisNetwork, VisNode};

use crate::abstract_store::{AbstractStore, RelationKind, Result};

/// Build the type-level graph of the store itself: one node per table, one
/// edge per relation field, weighted by how often each table is referenced.
#[derive(Debug, Args)]
pub struct SchemaGraph {}

#[derive(Debug)]
pub struct SchemaGraphCommand {
    pub args: SchemaGraph,
}

fn relation_edge(from: &str, field_to: &str, kind: RelationKind) -> VisEdge {
    let mut edge = VisEdge {
        from_: from.to_string(),
        to: field_to.to_string(),
        ..VisEdge::default()
    };
    match kind {
        RelationKind::OneToOne => {
            edge.color = Some(VisEdgeColor {
                color: Some("CC5555".to_string()),
                opacity: Some(0.9),
                ..VisEdgeColor::default()
            });
        }
        RelationKind::ManyToMany => {
            edge.color = Some(VisEdgeColor {
                color: Some("8888FF".to_string()),
                opacity: Some(0.6),
                ..VisEdgeColor::default()
            });
            edge.length = Some(400);
            edge.smooth = Some(false);
        }
        RelationKind::ForeignKey => {}
    }
    edge
}

#[async_trait]
impl PipelineCommand for SchemaGraphCommand {
    async fn execute(
        &self,
        store: &Box<dyn AbstractStore + Send + Sync>,
        _input: PipelineValues,
    ) -> Result<PipelineValues> {
        let schema = store.fetch_schema().await?;
        let mut network = VisNetwork::new();

        for table in &schema.tables {
            network.add_node(VisNode {
                id: table.name.clone(),
                label: table.object.clone(),
                group: table.group.clone(),
                mass: Some(1),
                value: Some(1),
                ..VisNode::default()
            });
            for field in &table.relations {
                // A table can reference the same target through several
                // fields, so parallel edges are wanted here.
                network.add_edge(relation_edge(&table.name, &field.to, field.kind), true);
            }
        }

        // In-degree becomes the extra mass on every referenced table.
        network.collect_mass(true);

        Ok(PipelineValues::VisNetwork(network))
    }
}
