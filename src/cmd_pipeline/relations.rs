use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::Value;

use super::vis_network::{VisEdge, VisEdgeColor, VisNetwork, VisNode, VisNodeFont};
use crate::abstract_store::{ErrorDetails, ErrorLayer, Result, StoreError};
use crate::cmd_pipeline::hierarchy::canonical_id;

/**
The table of relation-to-graph converters.

Each converter names the store tables it consumes and owns the bespoke
node-labeling logic for its entity types.  This is an explicit injected
table rather than anything registered globally: the assemble command looks
a converter up by name, fetches its tables, and hands the rows to a pure
build function.  Grouping maps are `BTreeMap` so output order is stable
for tests regardless of row order.
*/
pub struct RelationConverter {
    /// CLI-facing name.
    pub name: &'static str,
    /// Store tables the build function wants, in argument order.
    pub tables: &'static [&'static str],
    pub build: fn(&[Vec<Value>]) -> Result<VisNetwork>,
}

pub const RELATION_CONVERTERS: &[RelationConverter] = &[
    RelationConverter {
        name: "album-artist",
        tables: &["music_album_x_music_artist"],
        build: build_album_artist,
    },
    RelationConverter {
        name: "artist-person",
        tables: &["music_artist_x_person"],
        build: build_artist_person,
    },
    RelationConverter {
        name: "album-person",
        tables: &["music_album_x_person", "music_album_x_music_artist"],
        build: build_album_person,
    },
    RelationConverter {
        name: "person-song",
        tables: &["person_x_song", "music_artist_x_song"],
        build: build_person_song,
    },
    RelationConverter {
        name: "person-performance",
        tables: &[
            "person_x_song_performance",
            "music_artist_x_song_performance",
        ],
        build: build_person_performance,
    },
];

pub fn lookup_converter(name: &str) -> Result<&'static RelationConverter> {
    RELATION_CONVERTERS
        .iter()
        .find(|converter| converter.name == name)
        .ok_or_else(|| {
            StoreError::NotFound(ErrorDetails {
                layer: ErrorLayer::BadInput,
                message: format!(
                    "unknown relation '{}' (known: {})",
                    name,
                    RELATION_CONVERTERS
                        .iter()
                        .map(|converter| converter.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
        })
}

fn bad_row_err(message: String) -> StoreError {
    StoreError::StickyProblem(ErrorDetails {
        layer: ErrorLayer::DataLayer,
        message,
    })
}

/// The related entity embedded in a relation row, like the `music_artist`
/// object on a `music_artist_x_person` row.
fn related<'a>(row: &'a Value, key: &str) -> Result<&'a Value> {
    row.get(key)
        .filter(|val| val.is_object())
        .ok_or_else(|| bad_row_err(format!("relation row lacks related '{}'", key)))
}

fn entity_id(entity: &Value) -> Result<String> {
    entity
        .get("id")
        .and_then(canonical_id)
        .ok_or_else(|| bad_row_err("related entity lacks usable 'id'".to_string()))
}

fn entity_str<'a>(entity: &'a Value, key: &str) -> Option<&'a str> {
    entity.get(key).and_then(Value::as_str)
}

pub fn music_artist_node(artist: &Value) -> Result<VisNode> {
    let pk = entity_id(artist)?;
    Ok(VisNode {
        id: format!("music_artist-{}", pk),
        label: entity_str(artist, "name").unwrap_or_default().to_string(),
        group: "music_artist".to_string(),
        font: Some(VisNodeFont {
            size: Some(30),
            ..VisNodeFont::default()
        }),
        ..VisNode::default()
    })
}

pub fn person_node(person: &Value) -> Result<VisNode> {
    let pk = entity_id(person)?;
    let label = entity_str(person, "preferred_name")
        .or_else(|| entity_str(person, "full_name"))
        .unwrap_or_default();
    Ok(VisNode {
        id: format!("person-{}", pk),
        label: label.to_string(),
        group: "person".to_string(),
        ..VisNode::default()
    })
}

/// Group one side of a relation table by the other side's id:
/// `music_album_x_music_artist` grouped on `music_album` yields
/// album-id -> the artist entities that share it.
fn group_by_related<'a>(
    rows: &'a [Value],
    group_key: &str,
    collect_key: &str,
) -> Result<BTreeMap<String, Vec<&'a Value>>> {
    let mut grouped: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for row in rows {
        let group_id = entity_id(related(row, group_key)?)?;
        grouped
            .entry(group_id)
            .or_insert_with(Vec::new)
            .push(related(row, collect_key)?);
    }
    Ok(grouped)
}

/// Networks where two or more artists worked on an album together.
fn build_album_artist(tables: &[Vec<Value>]) -> Result<VisNetwork> {
    let mut network = VisNetwork::new();
    let album_to_artists = group_by_related(&tables[0], "music_album", "music_artist")?;
    for artists in album_to_artists.values() {
        for (artist_a, artist_b) in artists.iter().tuple_combinations() {
            let node_a = music_artist_node(artist_a)?;
            let node_b = music_artist_node(artist_b)?;
            let (from, to) = (node_a.id.clone(), node_b.id.clone());
            network.add_node(node_a);
            network.add_node(node_b);
            network.add_edge(
                VisEdge {
                    from_: from,
                    to,
                    width: Some(2),
                    ..VisEdge::default()
                },
                false,
            );
        }
    }
    Ok(network)
}

/// Direct artist membership: person -> artist, dashed once inactive.
fn build_artist_person(tables: &[Vec<Value>]) -> Result<VisNetwork> {
    let mut network = VisNetwork::new();
    for row in &tables[0] {
        let artist_node = music_artist_node(related(row, "music_artist")?)?;
        let person = person_node(related(row, "person")?)?;
        let dashes = match row.get("is_active") {
            Some(Value::Bool(false)) => Some(true),
            _ => None,
        };
        let (from, to) = (person.id.clone(), artist_node.id.clone());
        network.add_node(artist_node);
        network.add_node(person);
        network.add_edge(
            VisEdge {
                from_: from,
                to,
                dashes,
                width: Some(3),
                ..VisEdge::default()
            },
            false,
        );
    }
    Ok(network)
}

/// Person -> artist edges through a shared intermediate entity: the persons
/// are grouped per intermediate from the first table, the artists come from
/// the second.
fn build_via_shared(
    tables: &[Vec<Value>],
    via_key: &str,
    edge_color: &str,
    length: Option<u32>,
) -> Result<VisNetwork> {
    let mut network = VisNetwork::new();
    let via_to_persons = group_by_related(&tables[0], via_key, "person")?;
    for row in &tables[1] {
        let via_id = entity_id(related(row, via_key)?)?;
        let persons = match via_to_persons.get(&via_id) {
            Some(persons) => persons,
            None => continue,
        };
        let artist_node = music_artist_node(related(row, "music_artist")?)?;
        let artist_id = artist_node.id.clone();
        network.add_node(artist_node);
        for person in persons {
            let person = person_node(person)?;
            let from = person.id.clone();
            network.add_node(person);
            network.add_edge(
                VisEdge {
                    from_: from,
                    to: artist_id.clone(),
                    color: Some(VisEdgeColor {
                        color: Some(edge_color.to_string()),
                        ..VisEdgeColor::default()
                    }),
                    length,
                    ..VisEdge::default()
                },
                false,
            );
        }
    }
    Ok(network)
}

fn build_album_person(tables: &[Vec<Value>]) -> Result<VisNetwork> {
    build_via_shared(tables, "music_album", "66FF66", Some(600))
}

fn build_person_song(tables: &[Vec<Value>]) -> Result<VisNetwork> {
    build_via_shared(tables, "song", "2266FF", Some(600))
}

fn build_person_performance(tables: &[Vec<Value>]) -> Result<VisNetwork> {
    build_via_shared(tables, "song_performance", "6688FF", None)
}
