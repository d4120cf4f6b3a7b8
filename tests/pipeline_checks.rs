use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, to_value, Value};

use relviz::abstract_store::StoreError;
use relviz::cmd_pipeline::{build_pipeline, PipelineValues};
use relviz::utils::temp_dir::TempDir;

/// Write rows as a gzipped newline-delimited JSON table file, the layout the
/// local store reads.
fn write_table(root: &TempDir, table: &str, rows: &Value) {
    let tables_dir = root.join("tables");
    fs::create_dir_all(&tables_dir).unwrap();
    let file = fs::File::create(tables_dir.join(format!("{}.ndjson.gz", table))).unwrap();
    let mut gz = GzEncoder::new(file, Compression::default());
    for row in rows.as_array().unwrap() {
        writeln!(gz, "{}", row).unwrap();
    }
    gz.finish().unwrap();
}

fn write_schema(root: &TempDir, schema: &Value) {
    fs::write(root.join("schema.json"), schema.to_string()).unwrap();
}

async fn run_pipeline(root: &TempDir, cmd: &str) -> relviz::abstract_store::Result<PipelineValues> {
    let arg_str = format!("--store {} {}", root.display(), cmd);
    let (pipeline, _format) = build_pipeline("relviz-tool", &arg_str)?;
    pipeline.run(false).await
}

async fn run_to_json(root: &TempDir, cmd: &str) -> Value {
    match run_pipeline(root, cmd).await.unwrap() {
        PipelineValues::HierarchyForest(forest) => forest.to_value(),
        PipelineValues::VisNetwork(network) => network.to_presentation(),
        PipelineValues::Void => to_value("void").unwrap(),
    }
}

fn account_rows() -> Value {
    json!([
        {"id": 1, "parent_account_id": null, "name": "a"},
        {"id": 2, "parent_account_id": 1, "name": "aa"},
        {"id": 3, "parent_account_id": 2, "name": "aaa"},
    ])
}

#[tokio::test]
async fn build_hierarchy_nests_account_forest() {
    let root = TempDir::new("relviz-check-hierarchy");
    write_table(&root, "account", &account_rows());

    let result = run_to_json(
        &root,
        "build-hierarchy account --parent-key parent_account_id",
    )
    .await;
    assert_eq!(
        result,
        json!([
            {"id": 1, "parent_account_id": null, "name": "a", "depth": 1, "children": [
                {"id": 2, "parent_account_id": 1, "name": "aa", "depth": 2, "children": [
                    {"id": 3, "parent_account_id": 2, "name": "aaa", "depth": 3, "children": []},
                ]},
            ]},
        ])
    );
}

#[tokio::test]
async fn build_hierarchy_reroot_and_flat() {
    let root = TempDir::new("relviz-check-reroot");
    write_table(&root, "account", &account_rows());

    let rerooted = run_to_json(
        &root,
        "build-hierarchy account --parent-key parent_account_id --root 2",
    )
    .await;
    assert_eq!(
        rerooted,
        json!([
            {
                "id": 2, "parent_account_id": 1, "name": "aa", "depth": 1,
                "children": [
                    {"id": 3, "parent_account_id": 2, "name": "aaa", "depth": 2, "children": []},
                ],
                "parent_account": {"id": 1, "parent_account_id": null, "name": "a"},
            },
        ])
    );

    let flat = run_to_json(
        &root,
        "build-hierarchy account --parent-key parent_account_id --flat",
    )
    .await;
    assert_eq!(
        flat,
        json!([
            {"id": 1, "parent_account_id": null, "name": "a", "depth": 1, "children": [2]},
            {"id": 2, "parent_account_id": 1, "name": "aa", "depth": 2, "children": [3]},
            {"id": 3, "parent_account_id": 2, "name": "aaa", "depth": 3, "children": []},
        ])
    );
}

#[tokio::test]
async fn build_hierarchy_missing_root_errors() {
    let root = TempDir::new("relviz-check-missing-root");
    write_table(&root, "account", &account_rows());

    let result = run_pipeline(
        &root,
        "build-hierarchy account --parent-key parent_account_id --root 999",
    )
    .await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn assemble_graph_merges_relations_and_collects_mass() {
    let root = TempDir::new("relviz-check-assemble");
    write_table(
        &root,
        "music_artist_x_person",
        &json!([
            {"music_artist": {"id": 1, "name": "Ables"},
             "person": {"id": 5, "preferred_name": "Ann"},
             "is_active": true},
            {"music_artist": {"id": 1, "name": "Ables"},
             "person": {"id": 6, "preferred_name": "Bea"},
             "is_active": false},
        ]),
    );
    write_table(
        &root,
        "music_album_x_music_artist",
        &json!([
            {"music_album": {"id": 1, "title": "Split"},
             "music_artist": {"id": 1, "name": "Ables"}},
            {"music_album": {"id": 1, "title": "Split"},
             "music_artist": {"id": 2, "name": "Bakers"}},
        ]),
    );

    let result = run_to_json(
        &root,
        "assemble-graph artist-person album-artist | collect-mass",
    )
    .await;
    assert_eq!(
        result,
        json!({
            "nodes": [
                {"id": "music_artist-1", "label": "Ables", "group": "music_artist",
                 "mass": 2, "value": 2, "font": {"size": 30}},
                {"id": "person-5", "label": "Ann", "group": "person"},
                {"id": "person-6", "label": "Bea", "group": "person"},
                {"id": "music_artist-2", "label": "Bakers", "group": "music_artist",
                 "mass": 1, "value": 1, "font": {"size": 30}},
            ],
            "edges": [
                {"from": "person-5", "to": "music_artist-1", "width": 3},
                {"from": "person-6", "to": "music_artist-1", "dashes": true, "width": 3},
                {"from": "music_artist-1", "to": "music_artist-2", "width": 2},
            ],
        })
    );
}

#[tokio::test]
async fn assemble_graph_unknown_relation_errors() {
    let root = TempDir::new("relviz-check-unknown-relation");
    fs::create_dir_all(root.join("tables")).unwrap();

    let result = run_pipeline(&root, "assemble-graph nonesuch").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn schema_graph_weights_referenced_tables() {
    let root = TempDir::new("relviz-check-schema");
    write_schema(
        &root,
        &json!({
            "tables": [
                {"name": "core.Account", "object": "Account", "group": "core",
                 "relations": [{"to": "core.Account", "kind": "foreign_key"}]},
                {"name": "core.MusicArtistXPerson", "object": "MusicArtistXPerson",
                 "group": "core",
                 "relations": [
                     {"to": "core.MusicArtist", "kind": "foreign_key"},
                     {"to": "core.Person", "kind": "foreign_key"},
                 ]},
                {"name": "core.MusicArtist", "object": "MusicArtist", "group": "core",
                 "relations": [{"to": "core.Person", "kind": "many_to_many"}]},
                {"name": "core.Person", "object": "Person", "group": "core"},
            ],
        }),
    );

    let result = run_to_json(&root, "schema-graph").await;
    assert_eq!(
        result,
        json!({
            "nodes": [
                {"id": "core.Account", "label": "Account", "group": "core",
                 "mass": 2, "value": 2},
                {"id": "core.MusicArtistXPerson", "label": "MusicArtistXPerson",
                 "group": "core", "mass": 1, "value": 1},
                {"id": "core.MusicArtist", "label": "MusicArtist", "group": "core",
                 "mass": 2, "value": 2},
                {"id": "core.Person", "label": "Person", "group": "core",
                 "mass": 3, "value": 3},
            ],
            "edges": [
                {"from": "core.Account", "to": "core.Account"},
                {"from": "core.MusicArtistXPerson", "to": "core.MusicArtist"},
                {"from": "core.MusicArtistXPerson", "to": "core.Person"},
                {"from": "core.MusicArtist", "to": "core.Person",
                 "color": {"color": "8888FF", "opacity": 0.6},
                 "length": 400, "smooth": false},
            ],
        })
    );
}

#[tokio::test]
async fn missing_table_is_not_found() {
    let root = TempDir::new("relviz-check-missing-table");
    fs::create_dir_all(root.join("tables")).unwrap();

    let result = run_pipeline(&root, "build-hierarchy absent").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
