//! End-to-end: write a .gltf + .bin pair to disk, load it, resolve it.

use std::fs;
use std::path::{Path, PathBuf};

use asset::{ErrorKind, LoadOptions, Semantic, load, resolve};
use tempfile::tempdir;

const TRIANGLE: &str = r#"{
    "asset": { "version": "2.0", "generator": "resolve_from_disk" },
    "buffers": [ { "uri": "triangle.bin", "byteLength": 36 } ],
    "bufferViews": [ { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 } ],
    "accessors": [ {
        "bufferView": 0, "componentType": 5126, "type": "VEC3", "count": 3,
        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
    } ],
    "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 } } ] } ],
    "nodes": [ { "mesh": 0 } ],
    "scenes": [ { "nodes": [0] } ],
    "scene": 0
}"#;

fn triangle_bytes() -> Vec<u8> {
    [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        .iter()
        .flatten()
        .flat_map(|f| f.to_le_bytes())
        .collect()
}

fn write_triangle(dir: &Path, bin: &[u8]) -> PathBuf {
    let gltf = dir.join("triangle.gltf");
    fs::write(&gltf, TRIANGLE).expect("write gltf");
    fs::write(dir.join("triangle.bin"), bin).expect("write bin");
    gltf
}

#[test]
fn triangle_from_document_directory() {
    let dir = tempdir().expect("temp dir");
    let path = write_triangle(dir.path(), &triangle_bytes());

    let document = load::from_path(&path, &LoadOptions::default()).expect("load");
    let graph = resolve(&document, &[]).expect("resolve");

    let scene = graph.default_scene().expect("default scene");
    let node = &graph[scene.nodes[0]];
    let mesh = &graph[node.mesh.expect("mesh")];
    let position = mesh.primitives[0]
        .attribute(&Semantic::Positions)
        .expect("POSITION");
    let data = graph.buffer_view_data(graph[position].buffer_view);
    assert_eq!(data.len(), 36);
    assert_eq!(&data[12..16], &1.0f32.to_le_bytes());
    assert!(graph.short_buffers().is_empty());
}

#[test]
fn explicit_search_path_replaces_document_directory() {
    let doc_dir = tempdir().expect("temp dir");
    let bin_dir = tempdir().expect("temp dir");
    let path = doc_dir.path().join("triangle.gltf");
    fs::write(&path, TRIANGLE).unwrap();
    fs::write(bin_dir.path().join("triangle.bin"), triangle_bytes()).unwrap();

    let document = load::from_path(&path, &LoadOptions::default()).unwrap();
    let failed = resolve(&document, &[]).expect_err("bin is not next to the document");
    assert_eq!(failed.error.kind(), ErrorKind::Io);
    assert!(failed.graph.buffers().is_none());

    let empty = tempdir().unwrap();
    let paths = vec![empty.path().to_path_buf(), bin_dir.path().to_path_buf()];
    let graph = resolve(&document, &paths).expect("found in second search path");
    assert_eq!(graph.buffers()[0].data(), &triangle_bytes()[..]);
}

#[test]
fn short_file_is_padded() {
    let dir = tempdir().expect("temp dir");
    let path = write_triangle(dir.path(), &triangle_bytes()[..24]);

    let document = load::from_path(&path, &LoadOptions::default()).unwrap();
    let graph = resolve(&document, &[]).expect("short buffers do not fail resolution");

    let short = &graph.short_buffers()[0];
    assert_eq!(short.expected, 36);
    assert_eq!(short.actual, 24);
    let data = graph.buffers()[0].data();
    assert_eq!(data.len(), 36);
    assert_eq!(&data[24..], &[0u8; 12]);
}
