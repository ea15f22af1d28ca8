//! Entry point for gltf-resolve.
//! Loads a .gltf, resolves every reference and logs the scene hierarchy.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use asset::graph::NodeId;
use asset::{LoadOptions, ResolvedGltf, load, resolve_with_source};

const USAGE: &str =
    "usage: gltf-resolve [--search-path=DIR]... [--max-size=BYTES] [--strict] <file.gltf>";

#[derive(Debug, Default, PartialEq)]
struct Args {
    file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    max_size: Option<u64>,
    strict: bool,
    help: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    for arg in args {
        if let Some(dir) = arg.strip_prefix("--search-path=") {
            out.search_paths.push(PathBuf::from(dir));
        } else if let Some(val) = arg.strip_prefix("--max-size=") {
            let bytes = val
                .parse::<u64>()
                .with_context(|| format!("Invalid --max-size '{}'", val))?;
            out.max_size = Some(bytes);
        } else if arg == "--strict" {
            out.strict = true;
        } else if arg == "--help" || arg == "-h" {
            out.help = true;
        } else if arg.starts_with("--") {
            eprintln!("[warn] Unknown flag '{}', ignoring.", arg);
        } else if out.file.replace(PathBuf::from(&arg)).is_some() {
            bail!("More than one input file given\n{USAGE}");
        }
    }
    Ok(out)
}

/// Depth-first walk from `root`, skipping nodes already on the current path.
fn log_node(graph: &ResolvedGltf<'_>, id: NodeId, depth: usize, path: &mut HashSet<NodeId>) {
    let node = &graph[id];
    let indent = "  ".repeat(depth);
    let name = node.raw.name.as_deref().unwrap_or("<unnamed>");
    if !path.insert(id) {
        log::warn!("{indent}node {} ({name}) forms a cycle; not descending", id.index());
        return;
    }

    let t = node.raw.transform();
    log::info!(
        "{indent}node {} ({name}) t={:?} s={:?}",
        id.index(),
        t.translation.to_array(),
        t.scale.to_array()
    );
    if let Some(mesh) = node.mesh {
        for (i, primitive) in graph[mesh].primitives.iter().enumerate() {
            let attributes: Vec<String> = primitive
                .attributes
                .iter()
                .map(|(semantic, accessor)| {
                    let accessor = &graph[*accessor];
                    format!("{semantic}[{}x{}]", accessor.count(), accessor.element_type.tag())
                })
                .collect();
            log::info!(
                "{indent}  primitive {i}: {:?} {} indexed={}",
                primitive.mode,
                attributes.join(" "),
                primitive.indices.is_some()
            );
        }
    }
    for &child in &node.children {
        log_node(graph, child, depth + 1, path);
    }
    path.remove(&id);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    let file = args.file.ok_or_else(|| anyhow!("No input file given\n{USAGE}"))?;

    let options = LoadOptions {
        max_bytes: args.max_size.unwrap_or(LoadOptions::default().max_bytes),
    };
    let source = asset::FileSource::new(options.max_bytes);
    let document = load::from_path(&file, &options)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let graph = match resolve_with_source(&document, &args.search_paths, &source) {
        Ok(graph) => graph,
        Err(failed) => {
            log::error!("Resolved stages before failure: {:?}", failed.graph.completed());
            return Err(anyhow::Error::new(failed.into_error()))
                .with_context(|| format!("Failed to resolve {}", file.display()));
        }
    };

    if args.strict {
        graph.ensure_complete_buffers().with_context(|| {
            format!(
                "{} buffer(s) shorter than declared (--strict)",
                graph.short_buffers().len()
            )
        })?;
    }

    let doc = graph.document();
    log::info!(
        "Asset version {} (generator: {})",
        doc.asset.version,
        doc.asset.generator.as_deref().unwrap_or("unknown")
    );
    for (i, scene) in graph.scenes().iter().enumerate() {
        let marker = if graph.default_scene_id().map(|s| s.index()) == Some(i) {
            " (default)"
        } else {
            ""
        };
        log::info!("scene {i}{marker}: {} root node(s)", scene.nodes.len());
        let mut path = HashSet::new();
        for &root in &scene.nodes {
            log_node(&graph, root, 1, &mut path);
        }
    }
    for (i, animation) in graph.animations().iter().enumerate() {
        log::info!(
            "animation {i}: {} channel(s), {} sampler(s)",
            animation.channels.len(),
            animation.samplers.len()
        );
    }

    log::info!("Done.");
    Ok(())
}
