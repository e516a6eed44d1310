// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PanoDepth CLI - decode panorama depth maps and export their geometry.
//!
//! Usage:
//!   panodepth <FILE>... [options]
//!   panodepth --pano <ID>... --source-dir <DIR> [options]
//!
//! Input files hold either a provider JSON response (with `model.depth_map`)
//! or a bare depth payload string. Panorama ids are loaded through the disk
//! cache, falling back to `<DIR>/<ID>.json`.

mod cache;
mod export;
mod source;

use anyhow::{bail, Context, Result};
use cache::DiskCache;
use panodepth_core::{depth_image, include_plane, plane_image, DepthField, EdgePolicy, GROUND_GRAY};
use panodepth_geometry::{LatLng, PanoramaImage, ShardMeshCollection};
use panodepth_processing::{
    decode_batch, decode_response, load_batch, response_meta, DecodeRequest, DepthLoader, Panorama,
    PanoramaMeta, ProcessingConfig,
};
use rayon::prelude::*;
use serde::Serialize;
use source::DirectorySource;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, PartialEq)]
struct Options {
    files: Vec<PathBuf>,
    pano_ids: Vec<String>,
    source_dir: Option<PathBuf>,
    image_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    obj: Option<PathBuf>,
    cloud: Option<PathBuf>,
    edge_policy: Option<EdgePolicy>,
    apply_heading: bool,
    json: bool,
}

/// Per-panorama summary line
#[derive(Debug, Serialize)]
struct Summary {
    pano_id: String,
    width: u32,
    height: u32,
    planes: usize,
    included_planes: usize,
    shards: usize,
    included_shards: usize,
    sky_fraction: f64,
    degenerate_pixels: usize,
}

impl Summary {
    fn new(pano_id: &str, field: &DepthField) -> Self {
        let sky = field.depth_map.iter().filter(|&&d| panodepth_core::is_sky(d)).count();
        Self {
            pano_id: pano_id.to_string(),
            width: field.width,
            height: field.height,
            planes: field.planes.len(),
            included_planes: field.planes.iter().filter(|p| include_plane(p)).count(),
            shards: field.shards.len(),
            included_shards: field.included_shards().count(),
            sky_fraction: sky as f64 / field.depth_map.len().max(1) as f64,
            degenerate_pixels: field.degenerate_pixels,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,panodepth_cli=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(options) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };

    let mut config = ProcessingConfig::from_env();
    if let Some(policy) = options.edge_policy {
        config.segment.edge_policy = policy;
    }
    config.apply_heading |= options.apply_heading;

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("failed to start worker pool")?;

    let panoramas = if options.pano_ids.is_empty() {
        decode_files(&options.files, &config)?
    } else {
        load_panoramas(&options, &config)?
    };
    if panoramas.is_empty() {
        bail!("nothing decoded");
    }

    run(&options, &config, panoramas)
}

fn run(options: &Options, config: &ProcessingConfig, panoramas: Vec<(Panorama, bool)>) -> Result<()> {
    if let Some(dir) = &options.out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }

    // Track offsets are relative to the first panorama with a known location
    let origin: Option<LatLng> = panoramas
        .iter()
        .find(|(_, located)| *located)
        .map(|(pano, _)| pano.meta.location);

    let mut meshes = Vec::new();
    let mut cloud = Vec::new();

    for (pano, located) in panoramas {
        let pano = attach_image(pano, options.image_dir.as_deref())?;
        let pano_id = pano.meta.pano_id.clone();
        let Some(field) = pano.depth.as_ref() else {
            continue;
        };

        let summary = Summary::new(&pano_id, field);
        if options.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            print_summary(&summary);
        }

        if let Some(dir) = &options.out_dir {
            export::save_png(
                &dir.join(format!("{}-depth.png", pano_id)),
                field.width,
                field.height,
                depth_image(field),
            )?;
            export::save_png(
                &dir.join(format!("{}-planes.png", pano_id)),
                field.width,
                field.height,
                plane_image(field),
            )?;
        }

        let offset = match (origin, located) {
            (Some(origin), true) => pano.track_offset(origin),
            _ => panodepth_geometry::Vector3::zeros(),
        };
        let projector = pano.projector_with(config)?;

        if options.obj.is_some() {
            let mut collection = ShardMeshCollection::from_grids(&projector.shard_meshes()?);
            collection.translate(&offset);
            meshes.push((pano_id.clone(), collection));
        }
        if options.cloud.is_some() {
            cloud.extend(projector.point_cloud()?.into_iter().map(|mut point| {
                point.position += offset;
                point
            }));
        }
    }

    if let Some(path) = &options.obj {
        let stats = export::write_obj(path, &meshes)?;
        tracing::info!(
            path = %path.display(),
            objects = stats.objects,
            vertices = stats.vertices,
            triangles = stats.triangles,
            "Wrote shard meshes"
        );
    }
    if let Some(path) = &options.cloud {
        export::write_xyz(path, &cloud)?;
        tracing::info!(path = %path.display(), points = cloud.len(), "Wrote point cloud");
    }
    Ok(())
}

/// Decode local files; the flag marks panoramas whose location is known
fn decode_files(files: &[PathBuf], config: &ProcessingConfig) -> Result<Vec<(Panorama, bool)>> {
    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        inputs.push((file_stem(path), bytes));
    }

    let (json, payloads): (Vec<_>, Vec<_>) = inputs
        .into_iter()
        .partition(|(_, bytes)| bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{'));

    let mut panoramas: Vec<(Panorama, bool)> = json
        .par_iter()
        .map(|(stem, bytes)| -> Result<(Panorama, bool)> {
            let field = decode_response(stem, bytes, &config.segment)
                .with_context(|| format!("cannot decode {}", stem))?;
            Ok(assemble(stem, response_meta(bytes)?, field))
        })
        .collect::<Result<_>>()?;

    let requests: Vec<DecodeRequest> = payloads
        .into_iter()
        .map(|(stem, bytes)| DecodeRequest::new(stem, String::from_utf8_lossy(&bytes).trim()))
        .collect();
    for outcome in decode_batch(&requests, &config.segment) {
        let field = outcome
            .result
            .with_context(|| format!("cannot decode {}", outcome.pano_id))?;
        panoramas.push(assemble(&outcome.pano_id, None, field));
    }
    Ok(panoramas)
}

/// Load panoramas by id through the disk cache
fn load_panoramas(options: &Options, config: &ProcessingConfig) -> Result<Vec<(Panorama, bool)>> {
    let Some(source_dir) = &options.source_dir else {
        bail!("--pano needs --source-dir");
    };
    let loader = DepthLoader::new(DiskCache::new(&config.cache_dir), DirectorySource::new(source_dir))
        .with_config(config.segment);

    let mut panoramas = Vec::new();
    for outcome in load_batch(&loader, &options.pano_ids) {
        let field = match outcome.result {
            Ok(field) => field,
            Err(e) => {
                tracing::warn!(pano_id = %outcome.pano_id, error = %e, "Skipping panorama");
                continue;
            }
        };
        panoramas.push(assemble(&outcome.pano_id, outcome.meta, field));
    }
    Ok(panoramas)
}

fn assemble(fallback_id: &str, meta: Option<PanoramaMeta>, field: DepthField) -> (Panorama, bool) {
    let located = meta.is_some();
    let meta = meta.unwrap_or_else(|| PanoramaMeta {
        pano_id: fallback_id.to_string(),
        heading_degrees: 0.0,
        location: LatLng::new(0.0, 0.0),
    });
    (Panorama::new(meta).with_depth(field), located)
}

/// Attach `<dir>/<id>.{jpg,jpeg,png}` if present, else a flat grey image
fn attach_image(pano: Panorama, image_dir: Option<&Path>) -> Result<Panorama> {
    let (width, height) = match pano.depth.as_ref() {
        Some(field) => (field.width, field.height),
        None => return Ok(pano),
    };
    let found = image_dir.and_then(|dir| {
        ["jpg", "jpeg", "png"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", pano.meta.pano_id, ext)))
            .find(|path| path.is_file())
    });

    match found {
        Some(path) => {
            let rgba = image::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))?
                .to_rgba8();
            let (width, height) = rgba.dimensions();
            Ok(pano.with_rgba(width, height, rgba.into_raw())?)
        }
        None => Ok(pano.with_image(PanoramaImage::filled(width, height, GROUND_GRAY)?)),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(summary: &Summary) {
    println!("{}", summary.pano_id);
    println!("  Raster: {}x{}", summary.width, summary.height);
    println!(
        "  Planes: {} ({} included)",
        summary.planes, summary.included_planes
    );
    println!(
        "  Shards: {} ({} included)",
        summary.shards, summary.included_shards
    );
    println!("  Sky: {:.1}%", summary.sky_fraction * 100.0);
    if summary.degenerate_pixels > 0 {
        println!("  Degenerate pixels: {}", summary.degenerate_pixels);
    }
}

/// Parse command-line arguments; `None` means help was requested
fn parse_args(args: &[String]) -> Result<Option<Options>> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" => return Ok(None),
            "--pano" => options.pano_ids.push(next_value(args, &mut i, arg)?.to_string()),
            "--source-dir" => options.source_dir = Some(next_value(args, &mut i, arg)?.into()),
            "--image-dir" => options.image_dir = Some(next_value(args, &mut i, arg)?.into()),
            "--out-dir" => options.out_dir = Some(next_value(args, &mut i, arg)?.into()),
            "--obj" => options.obj = Some(next_value(args, &mut i, arg)?.into()),
            "--cloud" => options.cloud = Some(next_value(args, &mut i, arg)?.into()),
            "--edge-policy" => {
                let raw = next_value(args, &mut i, arg)?;
                options.edge_policy = Some(raw.parse().map_err(anyhow::Error::msg)?);
            }
            "--heading" => options.apply_heading = true,
            "--json" => options.json = true,
            other if other.starts_with("--") => bail!("unknown option: {}", other),
            file => options.files.push(PathBuf::from(file)),
        }
        i += 1;
    }

    if options.files.is_empty() && options.pano_ids.is_empty() {
        bail!("no input files or panorama ids given");
    }
    Ok(Some(options))
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} needs a value", flag))
}

fn print_usage() {
    println!("Decode panorama depth maps and export their geometry");
    println!();
    println!("Usage:");
    println!("  panodepth <FILE>... [options]");
    println!("  panodepth --pano <ID>... --source-dir <DIR> [options]");
    println!();
    println!("Options:");
    println!("  --pano <ID>           Load a panorama by id (repeatable)");
    println!("  --source-dir <DIR>    Directory of provider responses named <ID>.json");
    println!("  --image-dir <DIR>     Directory of panorama images named <ID>.jpg|png");
    println!("  --out-dir <DIR>       Write depth and plane preview PNGs");
    println!("  --obj <FILE>          Write shard meshes as OBJ");
    println!("  --cloud <FILE>        Write the coloured point cloud as XYZRGB");
    println!("  --edge-policy <P>     flush|drop open extents at the right edge");
    println!("  --heading             Rotate geometry by each capture heading");
    println!("  --json                Print summaries as JSON lines");
    println!();
    println!("Environment: PANODEPTH_CACHE_DIR, PANODEPTH_WORKER_THREADS, RUST_LOG, ...");
}
