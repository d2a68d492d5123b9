use std::collections::HashSet;
use std::env;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const FRAME_PREFIX: &str = "plan_";
const FRAME_EXTENSION: &str = ".jpg";

#[derive(Deserialize)]
struct CatalogFile {
    default_slug: Option<String>,
    movies: Vec<MovieEntry>,
}

#[derive(Deserialize)]
struct MovieEntry {
    label: String,
    slug: String,
    dir: String,
    frames: Option<Vec<String>>,
    width: Option<u32>,
    height: Option<u32>,
}

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    let env_path = workspace_root.join(".env");
    let env_local_path = workspace_root.join(".env.local");

    let _ = dotenvy::from_filename(&env_local_path);
    let _ = dotenvy::from_filename(&env_path);

    println!("cargo:rerun-if-env-changed=MOVIE_CATALOG_PATH");
    println!("cargo:rerun-if-changed={}", env_path.display());
    println!("cargo:rerun-if-changed={}", env_local_path.display());

    let catalog_path = resolve_catalog_path(workspace_root);
    println!("cargo:rerun-if-changed={}", catalog_path.display());

    let contents = fs::read_to_string(&catalog_path).unwrap_or_else(|err| {
        panic!(
            "failed to read movie catalog at {}: {err}",
            catalog_path.display()
        )
    });

    let catalog: CatalogFile = toml::from_str(&contents).unwrap_or_else(|err| {
        panic!(
            "failed to parse movie catalog at {}: {err}",
            catalog_path.display()
        )
    });

    if catalog.movies.is_empty() {
        panic!("movie catalog {} has no entries", catalog_path.display());
    }

    validate_entries(&catalog.movies, &catalog_path);

    let default_slug = catalog
        .default_slug
        .as_deref()
        .unwrap_or(catalog.movies[0].slug.as_str());
    if !catalog.movies.iter().any(|entry| entry.slug == default_slug) {
        panic!(
            "default_slug '{}' not found in {}",
            default_slug,
            catalog_path.display()
        );
    }

    let mut output = String::new();
    writeln!(
        &mut output,
        "pub const DEFAULT_MOVIE_SLUG: &str = {};",
        rust_string(default_slug)
    )
    .unwrap();
    writeln!(&mut output).unwrap();
    writeln!(&mut output, "pub const MOVIE_CATALOG: &[MovieCatalogEntry] = &[").unwrap();

    for entry in &catalog.movies {
        let dir = entry.dir.trim_end_matches('/');
        let frames = frame_names(entry, workspace_root, &catalog_path);
        let (width, height) = frame_dimensions(entry, dir, &frames, workspace_root);
        writeln!(&mut output, "    MovieCatalogEntry {{").unwrap();
        writeln!(&mut output, "        label: {},", rust_string(&entry.label)).unwrap();
        writeln!(&mut output, "        slug: {},", rust_string(&entry.slug)).unwrap();
        writeln!(&mut output, "        dir: {},", rust_string(dir)).unwrap();
        writeln!(&mut output, "        frames: &[").unwrap();
        for frame in &frames {
            let src = format!("{dir}/{frame}");
            writeln!(&mut output, "            {},", rust_string(&src)).unwrap();
        }
        writeln!(&mut output, "        ],").unwrap();
        writeln!(&mut output, "        width: {},", width).unwrap();
        writeln!(&mut output, "        height: {},", height).unwrap();
        writeln!(&mut output, "    }},").unwrap();
    }

    writeln!(&mut output, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_path = out_dir.join("movie_catalog.rs");
    fs::write(&out_path, output)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_path.display()));
}

fn resolve_catalog_path(workspace_root: &Path) -> PathBuf {
    let env_value = env::var("MOVIE_CATALOG_PATH").ok();
    let raw_path = match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => workspace_root.join("movies/catalog.toml"),
    };
    if raw_path.is_relative() {
        workspace_root.join(raw_path)
    } else {
        raw_path
    }
}

fn rust_string(value: &str) -> String {
    format!("{:?}", value)
}

fn is_frame_file_name(name: &str) -> bool {
    name.len() > FRAME_PREFIX.len() + FRAME_EXTENSION.len()
        && name.starts_with(FRAME_PREFIX)
        && name.ends_with(FRAME_EXTENSION)
}

fn validate_entries(entries: &[MovieEntry], catalog_path: &Path) {
    let mut slugs = HashSet::new();
    let mut dirs = HashSet::new();

    for entry in entries {
        if entry.slug.trim().is_empty() {
            panic!("movie slug cannot be empty in {}", catalog_path.display());
        }
        if entry.label.trim().is_empty() {
            panic!(
                "movie '{}' label cannot be empty in {}",
                entry.slug,
                catalog_path.display()
            );
        }
        if entry.dir.trim().is_empty() {
            panic!(
                "movie '{}' dir cannot be empty in {}",
                entry.slug,
                catalog_path.display()
            );
        }
        if entry.dir.starts_with("http://") || entry.dir.starts_with("https://") {
            panic!(
                "movie '{}' dir cannot be a URL in {}",
                entry.slug,
                catalog_path.display()
            );
        }
        if entry.width.is_some() ^ entry.height.is_some() {
            panic!(
                "movie '{}' must set both width and height or neither in {}",
                entry.slug,
                catalog_path.display()
            );
        }
        if let (Some(width), Some(height)) = (entry.width, entry.height) {
            if width == 0 || height == 0 {
                panic!(
                    "movie '{}' has invalid dimensions in {}",
                    entry.slug,
                    catalog_path.display()
                );
            }
        }
        if let Some(frames) = &entry.frames {
            for frame in frames {
                if !is_frame_file_name(frame) {
                    panic!(
                        "movie '{}' frame '{}' is not a {}*{} file in {}",
                        entry.slug,
                        frame,
                        FRAME_PREFIX,
                        FRAME_EXTENSION,
                        catalog_path.display()
                    );
                }
            }
        }
        if !slugs.insert(entry.slug.clone()) {
            panic!(
                "duplicate movie slug '{}' in {}",
                entry.slug,
                catalog_path.display()
            );
        }
        if !dirs.insert(entry.dir.clone()) {
            panic!(
                "duplicate movie dir '{}' in {}",
                entry.dir,
                catalog_path.display()
            );
        }
    }
}

fn frame_names(entry: &MovieEntry, workspace_root: &Path, catalog_path: &Path) -> Vec<String> {
    let mut frames = match &entry.frames {
        Some(frames) => frames.clone(),
        None => scan_frames(entry, workspace_root),
    };
    frames.sort();
    frames.dedup();
    if frames.is_empty() {
        panic!(
            "movie '{}' has no {}*{} frames in {}",
            entry.slug,
            FRAME_PREFIX,
            FRAME_EXTENSION,
            catalog_path.display()
        );
    }
    frames
}

fn scan_frames(entry: &MovieEntry, workspace_root: &Path) -> Vec<String> {
    let dir_path = resolve_dir_path(&entry.dir, workspace_root);
    println!("cargo:rerun-if-changed={}", dir_path.display());
    let read_dir = fs::read_dir(&dir_path).unwrap_or_else(|err| {
        panic!(
            "movie '{}' lists no frames and {} cannot be scanned: {err}",
            entry.slug,
            dir_path.display()
        )
    });
    read_dir
        .filter_map(|item| item.ok())
        .filter(|item| item.file_type().map(|kind| kind.is_file()).unwrap_or(false))
        .filter_map(|item| item.file_name().into_string().ok())
        .filter(|name| is_frame_file_name(name))
        .collect()
}

fn frame_dimensions(
    entry: &MovieEntry,
    dir: &str,
    frames: &[String],
    workspace_root: &Path,
) -> (u32, u32) {
    let first = format!("{dir}/{}", frames[0]);
    let first_path = resolve_dir_path(&first, workspace_root);
    match imagesize::size(&first_path) {
        Ok(size) => {
            println!("cargo:rerun-if-changed={}", first_path.display());
            let width = u32::try_from(size.width).unwrap_or_else(|_| {
                panic!(
                    "movie '{}' frame {} has width {} larger than u32",
                    entry.slug,
                    first_path.display(),
                    size.width
                )
            });
            let height = u32::try_from(size.height).unwrap_or_else(|_| {
                panic!(
                    "movie '{}' frame {} has height {} larger than u32",
                    entry.slug,
                    first_path.display(),
                    size.height
                )
            });
            if width == 0 || height == 0 {
                panic!(
                    "movie '{}' frame {} has invalid dimensions {}x{}",
                    entry.slug,
                    first_path.display(),
                    width,
                    height
                );
            }
            (width, height)
        }
        Err(err) => {
            if let (Some(width), Some(height)) = (entry.width, entry.height) {
                println!(
                    "cargo:warning=failed to read frame size for '{}', falling back to catalog dimensions {}x{}: {}",
                    first, width, height, err
                );
                (width, height)
            } else {
                panic!(
                    "failed to read frame size for '{}' at {}: {err}",
                    first,
                    first_path.display()
                );
            }
        }
    }
}

fn resolve_dir_path(path: &str, workspace_root: &Path) -> PathBuf {
    let raw_path = PathBuf::from(path);
    if raw_path.is_absolute() && raw_path.exists() {
        return raw_path;
    }
    let trimmed = path.trim_start_matches('/');
    let workspace_path = workspace_root.join(trimmed);
    if workspace_path.exists() {
        return workspace_path;
    }
    if raw_path.is_absolute() {
        return raw_path;
    }
    workspace_path
}
