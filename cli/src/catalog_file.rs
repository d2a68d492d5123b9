use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::fs_source::MovieDir;

#[derive(Debug, thiserror::Error)]
pub enum CatalogFileError {
    #[error("no movie folders with frames found")]
    Empty,
    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Same shape the core build script reads.
#[derive(Debug, Serialize)]
pub struct CatalogFile {
    pub default_slug: String,
    pub movies: Vec<MovieEntry>,
}

#[derive(Debug, Serialize)]
pub struct MovieEntry {
    pub label: String,
    pub slug: String,
    pub dir: String,
    pub frames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Lowercase ASCII slug; runs of other characters collapse into one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("movie");
    }
    slug
}

fn label_for(name: &str) -> String {
    name.split(|ch: char| ch == '-' || ch == '_' || ch.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn unique_slug(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn first_frame_dimensions(movie: &MovieDir) -> (Option<u32>, Option<u32>) {
    let Some(cover) = movie.cover() else {
        return (None, None);
    };
    match image::image_dimensions(cover) {
        Ok((width, height)) => (Some(width), Some(height)),
        Err(err) => {
            tracing::warn!(path = %cover.display(), error = %err, "frame size unavailable");
            (None, None)
        }
    }
}

/// Builds a catalog for `movies`; `src_prefix` is the path the web build
/// serves the image root under.
pub fn build_catalog(movies: &[MovieDir], src_prefix: &str) -> Result<CatalogFile, CatalogFileError> {
    let prefix = src_prefix.trim_end_matches('/');
    let mut taken = HashSet::new();
    let mut entries = Vec::with_capacity(movies.len());
    for movie in movies {
        let frames: Vec<String> = movie
            .frames
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        if frames.is_empty() {
            continue;
        }
        let (width, height) = first_frame_dimensions(movie);
        let dir = if prefix.is_empty() {
            movie.name.clone()
        } else {
            format!("{prefix}/{}", movie.name)
        };
        entries.push(MovieEntry {
            label: label_for(&movie.name),
            slug: unique_slug(slugify(&movie.name), &mut taken),
            dir,
            frames,
            width,
            height,
        });
    }
    let Some(first) = entries.first() else {
        return Err(CatalogFileError::Empty);
    };
    Ok(CatalogFile {
        default_slug: first.slug.clone(),
        movies: entries,
    })
}

pub fn render_catalog(catalog: &CatalogFile) -> Result<String, CatalogFileError> {
    Ok(toml::to_string_pretty(catalog)?)
}

pub fn write_catalog(catalog: &CatalogFile, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let contents = render_catalog(catalog)?;
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, contents)?;
    Ok(())
}
