use std::path::{Component, Path, PathBuf};

use image::RgbImage;
use shotorder_core::{sort_frame_names, Collection, ImageSource};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("image directory {0} does not exist")]
    MissingRoot(PathBuf),
    #[error("failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unknown movie: {0}")]
    UnknownMovie(String),
}

#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub path: PathBuf,
    pub pixels: RgbImage,
}

impl AsRef<RgbImage> for DecodedFrame {
    fn as_ref(&self) -> &RgbImage {
        &self.pixels
    }
}

/// A movie folder holding at least one frame file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieDir {
    pub name: String,
    pub dir: PathBuf,
    pub frames: Vec<PathBuf>,
}

impl MovieDir {
    pub fn cover(&self) -> Option<&Path> {
        self.frames.first().map(PathBuf::as_path)
    }
}

/// Reads movies from `<root>/<movie>/plan_*.jpg`.
#[derive(Debug, Clone)]
pub struct DirImageSource {
    root: PathBuf,
}

impl DirImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn movies(&self) -> Result<Vec<MovieDir>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::MissingRoot(self.root.clone()));
        }
        let mut movies = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| SourceError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let frames = frame_paths(entry.path())?;
            if frames.is_empty() {
                continue;
            }
            movies.push(MovieDir {
                name: entry.file_name().to_string_lossy().into_owned(),
                dir: entry.path().to_path_buf(),
                frames,
            });
        }
        Ok(movies)
    }

    fn movie_dir(&self, name: &str) -> Result<PathBuf, SourceError> {
        let trimmed = name.trim();
        let mut components = Path::new(trimmed).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        let dir = self.root.join(trimmed);
        if !single_normal || !dir.is_dir() {
            return Err(SourceError::UnknownMovie(trimmed.to_string()));
        }
        Ok(dir)
    }
}

impl ImageSource for DirImageSource {
    type Image = DecodedFrame;
    type Error = SourceError;

    fn collection_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.movies()?.into_iter().map(|movie| movie.name).collect())
    }

    fn load_collection(&self, name: &str) -> Result<Collection<Self::Image>, Self::Error> {
        let dir = self.movie_dir(name)?;
        let mut frames = Vec::new();
        for path in frame_paths(&dir)? {
            let pixels = image::open(&path)
                .map_err(|source| SourceError::Decode {
                    path: path.clone(),
                    source,
                })?
                .to_rgb8();
            frames.push(DecodedFrame { path, pixels });
        }
        tracing::debug!(movie = name.trim(), frames = frames.len(), "collection loaded");
        Ok(Collection::from_images(name.trim(), frames))
    }
}

/// Frame files of one movie folder in canonical order.
pub fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| SourceError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(sort_frame_names(names)
        .into_iter()
        .map(|name| dir.join(name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        let pixels = RgbImage::from_pixel(8, 6, Rgb([shade, shade, shade]));
        pixels.save(dir.join(name)).expect("write frame");
    }

    fn fixture() -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("tempdir");
        let alpha = root.path().join("alpha");
        fs::create_dir(&alpha).expect("alpha");
        write_frame(&alpha, "plan_02.jpg", 200);
        write_frame(&alpha, "plan_01.jpg", 100);
        write_frame(&alpha, "cover.jpg", 0);
        fs::write(alpha.join("notes.txt"), "not a frame").expect("notes");

        let beta = root.path().join("beta");
        fs::create_dir(&beta).expect("beta");
        write_frame(&beta, "plan_1.jpg", 50);

        fs::create_dir(root.path().join("empty")).expect("empty");
        root
    }

    #[test]
    fn lists_only_folders_with_frames() {
        let root = fixture();
        let source = DirImageSource::new(root.path());
        let movies = source.movies().expect("movies");
        let names: Vec<&str> = movies.iter().map(|movie| movie.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(
            movies[0].cover(),
            Some(root.path().join("alpha/plan_01.jpg").as_path())
        );
        assert_eq!(movies[0].frames.len(), 2);
    }

    #[test]
    fn loads_frames_in_canonical_order() {
        let root = fixture();
        let source = DirImageSource::new(root.path());
        let collection = source.load_collection("alpha").expect("collection");
        assert_eq!(collection.name(), "alpha");
        let names: Vec<String> = collection
            .frames()
            .iter()
            .map(|frame| {
                frame
                    .image
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(names, vec!["plan_01.jpg", "plan_02.jpg"]);
        assert_eq!(collection.frame(0).map(|frame| frame.image.pixels.width()), Some(8));
    }

    #[test]
    fn empty_folder_loads_as_empty_collection() {
        let root = fixture();
        let source = DirImageSource::new(root.path());
        assert!(source.load_collection("empty").expect("empty").is_empty());
    }

    #[test]
    fn rejects_unknown_and_escaping_names() {
        let root = fixture();
        let source = DirImageSource::new(root.path());
        assert!(matches!(
            source.load_collection("missing"),
            Err(SourceError::UnknownMovie(_))
        ));
        assert!(matches!(
            source.load_collection("../alpha"),
            Err(SourceError::UnknownMovie(_))
        ));
        assert!(matches!(
            DirImageSource::new(root.path().join("nope")).movies(),
            Err(SourceError::MissingRoot(_))
        ));
    }
}
