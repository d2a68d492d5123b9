pub const FRAME_PREFIX: &str = "plan_";
pub const FRAME_EXTENSION: &str = ".jpg";

#[derive(Clone, Debug, PartialEq)]
pub struct Frame<T> {
    pub index: usize,
    pub image: T,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Collection<T> {
    name: String,
    frames: Vec<Frame<T>>,
}

impl<T> Collection<T> {
    /// `images` must already be in canonical order.
    pub fn from_images(name: impl Into<String>, images: Vec<T>) -> Self {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Frame { index, image })
            .collect();
        Self {
            name: name.into(),
            frames,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame<T>> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame<T>] {
        &self.frames
    }

    pub fn cover(&self) -> Option<&Frame<T>> {
        self.frames.first()
    }
}

/// Supplies collections in canonical order; repeated loads of the same name
/// must yield the same ordering.
pub trait ImageSource {
    type Image;
    type Error: std::error::Error;

    fn collection_names(&self) -> Result<Vec<String>, Self::Error>;

    fn load_collection(&self, name: &str) -> Result<Collection<Self::Image>, Self::Error>;
}

pub fn is_frame_file_name(name: &str) -> bool {
    name.len() > FRAME_PREFIX.len() + FRAME_EXTENSION.len()
        && name.starts_with(FRAME_PREFIX)
        && name.ends_with(FRAME_EXTENSION)
}

pub fn sort_frame_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut frames: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .filter(|name| is_frame_file_name(name))
        .collect();
    frames.sort();
    frames
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovieCatalogEntry {
    pub label: &'static str,
    pub slug: &'static str,
    pub dir: &'static str,
    pub frames: &'static [&'static str],
    pub width: u32,
    pub height: u32,
}

impl MovieCatalogEntry {
    pub fn cover(&self) -> Option<&'static str> {
        self.frames.first().copied()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn collection(&self) -> Collection<&'static str> {
        Collection::from_images(self.slug, self.frames.to_vec())
    }
}

include!(concat!(env!("OUT_DIR"), "/movie_catalog.rs"));

pub fn movie_by_slug(slug: &str) -> Option<&'static MovieCatalogEntry> {
    let trimmed = slug.trim();
    MOVIE_CATALOG
        .iter()
        .find(|entry| entry.slug.eq_ignore_ascii_case(trimmed))
}

pub fn movie_by_label(label: &str) -> Option<&'static MovieCatalogEntry> {
    let trimmed = label.trim();
    MOVIE_CATALOG
        .iter()
        .find(|entry| entry.label.eq_ignore_ascii_case(trimmed))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown movie: {0}")]
    UnknownMovie(String),
}

#[derive(Clone, Copy, Debug)]
pub struct CatalogSource {
    entries: &'static [MovieCatalogEntry],
}

impl CatalogSource {
    pub fn new(entries: &'static [MovieCatalogEntry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [MovieCatalogEntry] {
        self.entries
    }

    pub fn entry(&self, slug: &str) -> Option<&'static MovieCatalogEntry> {
        let trimmed = slug.trim();
        self.entries
            .iter()
            .find(|entry| entry.slug.eq_ignore_ascii_case(trimmed))
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self::new(MOVIE_CATALOG)
    }
}

impl ImageSource for CatalogSource {
    type Image = &'static str;
    type Error = CatalogError;

    fn collection_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.slug.to_string())
            .collect())
    }

    fn load_collection(&self, name: &str) -> Result<Collection<Self::Image>, Self::Error> {
        self.entry(name)
            .map(MovieCatalogEntry::collection)
            .ok_or_else(|| CatalogError::UnknownMovie(name.trim().to_string()))
    }
}
