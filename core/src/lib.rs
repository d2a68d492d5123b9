pub mod catalog;
pub mod clock;
pub mod codec;
pub mod error;
pub mod session;
pub mod shuffle;
pub mod snapshot;
pub mod stats;

pub use catalog::{
    is_frame_file_name, movie_by_label, movie_by_slug, sort_frame_names, CatalogError,
    CatalogSource, Collection, Frame, ImageSource, MovieCatalogEntry, DEFAULT_MOVIE_SLUG,
    MOVIE_CATALOG,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{decode, encode, CodecError};
pub use error::{IndexKind, PuzzleError, RestoreError};
pub use session::{PuzzleSession, DEFAULT_GUESS_POSITION};
pub use snapshot::{SessionSnapshot, SESSION_SNAPSHOT_VERSION};
pub use stats::{format_elapsed, SessionStats, StatsSnapshot, Verification};
