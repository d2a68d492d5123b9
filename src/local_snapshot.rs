#[cfg(target_arch = "wasm32")]
use base64::engine::general_purpose::STANDARD;
#[cfg(target_arch = "wasm32")]
use base64::Engine;

use crate::app_core::AppCore;
#[cfg(target_arch = "wasm32")]
use shotorder_core::SESSION_SNAPSHOT_VERSION;
use shotorder_core::{
    CatalogSource, ImageSource, PuzzleSession, RestoreError, SessionSnapshot, SystemClock,
};

pub(crate) const LOCAL_SESSION_KEY: &str = "shotorder.session.v1";

#[derive(Debug, PartialEq)]
pub(crate) enum ApplySnapshotResult {
    Applied,
    UnknownMovie,
    Mismatch(RestoreError),
}

impl ApplySnapshotResult {
    pub(crate) fn is_applied(&self) -> bool {
        matches!(self, ApplySnapshotResult::Applied)
    }
}

/// Resumes `snapshot` on `core` when its movie is still in the catalog and
/// the frames line up.
pub(crate) fn apply_session_snapshot(
    snapshot: &SessionSnapshot,
    core: &AppCore,
    catalog: CatalogSource,
) -> ApplySnapshotResult {
    let (Some(entry), Ok(collection)) = (
        catalog.entry(&snapshot.collection),
        catalog.load_collection(&snapshot.collection),
    ) else {
        #[cfg(target_arch = "wasm32")]
        {
            gloo::console::log!("local snapshot: unknown movie", snapshot.collection.clone());
        }
        return ApplySnapshotResult::UnknownMovie;
    };
    match PuzzleSession::restore(collection, snapshot, SystemClock::new()) {
        Ok(session) => {
            core.resume(entry, session);
            #[cfg(target_arch = "wasm32")]
            {
                gloo::console::log!("local snapshot: restore applied");
            }
            ApplySnapshotResult::Applied
        }
        Err(err) => {
            #[cfg(target_arch = "wasm32")]
            {
                gloo::console::warn!("local snapshot: restore mismatch", err.to_string());
            }
            ApplySnapshotResult::Mismatch(err)
        }
    }
}

pub(crate) fn load_local_snapshot() -> Option<SessionSnapshot> {
    #[cfg(target_arch = "wasm32")]
    {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;
        let raw = storage.get_item(LOCAL_SESSION_KEY).ok()??;
        if raw.is_empty() {
            return None;
        }
        let bytes = STANDARD.decode(raw.as_bytes()).ok()?;
        let snapshot = match SessionSnapshot::from_bytes(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                gloo::console::warn!("local snapshot: decode failed", err.to_string());
                return None;
            }
        };
        if snapshot.version != SESSION_SNAPSHOT_VERSION {
            gloo::console::log!(
                "local snapshot: version mismatch",
                snapshot.version,
                SESSION_SNAPSHOT_VERSION
            );
            return None;
        }
        gloo::console::log!("local snapshot: loaded");
        Some(snapshot)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

pub(crate) fn save_local_snapshot(snapshot: &SessionSnapshot) {
    #[cfg(target_arch = "wasm32")]
    {
        let bytes = match snapshot.to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                gloo::console::warn!("local snapshot: encode failed", err.to_string());
                return;
            }
        };
        let raw = STANDARD.encode(bytes);
        let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
        else {
            gloo::console::warn!("local snapshot: storage unavailable");
            return;
        };
        if storage.set_item(LOCAL_SESSION_KEY, &raw).is_err() {
            gloo::console::warn!("local snapshot: storage set failed");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = snapshot;
    }
}

pub(crate) fn clear_local_snapshot() {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
        else {
            return;
        };
        let _ = storage.remove_item(LOCAL_SESSION_KEY);
    }
}
