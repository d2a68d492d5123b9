mod app_core;
mod local_snapshot;
mod yew_app;

use app_core::AppCore;

/// Mixes `Math.random` with the wall clock; only used to pick shuffles.
fn entropy_seed() -> u64 {
    let random = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let now = js_sys::Date::now() as u64;
    (random << 32) ^ now
}

fn main() {
    let core = AppCore::new(entropy_seed());
    if core.restore_local() {
        gloo::console::log!("resumed saved session");
    }
    yew_app::run(core);
}
