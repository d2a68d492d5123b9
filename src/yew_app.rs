use std::rc::Rc;

use gloo::timers::callback::Interval;
use web_sys::{HtmlInputElement, InputEvent};
use yew::prelude::*;

use crate::app_core::{AppCore, GameSnapshot, SlotView};
use shotorder_core::{MovieCatalogEntry, StatsSnapshot};

const GRID_COLUMNS: usize = 4;
const STATS_REFRESH_MS: u32 = 1_000;
const STALE_MIX_PERCENT: u8 = 45;

#[derive(Properties)]
pub(crate) struct AppProps {
    pub(crate) core: Rc<AppCore>,
}

impl PartialEq for AppProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

fn grid_style() -> String {
    format!(
        "display:grid;grid-template-columns:repeat({GRID_COLUMNS},minmax(0,1fr));gap:12px;"
    )
}

#[function_component(App)]
pub(crate) fn app(props: &AppProps) -> Html {
    let app_core = props.core.clone();
    let app_snapshot = use_state(|| app_core.snapshot());
    {
        let app_core = app_core.clone();
        let app_snapshot = app_snapshot.clone();
        use_effect_with((), move |_| {
            let app_core_for_cb = app_core.clone();
            let subscription = app_core.subscribe(Rc::new(move || {
                app_snapshot.set(app_core_for_cb.snapshot());
            }));
            move || drop(subscription)
        });
    }
    let playing = app_snapshot.game.is_some();
    {
        let app_core = app_core.clone();
        use_effect_with(playing, move |playing| {
            let interval = playing.then(|| {
                Interval::new(STATS_REFRESH_MS, move || {
                    app_core.tick();
                })
            });
            move || drop(interval)
        });
    }

    match app_snapshot.game.clone() {
        Some(game) => {
            let on_guess = {
                let app_core = app_core.clone();
                Callback::from(move |(slot, position): (usize, usize)| {
                    app_core.set_guess(slot, position);
                })
            };
            let on_check = {
                let app_core = app_core.clone();
                Callback::from(move |_: MouseEvent| app_core.verify())
            };
            let on_restart = {
                let app_core = app_core.clone();
                Callback::from(move |_: MouseEvent| app_core.restart())
            };
            let on_change_movie = {
                let app_core = app_core.clone();
                Callback::from(move |_: MouseEvent| app_core.change_movie())
            };
            html! {
                <GameView
                    game={game}
                    on_guess={on_guess}
                    on_check={on_check}
                    on_restart={on_restart}
                    on_change_movie={on_change_movie}
                />
            }
        }
        None => {
            let on_select = {
                let app_core = app_core.clone();
                Callback::from(move |slug: &'static str| app_core.select_movie(slug))
            };
            html! {
                <MovieSelection
                    movies={app_snapshot.movies}
                    error={app_snapshot.error.clone()}
                    on_select={on_select}
                />
            }
        }
    }
}

#[derive(Properties, PartialEq)]
struct MovieSelectionProps {
    movies: &'static [MovieCatalogEntry],
    error: Option<String>,
    on_select: Callback<&'static str>,
}

#[function_component(MovieSelection)]
fn movie_selection(props: &MovieSelectionProps) -> Html {
    let cards = props.movies.iter().map(|entry| {
        let on_select = props.on_select.clone();
        let slug = entry.slug;
        let onclick = Callback::from(move |_: MouseEvent| on_select.emit(slug));
        let cover = match entry.cover() {
            Some(src) => html! {
                <img
                    src={src}
                    alt={entry.label}
                    width={entry.width.to_string()}
                    height={entry.height.to_string()}
                    style="width:100%;height:auto;display:block;"
                />
            },
            None => html! {},
        };
        html! {
            <div class="movie-card" key={slug}>
                {cover}
                <button type="button" {onclick}>
                    { format!("{} ({} shots)", entry.label, entry.frame_count()) }
                </button>
            </div>
        }
    });
    html! {
        <main class="movie-selection">
            <h1>{ "Pick a movie" }</h1>
            if let Some(error) = props.error.as_ref() {
                <p class="error" role="alert">{ error.clone() }</p>
            }
            <div style={grid_style()}>
                { for cards }
            </div>
        </main>
    }
}

#[derive(Properties, PartialEq)]
struct GameViewProps {
    game: GameSnapshot,
    on_guess: Callback<(usize, usize)>,
    on_check: Callback<MouseEvent>,
    on_restart: Callback<MouseEvent>,
    on_change_movie: Callback<MouseEvent>,
}

#[function_component(GameView)]
fn game_view(props: &GameViewProps) -> Html {
    let game = &props.game;
    let total = game.slots.len();
    let cards = game.slots.iter().enumerate().map(|(slot, view)| {
        html! {
            <FrameCard
                key={slot}
                slot={slot}
                total={total}
                view={view.clone()}
                stale={game.stale}
                width={game.width}
                height={game.height}
                on_guess={props.on_guess.clone()}
            />
        }
    });
    html! {
        <main class="game">
            <header>
                <h1>{ game.label }</h1>
                <button type="button" onclick={props.on_change_movie.clone()}>
                    { "Change movie" }
                </button>
            </header>
            <div style={grid_style()}>
                { for cards }
            </div>
            <div class="controls">
                <button type="button" onclick={props.on_check.clone()}>{ "Check order" }</button>
                <button type="button" onclick={props.on_restart.clone()}>{ "Restart" }</button>
            </div>
            <StatsPanel
                stats={game.stats.clone()}
                last_check={game.last_check}
                solved={game.solved}
            />
        </main>
    }
}

#[derive(Properties, PartialEq)]
struct FrameCardProps {
    slot: usize,
    total: usize,
    view: SlotView,
    stale: bool,
    width: u32,
    height: u32,
    on_guess: Callback<(usize, usize)>,
}

#[function_component(FrameCard)]
fn frame_card(props: &FrameCardProps) -> Html {
    let slot = props.slot;
    let oninput = {
        let on_guess = props.on_guess.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            if let Some(position) = input
                .value()
                .parse::<usize>()
                .ok()
                .and_then(|value| value.checked_sub(1))
            {
                on_guess.emit((slot, position));
            }
        })
    };
    let color = props.view.status.color();
    let background = if props.stale {
        format!("color-mix(in srgb, {color} {STALE_MIX_PERCENT}%, transparent)")
    } else {
        color.to_string()
    };
    let style = format!("padding:5px;margin:0;background-color:{background};");
    let position = props.view.guess + 1;
    html! {
        <figure class="frame" style={style}>
            <img
                src={props.view.src}
                alt={format!("shot in slot {}", slot + 1)}
                width={props.width.to_string()}
                height={props.height.to_string()}
                style="width:100%;height:auto;display:block;"
            />
            <figcaption>
                <input
                    type="range"
                    min="1"
                    max={props.total.to_string()}
                    step="1"
                    value={position.to_string()}
                    {oninput}
                />
                <span>{ position.to_string() }</span>
            </figcaption>
        </figure>
    }
}

#[derive(Properties, PartialEq)]
struct StatsPanelProps {
    stats: StatsSnapshot,
    last_check: Option<(usize, usize)>,
    solved: bool,
}

#[function_component(StatsPanel)]
fn stats_panel(props: &StatsPanelProps) -> Html {
    let stats = &props.stats;
    let progress = props.last_check.map(|(correct, total)| {
        html! {
            <div class="progress">
                <progress value={correct.to_string()} max={total.max(1).to_string()} />
                <span>{ format!("{correct}/{total} shots in place") }</span>
            </div>
        }
    });
    html! {
        <section class="stats">
            <dl>
                <dt>{ "Attempts" }</dt>
                <dd>{ stats.attempts.to_string() }</dd>
                <dt>{ "Time" }</dt>
                <dd>{ stats.elapsed_label() }</dd>
                <dt>{ "Average correct" }</dt>
                <dd>{ stats.average_label() }</dd>
                <dt>{ "Best" }</dt>
                <dd>{ stats.best_label() }</dd>
            </dl>
            { for progress }
            if props.solved {
                <p class="solved">{ "Every shot is in place." }</p>
            }
        </section>
    }
}

pub(crate) fn run(core: Rc<AppCore>) {
    yew::Renderer::<App>::with_props(AppProps { core }).render();
}
