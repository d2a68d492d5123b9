mod board;
mod catalog_file;
mod fs_source;
mod play;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shotorder_core::{ImageSource, PuzzleSession};
use tracing_subscriber::EnvFilter;

use board::{render_board, BoardLayout};
use fs_source::DirImageSource;

#[derive(Parser)]
#[command(
    name = "shotorder-cli",
    version,
    about = "Put shuffled movie shots back in order from the terminal"
)]
struct Cli {
    /// Folder holding one subfolder of plan_*.jpg frames per movie.
    #[arg(long, global = true, env = "SHOTORDER_IMG_DIR", default_value = "img")]
    img_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Movies {
        #[command(subcommand)]
        command: MovieCommand,
    },
    /// Play one movie; the board image is rewritten after every change.
    Play {
        movie: String,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value = "board.png")]
        board: PathBuf,
        #[arg(long, default_value_t = 4)]
        columns: u32,
        #[arg(long, default_value_t = 320)]
        thumb_width: u32,
    },
}

#[derive(Subcommand)]
enum MovieCommand {
    List,
    /// Write a catalog file for the browser build.
    Catalog {
        #[arg(long, default_value = "movies/catalog.toml")]
        out: PathBuf,
        #[arg(long, default_value = "img")]
        src_prefix: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let source = DirImageSource::new(cli.img_dir);

    match cli.command {
        Commands::Movies { command } => match command {
            MovieCommand::List => {
                let movies = source.movies()?;
                if movies.is_empty() {
                    println!("no movies under {}", source.root().display());
                }
                for movie in movies {
                    let cover = movie
                        .cover()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default();
                    println!("{}\t{} shots\t{}", movie.name, movie.frames.len(), cover);
                }
            }
            MovieCommand::Catalog { out, src_prefix } => {
                let movies = source.movies()?;
                let catalog = catalog_file::build_catalog(&movies, &src_prefix)?;
                catalog_file::write_catalog(&catalog, &out)?;
                tracing::info!(
                    movies = catalog.movies.len(),
                    out = %out.display(),
                    "catalog written"
                );
            }
        },
        Commands::Play {
            movie,
            seed,
            board,
            columns,
            thumb_width,
        } => {
            let seed = match seed.as_deref() {
                Some(raw) => parse_seed_arg(raw)?,
                None => rand::rng().random(),
            };
            tracing::info!(seed = %format!("{seed:#x}"), movie = %movie, "starting puzzle");
            let mut rng = StdRng::seed_from_u64(seed);
            let collection = source.load_collection(&movie)?;
            let mut session = PuzzleSession::start(collection, &mut rng)?;
            let layout = BoardLayout {
                columns,
                thumb_width,
            };
            println!("board: {}", board.display());

            let stdin = io::stdin();
            let mut stdout = io::stdout();
            play::run(&mut session, &mut rng, stdin.lock(), &mut stdout, |session| {
                render_board(session, layout)
                    .save(&board)
                    .map_err(io::Error::other)
            })?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_seed_arg(raw: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(value)
}
