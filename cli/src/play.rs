use std::io::{self, BufRead, Write};

use rand::Rng;
use shotorder_core::shuffle::inverse_permutation;
use shotorder_core::{Clock, PuzzleError, PuzzleSession};

const HELP: &str = "\
commands (slots and positions start at 1):
  set <slot> <position>   move one slot
  guess <p1> ... <pN>     set every slot at once
  check                   verify the order
  show                    print the current guess
  stats                   attempts, time, average, best score
  restart                 reshuffle and reset the score
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayCommand {
    Set { slot: usize, position: usize },
    Guess(Vec<usize>),
    Check,
    Show,
    Stats,
    Restart,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Arity {
        command: &'static str,
        expected: &'static str,
    },
    #[error("'{0}' is not a number")]
    NotNumber(String),
    #[error("slots and positions start at 1")]
    Zero,
}

fn parse_one_based(raw: &str) -> Result<usize, CommandError> {
    let value: usize = raw
        .parse()
        .map_err(|_| CommandError::NotNumber(raw.to_string()))?;
    value.checked_sub(1).ok_or(CommandError::Zero)
}

/// Parses one input line; numbers are converted to 0-based.
pub fn parse_command(line: &str) -> Result<PlayCommand, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandError::Empty);
    };
    let args: Vec<&str> = words.collect();
    let no_args = |command: PlayCommand, name: &'static str| {
        if args.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::Arity {
                command: name,
                expected: "no arguments",
            })
        }
    };
    match head.to_ascii_lowercase().as_str() {
        "set" | "s" => {
            let [slot, position] = args.as_slice() else {
                return Err(CommandError::Arity {
                    command: "set",
                    expected: "<slot> <position>",
                });
            };
            Ok(PlayCommand::Set {
                slot: parse_one_based(slot)?,
                position: parse_one_based(position)?,
            })
        }
        "guess" | "g" => {
            if args.is_empty() {
                return Err(CommandError::Arity {
                    command: "guess",
                    expected: "one position per slot",
                });
            }
            let positions = args
                .iter()
                .map(|raw| parse_one_based(raw))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PlayCommand::Guess(positions))
        }
        "check" | "c" => no_args(PlayCommand::Check, "check"),
        "show" => no_args(PlayCommand::Show, "show"),
        "stats" => no_args(PlayCommand::Stats, "stats"),
        "restart" => no_args(PlayCommand::Restart, "restart"),
        "help" | "?" => no_args(PlayCommand::Help, "help"),
        "quit" | "q" | "exit" => no_args(PlayCommand::Quit, "quit"),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Quit,
    EndOfInput,
}

fn describe_error(err: &PuzzleError) -> String {
    match err {
        PuzzleError::IndexOutOfRange { kind, len, .. } => {
            format!("{kind} must be between 1 and {len}")
        }
        PuzzleError::InvalidInput(message) => message.clone(),
    }
}

fn write_guess<W: Write, T, C: Clock>(
    output: &mut W,
    session: &PuzzleSession<T, C>,
) -> io::Result<()> {
    let positions: Vec<String> = session
        .guess()
        .iter()
        .map(|position| (position + 1).to_string())
        .collect();
    writeln!(output, "guess: {}", positions.join(" "))
}

fn write_stats<W: Write, T, C: Clock>(
    output: &mut W,
    session: &PuzzleSession<T, C>,
) -> io::Result<()> {
    let stats = session.stats();
    writeln!(
        output,
        "attempts: {} | time: {} | average correct: {} | best: {}",
        stats.attempts,
        stats.elapsed_label(),
        stats.average_label(),
        stats.best_label()
    )
}

/// Runs the command loop until `quit` or end of input. `on_change` is
/// called once up front and after every state change.
pub fn run<T, C, R, I, W, F>(
    session: &mut PuzzleSession<T, C>,
    rng: &mut R,
    input: I,
    output: &mut W,
    mut on_change: F,
) -> io::Result<PlayOutcome>
where
    C: Clock,
    R: Rng + ?Sized,
    I: BufRead,
    W: Write,
    F: FnMut(&PuzzleSession<T, C>) -> io::Result<()>,
{
    let total = session.frame_count();
    writeln!(
        output,
        "{}: {} shots, slots numbered 1 to {} left to right, top to bottom. Type 'help'.",
        session.collection().name(),
        total,
        total
    )?;
    on_change(&*session)?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(output, "{err}")?;
                continue;
            }
        };
        match command {
            PlayCommand::Set { slot, position } => match session.set_guess(slot, position) {
                Ok(true) => {
                    writeln!(output, "slot {} -> position {}", slot + 1, position + 1)?;
                    on_change(&*session)?;
                }
                Ok(false) => {
                    writeln!(output, "slot {} already at position {}", slot + 1, position + 1)?;
                }
                Err(err) => writeln!(output, "{}", describe_error(&err))?,
            },
            PlayCommand::Guess(positions) => match session.set_guesses(&positions) {
                Ok(changed) => {
                    write_guess(output, session)?;
                    if changed {
                        on_change(&*session)?;
                    }
                }
                Err(err) => writeln!(output, "{}", describe_error(&err))?,
            },
            PlayCommand::Check => {
                let verification = session.verify();
                tracing::info!(
                    correct = verification.correct_count,
                    total = verification.total(),
                    "order checked"
                );
                let marks: Vec<String> = verification
                    .results
                    .iter()
                    .enumerate()
                    .map(|(slot, correct)| {
                        let mark = if *correct { "ok" } else { "x" };
                        format!("{}:{}", slot + 1, mark)
                    })
                    .collect();
                writeln!(output, "shots in place: {}", verification.progress_label())?;
                writeln!(output, "{}", marks.join(" "))?;
                if verification.is_complete() {
                    let stats = session.stats();
                    writeln!(
                        output,
                        "solved in {} attempts ({})",
                        stats.attempts,
                        stats.elapsed_label()
                    )?;
                    if let Some(slots) = inverse_permutation(session.display_order()) {
                        let slots: Vec<String> =
                            slots.iter().map(|slot| (slot + 1).to_string()).collect();
                        writeln!(output, "story order by slot: {}", slots.join(" "))?;
                    }
                }
                on_change(&*session)?;
            }
            PlayCommand::Show => write_guess(output, session)?,
            PlayCommand::Stats => write_stats(output, session)?,
            PlayCommand::Restart => {
                session.restart(rng);
                tracing::info!(movie = session.collection().name(), "puzzle restarted");
                writeln!(output, "reshuffled, score reset")?;
                on_change(&*session)?;
            }
            PlayCommand::Help => writeln!(output, "{HELP}")?,
            PlayCommand::Quit => {
                write_stats(output, session)?;
                return Ok(PlayOutcome::Quit);
            }
        }
    }
    Ok(PlayOutcome::EndOfInput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shotorder_core::{Collection, ManualClock};

    fn session() -> PuzzleSession<(), ManualClock> {
        let collection = Collection::from_images("scene", vec![(); 4]);
        PuzzleSession::with_display_order(collection, vec![2, 0, 3, 1], ManualClock::new(0))
            .expect("session")
    }

    fn play(script: &str) -> (String, usize, PlayOutcome, PuzzleSession<(), ManualClock>) {
        let mut session = session();
        let mut rng = StdRng::seed_from_u64(5);
        let mut output = Vec::new();
        let mut redraws = 0;
        let outcome = run(&mut session, &mut rng, script.as_bytes(), &mut output, |_| {
            redraws += 1;
            Ok(())
        })
        .expect("run");
        (
            String::from_utf8(output).expect("utf8"),
            redraws,
            outcome,
            session,
        )
    }

    #[test]
    fn parses_one_based_commands() {
        assert_eq!(
            parse_command("set 2 4"),
            Ok(PlayCommand::Set {
                slot: 1,
                position: 3
            })
        );
        assert_eq!(
            parse_command("  G 3 1 4 2 "),
            Ok(PlayCommand::Guess(vec![2, 0, 3, 1]))
        );
        assert_eq!(parse_command("check"), Ok(PlayCommand::Check));
        assert_eq!(parse_command("q"), Ok(PlayCommand::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(parse_command("set 0 1"), Err(CommandError::Zero));
        assert_eq!(
            parse_command("set two 1"),
            Err(CommandError::NotNumber("two".to_string()))
        );
        assert!(matches!(
            parse_command("set 1"),
            Err(CommandError::Arity { command: "set", .. })
        ));
        assert!(matches!(
            parse_command("check now"),
            Err(CommandError::Arity { command: "check", .. })
        ));
        assert_eq!(
            parse_command("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn solving_reports_success() {
        let (output, redraws, outcome, session) = play("guess 3 1 4 2\ncheck\nquit\n");
        assert!(output.contains("shots in place: 4/4"), "{output}");
        assert!(output.contains("solved in 1 attempts"), "{output}");
        assert!(output.contains("story order by slot: 2 4 1 3"), "{output}");
        assert_eq!(outcome, PlayOutcome::Quit);
        assert_eq!(redraws, 3);
        assert!(session.is_solved());
    }

    #[test]
    fn canonical_guess_scores_zero() {
        let (output, _, outcome, session) = play("guess 1 2 3 4\ncheck\n");
        assert!(output.contains("shots in place: 0/4"), "{output}");
        assert!(output.contains("1:x 2:x 3:x 4:x"), "{output}");
        assert!(!output.contains("story order"), "{output}");
        assert_eq!(outcome, PlayOutcome::EndOfInput);
        assert_eq!(session.stats().attempts, 1);
    }

    #[test]
    fn out_of_range_input_keeps_playing() {
        let (output, redraws, _, session) = play("set 5 1\nset 1 9\nguess 1 2\nset 1 1\nshow\n");
        assert!(output.contains("slot must be between 1 and 4"), "{output}");
        assert!(output.contains("position must be between 1 and 4"), "{output}");
        assert!(output.contains("expected 4 positions, got 2"), "{output}");
        assert!(output.contains("slot 1 already at position 1"), "{output}");
        assert!(output.contains("guess: 1 1 1 1"), "{output}");
        assert_eq!(redraws, 1);
        assert_eq!(session.guess(), &[0, 0, 0, 0]);
    }

    #[test]
    fn restart_resets_the_score() {
        let (output, _, _, session) = play("check\ncheck\nrestart\nstats\n");
        assert!(output.contains("reshuffled, score reset"), "{output}");
        assert!(output.contains("attempts: 0 |"), "{output}");
        assert_eq!(session.stats().attempts, 0);
        assert!(session.verification().is_none());
    }
}
