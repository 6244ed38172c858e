// Interactive command loop. Reads one-character commands from stdin at a
// `command> ` prompt, applies them to the scoreboard, and publishes exactly
// one message per state change. `q`, end-of-input and Ctrl-C all leave the
// loop the same way so shutdown always runs.
use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Notify;

use crate::mqtt::Publisher;
use crate::scoreboard::{Event, Scoreboard, ScoreboardError, Team};

/// One-character operator commands, mapped to handlers by a plain enum
/// dispatch instead of chained string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    Reset,
    GoalHome,
    GoalAway,
    AdjustHome,
    AdjustAway,
    SetHomeName,
    SetAwayName,
    Show,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Command> {
        match input {
            "i" => Some(Command::Init),
            "r" => Some(Command::Reset),
            "h" => Some(Command::GoalHome),
            "a" => Some(Command::GoalAway),
            "H" => Some(Command::AdjustHome),
            "A" => Some(Command::AdjustAway),
            "n" => Some(Command::SetHomeName),
            "N" => Some(Command::SetAwayName),
            "s" => Some(Command::Show),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }

    /// Commands that need one more line from the operator, with the prompt
    /// to print for it.
    fn follow_up_prompt(self) -> Option<&'static str> {
        match self {
            Command::AdjustHome => Some("Home adjust (+n/-n or absolute number): "),
            Command::AdjustAway => Some("Away adjust (+n/-n or absolute number): "),
            Command::SetHomeName => Some("Enter home name: "),
            Command::SetAwayName => Some("Enter away name: "),
            _ => None,
        }
    }
}

/// What applying one command to the board amounted to. At most one event is
/// ever published per command; `Shown` and `Quit` never publish.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Published(Event),
    Invalid(ScoreboardError),
    EmptyName,
    Shown,
    Quit,
}

/// Apply one parsed command to the board. `input` is the follow-up line for
/// the commands that take one and ignored otherwise. Pure state transition;
/// the caller decides what to print and whether to publish.
fn apply(board: &mut Scoreboard, command: Command, input: &str) -> Outcome {
    match command {
        Command::Init => Outcome::Published(board.init()),
        Command::Reset => Outcome::Published(board.reset()),
        Command::GoalHome => Outcome::Published(board.goal(Team::Home)),
        Command::GoalAway => Outcome::Published(board.goal(Team::Away)),
        Command::AdjustHome => match board.adjust(Team::Home, input) {
            Ok(event) => Outcome::Published(event),
            Err(e) => Outcome::Invalid(e),
        },
        Command::AdjustAway => match board.adjust(Team::Away, input) {
            Ok(event) => Outcome::Published(event),
            Err(e) => Outcome::Invalid(e),
        },
        Command::SetHomeName => match board.set_name(Team::Home, input) {
            Some(event) => Outcome::Published(event),
            None => Outcome::EmptyName,
        },
        Command::SetAwayName => match board.set_name(Team::Away, input) {
            Some(event) => Outcome::Published(event),
            None => Outcome::EmptyName,
        },
        Command::Show => Outcome::Shown,
        Command::Quit => Outcome::Quit,
    }
}

/// Per-command success line after a publish.
fn announce(board: &Scoreboard, command: Command) {
    match command {
        Command::Init => println!("Initialized names/scores"),
        Command::Reset => println!("Scores reset to 0"),
        Command::GoalHome => {
            println!("Home goal -> {}: {}", board.home_name(), board.home_score())
        }
        Command::GoalAway => {
            println!("Away goal -> {}: {}", board.away_name(), board.away_score())
        }
        Command::AdjustHome => println!(
            "Home adjusted -> {}: {}",
            board.home_name(),
            board.home_score()
        ),
        Command::AdjustAway => println!(
            "Away adjusted -> {}: {}",
            board.away_name(),
            board.away_score()
        ),
        Command::SetHomeName => println!("Home name set to: {}", board.home_name()),
        Command::SetAwayName => println!("Away name set to: {}", board.away_name()),
        Command::Show | Command::Quit => {}
    }
}

const MENU: &str = "Available commands:\n\
\x20 i  - init (reset names to defaults and scores to 0)\n\
\x20 r  - reset (set scores to 0)\n\
\x20 h  - home goal (increment home score)\n\
\x20 a  - away goal (increment away score)\n\
\x20 H  - home adjust (+n/-n or absolute)\n\
\x20 A  - away adjust (+n/-n or absolute)\n\
\x20 n  - set home name\n\
\x20 N  - set away name\n\
\x20 s  - show current state\n\
\x20 q  - quit\n";

/// One operator input, or the reason there was none.
#[derive(Debug)]
enum Input {
    Line(String),
    Eof,
    Interrupted,
}

/// Run the command loop until quit, end-of-input or interrupt. The scoreboard
/// lives here: it is created fresh for the process (scores always start at 0)
/// and only this loop mutates it.
pub async fn run(publisher: &Publisher) -> anyhow::Result<()> {
    let mut board = Scoreboard::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // One persistent SIGINT listener for the whole session. The handler a
    // `ctrl_c()` call installs is process-wide and permanent, so the signal
    // must be observed by a single long-lived task and fanned out; a fresh
    // future per prompt would miss signals delivered between its polls. The
    // `Notify` permit also holds a signal that arrives while a command is
    // executing until the next prompt picks it up.
    let interrupt = Arc::new(Notify::new());
    {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.notify_one();
            }
        });
    }

    println!("{}", MENU);

    loop {
        let line = match read_line(&mut lines, "command> ", &interrupt).await? {
            Input::Line(line) => line,
            Input::Eof => {
                println!("\nEOF received, exiting");
                break;
            }
            Input::Interrupted => {
                println!("\nInterrupted, disconnecting");
                break;
            }
        };

        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        let Some(command) = Command::parse(cmd) else {
            println!("Unknown command; type i/r/h/a/H/A/n/N/s/q");
            continue;
        };

        let input = match command.follow_up_prompt() {
            Some(prompt) => match read_line(&mut lines, prompt, &interrupt).await? {
                Input::Line(input) => input,
                Input::Eof => {
                    // The adjust prompts report EOF the way a failed parse
                    // reads; the name prompts abort.
                    match command {
                        Command::AdjustHome | Command::AdjustAway => {
                            println!("Invalid input: EOF when reading a line")
                        }
                        _ => println!("Aborted"),
                    }
                    continue;
                }
                Input::Interrupted => {
                    println!("\nInterrupted, disconnecting");
                    break;
                }
            },
            None => String::new(),
        };

        match apply(&mut board, command, &input) {
            Outcome::Published(event) => {
                publisher.publish_state(&board, event).await;
                announce(&board, command);
            }
            Outcome::Invalid(e) => println!("Invalid input: {}", e),
            Outcome::EmptyName => println!("Empty name, ignored"),
            Outcome::Shown => println!("State -> {}", board),
            Outcome::Quit => {
                println!("Exiting");
                break;
            }
        }
    }

    Ok(())
}

/// Print a prompt and read one line, racing the shared interrupt signal so
/// Ctrl-C exits from any prompt, follow-ups included.
async fn read_line(
    lines: &mut Lines<BufReader<Stdin>>,
    prompt: &str,
    interrupt: &Notify,
) -> anyhow::Result<Input> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    tokio::select! {
        // Interrupt takes priority over a line that raced in with it.
        biased;
        _ = interrupt.notified() => Ok(Input::Interrupted),
        line = lines.next_line() => Ok(match line? {
            Some(line) => Input::Line(line),
            None => Input::Eof,
        }),
    }
}

//   TESTS
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_documented_command_parses() {
        let table = [
            ("i", Command::Init),
            ("r", Command::Reset),
            ("h", Command::GoalHome),
            ("a", Command::GoalAway),
            ("H", Command::AdjustHome),
            ("A", Command::AdjustAway),
            ("n", Command::SetHomeName),
            ("N", Command::SetAwayName),
            ("s", Command::Show),
            ("q", Command::Quit),
        ];
        for (input, expected) in table {
            assert_eq!(Command::parse(input), Some(expected), "command {:?}", input);
        }
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        // `h` scores a goal but `H` prompts for an adjustment; the two must
        // never collapse into each other.
        assert_ne!(Command::parse("h"), Command::parse("H"));
        assert_ne!(Command::parse("a"), Command::parse("A"));
        assert_ne!(Command::parse("n"), Command::parse("N"));
    }

    #[test]
    fn test_unknown_input_does_not_parse() {
        for input in ["x", "q ", "ii", "I", "?", "quit", "1"] {
            assert_eq!(Command::parse(input), None, "input {:?}", input);
        }
    }

    #[test]
    fn test_menu_lists_every_command() {
        for cmd in ["i", "r", "h", "a", "H", "A", "n", "N", "s", "q"] {
            assert!(
                MENU.contains(&format!("  {}  - ", cmd)),
                "menu is missing {:?}",
                cmd
            );
        }
    }

    #[test]
    fn test_exactly_one_event_per_state_changing_command() {
        let mut board = Scoreboard::new();
        // (command, follow-up input, publishes exactly one event)
        let table = [
            (Command::Init, "", true),
            (Command::Reset, "", true),
            (Command::GoalHome, "", true),
            (Command::GoalAway, "", true),
            (Command::AdjustHome, "+2", true),
            (Command::AdjustAway, "4", true),
            (Command::SetHomeName, "LIONS", true),
            (Command::SetAwayName, "TIGERS", true),
            (Command::Show, "", false),
            (Command::Quit, "", false),
        ];
        for (command, input, publishes) in table {
            let outcome = apply(&mut board, command, input);
            assert_eq!(
                matches!(outcome, Outcome::Published(_)),
                publishes,
                "command {:?} with input {:?} got {:?}",
                command,
                input,
                outcome
            );
        }
    }

    #[test]
    fn test_rejected_inputs_publish_nothing_and_keep_state() {
        let mut board = Scoreboard::new();
        board.adjust(Team::Home, "4").unwrap();
        assert_eq!(
            apply(&mut board, Command::AdjustHome, "abc"),
            Outcome::Invalid(ScoreboardError::InvalidAdjustment)
        );
        assert_eq!(board.home_score(), 4, "rejected adjust leaves the score");

        board.set_name(Team::Away, "TIGERS");
        assert_eq!(
            apply(&mut board, Command::SetAwayName, "   "),
            Outcome::EmptyName
        );
        assert_eq!(board.away_name(), "TIGERS", "blank rename keeps the name");
    }

    #[tokio::test]
    async fn test_interrupt_wins_at_a_blocked_prompt() {
        // A signal that fired before (or while) the operator is being
        // prompted must surface as `Interrupted` without waiting on stdin.
        let interrupt = Notify::new();
        interrupt.notify_one();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let input = read_line(&mut lines, "", &interrupt).await.unwrap();
        assert!(
            matches!(input, Input::Interrupted),
            "expected Interrupted, got {:?}",
            input
        );
    }
}
