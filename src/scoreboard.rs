// In-memory scoreboard state. This is the whole domain: two team names, two
// non-negative scores, and an event label for every transition so the device
// firmware can tell why the display changed. The command loop owns the single
// instance; nothing here touches the network.
use std::fmt;

/// Event labels the firmware understands. One is attached to every published
/// message; the wire form is the SCREAMING_SNAKE string from `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Init,
    Reset,
    GoalHome,
    GoalAway,
    AdjustHome,
    AdjustAway,
    SetHomeName,
    SetAwayName,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Init => "INIT",
            Event::Reset => "RESET",
            Event::GoalHome => "GOAL_HOME",
            Event::GoalAway => "GOAL_AWAY",
            Event::AdjustHome => "ADJUST_HOME",
            Event::AdjustAway => "ADJUST_AWAY",
            Event::SetHomeName => "SET_HOME_NAME",
            Event::SetAwayName => "SET_AWAY_NAME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Home,
    Away,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoreboardError {
    /// Adjustment input that is empty or not a `+n`/`-n`/`n` integer token.
    #[error("invalid adjustment input: expected +n, -n or an absolute number")]
    InvalidAdjustment,
}

/// A parsed adjustment line. `+n`/`-n` moves the current score by a signed
/// delta; a bare number assigns it outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Relative(i64),
    Absolute(i64),
}

impl std::str::FromStr for Adjustment {
    type Err = ScoreboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ScoreboardError::InvalidAdjustment);
        }
        // A leading sign makes the whole token (sign included) a relative
        // delta; anything else is an absolute assignment. A bare "+" or "-"
        // fails the integer parse below.
        let relative = s.starts_with('+') || s.starts_with('-');
        let value: i64 = s.parse().map_err(|_| ScoreboardError::InvalidAdjustment)?;
        if relative {
            Ok(Adjustment::Relative(value))
        } else {
            Ok(Adjustment::Absolute(value))
        }
    }
}

/// The single mutable scoreboard instance. Scores are clamped to stay
/// non-negative on every mutation; names are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    home_name: String,
    away_name: String,
    home_score: u32,
    away_score: u32,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    pub fn new() -> Self {
        Scoreboard {
            home_name: "HOME".to_string(),
            away_name: "AWAY".to_string(),
            home_score: 0,
            away_score: 0,
        }
    }

    pub fn home_name(&self) -> &str {
        &self.home_name
    }

    pub fn away_name(&self) -> &str {
        &self.away_name
    }

    pub fn home_score(&self) -> u32 {
        self.home_score
    }

    pub fn away_score(&self) -> u32 {
        self.away_score
    }

    /// Zero both scores. The original tool's menu claims `init` also restores
    /// the default names, but its handler never did; we keep the observed
    /// behavior (scores only) rather than guess at the intended fix.
    pub fn init(&mut self) -> Event {
        self.home_score = 0;
        self.away_score = 0;
        Event::Init
    }

    pub fn reset(&mut self) -> Event {
        self.home_score = 0;
        self.away_score = 0;
        Event::Reset
    }

    pub fn goal(&mut self, team: Team) -> Event {
        match team {
            Team::Home => {
                self.home_score = clamp_score(self.home_score as i64 + 1);
                Event::GoalHome
            }
            Team::Away => {
                self.away_score = clamp_score(self.away_score as i64 + 1);
                Event::GoalAway
            }
        }
    }

    /// Apply an adjustment line to one team's score. On a parse failure the
    /// state is left untouched and the caller publishes nothing.
    pub fn adjust(&mut self, team: Team, input: &str) -> Result<Event, ScoreboardError> {
        let adj: Adjustment = input.parse()?;
        let (score, event) = match team {
            Team::Home => (&mut self.home_score, Event::AdjustHome),
            Team::Away => (&mut self.away_score, Event::AdjustAway),
        };
        *score = match adj {
            Adjustment::Relative(delta) => clamp_score(*score as i64 + delta),
            Adjustment::Absolute(value) => clamp_score(value),
        };
        Ok(event)
    }

    /// Rename one team. Whitespace is trimmed; an empty result keeps the
    /// prior name and returns `None` so the caller skips the publish.
    pub fn set_name(&mut self, team: Team, input: &str) -> Option<Event> {
        let name = input.trim();
        if name.is_empty() {
            return None;
        }
        match team {
            Team::Home => {
                self.home_name = name.to_string();
                Some(Event::SetHomeName)
            }
            Team::Away => {
                self.away_name = name.to_string();
                Some(Event::SetAwayName)
            }
        }
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}  |  {}: {}",
            self.home_name, self.home_score, self.away_name, self.away_score
        )
    }
}

/// Clamp a computed score into the non-negative range the display can show.
fn clamp_score(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

//   TESTS
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let board = Scoreboard::new();
        assert_eq!(board.home_name(), "HOME");
        assert_eq!(board.away_name(), "AWAY");
        assert_eq!(board.home_score(), 0);
        assert_eq!(board.away_score(), 0);
    }

    #[test]
    fn test_goal_increments_one_side_only() {
        let mut board = Scoreboard::new();
        assert_eq!(board.goal(Team::Home), Event::GoalHome);
        assert_eq!(board.goal(Team::Home), Event::GoalHome);
        assert_eq!(board.goal(Team::Away), Event::GoalAway);
        assert_eq!(board.home_score(), 2, "two home goals");
        assert_eq!(board.away_score(), 1, "one away goal");
    }

    #[test]
    fn test_reset_zeroes_scores_but_keeps_names() {
        let mut board = Scoreboard::new();
        board.set_name(Team::Home, "LIONS");
        board.goal(Team::Home);
        board.goal(Team::Away);
        assert_eq!(board.reset(), Event::Reset);
        assert_eq!(board.home_score(), 0);
        assert_eq!(board.away_score(), 0);
        assert_eq!(board.home_name(), "LIONS", "reset must not touch names");
    }

    #[test]
    fn test_init_zeroes_scores_and_keeps_names() {
        // Observed original behavior: init is reset-with-a-different-label.
        let mut board = Scoreboard::new();
        board.set_name(Team::Away, "TIGERS");
        board.goal(Team::Away);
        assert_eq!(board.init(), Event::Init);
        assert_eq!(board.away_score(), 0);
        assert_eq!(board.away_name(), "TIGERS");
    }

    #[test]
    fn test_adjust_relative_adds_to_current() {
        let mut board = Scoreboard::new();
        board.adjust(Team::Home, "3").unwrap();
        assert_eq!(board.adjust(Team::Home, "+5"), Ok(Event::AdjustHome));
        assert_eq!(board.home_score(), 8, "3 + 5 = 8");
    }

    #[test]
    fn test_adjust_relative_clamps_at_zero() {
        let mut board = Scoreboard::new();
        board.adjust(Team::Home, "3").unwrap();
        board.adjust(Team::Home, "-10").unwrap();
        assert_eq!(board.home_score(), 0, "clamped, never negative");
    }

    #[test]
    fn test_adjust_absolute_assigns() {
        let mut board = Scoreboard::new();
        board.goal(Team::Away);
        board.goal(Team::Away);
        assert_eq!(board.adjust(Team::Away, "7"), Ok(Event::AdjustAway));
        assert_eq!(board.away_score(), 7, "absolute assignment ignores current");
    }

    #[test]
    fn test_adjust_invalid_inputs_leave_state_unchanged() {
        let mut board = Scoreboard::new();
        board.adjust(Team::Home, "4").unwrap();
        for bad in ["", "abc", "+", "-", "  ", "1.5", "+-2"] {
            assert_eq!(
                board.adjust(Team::Home, bad),
                Err(ScoreboardError::InvalidAdjustment),
                "input {:?} must be rejected",
                bad
            );
            assert_eq!(board.home_score(), 4, "score unchanged after {:?}", bad);
        }
    }

    #[test]
    fn test_adjust_input_is_trimmed() {
        let mut board = Scoreboard::new();
        board.adjust(Team::Home, "  +2 ").unwrap();
        assert_eq!(board.home_score(), 2);
    }

    #[test]
    fn test_set_name_trims_and_replaces() {
        let mut board = Scoreboard::new();
        assert_eq!(
            board.set_name(Team::Home, "  LIONS  "),
            Some(Event::SetHomeName)
        );
        assert_eq!(board.home_name(), "LIONS");
    }

    #[test]
    fn test_set_name_empty_is_noop() {
        let mut board = Scoreboard::new();
        board.set_name(Team::Away, "TIGERS");
        assert_eq!(board.set_name(Team::Away, "   "), None);
        assert_eq!(board.away_name(), "TIGERS", "blank rename keeps prior name");
    }

    #[test]
    fn test_scores_never_negative_over_any_sequence() {
        let mut board = Scoreboard::new();
        let inputs = ["-1", "+1", "-100", "5", "-3", "-3", "+0"];
        for input in inputs {
            board.adjust(Team::Home, input).unwrap();
            board.adjust(Team::Away, input).unwrap();
            // u32 can't go negative, but the clamp also has to hold at zero
            // instead of wrapping.
            assert!(board.home_score() < 1000, "no wraparound on home");
            assert!(board.away_score() < 1000, "no wraparound on away");
        }
        assert_eq!(board.home_score(), 0);
    }

    #[test]
    fn test_display_snapshot() {
        let mut board = Scoreboard::new();
        board.goal(Team::Home);
        assert_eq!(board.to_string(), "HOME: 1  |  AWAY: 0");
    }
}
