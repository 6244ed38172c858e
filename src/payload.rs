// Wire-message builder. The scoreboard firmware parses a fixed JSON shape and
// expects the scores as *strings*, so this stays a pure function of the
// snapshot and never grows transformations. Field declaration order here is
// the serialization order, which the device relies on.
use serde::Serialize;

use crate::scoreboard::{Event, Scoreboard};

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    #[serde(rename = "homeName")]
    home_name: &'a str,
    #[serde(rename = "awayName")]
    away_name: &'a str,
    #[serde(rename = "homeScore")]
    home_score: String,
    #[serde(rename = "awayScore")]
    away_score: String,
    event: &'a str,
}

/// Serialize a scoreboard snapshot plus an event label into the payload the
/// device expects.
pub fn build_payload(board: &Scoreboard, event: Event) -> String {
    let msg = WireMessage {
        home_name: board.home_name(),
        away_name: board.away_name(),
        home_score: board.home_score().to_string(),
        away_score: board.away_score().to_string(),
        event: event.as_str(),
    };
    // Serialization of a plain struct with string fields cannot fail.
    serde_json::to_string(&msg).unwrap_or_default()
}

//   TESTS
//
