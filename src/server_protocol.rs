use serde_json::Value;

use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    /// Press or release of one directional key.
    Key { dir: Direction, down: bool },
    Start,
    Pause,
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "key" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            if dir == Direction::None {
                return None;
            }
            let down = match object.get("down") {
                None => true,
                Some(value) => value.as_bool()?,
            };
            Some(ParsedClientMessage::Key { dir, down })
        }
        "start" => Some(ParsedClientMessage::Start),
        "pause" => Some(ParsedClientMessage::Pause),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

pub fn parse_seed(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
}
