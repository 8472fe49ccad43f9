use serde_json::Value;

use crate::types::{Coord, SoloMode};

#[derive(Debug)]
pub enum ParsedClientMessage {
    JoinRoom {
        room: String,
        name: String,
    },
    StartSingle {
        name: String,
        mode: SoloMode,
    },
    MakeMove {
        from: Coord,
        to: Coord,
    },
    RestartGame,
    LeaveRoom,
    Ping {
        t: f64,
    },
}

/// `None` means malformed. Coordinates are only checked for integer
/// shape; board bounds are the core's concern.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "join_room" => {
            let room = object.get("room")?.as_str()?.to_string();
            let name = object.get("name")?.as_str()?.to_string();
            Some(ParsedClientMessage::JoinRoom { room, name })
        }
        "start_single" => {
            let name = object.get("name")?.as_str()?.to_string();
            let mode = SoloMode::parse(object.get("mode")?.as_str()?)?;
            Some(ParsedClientMessage::StartSingle { name, mode })
        }
        "make_move" => {
            let from = parse_coord(object.get("from")?)?;
            let to = parse_coord(object.get("to")?)?;
            Some(ParsedClientMessage::MakeMove { from, to })
        }
        "restart_game" => Some(ParsedClientMessage::RestartGame),
        "leave_room" => Some(ParsedClientMessage::LeaveRoom),
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

fn parse_coord(value: &Value) -> Option<Coord> {
    let object = value.as_object()?;
    let row = parse_i32(object.get("row")?)?;
    let col = parse_i32(object.get("col")?)?;
    Some(Coord { row, col })
}

fn parse_i32(value: &Value) -> Option<i32> {
    let number = value.as_i64()?;
    i32::try_from(number).ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_client_message, ParsedClientMessage};
    use crate::types::SoloMode;

    #[test]
    fn parse_join_room_message() {
        let parsed = parse_client_message(r#"{"type":"join_room","room":"arena","name":"A"}"#)
            .expect("join_room message should parse");
        match parsed {
            ParsedClientMessage::JoinRoom { room, name } => {
                assert_eq!(room, "arena");
                assert_eq!(name, "A");
            }
            _ => panic!("expected join_room message"),
        }
    }

    #[test]
    fn join_room_requires_both_fields() {
        assert!(parse_client_message(r#"{"type":"join_room","room":"arena"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"join_room","name":"A"}"#).is_none());
    }

    #[test]
    fn parse_start_single_message() {
        let parsed = parse_client_message(r#"{"type":"start_single","name":"A","mode":"level"}"#)
            .expect("start_single message should parse");
        assert!(matches!(
            parsed,
            ParsedClientMessage::StartSingle {
                mode: SoloMode::Level,
                ..
            }
        ));
    }

    #[test]
    fn start_single_rejects_unknown_mode() {
        assert!(
            parse_client_message(r#"{"type":"start_single","name":"A","mode":"multiplayer"}"#)
                .is_none()
        );
    }

    #[test]
    fn parse_make_move_message() {
        let parsed = parse_client_message(
            r#"{"type":"make_move","from":{"row":2,"col":3},"to":{"row":2,"col":4}}"#,
        )
        .expect("make_move message should parse");
        match parsed {
            ParsedClientMessage::MakeMove { from, to } => {
                assert_eq!((from.row, from.col), (2, 3));
                assert_eq!((to.row, to.col), (2, 4));
            }
            _ => panic!("expected make_move message"),
        }
    }

    #[test]
    fn make_move_accepts_negative_coordinates() {
        let parsed = parse_client_message(
            r#"{"type":"make_move","from":{"row":-1,"col":0},"to":{"row":0,"col":0}}"#,
        );
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::MakeMove { .. })
        ));
    }

    #[test]
    fn make_move_rejects_non_integer_coordinates() {
        assert!(parse_client_message(
            r#"{"type":"make_move","from":{"row":1.5,"col":0},"to":{"row":0,"col":0}}"#
        )
        .is_none());
        assert!(parse_client_message(
            r#"{"type":"make_move","from":{"row":"1","col":0},"to":{"row":0,"col":0}}"#
        )
        .is_none());
    }

    #[test]
    fn parse_bare_control_messages() {
        assert!(matches!(
            parse_client_message(r#"{"type":"restart_game"}"#),
            Some(ParsedClientMessage::RestartGame)
        ));
        assert!(matches!(
            parse_client_message(r#"{"type":"leave_room"}"#),
            Some(ParsedClientMessage::LeaveRoom)
        ));
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        assert!(matches!(
            parse_client_message(r#"{"type":"ping","t":12.5}"#),
            Some(ParsedClientMessage::Ping { .. })
        ));
    }

    #[test]
    fn unknown_or_malformed_messages_are_rejected() {
        assert!(parse_client_message("not json").is_none());
        assert!(parse_client_message(r#"{"type":"fly_to_the_moon"}"#).is_none());
        assert!(parse_client_message(r#"[1,2,3]"#).is_none());
    }
}
