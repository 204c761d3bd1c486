//! Parsing of prompt input into client actions.

use matinee_server::infrastructure::dto::websocket::ClientMessage;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown command '/{0}' (try /help)")]
    Unknown(String),
}

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Join(String),
    Leave,
    /// Without an offset, the local player's position is used
    Play(Option<f64>),
    Pause(Option<f64>),
    Seek(f64),
    Buffer(bool),
    Emoji(String),
    Kick(String),
    Chat(String),
    Help,
}

impl UserCommand {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Chat(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        match name {
            "join" => arg
                .map(|room_id| Self::Join(room_id.to_string()))
                .ok_or(CommandError::Usage("/join <roomId>")),
            "leave" => Ok(Self::Leave),
            "play" => parse_optional_offset(arg, "/play [offset]").map(Self::Play),
            "pause" => parse_optional_offset(arg, "/pause [offset]").map(Self::Pause),
            "seek" => parse_optional_offset(arg, "/seek <offset>")?
                .map(Self::Seek)
                .ok_or(CommandError::Usage("/seek <offset>")),
            "buffer" => match arg {
                Some("start") => Ok(Self::Buffer(true)),
                Some("end") => Ok(Self::Buffer(false)),
                _ => Err(CommandError::Usage("/buffer start|end")),
            },
            "emoji" => arg
                .map(|token| Self::Emoji(token.to_string()))
                .ok_or(CommandError::Usage("/emoji <token>")),
            "kick" => arg
                .map(|user_id| Self::Kick(user_id.to_string()))
                .ok_or(CommandError::Usage("/kick <userId>")),
            "help" => Ok(Self::Help),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Wire frame for this command; `None` for local-only commands
    pub fn into_client_message(self, local_position: f64) -> Option<ClientMessage> {
        let message = match self {
            Self::Join(room_id) => ClientMessage::Join { room_id },
            Self::Leave => ClientMessage::Leave,
            Self::Play(offset) => ClientMessage::Play {
                offset: offset.unwrap_or(local_position),
            },
            Self::Pause(offset) => ClientMessage::Pause {
                offset: offset.unwrap_or(local_position),
            },
            Self::Seek(offset) => ClientMessage::Seek { offset },
            Self::Buffer(true) => ClientMessage::BufferStart,
            Self::Buffer(false) => ClientMessage::BufferEnd,
            Self::Emoji(token) => ClientMessage::Emoji { token },
            Self::Kick(target_user_id) => ClientMessage::Kick { target_user_id },
            Self::Chat(text) => ClientMessage::Message { text },
            Self::Help => return None,
        };
        Some(message)
    }
}

fn parse_optional_offset(
    arg: Option<&str>,
    usage: &'static str,
) -> Result<Option<f64>, CommandError> {
    match arg {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|offset| offset.is_finite() && *offset >= 0.0)
            .map(Some)
            .ok_or(CommandError::Usage(usage)),
    }
}

pub const HELP: &str = "\
Commands:
  /join <roomId>      enter a room's channel
  /leave              leave the current room
  /play [offset]      (owner) start playback
  /pause [offset]     (owner) pause playback
  /seek <offset>      (owner) jump to a position in seconds
  /buffer start|end   tell the room you are buffering
  /emoji <token>      send a reaction
  /kick <userId>      (owner) remove a member
  /help               show this help
Anything else is sent as a chat message.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        // テスト項目: スラッシュで始まらない入力はチャットメッセージになる
        // given (前提条件):
        let line = "  hello everyone ";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Ok(UserCommand::Chat("hello everyone".to_string())));
    }

    #[test]
    fn test_slash_commands() {
        // テスト項目: 各スラッシュコマンドが対応する操作に解釈される
        // given (前提条件):
        let cases = vec![
            ("/join room-1", UserCommand::Join("room-1".to_string())),
            ("/leave", UserCommand::Leave),
            ("/play", UserCommand::Play(None)),
            ("/play 12.5", UserCommand::Play(Some(12.5))),
            ("/pause 3", UserCommand::Pause(Some(3.0))),
            ("/seek 100", UserCommand::Seek(100.0)),
            ("/buffer start", UserCommand::Buffer(true)),
            ("/buffer end", UserCommand::Buffer(false)),
            ("/emoji heart", UserCommand::Emoji("heart".to_string())),
            ("/kick bob", UserCommand::Kick("bob".to_string())),
            ("/help", UserCommand::Help),
        ];

        for (line, expected) in cases {
            // when (操作):
            let command = UserCommand::parse(line);

            // then (期待する結果):
            assert_eq!(command, Ok(expected), "line: {}", line);
        }
    }

    #[test]
    fn test_invalid_commands() {
        // テスト項目: 引数不足・不正なオフセット・未知のコマンドはエラーになる
        // given (前提条件):
        let lines = ["/join", "/seek", "/seek -1", "/play abc", "/buffer", "/dance"];

        // when (操作):
        let results: Vec<_> = lines.iter().map(|line| UserCommand::parse(line)).collect();

        // then (期待する結果):
        assert_eq!(results[0], Err(CommandError::Usage("/join <roomId>")));
        assert_eq!(results[1], Err(CommandError::Usage("/seek <offset>")));
        assert_eq!(results[2], Err(CommandError::Usage("/seek <offset>")));
        assert_eq!(results[3], Err(CommandError::Usage("/play [offset]")));
        assert_eq!(results[4], Err(CommandError::Usage("/buffer start|end")));
        assert_eq!(results[5], Err(CommandError::Unknown("dance".to_string())));
    }

    #[test]
    fn test_play_without_offset_uses_local_position() {
        // テスト項目: オフセット省略時の /play はローカルプレイヤーの位置を送る
        // given (前提条件):
        let command = UserCommand::Play(None);

        // when (操作):
        let message = command.into_client_message(42.0);

        // then (期待する結果):
        assert_eq!(message, Some(ClientMessage::Play { offset: 42.0 }));
        assert_eq!(UserCommand::Help.into_client_message(42.0), None);
    }
}
