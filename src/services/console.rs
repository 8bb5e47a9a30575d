use crate::{
    error::ParseCommandError, services::session_driver::SessionCommand, state::CharacterId,
};

/// Parse one line of console input into a session command.
///
/// Hit points default to 1; negative values are clamped to 0.
pub fn parse_command(line: &str) -> Result<SessionCommand, ParseCommandError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Err(ParseCommandError::Empty);
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "start" => SessionCommand::StartGame,
        "stop" => SessionCommand::StopGame,
        "pause" => SessionCommand::PauseGame,
        "resume" => SessionCommand::ResumeGame,
        "replay" => SessionCommand::ReplayGame,
        "over" => SessionCommand::GameOver {
            final_score: words
                .next()
                .map(|value| parse_points("over", value))
                .transpose()?,
        },
        "hit" => SessionCommand::RegisterHit {
            points: words
                .next()
                .map(|value| parse_points("hit", value))
                .transpose()?
                .unwrap_or(1),
        },
        "character" => {
            let id = words.next().ok_or(ParseCommandError::MissingArgument {
                command: "character",
                expected: "a character id",
            })?;
            SessionCommand::SelectCharacter(CharacterId::new(id))
        }
        "size" => {
            let (Some(width), Some(height)) = (words.next(), words.next()) else {
                return Err(ParseCommandError::MissingArgument {
                    command: "size",
                    expected: "<width> <height>",
                });
            };
            SessionCommand::UpdateViewSize {
                width: parse_dimension(width)?,
                height: parse_dimension(height)?,
            }
        }
        "camera" => match words.next() {
            Some("on") => SessionCommand::CaptureAvailability(true),
            Some("off") => SessionCommand::CaptureAvailability(false),
            Some(other) => {
                return Err(ParseCommandError::InvalidArgument {
                    command: "camera",
                    value: other.to_string(),
                });
            }
            None => {
                return Err(ParseCommandError::MissingArgument {
                    command: "camera",
                    expected: "`on` or `off`",
                });
            }
        },
        other => return Err(ParseCommandError::Unknown(other.to_string())),
    };

    Ok(command)
}

fn parse_points(command: &'static str, value: &str) -> Result<u32, ParseCommandError> {
    let points = value
        .parse::<i64>()
        .map_err(|_| ParseCommandError::InvalidArgument {
            command,
            value: value.to_string(),
        })?;
    Ok(u32::try_from(points.max(0)).unwrap_or(u32::MAX))
}

fn parse_dimension(value: &str) -> Result<u32, ParseCommandError> {
    value
        .parse::<u32>()
        .map_err(|_| ParseCommandError::InvalidArgument {
            command: "size",
            value: value.to_string(),
        })
}
