use std::num::{ParseFloatError, ParseIntError};

use serde::Serialize;
use thiserror::Error;

use crate::{CategoryFilter, Granularity, MapStyle, RawCode, UnknownVariant};

/// One UI event, in the line format understood by the harness.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MapCommand {
    Click {
        code: RawCode,
        granularity: Granularity,
        at_ms: u64,
    },
    ClickEmpty {
        at_ms: u64,
    },
    Deselect,
    Touch {
        at_ms: u64,
    },
    Advance {
        at_ms: u64,
    },
    Zoom {
        level: f64,
    },
    Move {
        lng: f64,
        lat: f64,
    },
    Filter {
        text: String,
    },
    Category {
        filter: CategoryFilter,
    },
    Color {
        code: RawCode,
        granularity: Granularity,
        color: String,
    },
    Style {
        style: MapStyle,
    },
    Opacity {
        value: f32,
    },
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
    #[error("invalid float '{value}' for {context}: {source}")]
    InvalidFloat {
        value: String,
        context: &'static str,
        source: ParseFloatError,
    },
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    #[error(transparent)]
    InvalidVariant(#[from] UnknownVariant),
}

pub fn parse_command_line(input: &str) -> Result<MapCommand, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let mut parts = trimmed.split_whitespace();
    let verb = parts
        .next()
        .map(|v| v.to_ascii_lowercase())
        .ok_or(CommandParseError::Empty)?;

    match verb.as_str() {
        "click" => {
            let code_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("code"))?;
            let granularity_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("granularity"))?;
            let at_str = parts.next().unwrap_or("0");
            let code = parse_u32(code_str, "click code")?;
            let granularity = granularity_str.parse::<Granularity>()?;
            let at_ms = parse_u64(at_str, "click time")?;
            Ok(MapCommand::Click {
                code,
                granularity,
                at_ms,
            })
        }
        "click_empty" => {
            let at_str = parts.next().unwrap_or("0");
            let at_ms = parse_u64(at_str, "click time")?;
            Ok(MapCommand::ClickEmpty { at_ms })
        }
        "deselect" => Ok(MapCommand::Deselect),
        "touch" => {
            let at_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("time"))?;
            let at_ms = parse_u64(at_str, "touch time")?;
            Ok(MapCommand::Touch { at_ms })
        }
        "advance" => {
            let at_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("time"))?;
            let at_ms = parse_u64(at_str, "advance time")?;
            Ok(MapCommand::Advance { at_ms })
        }
        "zoom" => {
            let level_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("level"))?;
            let level = parse_f64(level_str, "zoom level")?;
            Ok(MapCommand::Zoom { level })
        }
        "move" => {
            let lng_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("lng"))?;
            let lat_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("lat"))?;
            let lng = parse_f64(lng_str, "longitude")?;
            let lat = parse_f64(lat_str, "latitude")?;
            Ok(MapCommand::Move { lng, lat })
        }
        "filter" => {
            // The filter text keeps its own spacing; an absent text clears it.
            let text = trimmed[verb.len()..].trim().to_string();
            Ok(MapCommand::Filter { text })
        }
        "category" => {
            let filter_str = parts.next().unwrap_or("all");
            let filter = filter_str.parse::<CategoryFilter>()?;
            Ok(MapCommand::Category { filter })
        }
        "color" => {
            let code_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("code"))?;
            let granularity_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("granularity"))?;
            let color_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("color"))?;
            let code = parse_u32(code_str, "color code")?;
            let granularity = granularity_str.parse::<Granularity>()?;
            let color = parse_color(color_str)?;
            Ok(MapCommand::Color {
                code,
                granularity,
                color,
            })
        }
        "style" => {
            let style_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("style"))?;
            let style = style_str.parse::<MapStyle>()?;
            Ok(MapCommand::Style { style })
        }
        "opacity" => {
            let value_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("value"))?;
            let value = parse_f32(value_str, "opacity value")?;
            Ok(MapCommand::Opacity { value })
        }
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_u32(value: &str, context: &'static str) -> Result<u32, CommandParseError> {
    value
        .parse::<u32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_u64(value: &str, context: &'static str) -> Result<u64, CommandParseError> {
    value
        .parse::<u64>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_f32(value: &str, context: &'static str) -> Result<f32, CommandParseError> {
    value
        .parse::<f32>()
        .map_err(|source| CommandParseError::InvalidFloat {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_f64(value: &str, context: &'static str) -> Result<f64, CommandParseError> {
    value
        .parse::<f64>()
        .map_err(|source| CommandParseError::InvalidFloat {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_color(token: &str) -> Result<String, CommandParseError> {
    let hex = token
        .strip_prefix('#')
        .ok_or_else(|| CommandParseError::InvalidColor(token.to_string()))?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CommandParseError::InvalidColor(token.to_string()));
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_click_with_default_time() {
        let command = parse_command_line("click 570101 fine").unwrap();
        assert_eq!(
            command,
            MapCommand::Click {
                code: 570_101,
                granularity: Granularity::Fine,
                at_ms: 0,
            }
        );
    }

    #[test]
    fn filter_keeps_its_text() {
        let command = parse_command_line("filter 91, 1305**").unwrap();
        assert_eq!(
            command,
            MapCommand::Filter {
                text: "91, 1305**".to_string()
            }
        );
        assert_eq!(
            parse_command_line("FILTER").unwrap(),
            MapCommand::Filter {
                text: String::new()
            }
        );
    }

    #[test]
    fn move_takes_longitude_then_latitude() {
        assert_eq!(
            parse_command_line("move 135.5 34.7").unwrap(),
            MapCommand::Move {
                lng: 135.5,
                lat: 34.7,
            }
        );
        assert!(matches!(
            parse_command_line("move 135.5"),
            Err(CommandParseError::MissingArgument("lat"))
        ));
    }

    #[test]
    fn colors_are_normalized() {
        let command = parse_command_line("color 57 coarse #AABBCC").unwrap();
        assert_eq!(
            command,
            MapCommand::Color {
                code: 57,
                granularity: Granularity::Coarse,
                color: "#aabbcc".to_string(),
            }
        );
        assert!(matches!(
            parse_command_line("color 57 coarse red"),
            Err(CommandParseError::InvalidColor(_))
        ));
    }

    #[test]
    fn rejects_unknown_variants() {
        assert!(matches!(
            parse_command_line("category wild"),
            Err(CommandParseError::InvalidVariant(_))
        ));
        assert!(matches!(
            parse_command_line("click 57 tiny"),
            Err(CommandParseError::InvalidVariant(_))
        ));
        assert!(matches!(
            parse_command_line("warp 9"),
            Err(CommandParseError::UnknownCommand(_))
        ));
        assert!(matches!(parse_command_line("   "), Err(CommandParseError::Empty)));
    }
}
