use std::path::PathBuf;

use crate::{ArchiverError, Result};

pub const USAGE: &str = "bds-archiver <command> [--config PATH]

commands:
  harvest              launch the server, receive harvested data, build the palette
  palette <data.json>  build the palette from a saved hand-off
  capture              launch the server and capture from the frame relay
  replay <frames.json> re-run the dispatcher over a recording
  run                  harvest, then capture";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Harvest,
    Palette { data: PathBuf },
    Capture,
    Replay { recording: PathBuf },
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub command: Command,
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse arguments, program name excluded.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut config = None;
        let mut positional = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--config" {
                let path = args
                    .next()
                    .ok_or_else(|| ArchiverError::Usage("--config needs a path".to_owned()))?;
                config = Some(PathBuf::from(path));
            } else if let Some(path) = arg.strip_prefix("--config=") {
                config = Some(PathBuf::from(path));
            } else {
                positional.push(arg);
            }
        }

        let mut positional = positional.into_iter();
        let name = positional.next().unwrap_or_default();
        let mut operand = |what: &str| {
            positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| ArchiverError::Usage(format!("{name} needs {what}\n\n{USAGE}")))
        };
        let command = match name.as_str() {
            "harvest" => Command::Harvest,
            "palette" => Command::Palette {
                data: operand("a data.json path")?,
            },
            "capture" => Command::Capture,
            "replay" => Command::Replay {
                recording: operand("a frames.json path")?,
            },
            "run" => Command::Run,
            other => {
                return Err(ArchiverError::Usage(format!(
                    "unknown command `{other}`\n\n{USAGE}"
                )));
            }
        };
        Ok(Self { command, config })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli> {
        Cli::parse(args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse(&["harvest"]).unwrap().command, Command::Harvest);
        assert_eq!(
            parse(&["replay", "out/frames.json"]).unwrap().command,
            Command::Replay {
                recording: PathBuf::from("out/frames.json")
            }
        );
    }

    #[test]
    fn test_config_flag_anywhere() {
        let cli = parse(&["--config", "a.toml", "palette", "data.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert_eq!(
            cli.command,
            Command::Palette {
                data: PathBuf::from("data.json")
            }
        );
        let cli = parse(&["run", "--config=b.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("b.toml")));
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(parse(&[]), Err(ArchiverError::Usage(_))));
        assert!(matches!(parse(&["palette"]), Err(ArchiverError::Usage(_))));
        assert!(matches!(parse(&["capture", "--config"]), Err(ArchiverError::Usage(_))));
        assert!(matches!(parse(&["dance"]), Err(ArchiverError::Usage(_))));
    }
}
