use std::str::FromStr;

use roster_sync::Flag;

pub const HELP: &str = "\
commands:
  show                     redraw the grid
  search <text>            filter by first or last name
  clear                    drop the filter
  toggle <row#> <flag>     flip seen | intend_view | cv_saved | contacted
  autosave on|off          enable or pause automatic saving
  save                     write pending edits now
  refresh                  reload the roster from the shared link
  status                   connection and save state
  help                     this text
  quit                     exit, saving pending edits if autosave is on";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Search(String),
    Clear,
    Toggle { row: usize, flag: Flag },
    Autosave(bool),
    Save,
    Refresh,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word.to_ascii_lowercase().as_str() {
            "" | "show" | "ls" => Ok(Command::Show),
            "search" | "/" => Ok(if rest.is_empty() { Command::Clear } else { Command::Search(rest.to_string()) }),
            "clear" => Ok(Command::Clear),
            "toggle" | "t" => {
                let mut parts = rest.split_whitespace();
                let (Some(row), Some(flag), None) = (parts.next(), parts.next(), parts.next()) else {
                    return Err("usage: toggle <row#> <flag>".into());
                };
                let row = row.parse().map_err(|_| format!("not a row number: {row}"))?;
                Ok(Command::Toggle { row, flag: flag.parse()? })
            }
            "autosave" => match rest.to_ascii_lowercase().as_str() {
                "on" => Ok(Command::Autosave(true)),
                "off" => Ok(Command::Autosave(false)),
                _ => Err("usage: autosave on|off".into()),
            },
            "save" => Ok(Command::Save),
            "refresh" => Ok(Command::Refresh),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("".parse::<Command>(), Ok(Command::Show));
        assert_eq!("search  van der Berg ".parse::<Command>(), Ok(Command::Search("van der Berg".into())));
        assert_eq!("search".parse::<Command>(), Ok(Command::Clear));
        assert_eq!("toggle 3 cv_saved".parse::<Command>(), Ok(Command::Toggle { row: 3, flag: Flag::CvSaved }));
        assert_eq!("AUTOSAVE off".parse::<Command>(), Ok(Command::Autosave(false)));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!("toggle 3".parse::<Command>().is_err());
        assert!("toggle x seen".parse::<Command>().unwrap_err().contains("row number"));
        assert!("toggle 1 starred".parse::<Command>().unwrap_err().contains("unknown flag"));
        assert!("autosave maybe".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().unwrap_err().contains("help"));
    }
}
