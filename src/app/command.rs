use thiserror::Error;

pub const USAGE: &str = "\
usage: keepsake [COMMAND]

commands:
  show            load the page and print the stored name and photo (default)
  name <NAME>     set the display name
  greet           print the greeting for the stored name
  capture         take a photo with the camera
  pick            choose a photo from the Pictures library
  search <QUERY>  report a search query
  help            print this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Name(String),
    Greet,
    Capture,
    Pick,
    Search(String),
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("`{command}` requires {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// Parses arguments after the program name. Trailing words of `name` and
/// `search` are joined with single spaces.
pub fn parse_command<I>(args: I) -> Result<Command, CommandError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Show);
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "show" => Ok(Command::Show),
        "greet" => Ok(Command::Greet),
        "capture" => Ok(Command::Capture),
        "pick" => Ok(Command::Pick),
        "help" | "-h" | "--help" => Ok(Command::Help),
        // An empty name is a valid value, so only a missing word is rejected.
        "name" if rest.is_empty() => Err(CommandError::MissingArgument {
            command: "name",
            argument: "a display name",
        }),
        "name" => Ok(Command::Name(rest.join(" "))),
        "search" => {
            let query = rest.join(" ");
            if query.trim().is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "search",
                    argument: "a query",
                });
            }
            Ok(Command::Search(query))
        }
        _ => Err(CommandError::Unknown(command)),
    }
}
