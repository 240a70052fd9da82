/// Commands the bot answers. Anything else starting with '/' is ignored
/// but still never counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Streak,
    Stats,
    History,
    Top,
    Reset,
}

/// Parses a command out of message text. Group chats address commands as
/// `/streak@SomeBot`, the bot-name suffix is stripped before matching.
pub fn parse(text: &str) -> Option<Command> {
    let first_word = text.split_whitespace().next()?;
    let command = first_word.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);

    match command {
        "start" => Some(Command::Start),
        "streak" => Some(Command::Streak),
        "stats" => Some(Command::Stats),
        "history" => Some(Command::History),
        "top" => Some(Command::Top),
        "reset" => Some(Command::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{Command, parse};

    #[test_case("/start", Some(Command::Start))]
    #[test_case("/streak", Some(Command::Streak))]
    #[test_case("/stats", Some(Command::Stats))]
    #[test_case("/history", Some(Command::History))]
    #[test_case("/top", Some(Command::Top))]
    #[test_case("/reset", Some(Command::Reset))]
    #[test_case("/streak@StreakBot", Some(Command::Streak))]
    #[test_case("/reset please", Some(Command::Reset))]
    #[test_case("/unknown", None)]
    #[test_case("hello", None)]
    #[test_case("", None)]
    #[test_case("streak", None)]
    fn parses_commands(text: &str, expected: Option<Command>) {
        assert_eq!(parse(text), expected);
    }
}
