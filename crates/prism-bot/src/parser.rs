//! Command grammar: `!name[ arg1, arg2, ...]`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix marking a message as a command.
pub const SIGIL: char = '!';

static COMMAND_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!(\w+)(?:\s+([\w\s#,]*))?$").expect("command pattern is valid"));

/// A message that matched the command grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Parse `text` as a command, `None` if it does not match the grammar.
///
/// Arguments are split on commas and trimmed. Empty tokens keep their
/// position; a blank argument list yields no arguments.
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let captures = COMMAND_REGEX.captures(text)?;
    let name = captures.get(1)?.as_str().to_string();

    let args = match captures.get(2).map(|m| m.as_str()) {
        Some(blob) if !blob.trim().is_empty() => {
            blob.split(',').map(|token| token.trim().to_string()).collect()
        }
        _ => Vec::new(),
    };

    Some(ParsedCommand { name, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: &str, args: &[&str]) -> Option<ParsedCommand> {
        Some(ParsedCommand {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn test_bare_command() {
        assert_eq!(parse("!random"), parsed("random", &[]));
        assert_eq!(parse("!random   "), parsed("random", &[]));
    }

    #[test]
    fn test_arguments_are_split_and_trimmed() {
        assert_eq!(
            parse("!addtopic rust , Topics"),
            parsed("addtopic", &["rust", "Topics"])
        );
        assert_eq!(parse("!quote Ally Cat"), parsed("quote", &["Ally Cat"]));
        assert_eq!(parse("!quote bob#0420"), parsed("quote", &["bob#0420"]));
    }

    #[test]
    fn test_empty_tokens_keep_position() {
        assert_eq!(parse("!cmd a,,b"), parsed("cmd", &["a", "", "b"]));
    }

    #[test]
    fn test_non_matching_text() {
        assert_eq!(parse("hello"), None);
        assert_eq!(parse("!"), None);
        assert_eq!(parse("! random"), None);
        assert_eq!(parse("!random!"), None);
        assert_eq!(parse("!quote what?"), None);
    }
}
