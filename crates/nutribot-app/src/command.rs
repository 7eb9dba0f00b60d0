//! Terminal input lines mapped to controller actions.

use std::path::PathBuf;

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    /// A food description to analyse.
    Text(String),
    Photo(PathBuf),
    Voice,
    Food(String),
    Quantity(String),
    Confirm,
    Cancel,
    Help,
    Quit,
    /// A `/word` that is not a known command, or one missing its argument.
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Text(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg.is_empty()) {
            ("foto", false) => Command::Photo(PathBuf::from(arg)),
            ("voz", _) => Command::Voice,
            ("comida", false) => Command::Food(arg.to_string()),
            ("cantidad", false) => Command::Quantity(arg.to_string()),
            ("confirmar", _) => Command::Confirm,
            ("cancelar", _) => Command::Cancel,
            ("ayuda", _) => Command::Help,
            ("salir", _) => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            Command::parse("  2 manzanas \n"),
            Command::Text("2 manzanas".into())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_commands_without_arguments() {
        assert_eq!(Command::parse("/voz"), Command::Voice);
        assert_eq!(Command::parse("/confirmar"), Command::Confirm);
        assert_eq!(Command::parse("/cancelar"), Command::Cancel);
        assert_eq!(Command::parse("/ayuda"), Command::Help);
        assert_eq!(Command::parse("/salir"), Command::Quit);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            Command::parse("/foto  ~/fotos/almuerzo.jpg"),
            Command::Photo(PathBuf::from("~/fotos/almuerzo.jpg"))
        );
        assert_eq!(
            Command::parse("/comida manzana verde"),
            Command::Food("manzana verde".into())
        );
        assert_eq!(
            Command::parse("/cantidad 3 unidades"),
            Command::Quantity("3 unidades".into())
        );
    }

    #[test]
    fn test_missing_argument_is_unknown() {
        assert_eq!(Command::parse("/foto"), Command::Unknown("/foto".into()));
        assert_eq!(
            Command::parse("/cantidad   "),
            Command::Unknown("/cantidad".into())
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("/borrar todo"),
            Command::Unknown("/borrar todo".into())
        );
    }
}
