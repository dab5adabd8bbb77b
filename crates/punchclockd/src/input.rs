//! Kiosk terminal input

/// One line typed at the kiosk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskInput {
    Pin(String),
    ClockIn(String),
    Break(String),
    ClockOut(String),
    Status,
    Logout,
    Quit,
}

impl KioskInput {
    /// Parse a line. While nobody is logged in, anything but `quit` is a PIN.
    /// Blank lines yield `Ok(None)`; unknown commands yield a help message.
    pub fn parse(line: &str, logged_in: bool) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        let command = command.to_ascii_lowercase();

        if command == "quit" {
            return Ok(Some(KioskInput::Quit));
        }
        if !logged_in {
            return Ok(Some(KioskInput::Pin(line.to_string())));
        }

        let input = match command.as_str() {
            "in" => KioskInput::ClockIn(rest.to_string()),
            "break" | "pause" => KioskInput::Break(rest.to_string()),
            "out" => KioskInput::ClockOut(rest.to_string()),
            "status" => KioskInput::Status,
            "logout" => KioskInput::Logout,
            other => {
                return Err(format!(
                    "Unknown command '{}': in | break | out | status | logout | quit",
                    other
                ));
            }
        };
        Ok(Some(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_out_lines_are_pins() {
        assert_eq!(
            KioskInput::parse(" 1234 ", false),
            Ok(Some(KioskInput::Pin("1234".into())))
        );
        assert_eq!(
            KioskInput::parse("in", false),
            Ok(Some(KioskInput::Pin("in".into())))
        );
        assert_eq!(KioskInput::parse("QUIT", false), Ok(Some(KioskInput::Quit)));
    }

    #[test]
    fn test_commands_with_comments() {
        assert_eq!(
            KioskInput::parse("in  early shift ", true),
            Ok(Some(KioskInput::ClockIn("early shift".into())))
        );
        assert_eq!(
            KioskInput::parse("Pause", true),
            Ok(Some(KioskInput::Break(String::new())))
        );
        assert_eq!(
            KioskInput::parse("out done", true),
            Ok(Some(KioskInput::ClockOut("done".into())))
        );
        assert_eq!(KioskInput::parse("logout", true), Ok(Some(KioskInput::Logout)));
    }

    #[test]
    fn test_blank_and_unknown() {
        assert_eq!(KioskInput::parse("   ", true), Ok(None));
        assert!(KioskInput::parse("dance", true).is_err());
    }
}
