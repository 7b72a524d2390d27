//! Line commands

use gatehouse_types::PriceId;

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignIn { email: String, password: String },
    Subscribe(PriceId),
    Portal,
    SignOut,
    Show,
    Help,
    Quit,
}

/// Usage text
pub const HELP: &str = "\
Commands:
  signin <email> <password>   sign in
  subscribe <price_id>        start a checkout for a price tier
  portal                      open the billing portal
  signout                     sign out
  show                        print the current view
  help                        show this text
  quit                        exit";

/// Command parse error
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parse a line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("signin", [email, password]) => Self::SignIn {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("signin", _) => return Err(CommandError::Usage("signin <email> <password>")),
            ("subscribe", [price]) => Self::Subscribe(PriceId::new(*price)),
            ("subscribe", _) => return Err(CommandError::Usage("subscribe <price_id>")),
            ("portal", []) => Self::Portal,
            ("signout", []) => Self::SignOut,
            ("show", []) => Self::Show,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(Some(command))
    }
}
