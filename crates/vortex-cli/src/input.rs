//! Command line parsing for the interactive prompt.

use serde_json::Value;

/// Maximum username length accepted at the prompt
const MAX_USERNAME_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Login(Option<String>),
    Logout,
    WhoAmI,
    Go(String),
    Routes,
    Get(String),
    Delete(String),
    Post(String, Value),
    Put(String, Value),
    Signup(String),
    SetPassword(String),
    Quit,
}

pub const HELP: &str = "\
Commands:
  login [username]         sign in
  logout                   sign out
  whoami                   show the current user
  go <path>                open a view, e.g. go /leave
  routes                   list views and whether you can open them
  get <path>               GET an API path, e.g. get leaves/
  delete <path>            DELETE an API path
  post <path> <json>       POST a JSON body
  put <path> <json>        PUT a JSON body
  signup <username>        create an account
  set-password <token>     set the password for an invitation
  help                     show this help
  quit                     leave";

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        match word {
            "help" | "?" => Ok(Command::Help),
            "login" => {
                if rest.is_empty() {
                    Ok(Command::Login(None))
                } else {
                    validate_username(rest)?;
                    Ok(Command::Login(Some(rest.to_string())))
                }
            }
            "logout" => Ok(Command::Logout),
            "whoami" => Ok(Command::WhoAmI),
            "go" | "open" => Ok(Command::Go(required(rest, "go <path>")?)),
            "routes" => Ok(Command::Routes),
            "get" => Ok(Command::Get(required(rest, "get <path>")?)),
            "delete" => Ok(Command::Delete(required(rest, "delete <path>")?)),
            "post" => {
                let (path, body) = path_and_body(rest, "post <path> <json>")?;
                Ok(Command::Post(path, body))
            }
            "put" => {
                let (path, body) = path_and_body(rest, "put <path> <json>")?;
                Ok(Command::Put(path, body))
            }
            "signup" => {
                let username = required(rest, "signup <username>")?;
                validate_username(&username)?;
                Ok(Command::Signup(username))
            }
            "set-password" => Ok(Command::SetPassword(required(rest, "set-password <token>")?)),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(String::new()),
            other => Err(format!("Unknown command '{}'. Type 'help' for a list.", other)),
        }
    }
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest.to_string())
    }
}

fn path_and_body(rest: &str, usage: &str) -> Result<(String, Value), String> {
    let (path, body) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("Usage: {}", usage))?;
    let body: Value =
        serde_json::from_str(body.trim()).map_err(|e| format!("Invalid JSON body: {}", e))?;
    Ok((path.to_string(), body))
}

/// Reject usernames that could not have come from the login form.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!("Username longer than {} characters", MAX_USERNAME_LENGTH));
    }
    if username.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err("Username cannot contain spaces or control characters".to_string());
    }
    Ok(())
}
