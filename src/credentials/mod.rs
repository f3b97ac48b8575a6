use crate::error::{JudgeError, Result};

/// Environment variable holding the store access token
pub const ENV_TOKEN_VAR: &str = "JUDGE_DESK_TOKEN";

/// Environment variable holding the acting supervisor's user id
pub const ENV_USER_VAR: &str = "JUDGE_DESK_USER";

/// Who is acting, and with which credential. Passed explicitly into every
/// operation that reads or writes the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

impl Session {
    pub fn new(user_id: &str, token: &str) -> Self {
        Self {
            user_id: user_id.trim().to_string(),
            token: token.trim().to_string(),
        }
    }

    /// Refuse to go further without both a user and a token.
    pub fn ensure_authenticated(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(JudgeError::Auth(format!(
                "no session token; pass --token or set {}",
                ENV_TOKEN_VAR
            )));
        }
        if self.user_id.is_empty() {
            return Err(JudgeError::Auth(format!(
                "no user id; pass --user or set {}",
                ENV_USER_VAR
            )));
        }
        Ok(())
    }
}

/// Read a variable, treating unset and blank the same.
fn non_empty_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn pick(flag: Option<String>, env_name: &str) -> Option<String> {
    flag.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| non_empty_env(env_name))
}

/// Build a session from command-line values, falling back to the environment.
pub fn resolve_session(token_flag: Option<String>, user_flag: Option<String>) -> Result<Session> {
    let token = pick(token_flag, ENV_TOKEN_VAR).unwrap_or_default();
    let user_id = pick(user_flag, ENV_USER_VAR).unwrap_or_default();
    let session = Session::new(&user_id, &token);
    session.ensure_authenticated()?;
    Ok(session)
}
