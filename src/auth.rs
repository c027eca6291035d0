//! Session management: which user the CLI is acting as.
//!
//! A thin stand-in for the authentication collaborator. The signed-in
//! user's identifier lives in `session.json` inside the data directory;
//! every task and project mutation is a silent no-op while no user is
//! signed in.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Serialize, Deserialize)]
struct Session {
    user: String,
}

fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

/// The currently signed-in user identifier, if any.
pub fn current_user(data_dir: &Path) -> Option<String> {
    let path = session_path(data_dir);
    if !path.exists() {
        return None;
    }
    let mut buf = String::new();
    File::open(path).and_then(|mut f| f.read_to_string(&mut buf)).ok()?;
    let session: Session = serde_json::from_str(&buf).ok()?;
    let user = sanitize_user_name(&session.user);
    (!user.is_empty()).then_some(user)
}

/// Sign in as `name`. Replaces any existing session.
pub fn login(data_dir: &Path, name: &str) -> Result<String> {
    let user = sanitize_user_name(name);
    if user.is_empty() {
        return Err(crate::error::Error::EmptyTitle);
    }
    let session = Session { user: user.clone() };
    let data = serde_json::to_string_pretty(&session)?;
    let mut f = File::create(session_path(data_dir))?;
    f.write_all(data.as_bytes())?;
    Ok(user)
}

/// Sign out. Fine to call when already signed out.
pub fn logout(data_dir: &Path) -> Result<()> {
    let path = session_path(data_dir);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Convert a user name to a safe identifier for file naming: lowercase,
/// non-alphanumeric runs collapsed to single underscores.
pub fn sanitize_user_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
