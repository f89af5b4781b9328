use anyhow::bail;
use std::env;
use std::process::Command;

/// Author for new revisions: git identity, else the login name
pub fn current_author() -> anyhow::Result<String> {
    let login = env::var("USER").or_else(|_| env::var("USERNAME")).ok();

    match compose_author(git_config("user.name"), git_config("user.email"), login) {
        Some(author) => Ok(author),
        None => bail!("could not determine author: set git user.name or USER"),
    }
}

fn git_config(key: &str) -> Option<String> {
    let output = Command::new("git").args(["config", key]).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

fn compose_author(
    name: Option<String>,
    email: Option<String>,
    login: Option<String>,
) -> Option<String> {
    match (name, email) {
        (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
        (Some(name), None) => Some(name),
        (None, _) => login,
    }
}
