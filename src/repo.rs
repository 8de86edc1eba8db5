use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoSpecError {
    #[error("invalid repository '{0}', expected [OWNER/]REPO")]
    Invalid(String),
}

/// A repository given as `REPO` or `OWNER/REPO`.
///
/// When the owner is omitted, the card goes to a repository of the
/// authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub owner: Option<String>,
    pub name: String,
}

impl FromStr for RepoSpec {
    type Err = RepoSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RepoSpecError::Invalid(s.to_string());

        let parts: Vec<&str> = s.split('/').collect();
        let (owner, name) = match parts.as_slice() {
            [name] => (None, *name),
            [owner, name] if !owner.is_empty() => (Some(owner.to_string()), *name),
            _ => return Err(invalid()),
        };

        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}/{}", owner, self.name),
            None => f.write_str(&self.name),
        }
    }
}
