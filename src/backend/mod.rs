use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod github;

/// A card as created on a project board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// URL of the issue for issue cards
    pub url: String,
    pub project: String,
    pub column: String,
    /// Number of the issue the card links to
    pub issue: Option<u64>,
}

/// Issue to open before putting it on a board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    /// Milestone title, matched case-insensitively
    pub milestone: Option<String>,
}

/// How the user designated a project: by its number or by its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    Number(u32),
    Name(String),
}

impl ProjectSelector {
    pub fn parse(input: &str) -> Self {
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = input.parse() {
                return ProjectSelector::Number(number);
            }
        }
        ProjectSelector::Name(input.to_string())
    }

    /// Names are compared case-insensitively
    pub fn matches(&self, number: u32, name: &str) -> bool {
        match self {
            ProjectSelector::Number(n) => *n == number,
            ProjectSelector::Name(wanted) => wanted.to_lowercase() == name.to_lowercase(),
        }
    }
}

impl fmt::Display for ProjectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectSelector::Number(n) => write!(f, "#{}", n),
            ProjectSelector::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("project '{project}' not found in {board} (available: {})", available.join(", "))]
    ProjectNotFound {
        board: String,
        project: String,
        available: Vec<String>,
    },

    #[error("column '{column}' not found in project '{project}' (available: {})", available.join(", "))]
    ColumnNotFound {
        project: String,
        column: String,
        available: Vec<String>,
    },

    #[error("label '{label}' not found in {repo}, use --create-missing to create it")]
    LabelNotFound { repo: String, label: String },

    #[error("milestone '{milestone}' not found in {repo} (available: {})", available.join(", "))]
    MilestoneNotFound {
        repo: String,
        milestone: String,
        available: Vec<String>,
    },
}

/// Service filing cards on project boards
#[async_trait]
pub trait RepoCardService: Send + Sync {
    /// Login of the authenticated user
    async fn resolve_username(&self) -> Result<String>;

    async fn repo_exists(&self, owner: &str, name: &str) -> Result<bool>;

    /// Add a note card to a column of one of the repository's projects
    async fn create_card(
        &self,
        owner: &str,
        name: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card>;

    /// Open an issue on the repository and add it as a card to a column of
    /// one of its projects
    async fn create_issue_card(
        &self,
        owner: &str,
        name: &str,
        project: &ProjectSelector,
        column: &str,
        issue: &IssueDraft,
    ) -> Result<Card>;

    /// Add a note card to a column of one of the user's own projects
    async fn create_user_card(
        &self,
        login: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card>;
}
