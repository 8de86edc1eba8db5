use std::path::PathBuf;
use thiserror::Error;

use crate::cli::Cli;
use crate::router::CardDefaults;
use crate::template::{Placeholder, TemplateError};
use crate::types::{CaptureRequest, Destination, Idea, IssueOptions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("The following options are not allowed when using GitHub: {}", .0.join(", "))]
    NotAllowedWithGitHub(Vec<&'static str>),

    #[error("The following options can only be used with --gh: {}", .0.join(", "))]
    GitHubOnly(Vec<&'static str>),

    #[error("The following options can only be used with --issue: {}", .0.join(", "))]
    IssueOnly(Vec<&'static str>),

    #[error("--issue needs --repo: issues cannot be opened on user projects")]
    IssueWithoutRepo,

    #[error("The idea is empty")]
    EmptyIdea,

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Settings of one invocation, validated once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Passed explicitly to the GitHub client
    pub github_token: Option<String>,
    pub local_copy: Option<PathBuf>,
    pub defaults: CardDefaults,
    pub create_missing: bool,
    pub dry_run: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, UsageError> {
        cli.default_project.allow_only(&[
            Placeholder::Owner,
            Placeholder::Repository,
            Placeholder::Username,
        ])?;
        cli.default_column.allow_only(&[
            Placeholder::Owner,
            Placeholder::Repository,
            Placeholder::Username,
            Placeholder::Project,
        ])?;

        Ok(Self {
            github_token: cli.github_token.clone().filter(|token| !token.is_empty()),
            local_copy: cli.local_copy.clone(),
            defaults: CardDefaults {
                project: cli.default_project.clone(),
                column: cli.default_column.clone(),
            },
            create_missing: cli.create_missing,
            dry_run: cli.dry_run,
        })
    }
}

/// Build the request, rejecting options that make no sense for the destination
pub fn capture_request(cli: &Cli) -> Result<CaptureRequest, UsageError> {
    let body = cli.idea.join(" ");
    if body.trim().is_empty() {
        return Err(UsageError::EmptyIdea);
    }

    let mut idea = Idea::new(body);
    if let Some(title) = &cli.title {
        idea = idea.with_title(title.clone());
    }

    let mut tags: Vec<String> = Vec::new();
    for tag in &cli.tags {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    let destination = if cli.gh {
        let mut rejected = Vec::new();
        if cli.color.is_some() {
            rejected.push("--color");
        }
        if !cli.tags.is_empty() && !cli.issue {
            rejected.push("--tag");
        }
        if cli.pin {
            rejected.push("--pin");
        }
        if !rejected.is_empty() {
            return Err(UsageError::NotAllowedWithGitHub(rejected));
        }

        let issue = if cli.issue {
            if cli.repo.is_none() {
                return Err(UsageError::IssueWithoutRepo);
            }
            Some(IssueOptions {
                labels: tags,
                assignees: cli.assign_to.clone(),
                self_assign: !cli.no_self_assign,
                milestone: cli.milestone.clone(),
            })
        } else {
            let mut rejected = Vec::new();
            if !cli.assign_to.is_empty() {
                rejected.push("--assign-to");
            }
            if cli.no_self_assign {
                rejected.push("--no-self-assign");
            }
            if cli.milestone.is_some() {
                rejected.push("--milestone");
            }
            if !rejected.is_empty() {
                return Err(UsageError::IssueOnly(rejected));
            }
            None
        };

        Destination::GitHub {
            repo: cli.repo.clone(),
            project: cli.project.clone(),
            column: cli.column.clone(),
            issue,
        }
    } else {
        let mut rejected = Vec::new();
        if cli.repo.is_some() {
            rejected.push("--repo");
        }
        if cli.project.is_some() {
            rejected.push("--project");
        }
        if cli.column.is_some() {
            rejected.push("--column");
        }
        if cli.issue {
            rejected.push("--issue");
        }
        if !cli.assign_to.is_empty() {
            rejected.push("--assign-to");
        }
        if cli.no_self_assign {
            rejected.push("--no-self-assign");
        }
        if cli.milestone.is_some() {
            rejected.push("--milestone");
        }
        if cli.create_missing {
            rejected.push("--create-missing");
        }
        if !rejected.is_empty() {
            return Err(UsageError::GitHubOnly(rejected));
        }

        Destination::Notes {
            color: cli.color.clone(),
            tags,
            pinned: cli.pin,
        }
    };

    Ok(CaptureRequest { idea, destination })
}
