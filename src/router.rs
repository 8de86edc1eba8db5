use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{Card, IssueDraft, ProjectSelector, RepoCardService};
use crate::color::{self, ColorName};
use crate::notes::{NoteHeader, NoteStore};
use crate::repo::RepoSpec;
use crate::template::{Placeholder, Template, Vars};
use crate::types::{CaptureRequest, Destination, Idea, IssueOptions};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("GitHub token is required. Set GITHUB_TOKEN env var or use --github-token")]
    MissingToken,

    #[error("No note store configured. Set IDEASEED_LOCAL_COPY env var or use --local-copy")]
    MissingNoteStore,

    #[error("repository {owner}/{name} does not exist")]
    RepoNotFound { owner: String, name: String },

    #[error("issues can only be created on a repository, use --repo")]
    IssueNeedsRepository,
}

/// Project and column used when the user does not name them
#[derive(Debug, Clone)]
pub struct CardDefaults {
    pub project: Template,
    pub column: Template,
}

impl CardDefaults {
    fn use_username(&self) -> bool {
        self.project.uses(Placeholder::Username) || self.column.uses(Placeholder::Username)
    }
}

/// What was filed, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Card {
        /// `owner/repo`, or `@login` for a user project
        board: String,
        project: String,
        column: String,
        /// `None` in dry run
        url: Option<String>,
        local_copy: Option<PathBuf>,
    },
    Issue {
        board: String,
        project: String,
        column: String,
        /// Number and URL are `None` in dry run
        number: Option<u64>,
        url: Option<String>,
        labels: Vec<String>,
        assignees: Vec<String>,
        milestone: Option<String>,
        local_copy: Option<PathBuf>,
    },
    Note {
        path: PathBuf,
        color: Option<ColorName>,
        tags: Vec<String>,
        pinned: bool,
        written: bool,
    },
}

fn location(board: &str, project: &str, column: &str) -> String {
    format!(
        "{} › {} › {}",
        board.blue().bold(),
        project.blue().bold(),
        column.blue()
    )
}

impl Outcome {
    /// Human readable report, one line per fact
    pub fn summary(&self) -> String {
        let mut out = String::new();

        match self {
            Outcome::Card {
                board,
                project,
                column,
                url,
                local_copy,
            } => {
                let location = location(board, project, column);
                match url {
                    Some(url) => {
                        out.push_str(&format!("Card created in {}\n", location));
                        out.push_str(&format!("  {}\n", url));
                    }
                    None => out.push_str(&format!("DRY RUN: would create a card in {}\n", location)),
                }

                if let Some(path) = local_copy {
                    out.push_str(&format!("Local copy: {}\n", path.display()));
                }
            }
            Outcome::Issue {
                board,
                project,
                column,
                number,
                url,
                labels,
                assignees,
                milestone,
                local_copy,
            } => {
                let location = location(board, project, column);
                match (number, url) {
                    (Some(number), Some(url)) => {
                        out.push_str(&format!("Issue #{} created in {}\n", number, location));
                        out.push_str(&format!("  {}\n", url));
                    }
                    _ => out.push_str(&format!("DRY RUN: would open an issue in {}\n", location)),
                }

                if !labels.is_empty() {
                    out.push_str(&format!("  Labels: {}\n", labels.join(", ")));
                }
                if !assignees.is_empty() {
                    out.push_str(&format!("  Assignees: {}\n", assignees.join(", ")));
                }
                if let Some(milestone) = milestone {
                    out.push_str(&format!("  Milestone: {}\n", milestone));
                }
                if let Some(path) = local_copy {
                    out.push_str(&format!("Local copy: {}\n", path.display()));
                }
            }
            Outcome::Note {
                path,
                color,
                tags,
                pinned,
                written,
            } => {
                if *written {
                    out.push_str(&format!("Note saved to {}\n", path.display()));
                } else {
                    out.push_str(&format!("DRY RUN: would save note to {}\n", path.display()));
                }

                if let Some(color) = color {
                    out.push_str(&format!("  Color: {}\n", color::render(*color)));
                }
                if !tags.is_empty() {
                    out.push_str(&format!("  Tags: {}\n", tags.join(", ")));
                }
                if *pinned {
                    out.push_str("  Pinned\n");
                }
            }
        }

        out
    }

    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }
}

/// Where a repository card goes
struct RepoTarget {
    /// `owner/repo`
    board: String,
    owner: String,
    /// Known when it is the owner or when something needs it
    username: Option<String>,
    project: String,
    column: String,
}

/// Files captured ideas on GitHub project boards or in the note store
pub struct IdeaRouter<S: RepoCardService> {
    cards: Option<S>,
    notes: Option<NoteStore>,
    defaults: CardDefaults,
    dry_run: bool,
}

impl<S: RepoCardService> IdeaRouter<S> {
    /// `cards` is only available when a GitHub token was configured
    pub fn new(
        cards: Option<S>,
        notes: Option<NoteStore>,
        defaults: CardDefaults,
        dry_run: bool,
    ) -> Self {
        Self {
            cards,
            notes,
            defaults,
            dry_run,
        }
    }

    pub fn cards(&self) -> Option<&S> {
        self.cards.as_ref()
    }

    pub async fn route(&self, request: &CaptureRequest) -> Result<Outcome> {
        match &request.destination {
            Destination::GitHub {
                repo,
                project,
                column,
                issue,
            } => {
                let cards = self.cards.as_ref().ok_or(CaptureError::MissingToken)?;
                let project = project.as_deref();
                let column = column.as_deref();

                match (repo, issue) {
                    (Some(repo), Some(issue)) => {
                        self.file_issue(cards, &request.idea, repo, project, column, issue)
                            .await
                    }
                    (Some(repo), None) => {
                        self.file_repo_card(cards, &request.idea, repo, project, column)
                            .await
                    }
                    (None, Some(_)) => Err(CaptureError::IssueNeedsRepository.into()),
                    (None, None) => {
                        self.file_user_card(cards, &request.idea, project, column)
                            .await
                    }
                }
            }
            Destination::Notes {
                color,
                tags,
                pinned,
            } => self.file_note(&request.idea, color.as_deref(), tags, *pinned),
        }
    }

    /// Fails if the repository does not exist
    async fn locate_repo(
        &self,
        cards: &S,
        repo: &RepoSpec,
        project: Option<&str>,
        column: Option<&str>,
        need_username: bool,
    ) -> Result<RepoTarget> {
        let owner = match &repo.owner {
            Some(owner) => owner.clone(),
            None => {
                let login = cards.resolve_username().await?;
                debug!(%login, "repository owner defaults to the authenticated user");
                login
            }
        };

        let username = if repo.owner.is_none() {
            Some(owner.clone())
        } else if need_username || self.defaults.use_username() {
            Some(cards.resolve_username().await?)
        } else {
            None
        };

        if !cards.repo_exists(&owner, &repo.name).await? {
            return Err(CaptureError::RepoNotFound {
                owner,
                name: repo.name.clone(),
            }
            .into());
        }

        let vars = Vars {
            owner: Some(owner.as_str()),
            repository: Some(repo.name.as_str()),
            username: username.as_deref(),
            project: None,
        };
        let (project, column) = self.resolve_board(project, column, vars)?;

        Ok(RepoTarget {
            board: format!("{}/{}", owner, repo.name),
            owner,
            username,
            project,
            column,
        })
    }

    async fn file_repo_card(
        &self,
        cards: &S,
        idea: &Idea,
        repo: &RepoSpec,
        project: Option<&str>,
        column: Option<&str>,
    ) -> Result<Outcome> {
        let RepoTarget {
            board,
            owner,
            project,
            column,
            ..
        } = self.locate_repo(cards, repo, project, column, false).await?;

        if self.dry_run {
            return Ok(Outcome::Card {
                board,
                project,
                column,
                url: None,
                local_copy: None,
            });
        }

        let card = cards
            .create_card(
                &owner,
                &repo.name,
                &ProjectSelector::parse(&project),
                &column,
                &idea.card_text(),
            )
            .await?;
        info!(url = %card.url, %board, "card created");

        let local_copy = self.save_local_copy(idea, &card, &[&owner, &repo.name]);

        Ok(Outcome::Card {
            board,
            project: card.project,
            column: card.column,
            url: Some(card.url),
            local_copy,
        })
    }

    async fn file_issue(
        &self,
        cards: &S,
        idea: &Idea,
        repo: &RepoSpec,
        project: Option<&str>,
        column: Option<&str>,
        options: &IssueOptions,
    ) -> Result<Outcome> {
        let self_assign = options.self_assign && options.assignees.is_empty();
        let RepoTarget {
            board,
            owner,
            username,
            project,
            column,
        } = self.locate_repo(cards, repo, project, column, self_assign).await?;

        let assignees = match (self_assign, username) {
            (true, Some(username)) => vec![username],
            _ => options.assignees.clone(),
        };
        let (title, body) = idea.issue_text();
        let draft = IssueDraft {
            title,
            body,
            labels: options.labels.clone(),
            assignees,
            milestone: options.milestone.clone(),
        };

        if self.dry_run {
            return Ok(Outcome::Issue {
                board,
                project,
                column,
                number: None,
                url: None,
                labels: draft.labels,
                assignees: draft.assignees,
                milestone: draft.milestone,
                local_copy: None,
            });
        }

        let card = cards
            .create_issue_card(
                &owner,
                &repo.name,
                &ProjectSelector::parse(&project),
                &column,
                &draft,
            )
            .await?;
        info!(url = %card.url, %board, "issue card created");

        let local_copy = self.save_local_copy(idea, &card, &[&owner, &repo.name]);

        Ok(Outcome::Issue {
            board,
            project: card.project,
            column: card.column,
            number: card.issue,
            url: Some(card.url),
            labels: draft.labels,
            assignees: draft.assignees,
            milestone: draft.milestone,
            local_copy,
        })
    }

    async fn file_user_card(
        &self,
        cards: &S,
        idea: &Idea,
        project: Option<&str>,
        column: Option<&str>,
    ) -> Result<Outcome> {
        let login = cards.resolve_username().await?;

        let vars = Vars {
            owner: Some(login.as_str()),
            username: Some(login.as_str()),
            ..Vars::default()
        };
        let (project, column) = self.resolve_board(project, column, vars)?;
        let board = format!("@{}", login);

        if self.dry_run {
            return Ok(Outcome::Card {
                board,
                project,
                column,
                url: None,
                local_copy: None,
            });
        }

        let card = cards
            .create_user_card(
                &login,
                &ProjectSelector::parse(&project),
                &column,
                &idea.card_text(),
            )
            .await?;
        info!(url = %card.url, %board, "card created");

        let local_copy = self.save_local_copy(idea, &card, &[&login]);

        Ok(Outcome::Card {
            board,
            project: card.project,
            column: card.column,
            url: Some(card.url),
            local_copy,
        })
    }

    /// Explicit names win over the default templates
    fn resolve_board(
        &self,
        project: Option<&str>,
        column: Option<&str>,
        vars: Vars<'_>,
    ) -> Result<(String, String)> {
        let project = match project {
            Some(project) => project.to_string(),
            None => self
                .defaults
                .project
                .render(&vars)
                .context("Failed to resolve the default project, use --project")?,
        };

        let column = match column {
            Some(column) => column.to_string(),
            None => self
                .defaults
                .column
                .render(&Vars {
                    owner: vars.owner,
                    repository: vars.repository,
                    username: vars.username,
                    project: Some(project.as_str()),
                })
                .context("Failed to resolve the default column, use --column")?,
        };

        Ok((project, column))
    }

    /// The card already exists at this point, so a failed copy is only
    /// reported
    fn save_local_copy(&self, idea: &Idea, card: &Card, folder: &[&str]) -> Option<PathBuf> {
        let store = self.notes.as_ref()?;

        let header = NoteHeader {
            project: Some(card.project.clone()),
            column: Some(card.column.clone()),
            url: Some(card.url.clone()),
            created_at: Utc::now().to_rfc3339(),
            ..NoteHeader::default()
        };

        match store.save(idea, &header, folder) {
            Ok(path) => {
                debug!(path = %path.display(), "local copy written");
                Some(path)
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(%error, url = %card.url, "could not write the local copy");
                None
            }
        }
    }

    fn file_note(
        &self,
        idea: &Idea,
        color: Option<&str>,
        tags: &[String],
        pinned: bool,
    ) -> Result<Outcome> {
        let color = color.map(color::resolve).transpose()?;
        let store = self.notes.as_ref().ok_or(CaptureError::MissingNoteStore)?;

        if self.dry_run {
            return Ok(Outcome::Note {
                path: store.path_for(idea, &[]),
                color,
                tags: tags.to_vec(),
                pinned,
                written: false,
            });
        }

        let header = NoteHeader {
            color,
            tags: tags.to_vec(),
            pinned,
            created_at: Utc::now().to_rfc3339(),
            ..NoteHeader::default()
        };

        let path = store.save(idea, &header, &[])?;
        info!(path = %path.display(), "note saved");

        Ok(Outcome::Note {
            path,
            color,
            tags: tags.to_vec(),
            pinned,
            written: true,
        })
    }
}
