use crate::repo::RepoSpec;

/// The text captured in a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea {
    pub body: String,
    pub title: Option<String>,
}

impl Idea {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Note text of a GitHub card. Cards have no title field, so the title
    /// becomes a markdown heading.
    pub fn card_text(&self) -> String {
        match &self.title {
            Some(title) => format!("# {}\n\n{}", title, self.body),
            None => self.body.clone(),
        }
    }

    /// Title and body of an issue. Without a title, the idea is the title
    /// and the issue has no body.
    pub fn issue_text(&self) -> (String, String) {
        match &self.title {
            Some(title) => (title.clone(), self.body.clone()),
            None => (self.body.clone(), String::new()),
        }
    }

    /// Title, or first line of the body when there is none
    pub fn headline(&self) -> &str {
        match &self.title {
            Some(title) => title,
            None => self.body.lines().next().unwrap_or_default(),
        }
    }
}

/// Where the idea should be filed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A card on a GitHub project board. Without a repository, the card
    /// goes to one of the user's own projects.
    GitHub {
        repo: Option<RepoSpec>,
        project: Option<String>,
        column: Option<String>,
        /// Open an issue and put it on the board instead of a note card
        issue: Option<IssueOptions>,
    },

    /// A note in the local note store. `color` is the color as typed.
    Notes {
        color: Option<String>,
        tags: Vec<String>,
        pinned: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueOptions {
    pub labels: Vec<String>,
    /// Without any, the issue is assigned to the user if `self_assign`
    pub assignees: Vec<String>,
    pub self_assign: bool,
    pub milestone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub idea: Idea,
    pub destination: Destination,
}
