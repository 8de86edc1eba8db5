use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{Card, CardError, IssueDraft, ProjectSelector, RepoCardService};

/// Color of labels created by --create-missing
const NEW_LABEL_COLOR: &str = "ededed";

const VIEWER_QUERY: &str = "query { viewer { login } }";

const REPOSITORY_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { id }
}"#;

const REPOSITORY_PROJECTS_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    projects(first: 100) {
      nodes { id name number url columns(first: 100) { nodes { id name } } }
    }
  }
}"#;

const REPOSITORY_ISSUE_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    projects(first: 100) {
      nodes { id name number url columns(first: 100) { nodes { id name } } }
    }
    labels(first: 100) { nodes { name } }
    milestones(first: 100, states: [OPEN]) { nodes { number title } }
  }
}"#;

const USER_PROJECTS_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    projects(first: 100) {
      nodes { id name number url columns(first: 100) { nodes { id name } } }
    }
  }
}"#;

const ADD_CARD_MUTATION: &str = r#"
mutation($column: ID!, $note: String!) {
  addProjectCard(input: { projectColumnId: $column, note: $note }) {
    cardEdge { node { url } }
  }
}"#;

const ADD_ISSUE_CARD_MUTATION: &str = r#"
mutation($column: ID!, $issue: ID!) {
  addProjectCard(input: { projectColumnId: $column, contentId: $issue }) {
    cardEdge { node { url } }
  }
}"#;

const ADD_COLUMN_MUTATION: &str = r#"
mutation($project: ID!, $name: String!) {
  addProjectColumn(input: { projectId: $project, name: $name }) {
    columnEdge { node { id name } }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

impl GraphQlError {
    fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some("NOT_FOUND")
    }
}

fn describe(errors: &[GraphQlError]) -> String {
    if errors.is_empty() {
        return "response has no data".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl<T> GraphQlResponse<T> {
    /// Any error fails the request, even alongside partial data
    fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            anyhow::bail!("GitHub GraphQL error: {}", describe(&self.errors));
        }

        match self.data {
            Some(data) => Ok(data),
            None => anyhow::bail!("GitHub GraphQL error: {}", describe(&[])),
        }
    }

    /// A missing object comes back as a `null` field with a NOT_FOUND error.
    /// Those are left for the caller to read; any other error fails the
    /// request.
    fn into_lookup(self) -> Result<T> {
        let (missing, fatal): (Vec<_>, Vec<_>) =
            self.errors.into_iter().partition(GraphQlError::is_not_found);

        if !fatal.is_empty() {
            anyhow::bail!("GitHub GraphQL error: {}", describe(&fatal));
        }
        if !missing.is_empty() {
            debug!(errors = ?missing, "GraphQL NOT_FOUND errors");
        }

        match self.data {
            Some(data) => Ok(data),
            None => anyhow::bail!("GitHub GraphQL error: {}", describe(&missing)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Login,
}

#[derive(Debug, Deserialize)]
struct Login {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct RepositoryProjectsData {
    repository: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
struct UserProjectsData {
    user: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
struct ProjectOwner {
    projects: Connection<ProjectNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryIssueData {
    repository: Option<IssueContext>,
}

#[derive(Debug, Deserialize)]
struct IssueContext {
    projects: Connection<ProjectNode>,
    labels: Connection<LabelNode>,
    milestones: Connection<MilestoneNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    id: String,
    name: String,
    number: u32,
    url: String,
    columns: Connection<ColumnNode>,
}

#[derive(Debug, Clone, Deserialize)]
struct ColumnNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MilestoneNode {
    number: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCardData {
    add_project_card: Option<AddCardPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCardPayload {
    card_edge: Edge<CardNode>,
}

impl AddCardData {
    fn into_url(self) -> Result<Option<String>> {
        let payload = self
            .add_project_card
            .context("GitHub did not return the created card")?;

        Ok(payload.card_edge.node.url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddColumnData {
    add_project_column: Option<AddColumnPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddColumnPayload {
    column_edge: Edge<ColumnNode>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct CardNode {
    url: Option<String>,
}

fn select_project<'a>(
    projects: &'a [ProjectNode],
    board: &str,
    project: &ProjectSelector,
) -> Result<&'a ProjectNode, CardError> {
    projects
        .iter()
        .find(|p| project.matches(p.number, &p.name))
        .ok_or_else(|| CardError::ProjectNotFound {
            board: board.to_string(),
            project: project.to_string(),
            available: projects.iter().map(|p| p.name.clone()).collect(),
        })
}

fn find_column<'a>(project: &'a ProjectNode, name: &str) -> Option<&'a ColumnNode> {
    let wanted = name.to_lowercase();
    project
        .columns
        .nodes
        .iter()
        .find(|c| c.name.to_lowercase() == wanted)
}

fn find_milestone<'a>(milestones: &'a [MilestoneNode], title: &str) -> Option<&'a MilestoneNode> {
    let wanted = title.to_lowercase();
    milestones.iter().find(|m| m.title.to_lowercase() == wanted)
}

/// Wanted labels as spelled on the repository, and those it lacks
fn match_labels(existing: &[LabelNode], wanted: &[String]) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();

    for label in wanted {
        let lowered = label.to_lowercase();
        match existing.iter().find(|l| l.name.to_lowercase() == lowered) {
            Some(found) => names.push(found.name.clone()),
            None => {
                names.push(label.clone());
                missing.push(label.clone());
            }
        }
    }

    (names, missing)
}

/// GitHub project boards through the GraphQL API
pub struct GitHubCards {
    client: Octocrab,
    create_missing: bool,
}

impl GitHubCards {
    /// Create a new client with a personal access token
    pub fn new(token: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self {
            client,
            create_missing: false,
        })
    }

    /// Create missing columns, labels and milestones instead of failing
    pub fn create_missing(mut self, create_missing: bool) -> Self {
        self.create_missing = create_missing;
        self
    }

    async fn request<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<GraphQlResponse<T>> {
        debug!(%variables, "GraphQL request");

        self.client
            .graphql(&json!({ "query": query, "variables": variables }))
            .await
            .context("GitHub GraphQL request failed")
    }

    async fn lookup<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        self.request::<T>(query, variables).await?.into_lookup()
    }

    async fn mutate<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        self.request::<T>(query, variables).await?.into_data()
    }

    /// The named column of the project, created when missing if allowed
    async fn column(&self, project: &ProjectNode, name: &str) -> Result<ColumnNode> {
        if let Some(column) = find_column(project, name) {
            return Ok(column.clone());
        }

        if !self.create_missing {
            return Err(CardError::ColumnNotFound {
                project: project.name.clone(),
                column: name.to_string(),
                available: project.columns.nodes.iter().map(|c| c.name.clone()).collect(),
            }
            .into());
        }

        info!(project = %project.name, column = name, "creating missing column");
        let data: AddColumnData = self
            .mutate(ADD_COLUMN_MUTATION, json!({ "project": project.id, "name": name }))
            .await
            .with_context(|| format!("Failed to create column '{}'", name))?;

        let payload = data
            .add_project_column
            .context("GitHub did not return the created column")?;

        Ok(payload.column_edge.node)
    }

    /// Add the note to the selected column and return the card
    async fn add_note_card(
        &self,
        projects: &[ProjectNode],
        board: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card> {
        let project = select_project(projects, board, project)?;
        let column = self.column(project, column).await?;

        let data: AddCardData = self
            .mutate(ADD_CARD_MUTATION, json!({ "column": column.id, "note": text }))
            .await
            .context("Failed to create project card")?;

        // Cards of some projects have no URL of their own
        let url = data.into_url()?.unwrap_or_else(|| project.url.clone());

        Ok(Card {
            url,
            project: project.name.clone(),
            column: column.name,
            issue: None,
        })
    }

    async fn create_labels(&self, owner: &str, name: &str, labels: &[String]) -> Result<()> {
        for label in labels {
            info!(%label, "creating missing label");
            self.client
                .issues(owner, name)
                .create_label(label, NEW_LABEL_COLOR, "")
                .await
                .with_context(|| format!("Failed to create label '{}'", label))?;
        }

        Ok(())
    }

    async fn create_milestone(&self, owner: &str, name: &str, title: &str) -> Result<u64> {
        info!(milestone = title, "creating missing milestone");
        let created: MilestoneNode = self
            .client
            .post(
                format!("/repos/{}/{}/milestones", owner, name),
                Some(&json!({ "title": title })),
            )
            .await
            .with_context(|| format!("Failed to create milestone '{}'", title))?;

        Ok(created.number)
    }
}

#[async_trait]
impl RepoCardService for GitHubCards {
    async fn resolve_username(&self) -> Result<String> {
        let data: ViewerData = self
            .lookup(VIEWER_QUERY, json!({}))
            .await
            .context("Failed to get the GitHub username")?;

        Ok(data.viewer.login)
    }

    async fn repo_exists(&self, owner: &str, name: &str) -> Result<bool> {
        let data: RepositoryData = self
            .lookup(REPOSITORY_QUERY, json!({ "owner": owner, "name": name }))
            .await
            .with_context(|| format!("Failed to look up repository {}/{}", owner, name))?;

        Ok(data.repository.is_some())
    }

    async fn create_card(
        &self,
        owner: &str,
        name: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card> {
        let board = format!("{}/{}", owner, name);

        let data: RepositoryProjectsData = self
            .lookup(REPOSITORY_PROJECTS_QUERY, json!({ "owner": owner, "name": name }))
            .await
            .with_context(|| format!("Failed to list projects of {}", board))?;

        let repository = data
            .repository
            .with_context(|| format!("Repository {} does not exist", board))?;

        self.add_note_card(&repository.projects.nodes, &board, project, column, text)
            .await
    }

    async fn create_issue_card(
        &self,
        owner: &str,
        name: &str,
        project: &ProjectSelector,
        column: &str,
        issue: &IssueDraft,
    ) -> Result<Card> {
        let repo = format!("{}/{}", owner, name);

        let data: RepositoryIssueData = self
            .lookup(REPOSITORY_ISSUE_QUERY, json!({ "owner": owner, "name": name }))
            .await
            .with_context(|| format!("Failed to look up projects and labels of {}", repo))?;

        let context = data
            .repository
            .with_context(|| format!("Repository {} does not exist", repo))?;

        let project = select_project(&context.projects.nodes, &repo, project)?;
        let (labels, missing_labels) = match_labels(&context.labels.nodes, &issue.labels);
        if let Some(label) = missing_labels.first() {
            if !self.create_missing {
                return Err(CardError::LabelNotFound {
                    repo,
                    label: label.clone(),
                }
                .into());
            }
        }

        let milestone = match &issue.milestone {
            Some(title) => match find_milestone(&context.milestones.nodes, title) {
                Some(found) => Some(found.number),
                None if self.create_missing => Some(self.create_milestone(owner, name, title).await?),
                None => {
                    return Err(CardError::MilestoneNotFound {
                        repo,
                        milestone: title.clone(),
                        available: context.milestones.nodes.iter().map(|m| m.title.clone()).collect(),
                    }
                    .into())
                }
            },
            None => None,
        };

        let column = self.column(project, column).await?;
        self.create_labels(owner, name, &missing_labels).await?;
        debug!(?labels, ?milestone, "issue metadata");

        let created = self
            .client
            .issues(owner, name)
            .create(issue.title.as_str())
            .body(issue.body.as_str())
            .labels(labels)
            .assignees(issue.assignees.clone())
            .milestone(milestone)
            .send()
            .await
            .with_context(|| format!("Failed to create issue in {}", repo))?;
        info!(number = created.number, %repo, "issue created");

        let data: AddCardData = self
            .mutate(
                ADD_ISSUE_CARD_MUTATION,
                json!({ "column": column.id, "issue": &created.node_id }),
            )
            .await
            .with_context(|| format!("Issue #{} was created but not added to the project", created.number))?;
        data.into_url()?;

        Ok(Card {
            url: created.html_url.to_string(),
            project: project.name.clone(),
            column: column.name,
            issue: Some(created.number),
        })
    }

    async fn create_user_card(
        &self,
        login: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card> {
        let board = format!("@{}", login);

        let data: UserProjectsData = self
            .lookup(USER_PROJECTS_QUERY, json!({ "login": login }))
            .await
            .with_context(|| format!("Failed to list projects of {}", board))?;

        let user = data
            .user
            .with_context(|| format!("User {} does not exist", login))?;

        self.add_note_card(&user.projects.nodes, &board, project, column, text)
            .await
    }
}
