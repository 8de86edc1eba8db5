use anyhow::Result;
use async_trait::async_trait;
use ideaseed::backend::{Card, IssueDraft, ProjectSelector, RepoCardService};
use ideaseed::color::ColorError;
use ideaseed::notes::NoteStore;
use ideaseed::repo::RepoSpec;
use ideaseed::template::{Placeholder, Template, TemplateError};
use ideaseed::{
    CaptureError, CaptureRequest, CardDefaults, ColorName, Destination, Idea, IdeaRouter, IssueOptions,
    Outcome,
};
use std::fs;
use std::sync::Mutex;

/// In-memory GitHub recording every call it receives
struct FakeGitHub {
    login: String,
    repos: Vec<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl FakeGitHub {
    fn new(login: &str, repos: &[(&str, &str)]) -> Self {
        Self {
            login: login.to_string(),
            repos: repos
                .iter()
                .map(|(owner, name)| (owner.to_string(), name.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn card(board: &str, project: &ProjectSelector, column: &str) -> Card {
        let project = match project {
            ProjectSelector::Number(n) => format!("Project {}", n),
            ProjectSelector::Name(name) => name.clone(),
        };
        Card {
            url: format!("https://github.com/{}/projects#card", board),
            project,
            column: column.to_string(),
            issue: None,
        }
    }
}

#[async_trait]
impl RepoCardService for FakeGitHub {
    async fn resolve_username(&self) -> Result<String> {
        self.record("viewer".to_string());
        Ok(self.login.clone())
    }

    async fn repo_exists(&self, owner: &str, name: &str) -> Result<bool> {
        self.record(format!("exists {}/{}", owner, name));
        Ok(self.repos.iter().any(|(o, n)| o == owner && n == name))
    }

    async fn create_card(
        &self,
        owner: &str,
        name: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card> {
        self.record(format!("card {}/{} {} {} {:?}", owner, name, project, column, text));
        Ok(Self::card(&format!("{}/{}", owner, name), project, column))
    }

    async fn create_issue_card(
        &self,
        owner: &str,
        name: &str,
        project: &ProjectSelector,
        column: &str,
        issue: &IssueDraft,
    ) -> Result<Card> {
        self.record(format!(
            "issue {}/{} {} {} {:?} {:?} labels={:?} assignees={:?} milestone={:?}",
            owner, name, project, column, issue.title, issue.body, issue.labels, issue.assignees,
            issue.milestone
        ));
        Ok(Card {
            url: format!("https://github.com/{}/{}/issues/7", owner, name),
            issue: Some(7),
            ..Self::card(&format!("{}/{}", owner, name), project, column)
        })
    }

    async fn create_user_card(
        &self,
        login: &str,
        project: &ProjectSelector,
        column: &str,
        text: &str,
    ) -> Result<Card> {
        self.record(format!("user card @{} {} {} {:?}", login, project, column, text));
        Ok(Self::card(login, project, column))
    }
}

fn defaults(project: &str, column: &str) -> CardDefaults {
    CardDefaults {
        project: Template::parse(project).unwrap(),
        column: Template::parse(column).unwrap(),
    }
}

fn github_request(idea: Idea, repo: Option<&str>, project: Option<&str>, column: Option<&str>) -> CaptureRequest {
    CaptureRequest {
        idea,
        destination: Destination::GitHub {
            repo: repo.map(|r| r.parse::<RepoSpec>().unwrap()),
            project: project.map(str::to_string),
            column: column.map(str::to_string),
            issue: None,
        },
    }
}

fn issue_request(idea: Idea, repo: &str, issue: IssueOptions) -> CaptureRequest {
    CaptureRequest {
        idea,
        destination: Destination::GitHub {
            repo: Some(repo.parse::<RepoSpec>().unwrap()),
            project: None,
            column: None,
            issue: Some(issue),
        },
    }
}

fn notes_request(body: &str, color: Option<&str>, tags: &[&str]) -> CaptureRequest {
    CaptureRequest {
        idea: Idea::new(body),
        destination: Destination::Notes {
            color: color.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            pinned: false,
        },
    }
}

fn calls(router: &IdeaRouter<FakeGitHub>) -> Vec<String> {
    router.cards().unwrap().calls.lock().unwrap().clone()
}

#[tokio::test]
async fn test_card_in_explicit_repository() {
    let github = FakeGitHub::new("ewen-lbh", &[("schoolsyst", "webapp")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let outcome = router
        .route(&github_request(Idea::new("test"), Some("schoolsyst/webapp"), Some("UX"), None))
        .await
        .expect("card should be created");

    assert_eq!(
        outcome,
        Outcome::Card {
            board: "schoolsyst/webapp".to_string(),
            project: "UX".to_string(),
            column: "To Do".to_string(),
            url: Some("https://github.com/schoolsyst/webapp/projects#card".to_string()),
            local_copy: None,
        }
    );
}

#[tokio::test]
async fn test_owner_defaults_to_authenticated_user() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let outcome = router
        .route(&github_request(
            Idea::new("Choose audio normalization loudness"),
            Some("phelng"),
            None,
            None,
        ))
        .await
        .expect("card should be created");

    match outcome {
        Outcome::Card { board, project, column, .. } => {
            assert_eq!(board, "ewen-lbh/phelng");
            assert_eq!(project, "phelng");
            assert_eq!(column, "To Do");
        }
        other => panic!("expected a card, got {:?}", other),
    }
}

#[tokio::test]
async fn test_call_sequence() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    router
        .route(&github_request(Idea::new("idea"), Some("phelng"), None, None))
        .await
        .expect("card should be created");

    assert_eq!(
        calls(&router),
        vec![
            "viewer".to_string(),
            "exists ewen-lbh/phelng".to_string(),
            "card ewen-lbh/phelng phelng To Do \"idea\"".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_no_username_lookup_when_owner_given() {
    let github = FakeGitHub::new("ewen-lbh", &[("schoolsyst", "webapp")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), true);

    router
        .route(&github_request(Idea::new("idea"), Some("schoolsyst/webapp"), None, None))
        .await
        .expect("dry run should succeed");

    assert_eq!(calls(&router), vec!["exists schoolsyst/webapp".to_string()]);
}

#[tokio::test]
async fn test_username_placeholder_triggers_lookup() {
    let github = FakeGitHub::new("ewen-lbh", &[("schoolsyst", "webapp")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{username}'s ideas", "{project}"), false);

    let outcome = router
        .route(&github_request(Idea::new("idea"), Some("schoolsyst/webapp"), None, None))
        .await
        .expect("card should be created");

    match outcome {
        Outcome::Card { project, column, .. } => {
            assert_eq!(project, "ewen-lbh's ideas");
            assert_eq!(column, "ewen-lbh's ideas");
        }
        other => panic!("expected a card, got {:?}", other),
    }
    assert_eq!(calls(&router)[0], "viewer");
}

#[tokio::test]
async fn test_missing_repository() {
    let github = FakeGitHub::new("ewen-lbh", &[]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let err = router
        .route(&github_request(Idea::new("idea"), Some("ewen-lbh/nope"), None, None))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CaptureError>(),
        Some(CaptureError::RepoNotFound { owner, name }) if owner == "ewen-lbh" && name == "nope"
    ));
    assert!(!calls(&router).iter().any(|c| c.starts_with("card")));
}

#[tokio::test]
async fn test_missing_token() {
    let router: IdeaRouter<FakeGitHub> =
        IdeaRouter::new(None, None, defaults("{repository}", "To Do"), false);

    let err = router
        .route(&github_request(Idea::new("idea"), Some("phelng"), None, None))
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<CaptureError>(), Some(CaptureError::MissingToken)));
}

#[tokio::test]
async fn test_dry_run_creates_nothing() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let dir = tempfile::tempdir().unwrap();
    let router = IdeaRouter::new(
        Some(github),
        Some(NoteStore::new(dir.path())),
        defaults("{repository}", "To Do"),
        true,
    );

    let outcome = router
        .route(&github_request(Idea::new("idea"), Some("phelng"), None, None))
        .await
        .expect("dry run should succeed");

    assert!(matches!(outcome, Outcome::Card { url: None, local_copy: None, .. }));
    assert!(!calls(&router).iter().any(|c| c.starts_with("card")));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_title_becomes_card_heading() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    router
        .route(&github_request(
            Idea::new("details").with_title("Loudness"),
            Some("ewen-lbh/phelng"),
            Some("1"),
            Some("Backlog"),
        ))
        .await
        .expect("card should be created");

    assert_eq!(
        calls(&router).last().unwrap(),
        "card ewen-lbh/phelng #1 Backlog \"# Loudness\\n\\ndetails\""
    );
}

#[tokio::test]
async fn test_user_project_card() {
    let github = FakeGitHub::new("ewen-lbh", &[]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "willmake"), false);

    let outcome = router
        .route(&github_request(Idea::new("a CLI to note down ideas"), None, Some("incubator"), None))
        .await
        .expect("card should be created");

    match outcome {
        Outcome::Card { board, project, column, .. } => {
            assert_eq!(board, "@ewen-lbh");
            assert_eq!(project, "incubator");
            assert_eq!(column, "willmake");
        }
        other => panic!("expected a card, got {:?}", other),
    }
    assert_eq!(
        calls(&router),
        vec![
            "viewer".to_string(),
            "user card @ewen-lbh incubator willmake \"a CLI to note down ideas\"".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_user_project_has_no_repository_placeholder() {
    let github = FakeGitHub::new("ewen-lbh", &[]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let err = router
        .route(&github_request(Idea::new("idea"), None, None, None))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<TemplateError>(),
        Some(&TemplateError::Unavailable(Placeholder::Repository))
    );
}

#[tokio::test]
async fn test_card_local_copy() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let dir = tempfile::tempdir().unwrap();
    let router = IdeaRouter::new(
        Some(github),
        Some(NoteStore::new(dir.path())),
        defaults("{repository}", "To Do"),
        false,
    );

    let outcome = router
        .route(&github_request(Idea::new("Loudness presets"), Some("phelng"), None, None))
        .await
        .expect("card should be created");

    let expected = dir.path().join("ewen-lbh").join("phelng").join("loudness-presets.md");
    match outcome {
        Outcome::Card { local_copy, .. } => assert_eq!(local_copy, Some(expected.clone())),
        other => panic!("expected a card, got {:?}", other),
    }

    let content = fs::read_to_string(expected).unwrap();
    assert!(content.contains("project: phelng"));
    assert!(!content.contains("repo:"));
    assert!(content.contains("https://github.com/ewen-lbh/phelng/projects#card"));
    assert!(content.ends_with("Loudness presets\n"));
}

#[tokio::test]
async fn test_note_with_abbreviated_color() {
    let dir = tempfile::tempdir().unwrap();
    let router: IdeaRouter<FakeGitHub> = IdeaRouter::new(
        None,
        Some(NoteStore::new(dir.path())),
        defaults("{repository}", "To Do"),
        false,
    );

    let outcome = router
        .route(&notes_request("Lyrics video for Mazde - Neverland", Some("dar"), &["project", "vfx"]))
        .await
        .expect("note should be saved");

    let expected = dir.path().join("lyrics-video-for-mazde-neverland.md");
    assert_eq!(
        outcome,
        Outcome::Note {
            path: expected.clone(),
            color: Some(ColorName::DarkBlue),
            tags: vec!["project".to_string(), "vfx".to_string()],
            pinned: false,
            written: true,
        }
    );

    let content = fs::read_to_string(expected).unwrap();
    assert!(content.contains("color: darkblue"));
    assert!(content.contains("- vfx"));
}

#[tokio::test]
async fn test_note_with_ambiguous_color() {
    let dir = tempfile::tempdir().unwrap();
    let router: IdeaRouter<FakeGitHub> = IdeaRouter::new(
        None,
        Some(NoteStore::new(dir.path())),
        defaults("{repository}", "To Do"),
        false,
    );

    let err = router
        .route(&notes_request("idea", Some("b"), &[]))
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ColorError>(),
        Some(&ColorError::Ambiguous {
            query: "b".to_string(),
            candidates: vec![ColorName::Blue, ColorName::Brown],
        })
    );
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_note_without_store() {
    let router: IdeaRouter<FakeGitHub> =
        IdeaRouter::new(None, None, defaults("{repository}", "To Do"), false);

    let err = router
        .route(&notes_request("idea", None, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<CaptureError>(), Some(CaptureError::MissingNoteStore)));
}

#[tokio::test]
async fn test_note_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let router: IdeaRouter<FakeGitHub> = IdeaRouter::new(
        None,
        Some(NoteStore::new(dir.path())),
        defaults("{repository}", "To Do"),
        true,
    );

    let outcome = router
        .route(&notes_request("idea", Some("y"), &[]))
        .await
        .expect("dry run should succeed");

    assert!(matches!(
        outcome,
        Outcome::Note { written: false, color: Some(ColorName::Yellow), .. }
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_local_copy_failure_keeps_the_card() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let dir = tempfile::tempdir().unwrap();
    // A file where the store root should be: no directory can be made under it
    let root = dir.path().join("not-a-directory");
    fs::write(&root, "").unwrap();
    let router = IdeaRouter::new(
        Some(github),
        Some(NoteStore::new(&root)),
        defaults("{repository}", "To Do"),
        false,
    );

    let outcome = router
        .route(&github_request(Idea::new("Loudness presets"), Some("phelng"), None, None))
        .await
        .expect("the card was created, the failed copy should not fail the capture");

    assert_eq!(
        outcome,
        Outcome::Card {
            board: "ewen-lbh/phelng".to_string(),
            project: "phelng".to_string(),
            column: "To Do".to_string(),
            url: Some("https://github.com/ewen-lbh/phelng/projects#card".to_string()),
            local_copy: None,
        }
    );
}

#[tokio::test]
async fn test_issue_assigned_to_self() {
    let github = FakeGitHub::new("ewen-lbh", &[("schoolsyst", "webapp")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let options = IssueOptions {
        labels: vec!["ux".to_string()],
        self_assign: true,
        ..IssueOptions::default()
    };
    let outcome = router
        .route(&issue_request(Idea::new("Dark mode"), "schoolsyst/webapp", options))
        .await
        .expect("issue should be created");

    assert_eq!(
        outcome,
        Outcome::Issue {
            board: "schoolsyst/webapp".to_string(),
            project: "webapp".to_string(),
            column: "To Do".to_string(),
            number: Some(7),
            url: Some("https://github.com/schoolsyst/webapp/issues/7".to_string()),
            labels: vec!["ux".to_string()],
            assignees: vec!["ewen-lbh".to_string()],
            milestone: None,
            local_copy: None,
        }
    );
    assert_eq!(
        calls(&router),
        vec![
            "viewer".to_string(),
            "exists schoolsyst/webapp".to_string(),
            "issue schoolsyst/webapp webapp To Do \"Dark mode\" \"\" labels=[\"ux\"] \
             assignees=[\"ewen-lbh\"] milestone=None"
                .to_string(),
        ]
    );
}

#[tokio::test]
async fn test_issue_title_and_explicit_assignees() {
    let github = FakeGitHub::new("ewen-lbh", &[("ewen-lbh", "phelng")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let options = IssueOptions {
        assignees: vec!["alice".to_string()],
        self_assign: true,
        milestone: Some("v1.0".to_string()),
        ..IssueOptions::default()
    };
    router
        .route(&issue_request(
            Idea::new("Normalize to -14 LUFS").with_title("Loudness"),
            "phelng",
            options,
        ))
        .await
        .expect("issue should be created");

    assert_eq!(
        calls(&router).last().unwrap(),
        "issue ewen-lbh/phelng phelng To Do \"Loudness\" \"Normalize to -14 LUFS\" labels=[] \
         assignees=[\"alice\"] milestone=Some(\"v1.0\")"
    );
}

#[tokio::test]
async fn test_issue_without_self_assign_skips_lookup() {
    let github = FakeGitHub::new("ewen-lbh", &[("schoolsyst", "webapp")]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), true);

    let outcome = router
        .route(&issue_request(Idea::new("idea"), "schoolsyst/webapp", IssueOptions::default()))
        .await
        .expect("dry run should succeed");

    assert!(matches!(
        outcome,
        Outcome::Issue { number: None, url: None, ref assignees, .. } if assignees.is_empty()
    ));
    assert_eq!(calls(&router), vec!["exists schoolsyst/webapp".to_string()]);
}

#[tokio::test]
async fn test_issue_needs_repository() {
    let github = FakeGitHub::new("ewen-lbh", &[]);
    let router = IdeaRouter::new(Some(github), None, defaults("{repository}", "To Do"), false);

    let request = CaptureRequest {
        idea: Idea::new("idea"),
        destination: Destination::GitHub {
            repo: None,
            project: Some("incubator".to_string()),
            column: None,
            issue: Some(IssueOptions::default()),
        },
    };
    let err = router.route(&request).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CaptureError>(),
        Some(CaptureError::IssueNeedsRepository)
    ));
    assert!(calls(&router).is_empty());
}
