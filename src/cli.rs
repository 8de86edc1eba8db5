use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::repo::RepoSpec;
use crate::template::Template;

#[derive(Parser, Debug)]
#[command(name = "ideaseed", version)]
#[command(
    about = "Note down your ideas and get them to the right place, without switching away from your terminal",
    long_about = None
)]
pub struct Cli {
    /// The idea. Words are joined with single spaces; options must come first
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "IDEA")]
    pub idea: Vec<String>,

    /// Put the idea on a GitHub project board instead of the note store
    #[arg(short = 'g', long)]
    pub gh: bool,

    /// Repository of the project. Without OWNER/, your own repository.
    /// Without --repo, one of your user projects is used
    #[arg(short, long, value_name = "[OWNER/]REPO")]
    pub repo: Option<RepoSpec>,

    /// Project to put the card in, by name or number
    #[arg(short, long, value_name = "NAME|NUMBER")]
    pub project: Option<String>,

    /// Column of the project to put the card in
    #[arg(short, long, value_name = "NAME")]
    pub column: Option<String>,

    /// Open an issue and put it on the board instead of a note card.
    /// The idea becomes its title, or its description when --title is given
    #[arg(short = 'i', long)]
    pub issue: bool,

    /// Assign the issue to USERNAME. Can be repeated
    #[arg(short = 'a', long = "assign-to", value_name = "USERNAME")]
    pub assign_to: Vec<String>,

    /// Do not assign the issue to yourself when --assign-to is not given
    #[arg(long)]
    pub no_self_assign: bool,

    /// Put the issue in the milestone titled TITLE
    #[arg(short = 'M', long, value_name = "TITLE")]
    pub milestone: Option<String>,

    /// Create missing columns, labels and milestones
    #[arg(short = 'm', long)]
    pub create_missing: bool,

    /// Project used when --project is not given. Can use {owner}, {repository} and {username}
    #[arg(long, default_value = "{repository}", value_name = "TEMPLATE")]
    pub default_project: Template,

    /// Column used when --column is not given. Can also use {project}
    #[arg(long, default_value = "To Do", value_name = "TEMPLATE")]
    pub default_column: Template,

    /// Color of the note: blue, brown, darkblue, gray, green, orange, pink,
    /// purple, red, teal, white or yellow. Any unambiguous prefix works
    #[arg(short = 'd', long)]
    pub color: Option<String>,

    /// Tag the note, or label the issue with --issue. Can be repeated
    #[arg(short = 't', long = "tag", value_name = "TAG", visible_alias = "label", short_alias = 'l')]
    pub tags: Vec<String>,

    /// Pin the note
    #[arg(long)]
    pub pin: bool,

    /// Title of the note. On GitHub, becomes a heading of the card
    #[arg(short = 'T', long)]
    pub title: Option<String>,

    /// Directory where notes, and copies of GitHub cards, are saved
    #[arg(long, env = "IDEASEED_LOCAL_COPY", value_name = "DIR")]
    pub local_copy: Option<PathBuf>,

    /// GitHub personal access token (can be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Show what would be done without creating or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// More logs. Can be repeated
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
