use anyhow::Result;
use tracing::debug;

use ideaseed::backend::github::GitHubCards;
use ideaseed::cli::Cli;
use ideaseed::config::{capture_request, Config};
use ideaseed::notes::NoteStore;
use ideaseed::{Destination, IdeaRouter};

/// File the idea given on the command line
pub async fn capture(cli: &Cli) -> Result<()> {
    let config = Config::from_cli(cli)?;
    let request = capture_request(cli)?;
    debug!(?request, "capture request");

    // The client is only built for GitHub; the router reports a missing token
    let cards = match (&request.destination, &config.github_token) {
        (Destination::GitHub { .. }, Some(token)) => {
            Some(GitHubCards::new(token)?.create_missing(config.create_missing))
        }
        _ => None,
    };
    let notes = config.local_copy.clone().map(NoteStore::new);

    let router = IdeaRouter::new(cards, notes, config.defaults.clone(), config.dry_run);
    let outcome = router.route(&request).await?;

    outcome.print_summary();

    Ok(())
}
