use crate::bracket::{
    locate_control, read_weight_options, wait_for_selector, SettlePolicy, WeightIterator,
};
use crate::browser::{ChromeBrowser, SessionBootstrapper};
use crate::core::{BrowserControl, Config};
use crate::errors::{Result, ScrapeError};
use crate::export::{export_file_name, roster_to_xlsx};
use crate::roster::Roster;
use crate::types::WrestlerEntry;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// A finished run, ready to hand to the operator.
#[derive(Debug, Clone)]
pub struct RosterExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

/// Trims the tournament name and rejects a missing or blank one.
pub fn require_tournament(tournament: Option<&str>) -> Result<String> {
    match tournament.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ScrapeError::MissingInput("Missing tournament name".to_string())),
    }
}

/// Launches Chrome and scrapes the roster for `tournament`.
pub async fn scrape_tournament(config: &Config, tournament: &str) -> Result<Vec<WrestlerEntry>> {
    let tournament = require_tournament(Some(tournament))?;
    let run_id = Uuid::new_v4();
    let span = info_span!("scrape", %run_id, tournament = %tournament);

    let result = async {
        let browser = ChromeBrowser::launch(&config.browser, config.timing.popup_poll())?;
        scrape_with_browser(&browser, config, &tournament).await
    }
    .instrument(span)
    .await;

    if let Err(e) = &result {
        error!("Scraper failed: {}", e);
    }
    result
}

/// Scrapes and renders the roster as an xlsx download.
pub async fn export_tournament(config: &Config, tournament: &str) -> Result<RosterExport> {
    let entries = scrape_tournament(config, tournament).await?;
    let bytes = roster_to_xlsx(&entries)?;

    Ok(RosterExport {
        file_name: export_file_name(tournament),
        bytes,
        rows: entries.len(),
    })
}

/// Runs one scrape on `browser` and closes it afterwards, whatever the outcome.
pub async fn scrape_with_browser<B: BrowserControl>(
    browser: &B,
    config: &Config,
    tournament: &str,
) -> Result<Vec<WrestlerEntry>> {
    let outcome = scrape_session(browser, config, tournament).await;

    if let Err(e) = browser.close().await {
        warn!("Failed to close browser: {}", e);
    }

    outcome
}

async fn scrape_session<B: BrowserControl>(
    browser: &B,
    config: &Config,
    tournament: &str,
) -> Result<Vec<WrestlerEntry>> {
    let bracket = &config.bracket;
    let timing = &config.timing;

    let page = SessionBootstrapper::new(browser, config).acquire().await?;
    let frame = locate_control(&page, &bracket.control_selector).await?;

    wait_for_selector(
        &page,
        &frame,
        &bracket.control_selector,
        timing.control_wait(),
        timing.settle_poll(),
    )
    .await?;

    let options = read_weight_options(&page, &frame, &bracket.control_selector).await?;

    let settle = SettlePolicy {
        poll_interval: timing.settle_poll(),
        max_wait: timing.settle_max(),
    };
    let batches = WeightIterator::new(
        &page,
        &frame,
        &bracket.control_selector,
        &bracket.cell_selector,
        settle,
    )
    .scrape_all(&options, tournament)
    .await?;

    let roster = Roster::from_batches(batches);
    info!("Scraped {} wrestlers across {} weights", roster.len(), options.len());

    Ok(roster.into_sorted())
}
