use crate::bracket::settle::{read_settled_cells, SettlePolicy};
use crate::core::{BracketPage, FrameInfo};
use crate::errors::{Result, ScrapeError};
use crate::parser;
use crate::types::{WeightOption, WrestlerEntry};
use tracing::{info, warn};

/// Drives the weight dropdown of one located frame.
pub struct WeightIterator<'a, P: BracketPage> {
    page: &'a P,
    frame: &'a FrameInfo,
    control_selector: &'a str,
    cell_selector: &'a str,
    settle: SettlePolicy,
}

impl<'a, P: BracketPage> WeightIterator<'a, P> {
    pub fn new(
        page: &'a P,
        frame: &'a FrameInfo,
        control_selector: &'a str,
        cell_selector: &'a str,
        settle: SettlePolicy,
    ) -> Self {
        Self {
            page,
            frame,
            control_selector,
            cell_selector,
            settle,
        }
    }

    /// Scrapes every option in the given order, one batch per option.
    /// The first failure aborts the remaining options.
    pub async fn scrape_all(
        &self,
        options: &[WeightOption],
        tournament: &str,
    ) -> Result<Vec<Vec<WrestlerEntry>>> {
        let mut batches = Vec::with_capacity(options.len());
        let mut current = self.read_cells().await?;

        for option in options {
            let (batch, cells) = self
                .scrape_option(option, tournament, &current)
                .await
                .map_err(|e| {
                    let detail = match e {
                        ScrapeError::InteractionFailure(message) => message,
                        other => other.to_string(),
                    };
                    ScrapeError::interaction(format!("weight '{}': {}", option.label, detail))
                })?;
            batches.push(batch);
            current = cells;
        }

        Ok(batches)
    }

    async fn scrape_option(
        &self,
        option: &WeightOption,
        tournament: &str,
        before: &[String],
    ) -> Result<(Vec<WrestlerEntry>, Vec<String>)> {
        info!("Scraping weight: {}", option.label);

        let weight = option.weight();
        if weight.is_none() {
            warn!("Weight label '{}' has no leading number", option.label);
        }

        self.page
            .select_option(&self.frame.path, self.control_selector, &option.value)
            .await?;

        let cells = read_settled_cells(
            self.page,
            self.frame,
            self.cell_selector,
            before,
            self.settle,
        )
        .await?;

        let entries: Vec<WrestlerEntry> = parser::parse_cells(&cells)
            .into_iter()
            .map(|parsed| parsed.into_entry(weight, tournament))
            .collect();

        info!("  {} wrestlers at {}", entries.len(), option.label);
        Ok((entries, cells))
    }

    async fn read_cells(&self) -> Result<Vec<String>> {
        self.page
            .element_texts(&self.frame.path, self.cell_selector)
            .await
            .map_err(ScrapeError::into_interaction)
    }
}
