use crate::core::{BracketPage, FrameInfo};
use crate::errors::{Result, ScrapeError};
use crate::types::WeightOption;
use std::collections::HashSet;
use tracing::{debug, info};

/// Reads the weight dropdown once, in source order, dropping the empty
/// placeholder and any repeated option value.
pub async fn read_weight_options<P: BracketPage>(
    page: &P,
    frame: &FrameInfo,
    control_selector: &str,
) -> Result<Vec<WeightOption>> {
    let raw = page
        .select_options(&frame.path, control_selector)
        .await
        .map_err(ScrapeError::into_interaction)?;

    let options = dedupe_options(raw);
    info!("Found {} weight classes", options.len());
    Ok(options)
}

fn dedupe_options(raw: Vec<WeightOption>) -> Vec<WeightOption> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|option| !option.is_placeholder())
        .filter(|option| {
            let first = seen.insert(option.value.clone());
            if !first {
                debug!("Ignoring repeated weight option {}", option.value);
            }
            first
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFrame, FakePage, CONTROL_SELECTOR};

    #[test]
    fn test_placeholder_and_repeats_are_dropped() {
        let options = dedupe_options(vec![
            WeightOption::new("", "-- Select --"),
            WeightOption::new("113", "113 lbs"),
            WeightOption::new("106", "106 lbs"),
            WeightOption::new("113", "113 lbs (again)"),
        ]);

        assert_eq!(
            options,
            vec![WeightOption::new("113", "113 lbs"), WeightOption::new("106", "106 lbs")]
        );
    }

    #[tokio::test]
    async fn test_read_weight_options_in_source_order() {
        let page = FakePage::new(vec![FakeFrame::with_control(
            "https://host/b",
            vec![
                WeightOption::new("", "Select"),
                WeightOption::new("w2", "120 lbs"),
                WeightOption::new("w1", "106 lbs"),
            ],
        )]);
        let frame = page.frames().await.unwrap().remove(0);

        let options = read_weight_options(&page, &frame, CONTROL_SELECTOR).await.unwrap();
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["120 lbs", "106 lbs"]);
    }

    #[tokio::test]
    async fn test_unreadable_control_is_an_interaction_failure() {
        let page = FakePage::new(vec![FakeFrame::plain("https://host/top")]);
        let frame = page.frames().await.unwrap().remove(0);

        let err = read_weight_options(&page, &frame, CONTROL_SELECTOR).await.unwrap_err();
        assert!(matches!(err, ScrapeError::InteractionFailure(_)));
    }
}
