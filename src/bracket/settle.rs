use crate::core::{BracketPage, FrameInfo};
use crate::errors::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tracing::debug;

/// How a post-selection read decides the bracket has finished re-rendering.
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

/// Polls the bracket cells after a selection until they differ from
/// `before` and two consecutive reads agree. An empty read never counts as
/// settled since the frame is blank while it reloads. Once `max_wait` has
/// passed the latest read is returned as is.
pub async fn read_settled_cells<P: BracketPage>(
    page: &P,
    frame: &FrameInfo,
    cell_selector: &str,
    before: &[String],
    policy: SettlePolicy,
) -> Result<Vec<String>> {
    let start_time = Instant::now();
    let mut previous: Option<Vec<String>> = None;

    loop {
        tokio::time::sleep(policy.poll_interval).await;

        let cells = page
            .element_texts(&frame.path, cell_selector)
            .await
            .map_err(ScrapeError::into_interaction)?;

        let changed = cells.as_slice() != before;
        let stable = previous.as_ref() == Some(&cells);

        if changed && stable && !cells.is_empty() {
            debug!(
                "Bracket settled after {}ms ({} cells)",
                start_time.elapsed().as_millis(),
                cells.len()
            );
            return Ok(cells);
        }

        if start_time.elapsed() >= policy.max_wait {
            debug!(
                "Bracket settle window elapsed after {}ms, using last read ({} cells)",
                start_time.elapsed().as_millis(),
                cells.len()
            );
            return Ok(cells);
        }

        previous = Some(cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFrame, FakePage, CONTROL_SELECTOR};
    use crate::types::WeightOption;

    fn policy(max_ms: u64) -> SettlePolicy {
        SettlePolicy {
            poll_interval: Duration::from_millis(5),
            max_wait: Duration::from_millis(max_ms),
        }
    }

    #[tokio::test]
    async fn test_returns_new_content_once_stable() {
        let frame = FakeFrame::with_control("https://host/b", vec![WeightOption::new("1", "106 lbs")])
            .cells_for("1", &["A\nX, 9", "B\nY, 10"]);
        let page = FakePage::new(vec![frame]);
        let info = page.frames().await.unwrap().remove(0);

        page.select_option(&info.path, CONTROL_SELECTOR, "1").await.unwrap();
        let started = Instant::now();
        let cells = read_settled_cells(&page, &info, ".bracket-cell", &[], policy(5_000))
            .await
            .unwrap();

        assert_eq!(cells.len(), 2);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unchanged_content_falls_back_after_max_wait() {
        let frame = FakeFrame::with_control("https://host/b", vec![WeightOption::new("1", "106 lbs")])
            .cells_for("1", &["Same"]);
        let page = FakePage::new(vec![frame]);
        let info = page.frames().await.unwrap().remove(0);
        page.select_option(&info.path, CONTROL_SELECTOR, "1").await.unwrap();

        let before = vec!["Same".to_string()];
        let started = Instant::now();
        let cells = read_settled_cells(&page, &info, ".bracket-cell", &before, policy(40))
            .await
            .unwrap();

        assert_eq!(cells, before);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_blank_frame_during_reload_is_not_settled() {
        let frame = FakeFrame {
            initial_cells: vec!["Old\nX, 9".to_string()],
            ..FakeFrame::with_control("https://host/b", vec![WeightOption::new("1", "106 lbs")])
        }
        .cells_for("1", &["Jane Doe, 1st\nLincoln High, 10"]);
        let page = FakePage::new(vec![frame]);
        let info = page.frames().await.unwrap().remove(0);
        let before = page.element_texts(&info.path, ".bracket-cell").await.unwrap();

        page.select_option(&info.path, CONTROL_SELECTOR, "1").await.unwrap();
        page.blank_for_reads(6);
        let cells = read_settled_cells(&page, &info, ".bracket-cell", &before, policy(5_000))
            .await
            .unwrap();

        assert_eq!(cells, vec!["Jane Doe, 1st\nLincoln High, 10".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_bracket_waits_for_full_window() {
        let frame = FakeFrame {
            initial_cells: vec!["Old\nX, 9".to_string()],
            ..FakeFrame::with_control("https://host/b", vec![WeightOption::new("1", "106 lbs")])
        };
        let page = FakePage::new(vec![frame]);
        let info = page.frames().await.unwrap().remove(0);
        let before = page.element_texts(&info.path, ".bracket-cell").await.unwrap();

        page.select_option(&info.path, CONTROL_SELECTOR, "1").await.unwrap();
        let started = Instant::now();
        let cells = read_settled_cells(&page, &info, ".bracket-cell", &before, policy(60))
            .await
            .unwrap();

        assert!(cells.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_read_failure_is_an_interaction_failure() {
        let page = FakePage::new(vec![FakeFrame::inaccessible()]);
        let info = page.frames().await.unwrap().remove(0);

        let err = read_settled_cells(&page, &info, ".bracket-cell", &[], policy(40))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InteractionFailure(_)));
    }
}
