use crate::core::{BracketPage, FrameInfo};
use crate::errors::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Finds the first frame, in enumeration order, whose document contains
/// `selector`. Frames that cannot be queried are skipped.
pub async fn locate_control<P: BracketPage>(page: &P, selector: &str) -> Result<FrameInfo> {
    match find_control(page, selector).await? {
        Some(frame) => {
            info!("Found {} in frame: {}", selector, frame.display_url());
            Ok(frame)
        }
        None => Err(ScrapeError::ControlNotFound(selector.to_string())),
    }
}

/// Like [`locate_control`] but reports a miss as `None`.
pub async fn find_control<P: BracketPage>(page: &P, selector: &str) -> Result<Option<FrameInfo>> {
    let frames = page.frames().await.map_err(ScrapeError::into_interaction)?;

    for frame in frames {
        match page.has_element(&frame.path, selector).await {
            Ok(true) => return Ok(Some(frame)),
            Ok(false) => {}
            Err(e) => debug!("Skipping frame {:?}: {}", frame.path, e),
        }
    }

    Ok(None)
}

/// Polls the frame until `selector` is present, for at most `timeout`.
pub async fn wait_for_selector<P: BracketPage>(
    page: &P,
    frame: &FrameInfo,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let start_time = Instant::now();

    loop {
        if page
            .has_element(&frame.path, selector)
            .await
            .map_err(ScrapeError::into_interaction)?
        {
            return Ok(());
        }

        if start_time.elapsed() >= timeout {
            return Err(ScrapeError::Timeout(format!(
                "waiting for {} in frame {}",
                selector,
                frame.display_url()
            )));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFrame, FakePage};

    #[tokio::test]
    async fn test_first_matching_frame_wins() {
        let page = FakePage::new(vec![
            FakeFrame::plain("https://host/top"),
            FakeFrame::with_control("https://host/a", vec![]),
            FakeFrame::with_control("https://host/b", vec![]),
        ]);

        let frame = locate_control(&page, "#weightBox").await.unwrap();
        assert_eq!(frame.url.as_deref(), Some("https://host/a"));
    }

    #[tokio::test]
    async fn test_inaccessible_frames_are_skipped() {
        let page = FakePage::new(vec![
            FakeFrame::plain("https://host/top"),
            FakeFrame::inaccessible(),
            FakeFrame::with_control("https://host/brackets", vec![]),
        ]);

        let frame = locate_control(&page, "#weightBox").await.unwrap();
        assert_eq!(frame.path, vec![1]);
    }

    #[tokio::test]
    async fn test_missing_control_is_reported() {
        let page = FakePage::new(vec![FakeFrame::plain("https://host/top"), FakeFrame::inaccessible()]);

        let err = locate_control(&page, "#weightBox").await.unwrap_err();
        assert!(matches!(err, ScrapeError::ControlNotFound(ref s) if s == "#weightBox"));
        assert_eq!(find_control(&page, "#weightBox").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wait_for_selector_times_out() {
        let page = FakePage::new(vec![FakeFrame::plain("https://host/top")]);
        let frame = page.frames().await.unwrap().remove(0);

        let err = wait_for_selector(
            &page,
            &frame,
            "#weightBox",
            Duration::from_millis(20),
            Duration::from_millis(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Timeout(_)));
    }
}
