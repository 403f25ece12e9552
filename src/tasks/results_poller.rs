use crate::display::{Formatter, no_data_frame};
use crate::fetcher::ResultsSource;
use crate::publisher::FrameSink;
use chrono::TimeZone;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// What a single fetch-format-publish pass ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Published { frames: usize },
    PublishedNoData,
    FetchFailed,
    PublishFailed,
}

pub async fn run_cycle<Tz>(
    source: &dyn ResultsSource,
    formatter: &Formatter<Tz>,
    sink: &dyn FrameSink,
) -> CycleOutcome
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    info!("Fetching election data...");
    let frames = match source.fetch().await {
        Ok(Some(result)) => {
            info!(
                "Formatting {} party result(s) of {} ({}) as of {}",
                result.parties.len(),
                result.election_id,
                result.stage,
                result.timestamp.to_rfc3339()
            );
            formatter.format(&result)
        }
        Ok(None) => {
            warn!("No election data available");
            vec![no_data_frame()]
        }
        Err(e) => {
            // Device keeps showing the last message
            error!("Failed to fetch election data: {}", e);
            return CycleOutcome::FetchFailed;
        }
    };

    for frame in &frames {
        debug!("Frame ({} glyphs): {}", frame.glyphs(), frame.plain_text());
    }

    let no_data = frames == [no_data_frame()];
    match sink.publish(&frames).await {
        Ok(()) => {
            info!("Sent {} frame(s) to the display", frames.len());
            if no_data {
                CycleOutcome::PublishedNoData
            } else {
                CycleOutcome::Published {
                    frames: frames.len(),
                }
            }
        }
        Err(e) => {
            error!("Failed to publish frames: {}", e);
            CycleOutcome::PublishFailed
        }
    }
}

pub async fn poll_results_task<Tz>(
    source: &dyn ResultsSource,
    formatter: &Formatter<Tz>,
    sink: &dyn FrameSink,
    period: Duration,
) where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    info!("Starting results poller, updating every {}s", period.as_secs());
    let mut interval = interval(period);
    // A slow cycle pushes the schedule back rather than bunching ticks
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await; // First tick fires immediately
        let outcome = run_cycle(source, formatter, sink).await;
        info!("Cycle finished: {:?}, next update in {}s", outcome, period.as_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayConfig, FrameMode};
    use crate::display::Geometry;
    use crate::fetcher::FetchError;
    use crate::models::{DisplayFrame, ElectionResult, PartyResult};
    use crate::publisher::PublishError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use reqwest::StatusCode;
    use std::sync::Mutex;

    enum Canned {
        Result(ElectionResult),
        NoData,
        ServerError,
    }

    struct FakeSource(Canned);

    #[async_trait]
    impl ResultsSource for FakeSource {
        async fn fetch(&self) -> Result<Option<ElectionResult>, FetchError> {
            match &self.0 {
                Canned::Result(r) => Ok(Some(r.clone())),
                Canned::NoData => Ok(None),
                Canned::ServerError => Err(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Vec<DisplayFrame>>>,
        fail: bool,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn publish(&self, frames: &[DisplayFrame]) -> Result<(), PublishError> {
            if self.fail {
                return Err(PublishError::Timeout(Duration::from_secs(1)));
            }
            self.published.lock().unwrap().push(frames.to_vec());
            Ok(())
        }
    }

    fn formatter() -> Formatter<Utc> {
        Formatter::with_timezone(
            DisplayConfig {
                mode: FrameMode::Parties,
                threshold: 5.0,
                max_parties: 6,
                frame_duration: 10,
            },
            Geometry::default(),
            Utc,
        )
    }

    fn result() -> ElectionResult {
        ElectionResult {
            election_id: "btw25".to_string(),
            stage: "live".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2025-02-23T18:00:00+01:00").unwrap(),
            parties: vec![
                PartyResult::new("A", 45.2, Some(120), "000000"),
                PartyResult::new("B", 30.1, Some(80), "E3000F"),
            ],
        }
    }

    #[tokio::test]
    async fn publishes_formatted_frames() {
        let sink = RecordingSink::default();
        let outcome = run_cycle(&FakeSource(Canned::Result(result())), &formatter(), &sink).await;

        assert_eq!(outcome, CycleOutcome::Published { frames: 2 });
        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0][0].plain_text(), "A45% 120");
    }

    #[tokio::test]
    async fn fetch_failure_publishes_nothing() {
        let sink = RecordingSink::default();
        let outcome = run_cycle(&FakeSource(Canned::ServerError), &formatter(), &sink).await;

        assert_eq!(outcome, CycleOutcome::FetchFailed);
        assert!(sink.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_data_publishes_placeholder() {
        let sink = RecordingSink::default();
        let outcome = run_cycle(&FakeSource(Canned::NoData), &formatter(), &sink).await;

        assert_eq!(outcome, CycleOutcome::PublishedNoData);
        assert_eq!(*sink.published.lock().unwrap(), vec![vec![no_data_frame()]]);
    }

    #[tokio::test]
    async fn publish_failure_is_reported() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let outcome = run_cycle(&FakeSource(Canned::Result(result())), &formatter(), &sink).await;
        assert_eq!(outcome, CycleOutcome::PublishFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_runs_every_period() {
        let sink = RecordingSink::default();
        let source = FakeSource(Canned::Result(result()));
        let f = formatter();

        let poller = poll_results_task(&source, &f, &sink, Duration::from_secs(300));
        let _ = tokio::time::timeout(Duration::from_secs(650), poller).await;

        // ticks at 0s, 300s and 600s
        assert_eq!(sink.published.lock().unwrap().len(), 3);
    }
}
