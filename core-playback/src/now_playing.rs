//! Now-playing display controller.
//!
//! The info is host-managed: it is pushed as given and never cleared by the
//! session. Artwork is fetched in the background; a failed fetch only logs.
//! Transport status and elapsed time follow the session's events.

use crate::runtime;
use bridge_traits::{HttpClient, HttpRequest, NowPlayingCenter, NowPlayingInfo, NowPlayingStatus};
use core_runtime::events::PlaybackEvent;
use core_runtime::logging::redact_url;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct NowPlayingController {
    center: Option<Arc<dyn NowPlayingCenter>>,
    http: Option<Arc<dyn HttpClient>>,
    fetch_timeout: Duration,
    // Bumped on every info update so a slow fetch cannot overwrite newer artwork.
    artwork_generation: Arc<AtomicU64>,
}

impl NowPlayingController {
    pub fn new(
        center: Option<Arc<dyn NowPlayingCenter>>,
        http: Option<Arc<dyn HttpClient>>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            center,
            http,
            fetch_timeout,
            artwork_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_info(&self, info: NowPlayingInfo) {
        let Some(center) = self.center.clone() else {
            debug!("No now-playing center; ignoring info");
            return;
        };

        center.update_info(&info);
        let generation = self.artwork_generation.fetch_add(1, Ordering::AcqRel) + 1;

        let Some(url) = info.artwork_url.filter(|url| !url.trim().is_empty()) else {
            return;
        };
        let Some(http) = self.http.clone() else {
            warn!("No HTTP client configured; skipping artwork");
            return;
        };

        let latest = self.artwork_generation.clone();
        let request = HttpRequest::get(url.clone()).timeout(self.fetch_timeout);
        runtime::spawn(async move {
            let body = match http.execute(request).await {
                Ok(response) => response.into_success_body(),
                Err(e) => Err(e),
            };

            match body {
                Ok(bytes) if latest.load(Ordering::Acquire) == generation => {
                    debug!(len = bytes.len(), "Artwork fetched");
                    center.set_artwork(bytes);
                }
                Ok(_) => debug!("Discarding artwork for superseded info"),
                Err(e) => warn!(url = %redact_url(&url), error = %e, "Artwork fetch failed"),
            }
        });
    }

    /// Mirrors an emitted event onto the display.
    pub fn on_event(&self, event: &PlaybackEvent) {
        let Some(center) = self.center.as_ref() else {
            return;
        };

        match event {
            PlaybackEvent::Play => center.set_status(NowPlayingStatus::Playing),
            PlaybackEvent::Pause => center.set_status(NowPlayingStatus::Paused),
            PlaybackEvent::Stop { .. } => center.set_status(NowPlayingStatus::Stopped),
            PlaybackEvent::TimeUpdate { current_time } => {
                if let Ok(elapsed) = Duration::try_from_secs_f64(*current_time) {
                    center.set_elapsed(elapsed);
                }
            }
            _ => {}
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait::async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    #[derive(Default)]
    struct RecordingCenter {
        infos: Mutex<Vec<NowPlayingInfo>>,
        artwork: Mutex<Vec<Bytes>>,
        elapsed: Mutex<Vec<Duration>>,
        statuses: Mutex<Vec<NowPlayingStatus>>,
    }

    impl NowPlayingCenter for RecordingCenter {
        fn update_info(&self, info: &NowPlayingInfo) {
            self.infos.lock().push(info.clone());
        }

        fn set_artwork(&self, artwork: Bytes) {
            self.artwork.lock().push(artwork);
        }

        fn set_elapsed(&self, elapsed: Duration) {
            self.elapsed.lock().push(elapsed);
        }

        fn set_status(&self, status: NowPlayingStatus) {
            self.statuses.lock().push(status);
        }
    }

    fn ok_response(body: &'static [u8]) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(body),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn pushes_info_and_fetched_artwork() {
        let center = Arc::new(RecordingCenter::default());
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|request| {
                request.url == "https://img.example/cover.jpg"
                    && request.timeout == Some(Duration::from_secs(10))
            })
            .times(1)
            .returning(|_| Ok(ok_response(b"JPEG")));

        let controller = NowPlayingController::new(
            Some(center.clone()),
            Some(Arc::new(http)),
            Duration::from_secs(10),
        );
        controller.set_info(
            NowPlayingInfo::new("Morning Edition")
                .with_artwork_url("https://img.example/cover.jpg")
                .live(),
        );
        settle().await;

        assert_eq!(center.infos.lock().len(), 1);
        assert!(center.infos.lock()[0].is_live_stream);
        assert_eq!(center.artwork.lock().as_slice(), &[Bytes::from_static(b"JPEG")]);
    }

    #[tokio::test]
    async fn artwork_failure_keeps_info() {
        let center = Arc::new(RecordingCenter::default());
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("Request timed out".into())));

        let controller = NowPlayingController::new(
            Some(center.clone()),
            Some(Arc::new(http)),
            Duration::from_secs(1),
        );
        controller.set_info(NowPlayingInfo::new("Show").with_artwork_url("https://img.example/a.png"));
        settle().await;

        assert_eq!(center.infos.lock().len(), 1);
        assert!(center.artwork.lock().is_empty());
    }

    #[tokio::test]
    async fn no_fetch_without_artwork_url() {
        let center = Arc::new(RecordingCenter::default());
        let mut http = MockHttp::new();
        http.expect_execute().times(0);

        let controller = NowPlayingController::new(
            Some(center.clone()),
            Some(Arc::new(http)),
            Duration::from_secs(1),
        );
        controller.set_info(NowPlayingInfo::new("Show"));
        settle().await;

        assert_eq!(center.infos.lock().len(), 1);
    }

    #[test]
    fn mirrors_transport_and_elapsed() {
        let center = Arc::new(RecordingCenter::default());
        let controller = NowPlayingController::new(Some(center.clone()), None, Duration::from_secs(1));

        controller.on_event(&PlaybackEvent::Play);
        controller.on_event(&PlaybackEvent::TimeUpdate { current_time: 12.5 });
        controller.on_event(&PlaybackEvent::TimeUpdate { current_time: 1e20 });
        controller.on_event(&PlaybackEvent::TimeUpdate { current_time: f64::NAN });
        controller.on_event(&PlaybackEvent::Pause);
        controller.on_event(&PlaybackEvent::Stop { ended: false });
        controller.on_event(&PlaybackEvent::Buffering { is_buffering: true });

        assert_eq!(
            *center.statuses.lock(),
            vec![
                NowPlayingStatus::Playing,
                NowPlayingStatus::Paused,
                NowPlayingStatus::Stopped
            ]
        );
        assert_eq!(*center.elapsed.lock(), vec![Duration::from_millis(12_500)]);
    }
}
