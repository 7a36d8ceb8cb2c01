//! Pipeline orchestration: one URL in, one MP3 out

use crate::config::Config;
use crate::error::{DownloadError, PipelineError, Result, TranscodeError};
use crate::output::{sanitize_filename, unique_output_path};
use crate::progress::{PipelineStage, ProgressReporter};
use crate::request::{ConversionRequest, ConversionResult};
use crate::retry::RetryPolicy;
use crate::scratch::ScratchGuard;
use crate::source::{fallback_title, validate_url, VideoHandle, VideoSource};
use crate::transcoder::Transcoder;

use std::path::PathBuf;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const AUDIO_EXTENSION: &str = "mp3";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    /// Holds the downloaded video until it is transcoded
    pub scratch_dir: PathBuf,
    /// Substring every accepted URL must contain
    pub domain: String,
    /// Container extension of the progressive stream to download
    pub container: String,
    pub retry: RetryPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output.directory.clone(),
            scratch_dir: config.scratch_dir(),
            domain: config.source.domain.clone(),
            container: config.source.container.clone(),
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Main processing pipeline
pub struct ConversionPipeline<S, T> {
    source: S,
    transcoder: T,
    settings: PipelineSettings,
    reporter: Box<dyn ProgressReporter>,
}

impl<S: VideoSource, T: Transcoder> ConversionPipeline<S, T> {
    pub fn new(
        source: S,
        transcoder: T,
        settings: PipelineSettings,
        reporter: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            source,
            transcoder,
            settings,
            reporter,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one request to completion.
    ///
    /// The scratch directory is cleaned before this returns, whatever the
    /// outcome, and before the terminal stage is reported.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        let start_time = Instant::now();
        info!("Starting conversion of {} ({} quality)", request.url, request.quality);

        let mut scratch = None;
        let outcome = self.run(request, &mut scratch).await;

        self.reporter.stage(&PipelineStage::CleaningUp);
        drop(scratch);

        match &outcome {
            Ok(result) => {
                let duration = start_time.elapsed();
                info!(
                    "Conversion complete: {} ({:.1}s)",
                    result.output_path.display(),
                    duration.as_secs_f32()
                );
                self.reporter.stage(&PipelineStage::Complete {
                    output: result.output_path.clone(),
                    duration,
                });
            }
            Err(e) => {
                info!("Conversion of {} failed while {}: {}", request.url, e.stage(), e);
                self.reporter.stage(&PipelineStage::Failed {
                    stage: e.stage(),
                    error: e.to_string(),
                });
            }
        }

        outcome
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        scratch: &mut Option<ScratchGuard>,
    ) -> Result<ConversionResult> {
        // 1. Validate
        self.reporter.stage(&PipelineStage::Validating {
            url: request.url.clone(),
        });
        validate_url(&request.url, &self.settings.domain)?;
        let fallback = fallback_title(&request.url)?;

        // 2. Resolve metadata
        let video = self.resolve_with_retry(&request.url).await?;

        let title = video
            .usable_title()
            .map(sanitize_filename)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| sanitize_filename(&fallback));

        // 3. Select stream
        self.reporter.stage(&PipelineStage::SelectingStream {
            title: title.clone(),
        });
        let stream = video
            .select_stream(&self.settings.container, request.quality)
            .ok_or_else(|| PipelineError::NoStream {
                container: self.settings.container.clone(),
            })?;
        debug!(
            "Selected format {} ({}p, {} bytes)",
            stream.format_id, stream.resolution, stream.size_bytes
        );

        // 4. Download
        let guard = scratch.insert(ScratchGuard::new(&self.settings.scratch_dir, &video.id));
        tokio::fs::create_dir_all(guard.dir())
            .await
            .map_err(DownloadError::from)?;

        self.reporter.stage(&PipelineStage::Downloading {
            resolution: stream.resolution,
            total_bytes: stream.size_bytes,
        });
        let progress = self.reporter.transfer(stream.size_bytes);
        let downloaded = self
            .source
            .download(&video, stream, guard.dir(), progress.as_ref())
            .await;
        progress.finish(downloaded.is_ok());
        let video_path = downloaded?;

        // 5. Pick a free output path
        self.reporter.stage(&PipelineStage::ResolvingOutputPath);
        tokio::fs::create_dir_all(&self.settings.output_dir).await?;
        let wanted = self
            .settings
            .output_dir
            .join(format!("{}.{}", title, AUDIO_EXTENSION));
        let output_path = unique_output_path(&wanted);
        debug!("Output path: {}", output_path.display());

        // 6. Transcode
        self.reporter.stage(&PipelineStage::Transcoding {
            output: output_path.clone(),
        });
        let media = self.transcoder.open(&video_path).await?;
        if let Err(e) = self.transcoder.write_audio(&media, &output_path).await {
            if !matches!(e, TranscodeError::OutputExists(_)) {
                remove_partial_output(&output_path).await;
            }
            return Err(e.into());
        }

        Ok(ConversionResult { output_path })
    }

    async fn resolve_with_retry(&self, url: &str) -> Result<VideoHandle> {
        let policy = self.settings.retry;
        let mut reason = String::from("no attempts made");

        for attempt in 0..policy.max_attempts {
            self.reporter.stage(&PipelineStage::ResolvingMetadata {
                attempt: attempt + 1,
                max_attempts: policy.max_attempts,
            });

            match self.source.resolve(url).await {
                Ok(video) => {
                    // Rate limiting
                    sleep(policy.throttle).await;
                    if video.usable_title().is_some() {
                        return Ok(video);
                    }
                    reason = format!("metadata for {} has no title", video.id);
                }
                Err(e) => reason = e.to_string(),
            }

            info!(
                "Attempt {}/{} failed: {}",
                attempt + 1,
                policy.max_attempts,
                reason
            );

            if let Some(wait) = policy.backoff(attempt) {
                self.reporter.stage(&PipelineStage::RetryScheduled {
                    attempt: attempt + 1,
                    max_attempts: policy.max_attempts,
                    wait,
                    reason: reason.clone(),
                });
                sleep(wait).await;
            }
        }

        Err(PipelineError::Resolution {
            attempts: policy.max_attempts,
            reason,
        })
    }
}

async fn remove_partial_output(path: &std::path::Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Cleanup: failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::progress::TransferProgress;
    use crate::request::QualityPreference;
    use crate::source::StreamDescriptor;
    use crate::transcoder::{AudioTrack, MediaInput};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn stream(format_id: &str, resolution: u32, ext: &str, progressive: bool) -> StreamDescriptor {
        StreamDescriptor {
            format_id: format_id.to_string(),
            resolution,
            container_extension: ext.to_string(),
            is_progressive: progressive,
            size_bytes: 4096,
        }
    }

    fn video(title: Option<&str>, streams: Vec<StreamDescriptor>) -> VideoHandle {
        VideoHandle {
            id: "dQw4w9WgXcQ".to_string(),
            title: title.map(str::to_string),
            page_url: URL.to_string(),
            streams,
        }
    }

    fn standard_streams() -> Vec<StreamDescriptor> {
        vec![
            stream("22", 720, "mp4", true),
            stream("18", 360, "mp4", true),
            stream("37", 1080, "mp4", true),
            stream("137", 2160, "mp4", false),
        ]
    }

    #[derive(Default)]
    struct FakeSource {
        responses: Mutex<VecDeque<std::result::Result<VideoHandle, SourceError>>>,
        resolve_times: Mutex<Vec<tokio::time::Instant>>,
        downloads: Mutex<Vec<String>>,
        fail_download: bool,
    }

    impl FakeSource {
        fn new(responses: Vec<std::result::Result<VideoHandle, SourceError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn resolving(video: VideoHandle) -> Self {
            Self::new(vec![Ok(video)])
        }

        fn resolve_calls(&self) -> usize {
            self.resolve_times.lock().unwrap().len()
        }

        fn downloaded(&self) -> Vec<String> {
            self.downloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn resolve(&self, _url: &str) -> std::result::Result<VideoHandle, SourceError> {
            self.resolve_times
                .lock()
                .unwrap()
                .push(tokio::time::Instant::now());
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(SourceError::MetadataParse("no response queued".into())))
        }

        async fn download(
            &self,
            video: &VideoHandle,
            stream: &StreamDescriptor,
            destination_dir: &Path,
            progress: &dyn TransferProgress,
        ) -> std::result::Result<PathBuf, DownloadError> {
            self.downloads.lock().unwrap().push(stream.format_id.clone());
            let path = destination_dir.join(video.artifact_name(stream));
            std::fs::write(&path, b"partial video")?;
            progress.advance(1024);
            if self.fail_download {
                return Err(DownloadError::YtDlpFailed {
                    code: Some(1),
                    message: "ERROR: HTTP Error 403: Forbidden".into(),
                });
            }
            progress.advance(stream.size_bytes - 1024);
            Ok(path)
        }
    }

    #[derive(Default)]
    struct FakeTranscoder {
        fail: bool,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn open(&self, video: &Path) -> std::result::Result<MediaInput, TranscodeError> {
            if !video.exists() {
                return Err(TranscodeError::NoAudioTrack(video.display().to_string()));
            }
            Ok(MediaInput {
                path: video.to_path_buf(),
                audio: AudioTrack {
                    index: 1,
                    codec: "aac".into(),
                    sample_rate: Some(44100),
                    channels: Some(2),
                },
                duration: Some(212.0),
            })
        }

        async fn write_audio(
            &self,
            _input: &MediaInput,
            destination: &Path,
        ) -> std::result::Result<(), TranscodeError> {
            if destination.exists() {
                return Err(TranscodeError::OutputExists(destination.display().to_string()));
            }
            std::fs::write(destination, b"ID3")?;
            if self.fail {
                return Err(TranscodeError::FfmpegFailed {
                    code: Some(1),
                    message: "Conversion failed!".into(),
                });
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        stages: Arc<Mutex<Vec<PipelineStage>>>,
        transferred: Arc<AtomicU64>,
        finished: Arc<Mutex<Vec<bool>>>,
    }

    struct RecordedTransfer {
        transferred: Arc<AtomicU64>,
        finished: Arc<Mutex<Vec<bool>>>,
    }

    impl TransferProgress for RecordedTransfer {
        fn advance(&self, bytes: u64) {
            self.transferred.fetch_add(bytes, Ordering::SeqCst);
        }
        fn finish(&self, completed: bool) {
            self.finished.lock().unwrap().push(completed);
        }
    }

    impl ProgressReporter for Recorder {
        fn stage(&self, stage: &PipelineStage) {
            self.stages.lock().unwrap().push(stage.clone());
        }

        fn transfer(&self, _total_bytes: u64) -> Box<dyn TransferProgress> {
            Box::new(RecordedTransfer {
                transferred: self.transferred.clone(),
                finished: self.finished.clone(),
            })
        }
    }

    impl Recorder {
        fn finished(&self) -> Vec<bool> {
            self.finished.lock().unwrap().clone()
        }

        fn stages(&self) -> Vec<PipelineStage> {
            self.stages.lock().unwrap().clone()
        }

        fn last_two(&self) -> Vec<PipelineStage> {
            let stages = self.stages();
            stages[stages.len().saturating_sub(2)..].to_vec()
        }
    }

    fn settings(root: &Path, retry: RetryPolicy) -> PipelineSettings {
        PipelineSettings {
            output_dir: root.join("saved"),
            scratch_dir: root.join("saved").join("temp"),
            domain: "youtube.com".into(),
            container: "mp4".into(),
            retry,
        }
    }

    fn pipeline(
        root: &Path,
        source: FakeSource,
        transcoder: FakeTranscoder,
    ) -> (ConversionPipeline<FakeSource, FakeTranscoder>, Recorder) {
        let recorder = Recorder::default();
        let pipeline = ConversionPipeline::new(
            source,
            transcoder,
            settings(root, RetryPolicy::immediate(3)),
            Box::new(recorder.clone()),
        );
        (pipeline, recorder)
    }

    fn assert_about(actual: Duration, expected: Duration) {
        let slack = Duration::from_millis(50);
        assert!(
            actual >= expected && actual <= expected + slack,
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    fn highest() -> ConversionRequest {
        ConversionRequest::new(URL, QualityPreference::Highest)
    }

    fn assert_scratch_clean(root: &Path) {
        let scratch = root.join("saved").join("temp");
        if scratch.exists() {
            let leftovers: Vec<_> = std::fs::read_dir(&scratch).unwrap().collect();
            assert!(leftovers.is_empty(), "leftover scratch files: {leftovers:?}");
        }
    }

    #[tokio::test]
    async fn test_converts_highest_quality() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("Never Gonna Give You Up"), standard_streams()));
        let (pipeline, recorder) = pipeline(root.path(), source, FakeTranscoder::default());

        let result = pipeline.convert(&highest()).await.unwrap();

        let expected = root.path().join("saved").join("Never Gonna Give You Up.mp3");
        assert_eq!(result.output_path, expected);
        assert_eq!(std::fs::read(&expected).unwrap(), b"ID3");
        assert_eq!(pipeline.source.downloaded(), vec!["37"]);
        assert_eq!(recorder.transferred.load(Ordering::SeqCst), 4096);
        assert!(!root.path().join("saved").join("temp").exists());
    }

    #[tokio::test]
    async fn test_converts_lowest_quality() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("Song"), standard_streams()));
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let request = ConversionRequest::new(URL, QualityPreference::Lowest);
        pipeline.convert(&request).await.unwrap();

        assert_eq!(pipeline.source.downloaded(), vec!["18"]);
    }

    #[tokio::test]
    async fn test_stage_order_on_success() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("Song"), standard_streams()));
        let (pipeline, recorder) = pipeline(root.path(), source, FakeTranscoder::default());

        pipeline.convert(&highest()).await.unwrap();

        let names: Vec<&str> = recorder
            .stages()
            .iter()
            .map(|s| match s {
                PipelineStage::Validating { .. } => "validating",
                PipelineStage::ResolvingMetadata { .. } => "resolving",
                PipelineStage::RetryScheduled { .. } => "retry",
                PipelineStage::SelectingStream { .. } => "selecting",
                PipelineStage::Downloading { .. } => "downloading",
                PipelineStage::ResolvingOutputPath => "output-path",
                PipelineStage::Transcoding { .. } => "transcoding",
                PipelineStage::CleaningUp => "cleanup",
                PipelineStage::Complete { .. } => "complete",
                PipelineStage::Failed { .. } => "failed",
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "validating",
                "resolving",
                "selecting",
                "downloading",
                "output-path",
                "transcoding",
                "cleanup",
                "complete",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_network_call() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("Song"), standard_streams()));
        let (pipeline, recorder) = pipeline(root.path(), source, FakeTranscoder::default());

        let request = ConversionRequest::new("not a url", QualityPreference::Highest);
        let err = pipeline.convert(&request).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(err.stage(), "validating");
        assert_eq!(pipeline.source.resolve_calls(), 0);
        assert!(!root.path().join("saved").exists());
        assert!(matches!(
            recorder.last_two().as_slice(),
            [PipelineStage::CleaningUp, PipelineStage::Failed { stage: "validating", .. }]
        ));
    }

    #[tokio::test]
    async fn test_foreign_domain_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(root.path(), FakeSource::default(), FakeTranscoder::default());

        let request = ConversionRequest::new("https://vimeo.com/watch?v=123", QualityPreference::Highest);
        let err = pipeline.convert(&request).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(pipeline.source.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_url_without_watch_id_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(root.path(), FakeSource::default(), FakeTranscoder::default());

        let request = ConversionRequest::new(
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            QualityPreference::Highest,
        );
        let err = pipeline.convert(&request).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(pipeline.source.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_progressive_mp4_means_no_download() {
        let root = tempfile::tempdir().unwrap();
        let streams = vec![
            stream("137", 1080, "mp4", false),
            stream("43", 360, "webm", true),
        ];
        let source = FakeSource::resolving(video(Some("Song"), streams));
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let err = pipeline.convert(&highest()).await.unwrap_err();

        assert!(matches!(err, PipelineError::NoStream { .. }));
        assert!(pipeline.source.downloaded().is_empty());
        assert_scratch_clean(root.path());
    }

    #[tokio::test]
    async fn test_missing_title_is_retried() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::new(vec![
            Ok(video(None, standard_streams())),
            Ok(video(Some(""), standard_streams())),
            Ok(video(Some("Third Time Lucky"), standard_streams())),
        ]);
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let result = pipeline.convert(&highest()).await.unwrap();

        assert_eq!(pipeline.source.resolve_calls(), 3);
        assert_eq!(
            result.output_path,
            root.path().join("saved").join("Third Time Lucky.mp3")
        );
    }

    #[tokio::test]
    async fn test_exhausted_retries() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::new(vec![
            Err(SourceError::VideoUnavailable(URL.into())),
            Err(SourceError::VideoUnavailable(URL.into())),
            Err(SourceError::VideoUnavailable(URL.into())),
            Ok(video(Some("Too Late"), standard_streams())),
        ]);
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let err = pipeline.convert(&highest()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Resolution { attempts: 3, .. }));
        assert_eq!(pipeline.source.resolve_calls(), 3);
        assert!(pipeline.source.downloaded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::new(vec![
            Err(SourceError::YtDlpFailed {
                code: Some(1),
                message: "HTTP Error 429".into(),
            }),
            Err(SourceError::YtDlpFailed {
                code: Some(1),
                message: "HTTP Error 429".into(),
            }),
            Ok(video(Some("Finally"), standard_streams())),
        ]);
        let recorder = Recorder::default();
        let pipeline = ConversionPipeline::new(
            source,
            FakeTranscoder::default(),
            settings(root.path(), RetryPolicy::default()),
            Box::new(recorder.clone()),
        );

        let started = tokio::time::Instant::now();
        let video = pipeline.resolve_with_retry(URL).await.unwrap();

        assert_eq!(video.usable_title(), Some("Finally"));
        let times = pipeline.source.resolve_times.lock().unwrap().clone();
        assert_eq!(times.len(), 3);
        assert_about(times[1] - times[0], Duration::from_secs(3));
        assert_about(times[2] - times[1], Duration::from_secs(6));
        // Throttle after the successful call
        assert_about(started.elapsed(), Duration::from_secs(12));

        let waits: Vec<Duration> = recorder
            .stages()
            .iter()
            .filter_map(|s| match s {
                PipelineStage::RetryScheduled { wait, .. } => Some(*wait),
                _ => None,
            })
            .collect();
        assert_eq!(waits, vec![Duration::from_secs(3), Duration::from_secs(6)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_final_attempt() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        let pipeline = ConversionPipeline::new(
            source,
            FakeTranscoder::default(),
            settings(root.path(), RetryPolicy::default()),
            Box::new(crate::progress::NoopReporter),
        );

        let started = tokio::time::Instant::now();
        let err = pipeline.resolve_with_retry(URL).await.unwrap_err();

        assert!(matches!(err, PipelineError::Resolution { attempts: 3, .. }));
        assert_about(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test]
    async fn test_download_failure_cleans_scratch() {
        let root = tempfile::tempdir().unwrap();
        let mut source = FakeSource::resolving(video(Some("Song"), standard_streams()));
        source.fail_download = true;
        let (pipeline, recorder) = pipeline(root.path(), source, FakeTranscoder::default());

        let err = pipeline.convert(&highest()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Download(_)));
        assert_eq!(recorder.transferred.load(Ordering::SeqCst), 1024);
        assert_eq!(recorder.finished(), vec![false]);
        assert!(!root.path().join("saved").join("temp").exists());
        assert!(!root.path().join("saved").join("Song.mp3").exists());
    }

    #[tokio::test]
    async fn test_transcode_failure_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("Song"), standard_streams()));
        let (pipeline, recorder) = pipeline(root.path(), source, FakeTranscoder { fail: true });

        let err = pipeline.convert(&highest()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Transcode(_)));
        assert_eq!(err.stage(), "transcoding");
        assert_scratch_clean(root.path());
        assert!(!root.path().join("saved").join("Song.mp3").exists());
        assert!(matches!(
            recorder.last_two().as_slice(),
            [PipelineStage::CleaningUp, PipelineStage::Failed { stage: "transcoding", .. }]
        ));
    }

    #[tokio::test]
    async fn test_existing_outputs_get_suffixes() {
        let root = tempfile::tempdir().unwrap();
        let saved = root.path().join("saved");
        std::fs::create_dir_all(&saved).unwrap();
        std::fs::write(saved.join("Song.mp3"), b"original").unwrap();

        let source = FakeSource::new(vec![
            Ok(video(Some("Song"), standard_streams())),
            Ok(video(Some("Song"), standard_streams())),
        ]);
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let first = pipeline.convert(&highest()).await.unwrap();
        let second = pipeline.convert(&highest()).await.unwrap();

        assert_eq!(first.output_path, saved.join("Song_1.mp3"));
        assert_eq!(second.output_path, saved.join("Song_2.mp3"));
        assert_eq!(std::fs::read(saved.join("Song.mp3")).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_title_is_sanitized() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("AC/DC: Back in Black? <Live>"), standard_streams()));
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let result = pipeline.convert(&highest()).await.unwrap();

        assert_eq!(
            result.output_path,
            root.path().join("saved").join("ACDC Back in Black Live.mp3")
        );
    }

    #[tokio::test]
    async fn test_unusable_sanitized_title_falls_back_to_id() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("???"), standard_streams()));
        let (pipeline, _) = pipeline(root.path(), source, FakeTranscoder::default());

        let result = pipeline.convert(&highest()).await.unwrap();

        assert_eq!(
            result.output_path,
            root.path().join("saved").join("video_dQw4w9WgXcQ.mp3")
        );
    }

    #[tokio::test]
    async fn test_blank_title_is_accepted_and_falls_back_to_id() {
        let root = tempfile::tempdir().unwrap();
        let source = FakeSource::resolving(video(Some("   "), standard_streams()));
        let (pipeline, recorder) = pipeline(root.path(), source, FakeTranscoder::default());

        let result = pipeline.convert(&highest()).await.unwrap();

        assert_eq!(pipeline.source.resolve_calls(), 1);
        assert_eq!(
            result.output_path,
            root.path().join("saved").join("video_dQw4w9WgXcQ.mp3")
        );
        assert_eq!(recorder.finished(), vec![true]);
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.output_dir, PathBuf::from("saved"));
        assert_eq!(settings.scratch_dir, PathBuf::from("saved").join("temp"));
        assert_eq!(settings.domain, "youtube.com");
        assert_eq!(settings.container, "mp4");
        assert_eq!(settings.retry, RetryPolicy::default());
    }
}
