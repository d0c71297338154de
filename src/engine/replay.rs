//! Replay Engine - streams recorded NDJSON events from a file or stdin

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::{DeployEngine, DeployEventStream};
use crate::error::{DeployViewError, Result};
use crate::event::parse_event_line;
use crate::instance::InstanceState;

const CHANNEL_CAPACITY: usize = 256;

/// Where recorded events are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    File(PathBuf),
    Stdin,
}

impl EventSource {
    /// `-` selects stdin, anything else is a file path
    pub fn from_arg(arg: &Path) -> Self {
        if arg == Path::new("-") {
            EventSource::Stdin
        } else {
            EventSource::File(arg.to_path_buf())
        }
    }
}

/// Engine that replays a recorded event stream
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    source: EventSource,
    pace: Option<Duration>,
    instance_state: Option<PathBuf>,
}

impl ReplayEngine {
    pub fn new(source: EventSource) -> Self {
        Self {
            source,
            pace: None,
            instance_state: None,
        }
    }

    /// Delay between replayed events
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = (!pace.is_zero()).then_some(pace);
        self
    }

    /// Instance state JSON served by `get_blueprint_instance`
    pub fn with_instance_state(mut self, path: impl Into<PathBuf>) -> Self {
        self.instance_state = Some(path.into());
        self
    }

    fn spawn_reader<R>(&self, reader: R) -> DeployEventStream
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let pace = self.pace;
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            let mut line_no = 0;
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(DeployViewError::Io(e))).await;
                        break;
                    }
                };
                line_no += 1;

                let event = match parse_event_line(&line, line_no) {
                    Ok(Some(event)) => Ok(event),
                    Ok(None) => continue,
                    Err(e) => Err(e),
                };
                let failed = event.is_err();
                if tx.send(event).await.is_err() {
                    debug!("event receiver dropped, stopping replay");
                    break;
                }
                if failed {
                    break;
                }
                if let Some(pace) = pace {
                    time::sleep(pace).await;
                }
            }
            debug!(lines = line_no, "replay finished");
        });
        Box::new(ReceiverStream::new(rx))
    }
}

#[async_trait]
impl DeployEngine for ReplayEngine {
    async fn stream_deploy_events(&self, instance_id: Option<&str>) -> Result<DeployEventStream> {
        if let Some(id) = instance_id {
            debug!(instance_id = id, "replay streams the whole recording");
        }
        match &self.source {
            EventSource::Stdin => Ok(self.spawn_reader(tokio::io::stdin())),
            EventSource::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => DeployViewError::FileNotFound {
                        path: path.display().to_string(),
                    },
                    _ => DeployViewError::Io(e),
                })?;
                Ok(self.spawn_reader(file))
            }
        }
    }

    async fn get_blueprint_instance(&self, instance_id: &str) -> Result<InstanceState> {
        let Some(path) = &self.instance_state else {
            return Err(DeployViewError::InstanceNotFound {
                instance_id: instance_id.to_string(),
            });
        };
        let state = InstanceState::load(path)?;
        if !state.instance_id.is_empty() && state.instance_id != instance_id {
            warn!(
                requested = instance_id,
                found = %state.instance_id,
                "instance state file is for a different instance"
            );
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn events_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_source_from_arg() {
        assert_eq!(EventSource::from_arg(Path::new("-")), EventSource::Stdin);
        assert_eq!(
            EventSource::from_arg(Path::new("events.ndjson")),
            EventSource::File(PathBuf::from("events.ndjson"))
        );
    }

    #[tokio::test]
    async fn test_replays_events_skipping_blank_lines() {
        let file = events_file(concat!(
            r#"{"type":"instance","instance_id":"i-1","status":"deploying"}"#,
            "\n\n",
            r#"{"type":"resource","instance_id":"i-1","resource_name":"api","status":"creating"}"#,
            "\n",
        ));
        let engine = ReplayEngine::new(EventSource::File(file.path().to_path_buf()));
        let events: Vec<_> = engine
            .stream_deploy_events(None)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[tokio::test]
    async fn test_malformed_line_ends_stream_with_error() {
        let file = events_file(concat!(
            r#"{"type":"instance","instance_id":"i-1","status":"deploying"}"#,
            "\n",
            "not json\n",
            r#"{"type":"instance","instance_id":"i-1","status":"deployed"}"#,
            "\n",
        ));
        let engine = ReplayEngine::new(EventSource::File(file.path().to_path_buf()));
        let events: Vec<_> = engine
            .stream_deploy_events(None)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        match &events[1] {
            Err(DeployViewError::EventParse { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_events_file() {
        let engine = ReplayEngine::new(EventSource::File("/nope/events.ndjson".into()));
        let err = engine.stream_deploy_events(None).await.err().unwrap();
        assert!(matches!(err, DeployViewError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_instance_state_requires_file() {
        let engine = ReplayEngine::new(EventSource::Stdin);
        let err = engine.get_blueprint_instance("i-1").await.unwrap_err();
        assert!(matches!(err, DeployViewError::InstanceNotFound { .. }));

        let state = events_file(r#"{"instance_id":"i-1","instance_name":"orders"}"#);
        let engine = ReplayEngine::new(EventSource::Stdin).with_instance_state(state.path());
        let loaded = engine.get_blueprint_instance("i-1").await.unwrap();
        assert_eq!(loaded.instance_name, "orders");
    }
}
