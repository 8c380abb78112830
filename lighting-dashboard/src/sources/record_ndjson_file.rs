use std::path::PathBuf;

use lighting_client::domain::RecordDraft;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tokio_stream::{wrappers::LinesStream, StreamExt};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// NDJSON source: one JSON `RecordDraft` per line, the same body the admin
/// API accepts. Blank lines are ignored.
pub struct RecordNdjsonFileSource {
    path: PathBuf,
}

impl RecordNdjsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_line(line: &str) -> Result<RecordDraft, PipelineError> {
    serde_json::from_str(line).map_err(|e| {
        metrics::counter!("import_ndjson_parse_errors_total").increment(1);
        PipelineError::Source(format!("failed to parse record json line: {e}"))
    })
}

#[async_trait::async_trait]
impl Source<RecordDraft> for RecordNdjsonFileSource {
    async fn stream(&self) -> EnvelopeStream<RecordDraft> {
        let path = self.path.clone();
        let s = async_stream::stream! {
            let file = match File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to open NDJSON file: {e}")));
                    return;
                }
            };
            let mut lines = LinesStream::new(BufReader::new(file).lines());

            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        yield Err(PipelineError::Source(format!("failed to read NDJSON line: {e}")));
                        return;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                yield parse_line(&line).map(Envelope::now);
            }
        };

        Box::pin(s)
    }
}
