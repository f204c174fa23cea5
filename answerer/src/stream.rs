//! Generation Streamer: ordered fragment delivery with timing and token
//! accounting.
//!
//! A [`GenerationStreamer`] wraps an open chunk stream from the generation
//! service and pulls fragments under an overall deadline. The session's
//! request call is the `Idle → Requesting` leg of the state machine; a
//! streamer is only constructed once the request was accepted, so it starts
//! in [`StreamState::Streaming`].
//!
//! [`forward`] pumps a streamer into a bounded channel so fragments reach
//! the caller as soon as they arrive — never accumulated — and the pump
//! stops (releasing the upstream connection) the moment the caller hangs
//! up.

use std::time::Duration;

use futures::StreamExt;
use llm_service::{GenStream, Generated, LlmError};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::candidate::GenerationStats;
use crate::error::{AnswerError, map_generation_error};

/// Bound on unconsumed fragments; the pump blocks rather than buffer more.
const FRAGMENT_CHANNEL_CAP: usize = 32;

/// Token-count heuristic used when the generation service does not report
/// its own counters: whitespace-delimited words × 2 (the corpus averages
/// ~0.5 English words per token).
pub fn approx_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64 * 2
}

/// Generation service contract used by the session: one batch call and one
/// streaming call. Implemented by [`llm_service::OllamaService`]; tests
/// substitute fakes.
pub trait GenerationBackend: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Generated, LlmError>> + Send + 'a>,
    >;

    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<GenStream, LlmError>> + Send + 'a>,
    >;
}

impl GenerationBackend for llm_service::OllamaService {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Generated, LlmError>> + Send + 'a>,
    > {
        Box::pin(llm_service::OllamaService::generate(self, prompt))
    }

    fn generate_stream<'a>(
        &'a self,
        prompt: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<GenStream, LlmError>> + Send + 'a>,
    > {
        Box::pin(llm_service::OllamaService::generate_stream(self, prompt))
    }
}

/// Streamer lifecycle once the generation request was accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// Fragments are being pulled from the service.
    Streaming,
    /// The service closed the stream normally.
    Completed,
    /// Deadline exceeded or the service errored; surfaced to the caller.
    Failed,
    /// The caller hung up; emitted fragments stand, nothing more is pulled.
    Cancelled,
}

/// Pulls fragments from an open generation stream under a deadline,
/// accumulating token counters as chunks arrive.
pub struct GenerationStreamer {
    source: GenStream,
    state: StreamState,
    timeout: Duration,
    deadline: tokio::time::Instant,
    heuristic_generated: u64,
    reported_generated: Option<u64>,
    reported_prompt: Option<u64>,
}

impl GenerationStreamer {
    /// Wraps an accepted stream; the deadline covers the whole stream, not
    /// each fragment.
    pub fn new(source: GenStream, timeout: Duration) -> Self {
        Self {
            source,
            state: StreamState::Streaming,
            timeout,
            deadline: tokio::time::Instant::now() + timeout,
            heuristic_generated: 0,
            reported_generated: None,
            reported_prompt: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Stops pulling; already-emitted fragments are not retracted. Dropping
    /// the streamer closes the upstream connection.
    pub fn cancel(&mut self) {
        self.state = StreamState::Cancelled;
    }

    /// Next text fragment in arrival order; `None` once the stream is done
    /// (or was cancelled/failed earlier).
    ///
    /// Malformed chunks are logged and skipped. A deadline hit yields
    /// [`AnswerError::GenerationTimeout`]; a service error yields
    /// [`AnswerError::GenerationUnavailable`]. Both are terminal.
    pub async fn next_fragment(&mut self) -> Option<Result<String, AnswerError>> {
        if self.state != StreamState::Streaming {
            return None;
        }

        loop {
            match tokio::time::timeout_at(self.deadline, self.source.next()).await {
                Err(_) => {
                    self.state = StreamState::Failed;
                    return Some(Err(AnswerError::GenerationTimeout(self.timeout)));
                }
                Ok(None) => {
                    self.state = StreamState::Completed;
                    return None;
                }
                Ok(Some(Ok(chunk))) => {
                    if let Some(n) = chunk.eval_count {
                        self.reported_generated = Some(n);
                    }
                    if let Some(n) = chunk.prompt_eval_count {
                        self.reported_prompt = Some(n);
                    }

                    if chunk.response.is_empty() {
                        if chunk.done {
                            self.state = StreamState::Completed;
                            return None;
                        }
                        continue;
                    }

                    self.heuristic_generated += approx_tokens(&chunk.response);
                    if chunk.done {
                        self.state = StreamState::Completed;
                    }
                    return Some(Ok(chunk.response));
                }
                Ok(Some(Err(LlmError::Decode(e)))) => {
                    warn!("malformed stream chunk skipped: {e}");
                }
                Ok(Some(Err(e))) => {
                    self.state = StreamState::Failed;
                    return Some(Err(map_generation_error(e, self.timeout)));
                }
            }
        }
    }

    /// Generated-token count: service-reported when available, otherwise
    /// the accumulated heuristic.
    pub fn generated_tokens(&self) -> u64 {
        self.reported_generated.unwrap_or(self.heuristic_generated)
    }

    /// Prompt-token count as reported by the service, if it was.
    pub fn reported_prompt_tokens(&self) -> Option<u64> {
        self.reported_prompt
    }
}

/// Timing context carried from the session into stats finalization.
pub(crate) struct StatsSeed {
    pub retrieval_seconds: f64,
    pub prompt_tokens_estimate: u64,
    pub query_start: std::time::Instant,
    pub generation_start: std::time::Instant,
}

impl StatsSeed {
    pub(crate) fn finalize(&self, streamer: &GenerationStreamer) -> GenerationStats {
        GenerationStats {
            retrieval_seconds: self.retrieval_seconds,
            generation_seconds: self.generation_start.elapsed().as_secs_f64(),
            total_seconds: self.query_start.elapsed().as_secs_f64(),
            prompt_tokens: streamer
                .reported_prompt_tokens()
                .unwrap_or(self.prompt_tokens_estimate),
            generated_tokens: streamer.generated_tokens(),
        }
    }
}

/// Incremental answer handle: an ordered stream of text fragments.
///
/// Backed by a bounded channel; implements [`futures::Stream`] so the HTTP
/// layer can hand it straight to a response body.
pub struct AnswerStream {
    rx: mpsc::Receiver<Result<String, AnswerError>>,
}

impl AnswerStream {
    /// Next fragment, `None` once the stream is closed.
    pub async fn next_fragment(&mut self) -> Option<Result<String, AnswerError>> {
        self.rx.recv().await
    }
}

impl futures::Stream for AnswerStream {
    type Item = Result<String, AnswerError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Spawns the pump task that forwards fragments from `streamer` to the
/// returned [`AnswerStream`] in arrival order.
///
/// Each fragment is sent as soon as it is pulled. When the receiver is
/// dropped the pump cancels the streamer and stops; when the stream ends
/// (normally or on error) the finalized stats are logged.
pub(crate) fn forward(mut streamer: GenerationStreamer, seed: StatsSeed) -> AnswerStream {
    let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAP);

    tokio::spawn(async move {
        loop {
            match streamer.next_fragment().await {
                Some(item) => {
                    let terminal = item.is_err();
                    if tx.send(item).await.is_err() {
                        streamer.cancel();
                        break;
                    }
                    if terminal {
                        break;
                    }
                }
                None => break,
            }
        }

        let stats = seed.finalize(&streamer);
        info!(
            state = ?streamer.state(),
            retrieval_s = format!("{:.2}", stats.retrieval_seconds),
            generation_s = format!("{:.2}", stats.generation_seconds),
            total_s = format!("{:.2}", stats.total_seconds),
            prompt_tokens = stats.prompt_tokens,
            generated_tokens = stats.generated_tokens,
            "generation stream closed"
        );
    });

    AnswerStream { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_service::GenChunk;
    use std::time::Instant;

    fn chunk(text: &str) -> Result<GenChunk, LlmError> {
        Ok(GenChunk {
            response: text.into(),
            done: false,
            eval_count: None,
            prompt_eval_count: None,
        })
    }

    fn final_chunk(eval: u64, prompt: u64) -> Result<GenChunk, LlmError> {
        Ok(GenChunk {
            response: String::new(),
            done: true,
            eval_count: Some(eval),
            prompt_eval_count: Some(prompt),
        })
    }

    fn source(items: Vec<Result<GenChunk, LlmError>>) -> GenStream {
        Box::pin(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn fragments_arrive_in_production_order() {
        let mut streamer = GenerationStreamer::new(
            source(vec![chunk("Hel"), chunk("lo"), chunk(" world"), final_chunk(12, 40)]),
            Duration::from_secs(5),
        );

        let mut out = String::new();
        while let Some(item) = streamer.next_fragment().await {
            out.push_str(&item.unwrap());
        }

        assert_eq!(out, "Hello world");
        assert_eq!(streamer.state(), StreamState::Completed);
        assert_eq!(streamer.generated_tokens(), 12);
        assert_eq!(streamer.reported_prompt_tokens(), Some(40));
    }

    #[tokio::test]
    async fn malformed_chunk_is_skipped_not_fatal() {
        let mut streamer = GenerationStreamer::new(
            source(vec![
                chunk("first"),
                Err(LlmError::Decode("broken line".into())),
                chunk("second"),
            ]),
            Duration::from_secs(5),
        );

        assert_eq!(streamer.next_fragment().await.unwrap().unwrap(), "first");
        assert_eq!(streamer.next_fragment().await.unwrap().unwrap(), "second");
        assert!(streamer.next_fragment().await.is_none());
        assert_eq!(streamer.state(), StreamState::Completed);
    }

    #[tokio::test]
    async fn heuristic_counts_when_service_reports_nothing() {
        let mut streamer = GenerationStreamer::new(
            source(vec![chunk("three plain words")]),
            Duration::from_secs(5),
        );
        while streamer.next_fragment().await.is_some() {}
        assert_eq!(streamer.generated_tokens(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_fails_with_timeout() {
        let mut streamer = GenerationStreamer::new(
            Box::pin(futures::stream::pending()),
            Duration::from_secs(3),
        );

        let item = streamer.next_fragment().await.unwrap();
        assert!(matches!(item, Err(AnswerError::GenerationTimeout(_))));
        assert_eq!(streamer.state(), StreamState::Failed);
        assert!(streamer.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn service_error_fails_as_unavailable() {
        let mut streamer = GenerationStreamer::new(
            source(vec![
                chunk("partial"),
                Err(LlmError::InvalidEndpoint("gone".into())),
            ]),
            Duration::from_secs(5),
        );

        assert_eq!(streamer.next_fragment().await.unwrap().unwrap(), "partial");
        let item = streamer.next_fragment().await.unwrap();
        assert!(matches!(item, Err(AnswerError::GenerationUnavailable(_))));
        assert_eq!(streamer.state(), StreamState::Failed);
    }

    #[tokio::test]
    async fn forward_preserves_order_into_the_channel() {
        let streamer = GenerationStreamer::new(
            source(vec![chunk("a"), chunk("b"), chunk("c"), final_chunk(3, 9)]),
            Duration::from_secs(5),
        );
        let seed = StatsSeed {
            retrieval_seconds: 0.1,
            prompt_tokens_estimate: 20,
            query_start: Instant::now(),
            generation_start: Instant::now(),
        };

        let mut stream = forward(streamer, seed);
        let mut got = Vec::new();
        while let Some(item) = stream.next_fragment().await {
            got.push(item.unwrap());
        }
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn approx_tokens_doubles_word_count() {
        assert_eq!(approx_tokens(""), 0);
        assert_eq!(approx_tokens("one two three"), 6);
    }
}
