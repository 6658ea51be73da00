// ABOUTME: OpenAI-compatible streaming client — POST /chat/completions with stream=true.
// ABOUTME: Decodes the server-sent event body into text fragments as bytes arrive.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::agent::provider::{CompletionClient, FragmentStream, request_messages};
use crate::error::CompletionError;
use crate::session::Message;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Error object some providers send inside the event stream.
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Longest stray line quoted back in an error.
const STRAY_PREVIEW_CHARS: usize = 200;

/// Incremental decoder for a `text/event-stream` completion body.
///
/// Bytes are buffered until a full line is available, so multi-byte characters
/// split across network chunks decode correctly. Call [`SseDecoder::finish`]
/// once the body ends.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    done: bool,
    fragments: usize,
    failed: bool,
    stray: Option<String>,
}

impl SseDecoder {
    /// True once `data: [DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes; returns the fragments completed by them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String, CompletionError>> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.push_line(&line, &mut out);
        }

        out
    }

    /// Flush an unterminated final line and check the body carried a reply.
    ///
    /// A body that ends without `[DONE]` and without a single fragment is not
    /// a completion stream.
    pub fn finish(&mut self) -> Vec<Result<String, CompletionError>> {
        let mut out = Vec::new();
        let rest = std::mem::take(&mut self.buf);
        if !rest.is_empty() {
            self.push_line(&rest, &mut out);
        }

        if !self.done && self.fragments == 0 && !self.failed {
            let detail = match self.stray.take() {
                Some(line) => format!("expected event stream, got: {line}"),
                None => "response ended without completion data".to_string(),
            };
            self.failed = true;
            out.push(Err(CompletionError::Malformed(detail)));
        }

        out
    }

    fn push_line(&mut self, raw: &[u8], out: &mut Vec<Result<String, CompletionError>>) {
        if self.done {
            return;
        }
        match self.decode_line(raw) {
            Some(Ok(text)) => {
                self.fragments += 1;
                out.push(Ok(text));
            }
            Some(Err(e)) => {
                self.failed = true;
                out.push(Err(e));
            }
            None => {}
        }
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Result<String, CompletionError>> {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches(['\n', '\r']),
            Err(e) => return Some(Err(CompletionError::Malformed(e.to_string()))),
        };

        let Some(payload) = line.strip_prefix("data:") else {
            self.note_stray(line);
            return None;
        };
        let payload = payload.trim_start();
        if payload == "[DONE]" {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(ChatCompletionChunk {
                error: Some(error), ..
            }) => Some(Err(CompletionError::Service(error.message))),
            Ok(chunk) => {
                let text: String = chunk
                    .choices
                    .into_iter()
                    .filter_map(|c| c.delta.content)
                    .collect();
                if text.is_empty() { None } else { Some(Ok(text)) }
            }
            Err(_) => Some(Err(CompletionError::Malformed(payload.to_string()))),
        }
    }

    /// Remember the first line that is not part of the event-stream grammar.
    fn note_stray(&mut self, line: &str) {
        let trimmed = line.trim();
        let is_sse_field = trimmed.is_empty()
            || trimmed.starts_with(':')
            || ["event:", "id:", "retry:"]
                .iter()
                .any(|field| trimmed.starts_with(field));
        if !is_sse_field && self.stray.is_none() {
            self.stray = Some(trimmed.chars().take(STRAY_PREVIEW_CHARS).collect());
        }
    }
}

/// Client for any provider speaking the OpenAI chat completions protocol.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn stream_reply(&self, system_prompt: &str, messages: &[Message]) -> FragmentStream {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: request_messages(system_prompt, messages),
            stream: true,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(model = %self.model, messages = body.messages.len(), "starting completion stream");

        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);

        let response = async move {
            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                return Err(CompletionError::Status { status, body });
            }
            Ok(response)
        };

        stream::once(response)
            .flat_map(|result| match result {
                Ok(response) => decode_body(response.bytes_stream()),
                Err(e) => stream::iter(vec![Err(e)]).boxed(),
            })
            .boxed()
    }
}

/// Turn a streaming response body into reply fragments. A transport error
/// ends the stream.
fn decode_body<S, B>(bytes: S) -> FragmentStream
where
    S: futures::Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = (bytes.boxed(), SseDecoder::default(), false);
    stream::unfold(state, |(mut bytes, mut decoder, ended)| async move {
        if ended {
            return None;
        }
        let (items, ended) = match bytes.next().await {
            Some(Ok(chunk)) => (decoder.feed(chunk.as_ref()), false),
            Some(Err(e)) => (vec![Err(CompletionError::from(e))], true),
            None => (decoder.finish(), true),
        };
        Some((stream::iter(items), (bytes, decoder, ended)))
    })
    .flatten()
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"index": 0, "delta": {"content": text}}]})
        )
    }

    fn texts(items: Vec<Result<String, CompletionError>>) -> Vec<String> {
        items.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn decodes_fragments_in_order() {
        let mut decoder = SseDecoder::default();
        let body = format!("{}{}data: [DONE]\n\n", chunk("안녕"), chunk("하세요"));
        assert_eq!(texts(decoder.feed(body.as_bytes())), vec!["안녕", "하세요"]);
        assert!(decoder.is_done());
    }

    #[test]
    fn buffers_partial_lines_and_split_characters() {
        let mut decoder = SseDecoder::default();
        let body = chunk("토론");
        let bytes = body.as_bytes();
        // Split inside the first multi-byte character of the payload.
        let split = body.find('토').unwrap() + 1;

        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(texts(decoder.feed(&bytes[split..])), vec!["토론"]);
    }

    #[test]
    fn skips_role_only_and_empty_deltas() {
        let mut decoder = SseDecoder::default();
        let role = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n";
        let empty = "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n";
        let no_choices = "data: {\"choices\":[]}\n\n";
        let out = decoder.feed(format!("{role}{empty}{no_choices}").as_bytes());
        assert!(out.is_empty());
    }

    #[test]
    fn ignores_comments_and_crlf() {
        let mut decoder = SseDecoder::default();
        let body = format!(": keep-alive\r\n{}", chunk("hi").replace('\n', "\r\n"));
        assert_eq!(texts(decoder.feed(body.as_bytes())), vec!["hi"]);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let mut decoder = SseDecoder::default();
        let out = decoder.feed(b"data: {not json}\n");
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(CompletionError::Malformed(_))));
    }

    #[test]
    fn nothing_after_done() {
        let mut decoder = SseDecoder::default();
        let body = format!("data: [DONE]\n\n{}", chunk("late"));
        assert!(decoder.feed(body.as_bytes()).is_empty());
    }

    #[test]
    fn error_event_is_a_service_error() {
        let mut decoder = SseDecoder::default();
        let out = decoder.feed(b"data: {\"error\":{\"message\":\"quota exceeded\"}}\n\n");
        assert_eq!(out.len(), 1);
        match &out[0] {
            Err(CompletionError::Service(message)) => assert_eq!(message, "quota exceeded"),
            other => panic!("expected service error, got {:?}", other),
        }
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn unterminated_final_line_is_flushed() {
        let mut decoder = SseDecoder::default();
        let body = chunk("마지막");
        let body = body.trim_end();
        assert!(decoder.feed(body.as_bytes()).is_empty());
        assert_eq!(texts(decoder.finish()), vec!["마지막"]);
    }

    #[test]
    fn plain_json_body_is_malformed() {
        let mut decoder = SseDecoder::default();
        let body = "{\"id\":\"x\",\"choices\":[{\"message\":{\"content\":\"hi\"}}]}\n";
        assert!(decoder.feed(body.as_bytes()).is_empty());
        let out = decoder.finish();
        assert_eq!(out.len(), 1);
        match &out[0] {
            Err(CompletionError::Malformed(detail)) => assert!(detail.contains("\"id\"")),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn empty_body_without_done_is_malformed() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(b": keep-alive\n\n").is_empty());
        let out = decoder.finish();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(CompletionError::Malformed(_))));
    }

    #[test]
    fn done_without_fragments_is_an_empty_reply() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(b"data: [DONE]\n\n").is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn fragments_without_done_are_kept() {
        let mut decoder = SseDecoder::default();
        assert_eq!(texts(decoder.feed(chunk("cut").as_bytes())), vec!["cut"]);
        assert!(decoder.finish().is_empty());
    }

    async fn collect_body(body: &str) -> Vec<Result<String, CompletionError>> {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(body.as_bytes().to_vec())];
        decode_body(stream::iter(chunks)).collect().await
    }

    #[tokio::test]
    async fn decode_body_fails_on_error_event() {
        let items = collect_body("data: {\"error\":{\"message\":\"quota exceeded\"}}\n\n").await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(CompletionError::Service(_))));
    }

    #[tokio::test]
    async fn decode_body_fails_on_non_event_stream() {
        let items = collect_body("{\"object\":\"chat.completion\"}").await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(CompletionError::Malformed(_))));
    }

    #[tokio::test]
    async fn decode_body_flushes_unterminated_final_line() {
        let body = chunk("끝");
        let items = collect_body(body.trim_end()).await;
        assert_eq!(texts(items), vec!["끝"]);
    }

    #[tokio::test]
    async fn decode_body_streams_across_chunks() {
        let body = format!("{}{}data: [DONE]\n\n", chunk("찬성"), chunk("합니다"));
        let bytes = body.into_bytes();
        let (a, b) = bytes.split_at(7);
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(a.to_vec()), Ok(b.to_vec())];

        let fragments: Vec<String> = decode_body(stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments.concat(), "찬성합니다");
    }

    #[test]
    fn request_serializes_system_first() {
        let body = ChatCompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: request_messages("sys", &[Message::assistant("hello")]),
            stream: true,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = OpenAiClient::new("sk", "m").with_base_url("http://localhost:11434/v1/");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }
}
