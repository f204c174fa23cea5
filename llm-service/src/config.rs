//! Universal model configuration shared by generation and embedding calls.

/// Configuration for a single Ollama model invocation.
///
/// One instance describes one (endpoint, model) pair plus sampling knobs.
/// Generation and embedding typically use two different instances, since
/// embedding models are dedicated.
///
/// # Examples
///
/// ```
/// use llm_service::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "gemma:2b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: Some(350),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(600),
/// };
/// assert_eq!(cfg.model, "gemma:2b");
/// ```
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    /// Model identifier string (e.g., `"gemma:2b"`, `"nomic-embed-text"`).
    pub model: String,

    /// Inference endpoint base URL (e.g., `http://localhost:11434`).
    pub endpoint: String,

    /// Maximum number of tokens to generate (`num_predict`).
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
