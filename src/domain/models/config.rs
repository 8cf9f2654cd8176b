use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for healmap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Extracted text of the reference document
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,

    /// Where the index snapshot is persisted
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generative model configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Optional prompt template overrides
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_document_path() -> PathBuf {
    PathBuf::from(".healmap/document/healing_map.txt")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
            snapshot: SnapshotConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            templates: TemplatesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Snapshot file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotConfig {
    /// Embeddings-and-passages snapshot file
    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: PathBuf,

    /// Vector index file
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

fn default_embeddings_path() -> PathBuf {
    PathBuf::from(".healmap/vector_db/embeddings.json")
}

fn default_index_path() -> PathBuf {
    PathBuf::from(".healmap/vector_db/index.hmix")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            embeddings_path: default_embeddings_path(),
            index_path: default_index_path(),
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChunkingConfig {
    /// Whitespace tokens per passage
    #[serde(default = "default_max_len")]
    pub max_len: usize,
}

const fn default_max_len() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Passages retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

const fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

/// Embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// In-process hashed bag-of-words model
    Local,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimensionality produced by the model
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum texts per request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

const fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::OpenAi
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

const fn default_max_batch_size() -> usize {
    2048
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            base_url: default_openai_base_url(),
            api_key: None,
            timeout_secs: default_embedding_timeout_secs(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Generative model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// OpenAI-compatible `/chat/completions` endpoint
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    #[serde(default = "default_generation_backend")]
    pub backend: GenerationBackend,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature in [0, 1]
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Backend default when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Falls back to `OPENAI_API_KEY` or `ANTHROPIC_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_generation_backend() -> GenerationBackend {
    GenerationBackend::OpenAi
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_temperature() -> f32 {
    0.3
}

const fn default_generation_timeout_secs() -> u64 {
    120
}

const fn default_max_tokens() -> u32 {
    4096
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_generation_backend(),
            model: default_generation_model(),
            temperature: default_temperature(),
            base_url: None,
            api_key: None,
            timeout_secs: default_generation_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Paths of template files replacing the built-in prompts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TemplatesConfig {
    #[serde(default)]
    pub plan: Option<PathBuf>,

    #[serde(default)]
    pub overview: Option<PathBuf>,

    #[serde(default)]
    pub analysis: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
