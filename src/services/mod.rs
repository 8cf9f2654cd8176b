pub mod index_service;
pub mod pipeline;
pub mod prompt_assembler;
pub mod retriever;
pub mod templates;

pub use index_service::{IndexOrigin, IndexRegistry, IndexService, LoadedIndex};
pub use pipeline::{HealmapPipeline, PipelineSettings};
pub use prompt_assembler::assemble;
pub use retriever::Retriever;
pub use templates::{Intent, PromptTemplates};
