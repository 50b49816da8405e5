pub mod builder;
pub mod stages;
pub mod step;

pub use builder::Pipeline;
pub use stages::{Answer, AnswerStep, Verification, VerifyStep};
pub use step::Step;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Llm(#[from] lectern_llm::LlmError),

    #[error(transparent)]
    Memory(#[from] lectern_memory::MemoryError),

    #[error("answering stage produced no output")]
    EmptyAnswer,

    #[error("{0}")]
    Custom(String),
}
