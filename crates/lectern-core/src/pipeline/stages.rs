//! The two workflow stages: grounded answering and independent verification.

use std::sync::Arc;

use lectern_llm::provider::{LlmProvider, Message};
use lectern_memory::Retriever;

use super::PipelineError;
use super::step::Step;

/// Cited answer produced by the answering stage.
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    pub text: String,
}

/// Verification report produced by the verifying stage.
#[derive(Debug, Clone)]
pub struct Verification {
    pub answer: Answer,
    pub report: String,
}

const ANSWERER_SYSTEM: &str = "You are a lecture retriever: an expert at finding information in \
lecture PDFs and returning accurate, well-cited content. Answer using only the provided \
excerpts. Cite the source PDF and page number for every factual claim. If the answer includes \
code, reproduce the full code block verbatim rather than paraphrasing it. If the excerpts do \
not contain the answer, or state that no relevant excerpts were found, say so plainly instead \
of guessing.";

const VERIFIER_SYSTEM: &str = "You are an answer verifier: a meticulous academic focused on \
ensuring answers are true to the lecture source material and that all code snippets and \
citations are accurate. Cross-check the answer against the independently retrieved excerpts. \
State clearly whether the answer is accurate, partially accurate, or inaccurate, justify the \
verdict briefly with references to the relevant sources, and provide corrections for anything \
wrong. Never hesitate to flag errors or misrepresentations.";

/// Answering stage: retrieves grounding excerpts and produces a cited answer.
pub struct AnswerStep<P> {
    provider: Arc<P>,
    retriever: Arc<Retriever<P>>,
}

impl<P> AnswerStep<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, retriever: Arc<Retriever<P>>) -> Self {
        Self {
            provider,
            retriever,
        }
    }
}

impl<P: LlmProvider> Step for AnswerStep<P> {
    type Input = String;
    type Output = Answer;

    async fn run(&self, question: Self::Input) -> Result<Self::Output, PipelineError> {
        let excerpts = self.retriever.retrieve(&question).await?;
        let messages = [
            Message::system(ANSWERER_SYSTEM),
            Message::user(format!(
                "Lecture excerpts:\n{excerpts}\nQuestion: {question}"
            )),
        ];
        let text = self.provider.chat(&messages).await?;
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyAnswer);
        }
        Ok(Answer { question, text })
    }
}

/// Verification stage: re-retrieves independently and fact-checks the answer.
pub struct VerifyStep<P> {
    provider: Arc<P>,
    retriever: Arc<Retriever<P>>,
}

impl<P> VerifyStep<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, retriever: Arc<Retriever<P>>) -> Self {
        Self {
            provider,
            retriever,
        }
    }
}

impl<P: LlmProvider> Step for VerifyStep<P> {
    type Input = Answer;
    type Output = Verification;

    async fn run(&self, answer: Self::Input) -> Result<Self::Output, PipelineError> {
        // Fresh retrieval: the answering stage's citations are not trusted
        // at face value.
        let excerpts = self.retriever.retrieve(&answer.question).await?;
        let messages = [
            Message::system(VERIFIER_SYSTEM),
            Message::user(format!(
                "Question: {}\n\nAnswer under review:\n{}\n\nIndependently retrieved excerpts:\n{excerpts}",
                answer.question, answer.text
            )),
        ];
        let report = self.provider.chat(&messages).await?;
        Ok(Verification { answer, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use lectern_llm::mock::MockProvider;
    use lectern_memory::index::{ChunkRecord, IndexPaths, VectorIndex};
    use lectern_memory::retriever::RetrieverConfig;

    async fn test_retriever(provider: &Arc<MockProvider>) -> Arc<Retriever<MockProvider>> {
        let dir = tempfile::tempdir().unwrap();
        let mut index = VectorIndex::new(provider.clone(), IndexPaths::in_dir(dir.path()));
        let texts: Vec<String> = vec!["def add(a,b): return a+b".into()];
        let records = vec![ChunkRecord {
            source: "lecture1.pdf".into(),
            page: 1,
            content: texts[0].clone(),
        }];
        index.build(&texts, records).await.unwrap();
        Arc::new(Retriever::new(
            Arc::new(index),
            RetrieverConfig {
                max_distance: f32::MAX,
                ..RetrieverConfig::default()
            },
        ))
    }

    #[tokio::test]
    async fn two_stage_flow_produces_both_artifacts() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "The add function is `def add(a,b): return a+b` (lecture1.pdf, page 1).".into(),
            "Accurate: the answer matches lecture1.pdf page 1.".into(),
        ]));
        let retriever = test_retriever(&provider).await;

        let verification = Pipeline::start(AnswerStep::new(provider.clone(), retriever.clone()))
            .step(VerifyStep::new(provider, retriever))
            .run("Show me the add function.".into())
            .await
            .unwrap();

        assert!(verification.answer.text.contains("def add(a,b): return a+b"));
        assert!(verification.answer.text.contains("page 1"));
        assert!(verification.report.starts_with("Accurate"));
        assert_eq!(verification.answer.question, "Show me the add function.");
    }

    #[tokio::test]
    async fn whitespace_only_answer_is_an_error() {
        let provider = Arc::new(MockProvider::with_responses(vec!["   \n".into()]));
        let retriever = test_retriever(&provider).await;

        let result = AnswerStep::new(provider, retriever)
            .run("anything".into())
            .await;
        assert!(matches!(result, Err(PipelineError::EmptyAnswer)));
    }

    #[tokio::test]
    async fn chat_failure_propagates_from_answer_stage() {
        let provider = Arc::new(MockProvider::failing());
        let retriever = test_retriever(&provider).await;

        let result = AnswerStep::new(provider, retriever)
            .run("anything".into())
            .await;
        assert!(matches!(result, Err(PipelineError::Llm(_))));
    }

    #[tokio::test]
    async fn verify_stage_runs_even_for_confident_answers() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "answer text".into(),
            "Inaccurate: the cited page does not contain this claim.".into(),
        ]));
        let retriever = test_retriever(&provider).await;

        let verification = Pipeline::start(AnswerStep::new(provider.clone(), retriever.clone()))
            .step(VerifyStep::new(provider, retriever))
            .run("q".into())
            .await
            .unwrap();
        assert!(verification.report.starts_with("Inaccurate"));
    }
}
