//! Interactive question loop driving the answer/verify pipeline.

use std::io::Write;
use std::sync::Arc;

use lectern_llm::LlmProvider;
use lectern_memory::Retriever;

use crate::pipeline::{AnswerStep, Pipeline, PipelineError, Verification, VerifyStep};

pub struct Session<P> {
    provider: Arc<P>,
    retriever: Arc<Retriever<P>>,
}

impl<P: LlmProvider> Session<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, retriever: Arc<Retriever<P>>) -> Self {
        Self {
            provider,
            retriever,
        }
    }

    /// Run the two-stage pipeline for a single question.
    ///
    /// # Errors
    ///
    /// Returns an error if either stage fails; the caller decides whether
    /// the session continues.
    pub async fn ask(&self, question: &str) -> Result<Verification, PipelineError> {
        Pipeline::start(AnswerStep::new(
            self.provider.clone(),
            self.retriever.clone(),
        ))
        .step(VerifyStep::new(
            self.provider.clone(),
            self.retriever.clone(),
        ))
        .run(question.to_owned())
        .await
    }

    /// Read questions from stdin until EOF or an exit command.
    ///
    /// A failed question is reported and the loop keeps accepting input;
    /// only I/O failures on stdin/stdout end the session with an error.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin or stdout becomes unusable.
    pub async fn run(&self) -> std::io::Result<()> {
        loop {
            print!("Q: ");
            std::io::stdout().flush()?;

            let Some(line) = read_stdin_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                break;
            }

            match self.ask(question).await {
                Ok(verification) => print_verification(&verification),
                Err(e) => {
                    tracing::error!("pipeline failed: {e}");
                    println!("Could not answer this question: {e}");
                }
            }
        }
        Ok(())
    }
}

async fn read_stdin_line() -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        let n = std::io::stdin().read_line(&mut buf)?;
        Ok(if n == 0 { None } else { Some(buf) })
    })
    .await
    .map_err(std::io::Error::other)?
}

fn print_verification(verification: &Verification) {
    println!("\nAnswer:\n{}", verification.answer.text);
    if verification.report.trim().is_empty() {
        println!("\nVerification Report: no verification output was produced.");
    } else {
        println!("\nVerification Report:\n{}", verification.report);
    }
}
