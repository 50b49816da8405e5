use std::future::Future;

use super::PipelineError;

/// One typed stage of the workflow: consumes its input artifact, produces
/// the next one. Failure propagates to the pipeline caller; there is no
/// retry at this level.
pub trait Step: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn run(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, PipelineError>> + Send;
}
