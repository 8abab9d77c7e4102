//! Model invoker - uniform completion calls with retry and trace append

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use domain::{FailureKind, ModelId, ModelResponse};
use tracing::{debug, instrument, warn};

use crate::error::EngineError;
use crate::ports::{GenerationFault, GenerationOptions, GenerationPort};
use crate::trace::TraceRecorder;

/// Uniform interface to request a completion from a named local model
///
/// Every call is stateless from the invoker's perspective; callers thread
/// prior turns into the prompt explicitly. Each terminal outcome - success
/// or failure - is appended to the active run trace.
#[derive(Clone)]
pub struct ModelInvoker {
    port: Arc<dyn GenerationPort>,
}

impl fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInvoker").finish_non_exhaustive()
    }
}

impl ModelInvoker {
    /// Create an invoker over the serving endpoint
    pub fn new(port: Arc<dyn GenerationPort>) -> Self {
        Self { port }
    }

    /// Invoke with endpoint-default options
    pub async fn invoke(
        &self,
        model: &ModelId,
        prompt: &str,
        recorder: &TraceRecorder,
    ) -> Result<ModelResponse, EngineError> {
        self.invoke_with_options(model, prompt, &GenerationOptions::defaults(), recorder)
            .await
    }

    /// Invoke with per-call option overrides
    ///
    /// Exactly one retry on timeout with the same prompt; an unavailable
    /// model surfaces immediately.
    #[instrument(skip(self, prompt, recorder), fields(model = %model, prompt_len = prompt.len()))]
    pub async fn invoke_with_options(
        &self,
        model: &ModelId,
        prompt: &str,
        options: &GenerationOptions,
        recorder: &TraceRecorder,
    ) -> Result<ModelResponse, EngineError> {
        let prompt_hash = blake3::hash(prompt.as_bytes()).to_hex().to_string();
        let start = Instant::now();

        let mut attempt = self.port.generate(model, prompt, options).await;
        if let Err(GenerationFault::Timeout { elapsed_ms }) = &attempt {
            warn!(elapsed_ms, "Model call timed out, retrying once");
            attempt = self.port.generate(model, prompt, options).await;
        }

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match attempt {
            Ok(generation) => {
                debug!(latency_ms, "Model call succeeded");
                let response =
                    ModelResponse::success(model.clone(), prompt_hash, generation.text, latency_ms);
                recorder.record_response(response.clone());
                Ok(response)
            },
            Err(GenerationFault::Timeout { elapsed_ms }) => {
                let response = ModelResponse::failure(
                    model.clone(),
                    prompt_hash,
                    FailureKind::Timeout,
                    format!("timed out after {elapsed_ms}ms (retried once)"),
                    latency_ms,
                );
                recorder.record_response(response);
                Err(EngineError::ModelTimeout {
                    model: model.clone(),
                    elapsed_ms,
                })
            },
            Err(GenerationFault::Unavailable { reason }) => {
                let response = ModelResponse::failure(
                    model.clone(),
                    prompt_hash,
                    FailureKind::Unavailable,
                    reason.clone(),
                    latency_ms,
                );
                recorder.record_response(response);
                Err(EngineError::ModelUnavailable {
                    model: model.clone(),
                    reason,
                })
            },
        }
    }
}
