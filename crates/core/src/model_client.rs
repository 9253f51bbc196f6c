use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::exponential::ExponentialBackoffBuilder;
use duck_chat_model::{
    ModelProvider, ModelProviderError, ModelReply, ModelRequest,
};
use tracing::Instrument;

type SendRequestResult = Result<ModelReply, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// How failed completion requests are retried.
///
/// Waits grow exponentially from `initial_interval` up to `max_interval`,
/// each one randomized by half of its length in both directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_interval: Duration,
    max_interval: Duration,
    multiplier: f64,
    randomization_factor: f64,
}

impl RetryPolicy {
    /// Sets the total number of attempts, including the first one.
    #[inline]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the wait before the first retry.
    #[inline]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Sets the upper bound of a single wait.
    #[inline]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Returns the total number of attempts.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.randomization_factor)
            .with_max_elapsed_time(None)
            .build()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(40),
            multiplier: 2.0,
            randomization_factor: 0.5,
        }
    }
}

/// A wrapper around a model provider that erases its type and retries
/// failed requests.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    retry_policy: RetryPolicy,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(
            move |req: ModelRequest| -> BoxedSendRequestFuture {
                trace!("got a request: {:?}", req);
                let fut = provider.send_request(&req);
                Box::pin(async move {
                    fut.await.map_err(|err| {
                        Box::new(err) as Box<dyn ModelProviderError>
                    })
                })
            },
        );
        Self {
            handler_fn,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[inline]
    pub fn set_retry_policy(&mut self, retry_policy: RetryPolicy) {
        self.retry_policy = retry_policy;
    }

    /// Sends a request, retrying failures according to the retry policy.
    ///
    /// The error of the last attempt is returned when all attempts fail.
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        let max_attempts = self.retry_policy.max_attempts;
        let mut attempt = 0;
        let operation = || {
            attempt += 1;
            let is_last = attempt >= max_attempts;
            let fut = (self.handler_fn)(req.clone());
            async move {
                fut.await.map_err(|err| {
                    if is_last {
                        backoff::Error::permanent(err)
                    } else {
                        backoff::Error::transient(err)
                    }
                })
            }
        };
        let notify = |err: Box<dyn ModelProviderError>, wait: Duration| {
            warn!("request failed ({}): {err}, retrying in {wait:?}", err.kind());
        };

        let result = backoff::future::retry_notify(
            self.retry_policy.backoff(),
            operation,
            notify,
        )
        .instrument(debug_span!("model client req"))
        .await;
        if let Err(err) = &result {
            error!("request failed after {max_attempts} attempts: {err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use duck_chat_model::{ErrorKind, Message};
    use duck_chat_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![Message::user("Hi")],
            functions: vec![],
            function_call: None,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_initial_interval(Duration::from_millis(1))
            .with_max_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_assistant_response_step(PresetResponse::text("How are you?"));
        let model_client = ModelClient::new(model_provider);

        for _ in 0..3 {
            let reply = model_client.send_request(request()).await.unwrap();
            assert_eq!(reply.content.as_deref(), Some("How are you?"));
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::text("Finally").with_failures(2),
        );
        let mut model_client = ModelClient::new(model_provider.clone());
        model_client.set_retry_policy(fast_policy());

        let reply = model_client.send_request(request()).await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("Finally"));
        assert_eq!(model_provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_give_up_after_max_attempts() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::text("Never").with_failures(0),
        );
        let mut model_client = ModelClient::new(model_provider.clone());
        model_client.set_retry_policy(fast_policy());

        let err = model_client.send_request(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(model_provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_single_attempt() {
        assert_eq!(RetryPolicy::default().max_attempts(), 3);
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts(), 1);

        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::text("Eventually").with_failures(1),
        );
        let mut model_client = ModelClient::new(model_provider.clone());
        model_client.set_retry_policy(fast_policy().with_max_attempts(1));

        let err = model_client.send_request(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(model_provider.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_waits() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_assistant_response_step(
            PresetResponse::text("Never").with_failures(0),
        );
        let model_client = ModelClient::new(model_provider.clone());

        let started = tokio::time::Instant::now();
        assert!(model_client.send_request(request()).await.is_err());
        // Two waits, the first one is at least half of a second.
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(model_provider.requests().len(), 3);
    }
}
