use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::stateless_llm::{GenerationRequest, StatelessLLMInterface};
use crate::config::RetryConfig;
use crate::error::{DispatchError, ServiceError};

/// Temperatures outside this range are forwarded but logged.
const TYPICAL_TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Source of backoff waits. Production uses the tokio timer; tests record
/// the requested durations instead of sleeping.
#[async_trait]
pub trait BackoffClock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl BackoffClock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded exponential backoff applied to rate-limit rejections only.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Wait after the rate-limited attempt with zero-based `attempt_index`.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            timeout: None,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Sends one request to the text-generation service, retrying only on
/// rate limits.
pub struct RequestDispatcher {
    llm: Arc<dyn StatelessLLMInterface>,
    policy: RetryPolicy,
    clock: Arc<dyn BackoffClock>,
}

impl RequestDispatcher {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>, policy: RetryPolicy) -> Self {
        Self::with_clock(llm, policy, Arc::new(TokioClock))
    }

    pub fn with_clock(
        llm: Arc<dyn StatelessLLMInterface>,
        policy: RetryPolicy,
        clock: Arc<dyn BackoffClock>,
    ) -> Self {
        Self { llm, policy, clock }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Raw response text, or the reason the caller should fall back.
    pub async fn dispatch(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, DispatchError> {
        if !TYPICAL_TEMPERATURE_RANGE.contains(&request.temperature) {
            warn!(
                "Temperature {} is outside {:?}; forwarding unchanged",
                request.temperature, TYPICAL_TEMPERATURE_RANGE
            );
        }

        match self.policy.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_attempts(request, cancel))
                .await
                .unwrap_or(Err(DispatchError::TimedOut(limit))),
            None => self.run_attempts(request, cancel).await,
        }
    }

    async fn run_attempts(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, DispatchError> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
                result = self.llm.chat_completion(request) => result,
            };

            match result {
                Ok(text) => {
                    if attempt > 0 {
                        info!("LLM recovered after {} rate-limited attempts", attempt);
                    }
                    return Ok(text);
                }
                Err(ServiceError::RateLimited) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Rate limit exceeded (attempt {}/{}). Waiting {:?}",
                        attempt + 1,
                        max_attempts,
                        delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
                        _ = self.clock.sleep(delay) => {}
                    }
                }
                Err(e) => {
                    warn!("LLM request failed without retry: {}", e);
                    return Err(DispatchError::Service(e));
                }
            }
        }

        debug!("Giving up after {} rate-limited attempts", max_attempts);
        Err(DispatchError::RateLimitExhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Records requested waits and returns immediately.
    #[derive(Default)]
    pub(crate) struct RecordingClock {
        pub waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl BackoffClock for RecordingClock {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    pub(crate) type Step = fn() -> Result<String, ServiceError>;

    /// Replays scripted results; repeats the last one once exhausted.
    pub(crate) struct ScriptedLLM {
        script: Mutex<VecDeque<Step>>,
        last: Step,
        pub calls: AtomicU32,
    }

    impl ScriptedLLM {
        pub(crate) fn new(script: Vec<Step>) -> Self {
            let last = *script.last().expect("script must not be empty");
            Self {
                script: Mutex::new(script.into()),
                last,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl StatelessLLMInterface for ScriptedLLM {
        async fn chat_completion(&self, _request: &GenerationRequest) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front().unwrap_or(self.last);
            next()
        }
    }

    /// Never answers; used to exercise cancellation and timeouts.
    pub(crate) struct HangingLLM;

    #[async_trait]
    impl StatelessLLMInterface for HangingLLM {
        async fn chat_completion(&self, _request: &GenerationRequest) -> Result<String, ServiceError> {
            std::future::pending().await
        }
    }

    pub(crate) fn rate_limited() -> Result<String, ServiceError> {
        Err(ServiceError::RateLimited)
    }

    fn server_error() -> Result<String, ServiceError> {
        Err(ServiceError::Status {
            status: 500,
            body: "boom".to_string(),
        })
    }

    fn ok_chair() -> Result<String, ServiceError> {
        Ok("{\"object\":\"chair\"}".to_string())
    }

    fn request(temperature: f32) -> GenerationRequest {
        GenerationRequest {
            system_instruction: "sys".to_string(),
            task_instruction: "task".to_string(),
            temperature,
            max_output_tokens: 500,
        }
    }

    fn dispatcher(llm: Arc<ScriptedLLM>, clock: Arc<RecordingClock>) -> RequestDispatcher {
        RequestDispatcher::with_clock(llm, RetryPolicy::default(), clock)
    }

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..5).map(|i| policy.delay_for(i).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn policy_from_config_never_drops_below_one_attempt() {
        let config = RetryConfig {
            max_attempts: 0,
            base_delay_ms: 250,
            timeout_secs: Some(3),
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.timeout, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn persistent_rate_limit_uses_five_attempts_and_doubling_waits() {
        let llm = Arc::new(ScriptedLLM::new(vec![rate_limited as Step]));
        let clock = Arc::new(RecordingClock::default());
        let err = dispatcher(llm.clone(), clock.clone())
            .dispatch(&request(0.7), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::RateLimitExhausted { attempts: 5 }));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 5);
        let waits: Vec<u64> = clock.waits.lock().unwrap().iter().map(|d| d.as_secs()).collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 16]);
    }

    #[tokio::test]
    async fn recovers_after_rate_limit() {
        let llm = Arc::new(ScriptedLLM::new(vec![rate_limited as Step, rate_limited, ok_chair]));
        let clock = Arc::new(RecordingClock::default());
        let text = dispatcher(llm.clone(), clock.clone())
            .dispatch(&request(0.7), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "{\"object\":\"chair\"}");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.waits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let llm = Arc::new(ScriptedLLM::new(vec![server_error as Step, ok_chair]));
        let clock = Arc::new(RecordingClock::default());
        let err = dispatcher(llm.clone(), clock.clone())
            .dispatch(&request(0.7), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Service(ServiceError::Status { status: 500, .. })));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(clock.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_temperature_is_forwarded() {
        let llm = Arc::new(ScriptedLLM::new(vec![ok_chair as Step]));
        let clock = Arc::new(RecordingClock::default());
        let result = dispatcher(llm, clock)
            .dispatch(&request(3.5), &CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_calling() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let dispatcher = RequestDispatcher::with_clock(
            Arc::new(HangingLLM),
            RetryPolicy::default(),
            Arc::new(RecordingClock::default()),
        );
        let err = dispatcher.dispatch(&request(0.7), &cancel).await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff_wait() {
        let cancel = CancellationToken::new();
        let dispatcher = RequestDispatcher::new(
            Arc::new(ScriptedLLM::new(vec![rate_limited as Step])),
            RetryPolicy {
                max_attempts: 5,
                base_delay: Duration::from_secs(3600),
                timeout: None,
            },
        );

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = dispatcher.dispatch(&request(0.7), &cancel).await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }

    #[tokio::test]
    async fn overall_timeout_bounds_the_dispatch() {
        let dispatcher = RequestDispatcher::with_clock(
            Arc::new(HangingLLM),
            RetryPolicy {
                max_attempts: 5,
                base_delay: Duration::from_secs(1),
                timeout: Some(Duration::from_millis(30)),
            },
            Arc::new(RecordingClock::default()),
        );
        let err = dispatcher
            .dispatch(&request(0.7), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::TimedOut(_)));
    }
}
