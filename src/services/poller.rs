use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;

use crate::error::ProviderError;

/// One observation of a provider-side job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobProbe {
    /// Not terminal yet; keep polling.
    Pending,
    /// Terminal success with the provider's final payload.
    Completed(Value),
    /// Terminal provider-side failure.
    Failed(String),
}

/// Growth of the wait between consecutive status fetches.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    Fixed,
    /// Wait grows by `increment` after each fetch.
    Linear { increment: Duration },
}

/// Injected tracking policy: how often to probe a job and for how long.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
    pub backoff: Backoff,
    /// Random fraction (0.0..1.0) added on top of each wait. Zero disables.
    pub jitter: f64,
}

impl PollPolicy {
    pub fn fixed(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            deadline,
            backoff: Backoff::Fixed,
            jitter: 0.0,
        }
    }

    /// Upper bound on status fetches this policy can issue.
    pub fn max_fetches(&self) -> u32 {
        (self.deadline.as_secs_f64() / self.interval.as_secs_f64()).ceil() as u32
    }

    fn wait_after(&self, fetches_done: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Linear { increment } => self.interval + increment * (fetches_done - 1),
        };
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(0.0..self.jitter);
        base.mul_f64(factor)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            deadline: Duration::from_secs(600),
            backoff: Backoff::Linear {
                increment: Duration::from_millis(500),
            },
            jitter: 0.1,
        }
    }
}

/// Terminal outcome observed by the poll tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Completed(Value),
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("job did not reach a terminal state within {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Poll `fetch` until the job is terminal or the policy's budget is spent.
///
/// Issues at most `policy.max_fetches()` status fetches, never more than one
/// per wait interval. A job still pending when the deadline would pass is
/// abandoned as timed out; no corrective action is taken.
pub async fn track<F, Fut>(policy: &PollPolicy, mut fetch: F) -> Result<TrackOutcome, TrackError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobProbe, ProviderError>>,
{
    let started = tokio::time::Instant::now();
    let mut fetches = 0u32;

    loop {
        fetches += 1;
        match fetch().await? {
            JobProbe::Completed(payload) => return Ok(TrackOutcome::Completed(payload)),
            JobProbe::Failed(message) => return Ok(TrackOutcome::Failed(message)),
            JobProbe::Pending => {}
        }

        let wait = policy.wait_after(fetches);
        if fetches >= policy.max_fetches() || started.elapsed() + wait > policy.deadline {
            return Err(TrackError::TimedOut(policy.deadline));
        }
        tokio::time::sleep(wait).await;
    }
}
