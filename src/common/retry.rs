// src/common/retry.rs

use std::{future::Future, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Mesmo intervalo entre todas as tentativas.
    Fixed,
    /// Intervalo cresce linearmente: delay, 2*delay, 3*delay...
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// O erro não era retentável; paramos na hora.
    Aborted(E),
    /// Todas as tentativas falharam. `last` é o erro da última.
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Aborted(e) => e,
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

impl RetryPolicy {
    pub const fn fixed(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay, backoff: Backoff::Fixed }
    }

    pub const fn linear(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay, backoff: Backoff::Linear }
    }

    /// Espera depois da tentativa `attempt` (começando em 1) ter falhado.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Linear => self.delay.saturating_mul(attempt),
        }
    }

    pub async fn run<T, E, F, Fut, R>(
        &self,
        label: &str,
        mut operation: F,
        is_retryable: R,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_retryable(&err) => return Err(RetryError::Aborted(err)),
                Err(err) if attempt >= attempts => {
                    tracing::warn!(%label, attempt, error = %err, "tentativas esgotadas");
                    return Err(RetryError::Exhausted { attempts, last: err });
                }
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    tracing::info!(
                        %label,
                        attempt,
                        error = %err,
                        "tentativa falhou, nova tentativa em {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
