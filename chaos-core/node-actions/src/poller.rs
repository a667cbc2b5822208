//! 有界轮询
//!
//! 所有状态确认（实例状态、节点 Unknown、节点移除）共用同一个原语：
//! 立即采样一次，未命中则等待一个间隔后再采样，直到命中目标、累计等待
//! 超过超时或收到取消信号。
//!
//! 超时只计算等待间隔，不计算采样本身的耗时，因此实际耗时可能比
//! `timeout` 长出所有采样调用的累计延迟。

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 采样间隔下限；更小的间隔（包括 0）按此值处理
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// 轮询策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// 首次等待间隔
    pub interval: Duration,
    /// 累计等待上限
    pub timeout: Duration,
    /// 间隔增长倍数，1.0 表示固定间隔
    pub backoff_multiplier: f64,
    /// 间隔上限
    pub max_interval: Duration,
}

impl PollPolicy {
    /// 固定 1 秒间隔
    pub fn fixed(timeout: Duration) -> Self {
        Self::with_interval(timeout, Duration::from_secs(1))
    }

    /// 固定间隔
    pub fn with_interval(timeout: Duration, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            interval,
            timeout,
            backoff_multiplier: 1.0,
            max_interval: interval,
        }
    }

    /// 启用指数退避
    pub fn backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self.max_interval = max_interval.max(self.interval);
        self
    }

    /// 替换超时
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn next_interval(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.backoff_multiplier)
            .min(self.max_interval)
            .max(MIN_INTERVAL)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(30))
    }
}

/// 轮询结果
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// 命中目标
    Reached { value: T, samples: u32 },
    /// 超时，携带最后一次采样值
    TimedOut { last: T, samples: u32 },
    /// 等待期间收到取消信号
    Cancelled { last: T, samples: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_reached(&self) -> bool {
        matches!(self, PollOutcome::Reached { .. })
    }

    pub fn samples(&self) -> u32 {
        match self {
            PollOutcome::Reached { samples, .. }
            | PollOutcome::TimedOut { samples, .. }
            | PollOutcome::Cancelled { samples, .. } => *samples,
        }
    }

    /// 最后一次采样值
    pub fn value(&self) -> &T {
        match self {
            PollOutcome::Reached { value, .. } => value,
            PollOutcome::TimedOut { last, .. } | PollOutcome::Cancelled { last, .. } => last,
        }
    }
}

/// 轮询直到 `is_target` 命中
///
/// 至少采样一次；固定间隔 `i`、超时 `t` 时最多采样 `t / i + 1` 次，
/// `i` 不小于 [`MIN_INTERVAL`]。
/// 采样函数返回的错误立即向上传播，不会被重试。
pub async fn poll_until<T, E, F, Fut, P>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut sample: F,
    is_target: P,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let mut elapsed = Duration::ZERO;
    let mut interval = policy.interval.max(MIN_INTERVAL);
    let mut samples = 0u32;

    loop {
        let value = sample().await?;
        samples += 1;

        if is_target(&value) {
            debug!("第 {} 次采样命中目标", samples);
            return Ok(PollOutcome::Reached { value, samples });
        }

        if elapsed + interval > policy.timeout {
            debug!("轮询超时: {} 次采样, 累计等待 {:?}", samples, elapsed);
            return Ok(PollOutcome::TimedOut { last: value, samples });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(PollOutcome::Cancelled { last: value, samples });
            }
            _ = tokio::time::sleep(interval) => {}
        }

        elapsed += interval;
        interval = policy.next_interval(interval);
    }
}

/// 可取消的等待，返回 `false` 表示被取消
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
