//! Rate-limited diagnostic logging.
//!
//! Grounded on `VLOG_RATE_LIMIT_INIT(1, 5)` / `VLOG_WARN_RL` in
//! `ofp-actions.c`: a switch parsing actions from an untrusted controller
//! (or vice versa) must not let a flood of malformed input spam its log.
//! This is a minimal token-bucket over [`log::warn!`]: one line per
//! window, with the number of suppressed messages folded into the next
//! line that does get through.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A rate limiter that allows at most one log line per `window`, folding
/// the count of suppressed calls into the next line that is emitted.
pub struct RateLimiter {
    window: Duration,
    state: Mutex<State>,
}

struct State {
    last: Option<Instant>,
    suppressed: u64,
}

impl RateLimiter {
    /// Create a rate limiter allowing one message per `window`.
    pub const fn new(window: Duration) -> Self {
        RateLimiter {
            window,
            state: Mutex::new(State {
                last: None,
                suppressed: 0,
            }),
        }
    }

    /// Log `message` at `warn` level, unless within the rate-limit window
    /// of the previous log line, in which case the call is counted and
    /// silently dropped.
    pub fn warn(&self, message: &str) {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        let should_log = match state.last {
            Some(last) => now.duration_since(last) >= self.window,
            None => true,
        };
        if should_log {
            if state.suppressed > 0 {
                log::warn!("{} ({} similar messages suppressed)", message, state.suppressed);
            } else {
                log::warn!("{}", message);
            }
            state.last = Some(now);
            state.suppressed = 0;
        } else {
            state.suppressed += 1;
        }
    }
}

/// The diagnostic sink used throughout the codec, mirroring `rl` /
/// `static struct vlog_rate_limit rl` at each OVS call site: one line per
/// five seconds.
pub static RL: RateLimiter = RateLimiter::new(Duration::from_secs(5));

/// Emit a rate-limited warning including a byte offset.
pub fn warn_at(offset: usize, message: &str) {
    RL.warn(&format!("{} at offset {}", message, offset));
}
