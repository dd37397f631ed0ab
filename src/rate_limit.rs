use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Per-user AI generation limiter using a sliding window: at most `limit`
/// generations in any `window`-long span.
pub struct GenerationRateLimiter {
    /// user_id -> timestamps of admitted generations, oldest first
    entries: DashMap<Uuid, VecDeque<Instant>>,
    limit: u32,
    window: Duration,
}

impl GenerationRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window,
        }
    }

    /// Count one generation for `user_id`. Returns Err with retry-after seconds.
    pub fn check(&self, user_id: Uuid) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self.entries.entry(user_id).or_insert_with(VecDeque::new);
        let hits = entry.value_mut();
        prune(hits, now, self.window);

        if hits.len() >= self.limit as usize {
            let oldest = hits.front().copied().unwrap_or(now);
            let remaining = self.window.saturating_sub(now.duration_since(oldest));
            return Err(remaining.as_secs_f64().ceil().max(1.0) as u64);
        }

        hits.push_back(now);
        Ok(())
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries.retain(|_, hits| {
            prune(hits, now, window);
            !hits.is_empty()
        });
    }
}

fn prune(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while hits
        .front()
        .is_some_and(|hit| now.duration_since(*hit) >= window)
    {
        hits.pop_front();
    }
}

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const LOGIN_MAX_FAILURES: u32 = 5;

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 5 failures per 15 minutes. Does NOT increment the counter; call
    /// `record_failure()` on an invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > LOGIN_WINDOW {
            return Ok(());
        }

        if *count >= LOGIN_MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(LOGIN_WINDOW.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > LOGIN_WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn clear(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_limit_is_per_user() {
        let limiter = GenerationRateLimiter::new(2, Duration::from_secs(60));
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();

        assert!(limiter.check(alice).is_ok());
        assert!(limiter.check(alice).is_ok());
        let retry_after = limiter.check(alice).unwrap_err();
        assert!(retry_after <= 60);

        assert!(limiter.check(bob).is_ok());
    }

    #[test]
    fn generation_window_resets() {
        let limiter = GenerationRateLimiter::new(1, Duration::from_millis(10));
        let user = Uuid::now_v7();
        assert!(limiter.check(user).is_ok());
        assert_eq!(limiter.check(user), Err(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check(user).is_ok());
    }

    #[test]
    fn generation_window_slides_across_boundaries() {
        let limiter = GenerationRateLimiter::new(2, Duration::from_millis(200));
        let user = Uuid::now_v7();

        assert!(limiter.check(user).is_ok());
        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.check(user).is_ok());
        assert!(limiter.check(user).is_err());

        // the first hit has aged out, the second still counts
        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.check(user).is_ok());
        assert!(limiter.check(user).is_err());
    }

    #[test]
    fn cleanup_drops_idle_users() {
        let limiter = GenerationRateLimiter::new(1, Duration::from_millis(10));
        limiter.check(Uuid::now_v7()).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        limiter.cleanup();
        assert!(limiter.entries.is_empty());
    }

    #[test]
    fn login_blocks_after_five_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..LOGIN_MAX_FAILURES {
            assert!(limiter.check("User@Example.com").is_ok());
            limiter.record_failure("user@example.com");
        }
        assert!(limiter.check("USER@example.com").is_err());

        limiter.clear("user@example.com");
        assert!(limiter.check("user@example.com").is_ok());
    }
}
