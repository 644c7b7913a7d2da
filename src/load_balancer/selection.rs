//! Random-eligible selection strategy.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::load_balancer::{backend::Upstream, CandidateList, SelectionPolicy};
use crate::observability::metrics;

/// Shuffles every eligible upstream.
///
/// An upstream is eligible when healthy, or when it has been unhealthy for
/// longer than `retry_interval`. If nothing is eligible, the whole pool is
/// shuffled instead: trying a known-bad upstream beats refusing all traffic.
#[derive(Debug, Clone)]
pub struct RandomEligible {
    retry_interval: Duration,
}

impl RandomEligible {
    pub fn new(retry_interval: Duration) -> Self {
        Self { retry_interval }
    }

    /// Same as [`SelectionPolicy::candidates`] with a caller-provided RNG.
    pub fn candidates_with<R: Rng + ?Sized>(
        &self,
        upstreams: &[Arc<Upstream>],
        now: Instant,
        rng: &mut R,
    ) -> CandidateList {
        let mut eligible: Vec<Arc<Upstream>> = upstreams
            .iter()
            .filter(|u| u.is_eligible(now, self.retry_interval))
            .cloned()
            .collect();

        if !eligible.is_empty() {
            eligible.shuffle(rng);
            return CandidateList::new(eligible, false);
        }

        let mut all = upstreams.to_vec();
        all.shuffle(rng);
        if !all.is_empty() {
            tracing::error!(
                severity = "critical",
                upstreams = all.len(),
                "No eligible upstreams; trying every upstream as a last resort"
            );
            metrics::record_fallback();
        }
        CandidateList::new(all, true)
    }
}

impl SelectionPolicy for RandomEligible {
    fn candidates(&self, upstreams: &[Arc<Upstream>], now: Instant) -> CandidateList {
        self.candidates_with(upstreams, now, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use url::Url;

    const RETRY: Duration = Duration::from_secs(30);

    fn pool(n: usize) -> Vec<Arc<Upstream>> {
        (0..n)
            .map(|i| {
                let addr = format!("http://127.0.0.1:{}", 5001 + i);
                Arc::new(Upstream::new(addr.clone(), Url::parse(&addr).unwrap()))
            })
            .collect()
    }

    fn addresses(list: &CandidateList) -> HashSet<String> {
        list.iter().map(|u| u.address().to_string()).collect()
    }

    #[test]
    fn test_all_healthy_are_candidates() {
        let upstreams = pool(3);
        let list = RandomEligible::new(RETRY).candidates(&upstreams, Instant::now());
        assert!(!list.is_fallback());
        assert_eq!(list.len(), 3);
        assert_eq!(addresses(&list).len(), 3);
    }

    #[test]
    fn test_recently_failed_is_skipped() {
        let upstreams = pool(2);
        let t0 = Instant::now();
        upstreams[0].mark_unhealthy(t0);

        let list = RandomEligible::new(RETRY).candidates(&upstreams, t0 + Duration::from_secs(5));
        assert!(!list.is_fallback());
        assert_eq!(list.addresses(), vec!["http://127.0.0.1:5002"]);
    }

    #[test]
    fn test_retry_window_reopens_after_interval() {
        let upstreams = pool(2);
        let t0 = Instant::now();
        upstreams[0].mark_unhealthy(t0);

        let policy = RandomEligible::new(RETRY);
        let at_boundary = policy.candidates(&upstreams, t0 + RETRY);
        assert_eq!(at_boundary.len(), 1);

        let after = policy.candidates(&upstreams, t0 + Duration::from_secs(31));
        assert_eq!(after.len(), 2);
        assert!(addresses(&after).contains("http://127.0.0.1:5001"));
    }

    // Deliberate "try anyway" behaviour: an all-down pool still yields every upstream.
    #[test]
    fn test_falls_back_to_full_pool_when_nothing_eligible() {
        let upstreams = pool(2);
        let t0 = Instant::now();
        for u in &upstreams {
            u.mark_unhealthy(t0);
        }

        let list = RandomEligible::new(RETRY).candidates(&upstreams, t0 + Duration::from_secs(1));
        assert!(list.is_fallback());
        assert_eq!(addresses(&list), addresses(&CandidateList::new(upstreams.clone(), true)));
    }

    #[test]
    fn test_order_is_shuffled() {
        let upstreams = pool(5);
        let policy = RandomEligible::new(RETRY);
        let mut rng = StdRng::seed_from_u64(7);

        let orders: HashSet<Vec<String>> = (0..50)
            .map(|_| policy.candidates_with(&upstreams, Instant::now(), &mut rng).addresses())
            .collect();
        assert!(orders.len() > 1, "50 shuffles of 5 upstreams should not all agree");

        let firsts: HashSet<String> = (0..200)
            .map(|_| policy.candidates_with(&upstreams, Instant::now(), &mut rng).addresses()[0].clone())
            .collect();
        assert_eq!(firsts.len(), 5, "every upstream should lead some list");
    }

    #[test]
    fn test_empty_pool() {
        let list = RandomEligible::new(RETRY).candidates(&[], Instant::now());
        assert!(list.is_empty());
    }
}
