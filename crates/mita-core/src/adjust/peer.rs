//! Peer stage: nudge outlying categories toward peer averages

use crate::allocation::CategoryAllocation;
use crate::error::Result;

use super::{AdjustmentContext, AdjustmentStage};

/// Relative deviation from the current amount that counts as an outlier
const DEVIATION_THRESHOLD: f64 = 0.3;
/// Fraction of the gap closed per adjustment
const PULL: f64 = 0.25;

pub struct PeerStage;

impl AdjustmentStage for PeerStage {
    fn id(&self) -> &'static str {
        "peer"
    }

    fn name(&self) -> &'static str {
        "Peer Comparison"
    }

    fn adjust(
        &self,
        allocation: &CategoryAllocation,
        ctx: &AdjustmentContext<'_>,
    ) -> Result<CategoryAllocation> {
        let Some(peers) = ctx.peers else {
            return Ok(allocation.clone());
        };

        let mut adjusted = allocation.clone();
        let mut touched = false;

        for (category, stat) in peers {
            let Some(current) = allocation.get(category) else {
                continue;
            };
            if !stat.peer_average.is_finite() {
                continue;
            }
            let gap = stat.peer_average - current;
            if gap.abs() > DEVIATION_THRESHOLD * current {
                adjusted.set(category.clone(), current + PULL * gap);
                touched = true;
            }
        }

        if !touched {
            return Ok(allocation.clone());
        }
        Ok(adjusted.renormalize(ctx.income))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::tests::base;
    use crate::models::{PeerData, PeerStat};

    fn peers(entries: &[(&str, f64)]) -> PeerData {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), PeerStat { peer_average: *v }))
            .collect()
    }

    #[test]
    fn test_outlier_moves_quarter_of_the_gap() {
        // food 450 vs peers 250: gap 200 > 135, moves to 400 before renormalization
        let p = peers(&[("food", 250.0)]);
        let ctx = AdjustmentContext::new(3000.0).with_peers(Some(&p));

        let a = PeerStage.adjust(&base(), &ctx).unwrap();
        assert!(a.sums_to(3000.0));
        let factor = 3000.0 / 2950.0;
        assert!((a.amount("food") - 400.0 * factor).abs() < 1e-6);
    }

    #[test]
    fn test_close_to_peers_is_identity() {
        // 10% off, under the 30% threshold
        let p = peers(&[("food", 495.0), ("housing", 850.0)]);
        let ctx = AdjustmentContext::new(3000.0).with_peers(Some(&p));
        assert_eq!(PeerStage.adjust(&base(), &ctx).unwrap(), base());
    }

    #[test]
    fn test_peer_only_category_ignored() {
        let p = peers(&[("pets", 200.0)]);
        let ctx = AdjustmentContext::new(3000.0).with_peers(Some(&p));

        let a = PeerStage.adjust(&base(), &ctx).unwrap();
        assert!(!a.contains("pets"));
        assert_eq!(a, base());
    }

    #[test]
    fn test_absent_peers_is_identity() {
        let ctx = AdjustmentContext::new(3000.0);
        assert_eq!(PeerStage.adjust(&base(), &ctx).unwrap(), base());
    }
}
