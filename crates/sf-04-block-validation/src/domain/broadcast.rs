//! Which broadcasts follow an accepted block.

use shared_types::DataOrigin;

/// Broadcasts to emit for one accepted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastPlan {
    /// To the other brokers of this node's clique.
    pub intra_clique: bool,
    /// To peers in other cliques.
    pub inter_clique: bool,
}

impl BroadcastPlan {
    /// Decide from the clique layout, the block's origin and the sync flag.
    ///
    /// A lone broker has no clique peers. Blocks from other cliques are only
    /// relayed inside the clique once the node is synced, and nothing leaves
    /// the clique before then.
    pub fn decide(broker_num: usize, origin: DataOrigin, synced: bool) -> Self {
        Self {
            intra_clique: broker_num > 1 && (synced || !origin.is_inter_clique()),
            inter_clique: synced,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.intra_clique && !self.inter_clique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::PeerId;

    const PEER: PeerId = PeerId([3u8; 32]);
    const ORIGINS: [DataOrigin; 3] = [
        DataOrigin::Local,
        DataOrigin::InterClique(PEER),
        DataOrigin::IntraClique(PEER),
    ];

    #[test]
    fn test_single_broker_never_intra() {
        for origin in ORIGINS {
            let plan = BroadcastPlan::decide(1, origin, true);
            assert!(!plan.intra_clique);
            assert!(plan.inter_clique);
            assert!(BroadcastPlan::decide(1, origin, false).is_empty());
        }
    }

    #[test]
    fn test_multi_broker_unsynced() {
        assert_eq!(
            BroadcastPlan::decide(2, DataOrigin::Local, false),
            BroadcastPlan {
                intra_clique: true,
                inter_clique: false
            }
        );
        assert!(BroadcastPlan::decide(2, DataOrigin::IntraClique(PEER), false).intra_clique);
        assert!(BroadcastPlan::decide(2, DataOrigin::InterClique(PEER), false).is_empty());
    }

    #[test]
    fn test_multi_broker_synced() {
        for origin in ORIGINS {
            assert_eq!(
                BroadcastPlan::decide(3, origin, true),
                BroadcastPlan {
                    intra_clique: true,
                    inter_clique: true
                }
            );
        }
    }
}
