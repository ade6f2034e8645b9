use rand::seq::SliceRandom;
use rand::Rng;

use crate::cell::{BadKind, CellState, RewardTier};
use crate::hole::{Geometry, HoleId};
use crate::neighbor_iter::NeighborIterable;

#[derive(Copy, Clone, Debug)]
enum Content {
    Safe,
    Bad(BadKind),
    Reward(RewardTier),
}

/// Ground-truth board used to drive self-play and interactive sessions. The
/// probability engine never sees this directly -- it only receives
/// `CellState`s through `Engine::reveal`, the same interface a real player
/// would use.
pub struct Board {
    geo: Geometry,
    content: Vec<Content>,
}

impl NeighborIterable for Board {
    fn geometry(&self) -> Geometry {
        self.geo
    }
}

impl Board {
    /// Scatters `total_bads` bad cells uniformly at random (a small
    /// fraction rupoors rather than bombs) and a light sprinkling of reward
    /// tiers among the rest, adapted from `Minefield::create_random`'s
    /// shuffle-based placement.
    pub fn random(width: u8, height: u8, total_bads: u16, rng: &mut impl Rng) -> Self {
        let geo = Geometry::new(width, height);
        let n = geo.cell_count();
        let total_bads = usize::from(total_bads);
        assert!(total_bads <= n, "more bad cells than the board holds");

        let mut content = vec![Content::Safe; n];
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        for &idx in order.iter().take(total_bads) {
            let kind = if rng.gen_bool(0.15) {
                BadKind::Rupoor
            } else {
                BadKind::Bomb
            };
            content[idx] = Content::Bad(kind);
        }
        for &idx in order.iter().skip(total_bads) {
            if rng.gen_bool(0.08) {
                content[idx] = Content::Reward(Self::random_reward_tier(rng));
            }
        }

        Self { geo, content }
    }

    fn random_reward_tier(rng: &mut impl Rng) -> RewardTier {
        const TIERS: [RewardTier; 5] = [
            RewardTier::Green,
            RewardTier::Blue,
            RewardTier::Red,
            RewardTier::Silver,
            RewardTier::Gold,
        ];
        // skewed toward the common, low-value tiers.
        const WEIGHTS: [u32; 5] = [50, 25, 15, 7, 3];
        let total: u32 = WEIGHTS.iter().sum();
        let mut pick = rng.gen_range(0..total);
        for (tier, w) in TIERS.iter().zip(WEIGHTS) {
            if pick < w {
                return *tier;
            }
            pick -= w;
        }
        unreachable!()
    }

    pub fn geometry(&self) -> Geometry {
        self.geo
    }

    pub fn total_bads(&self) -> u16 {
        self.content
            .iter()
            .filter(|c| matches!(c, Content::Bad(_)))
            .count() as u16
    }

    pub fn is_bad(&self, x: u8, y: u8) -> bool {
        matches!(
            self.content[self.geo.hole_of(x, y).0 as usize],
            Content::Bad(_)
        )
    }

    /// What digging at `(x, y)` reveals: a bad kind, a reward tier, or the
    /// count of bad neighbors.
    pub fn cell(&self, x: u8, y: u8) -> CellState {
        match self.content[self.geo.hole_of(x, y).0 as usize] {
            Content::Bad(kind) => CellState::Bad(kind),
            Content::Reward(tier) => CellState::Reward(tier),
            Content::Safe => {
                let count = self
                    .neighbors_of(x, y)
                    .filter(|&(nx, ny)| self.is_bad(nx, ny))
                    .count() as u8;
                CellState::Clue(count)
            }
        }
    }

    /// True once every non-bad cell has been accounted for by `dug`.
    pub fn has_won(&self, dug: impl Fn(HoleId) -> bool) -> bool {
        (0..self.content.len())
            .all(|i| matches!(self.content[i], Content::Bad(_)) || dug(HoleId(i as u16)))
    }
}
