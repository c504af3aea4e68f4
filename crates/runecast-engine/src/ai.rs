//! The scripted stand-in that plays the opposite seat in solo games.

use runecast_protocol::{DieFace, SymbolKind};

use crate::state::MAX_KEPT_DICE;

/// Picks dice from a roll by fixed priority: attack first, then
/// defense, steal, god-token, truncated to the keep cap. Returns
/// positional indices into the roll, so duplicate faces stay distinct.
/// Deterministic given the roll.
pub fn choose_dice(roll: &[DieFace]) -> Vec<usize> {
    const PRIORITY: [SymbolKind; 4] = [
        SymbolKind::Attack,
        SymbolKind::Defense,
        SymbolKind::Steal,
        SymbolKind::GodToken,
    ];

    let mut picks = Vec::with_capacity(MAX_KEPT_DICE);
    for kind in PRIORITY {
        for (index, die) in roll.iter().enumerate() {
            if die.kind == kind {
                picks.push(index);
            }
        }
    }
    picks.truncate(MAX_KEPT_DICE);
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use runecast_protocol::FaceName;

    fn roll(names: &[FaceName]) -> Vec<DieFace> {
        names.iter().map(|&n| DieFace::new(n)).collect()
    }

    #[test]
    fn attack_outranks_everything() {
        let dice = roll(&[
            FaceName::Prayer,
            FaceName::Axe,
            FaceName::Helmet,
            FaceName::Arrow,
            FaceName::Hand,
            FaceName::Axe,
        ]);
        // All three attack dice, in roll order.
        assert_eq!(choose_dice(&dice), vec![1, 3, 5]);
    }

    #[test]
    fn falls_through_the_priority_ladder() {
        let dice = roll(&[
            FaceName::Prayer,
            FaceName::Hand,
            FaceName::Shield,
            FaceName::Prayer,
            FaceName::Hand,
            FaceName::Axe,
        ]);
        // One attack, one defense, then the first steal.
        assert_eq!(choose_dice(&dice), vec![5, 2, 1]);
    }

    #[test]
    fn all_prayers_still_fills_the_cap() {
        let dice = roll(&[FaceName::Prayer; 6]);
        assert_eq!(choose_dice(&dice), vec![0, 1, 2]);
    }

    #[test]
    fn short_roll_yields_short_pick() {
        let dice = roll(&[FaceName::Axe, FaceName::Helmet]);
        assert_eq!(choose_dice(&dice), vec![0, 1]);
    }
}
