//! Scoring utilities for finished rounds.
//!
//! Scoring rule:
//!   score = sum of the player's remaining cards (hidden cards at true value)
//! The player who declared the end has their score doubled unless it is
//! strictly lower than every other player's score. Lower is better.

use crate::action::PlayerId;

/// Applies the end-declaration penalty to raw field sums.
pub fn final_scores(raw: &[i32], ends_at: Option<PlayerId>) -> Vec<i32> {
    let mut scores = raw.to_vec();
    let Some(declarer) = ends_at else {
        return scores;
    };
    let Some(&own) = raw.get(declarer) else {
        return scores;
    };
    let best_other = raw
        .iter()
        .enumerate()
        .filter(|(id, _)| *id != declarer)
        .map(|(_, score)| *score)
        .min();
    if let Some(best_other) = best_other {
        if own >= best_other {
            scores[declarer] = own * 2;
        }
    }
    scores
}

/// Players sharing the lowest score.
pub fn winners(scores: &[i32]) -> Vec<PlayerId> {
    let Some(best) = scores.iter().min() else {
        return Vec::new();
    };
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| *score == best)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_lowest_declarer_keeps_score() {
        // Declarer 2 holds 5, others 9, 6, 30 => no penalty.
        assert_eq!(final_scores(&[9, 6, 5, 30], Some(2)), vec![9, 6, 5, 30]);
    }

    #[test]
    fn tied_declarer_is_doubled() {
        assert_eq!(final_scores(&[9, 6, 6, 30], Some(2)), vec![9, 6, 12, 30]);
    }

    #[test]
    fn higher_declarer_is_doubled() {
        assert_eq!(final_scores(&[3, 20, 14, 8], Some(1)), vec![3, 40, 14, 8]);
    }

    #[test]
    fn no_declaration_leaves_scores() {
        assert_eq!(final_scores(&[1, 2, 3, 4], None), vec![1, 2, 3, 4]);
    }

    #[test]
    fn winners_collects_ties() {
        assert_eq!(winners(&[4, -1, 7, -1]), vec![1, 3]);
        assert!(winners(&[]).is_empty());
    }
}
