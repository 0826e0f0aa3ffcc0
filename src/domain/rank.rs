// Stable-rank recalculation: players with equal score share a rank; gaps are
// only consumed by connected players, disconnected players keep whatever
// rank they last held.

use crate::domain::player::Player;

/// Recomputes `rank` in place for all connected players, ordered by
/// descending score with ties broken by existing (insertion) order.
pub fn recalculate(players: &mut [Player]) {
    let mut order: Vec<usize> = (0..players.len())
        .filter(|&i| players[i].conn.connected)
        .collect();
    order.sort_by(|&a, &b| players[b].score.cmp(&players[a].score));

    let mut last_score: Option<i64> = None;
    let mut last_rank: u32 = 0;
    for idx in order {
        let score = players[idx].score;
        let rank = match last_score {
            Some(prev) if prev == score => last_rank,
            _ => last_rank + 1,
        };
        players[idx].rank = rank;
        last_score = Some(score);
        last_rank = rank;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::Player;
    use std::sync::Arc;

    fn player(id: &str, score: i64, connected: bool) -> Player {
        let mut p = Player::new(Arc::from(id), id.to_string(), false);
        p.score = score;
        p.conn.connected = connected;
        p
    }

    #[test]
    fn tie_break_rank_scenario_from_spec() {
        let mut players = vec![
            player("a", 1, true),
            player("b", 1, true),
            player("c", 0, true),
        ];
        recalculate(&mut players);
        assert_eq!(players[0].rank, 1);
        assert_eq!(players[1].rank, 1);
        assert_eq!(players[2].rank, 2);

        // Drop the third player; remaining ranks stay (1, 1).
        players[2].conn.connected = false;
        recalculate(&mut players);
        assert_eq!(players[0].rank, 1);
        assert_eq!(players[1].rank, 1);
    }

    #[test]
    fn disconnected_players_keep_prior_rank() {
        let mut players = vec![player("a", 10, true), player("b", 5, false)];
        players[1].rank = 7;
        recalculate(&mut players);
        assert_eq!(players[0].rank, 1);
        assert_eq!(players[1].rank, 7);
    }
}
