// src/utils/ranking.rs

use sqlx::SqlitePool;

use crate::error::AppError;

/// Assigns dense ranks 1..N over (user_id, total_score) pairs.
///
/// Ordering is total_score descending with user_id ascending as the
/// tie-break, so the result is deterministic regardless of input order.
/// The per-quiz leaderboard query applies the same ordering via
/// ROW_NUMBER(); the stored global rank is a cached projection of it.
pub fn assign_ranks(users: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let mut ordered: Vec<(i64, i64)> = users.to_vec();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, _score))| (user_id, i as i64 + 1))
        .collect()
}

/// Recomputes every user's stored rank from the full users table.
///
/// Invoked after each scoring event and after registration. Deliberately
/// not wrapped in a transaction: an interrupted run leaves ranks stale,
/// and the next invocation recomputes from scratch.
pub async fn recompute_user_ranks(pool: &SqlitePool) -> Result<(), AppError> {
    let users: Vec<(i64, i64)> =
        sqlx::query_as("SELECT user_id, total_score FROM users")
            .fetch_all(pool)
            .await?;

    for (user_id, rank) in assign_ranks(&users) {
        sqlx::query("UPDATE users SET rank = ? WHERE user_id = ?")
            .bind(rank)
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_are_dense_permutation() {
        let users = vec![(3, 50), (1, 200), (2, 100)];
        let ranks = assign_ranks(&users);

        let mut assigned: Vec<i64> = ranks.iter().map(|(_, r)| *r).collect();
        assigned.sort();
        assert_eq!(assigned, vec![1, 2, 3]);

        assert_eq!(ranks[0], (1, 1));
        assert_eq!(ranks[1], (2, 2));
        assert_eq!(ranks[2], (3, 3));
    }

    #[test]
    fn test_tie_break_lower_id_wins() {
        let users = vec![(7, 100), (4, 100), (9, 100)];
        let ranks = assign_ranks(&users);

        assert_eq!(ranks[0], (4, 1));
        assert_eq!(ranks[1], (7, 2));
        assert_eq!(ranks[2], (9, 3));
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        let a = assign_ranks(&[(1, 10), (2, 20), (3, 30)]);
        let b = assign_ranks(&[(3, 30), (1, 10), (2, 20)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(assign_ranks(&[]).is_empty());
        assert_eq!(assign_ranks(&[(42, 0)]), vec![(42, 1)]);
    }
}
