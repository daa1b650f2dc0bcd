//! Round bookkeeping shared by the timed answer games.
//!
//! A [`RoundLedger`] enforces the two ordering rules of timed rounds:
//! only the first correct answer of a round scores, and a round can time out
//! only once.

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::PlayerId;

/// Answer value clients send when the round timer ran out.
pub const TIMEOUT_SENTINEL: &str = "timeout";

/// Normalize a submitted or expected answer for comparison.
///
/// Case and surrounding/repeated whitespace are ignored; umlauts and ß are kept.
pub fn normalize_answer(answer: &str) -> String {
    answer
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("round {0} has already timed out")]
    DuplicateTimeout(usize),

    #[error("submission for round {submitted} but round {current} is active")]
    StaleRound { submitted: usize, current: usize },
}

/// The most recent submission, shown to clients until the round advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAnswer {
    pub player_id: PlayerId,
    pub answer: String,
    pub correct: bool,
}

/// How a submission was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Timeout,
    Correct { scored: bool },
    Incorrect,
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct { .. })
    }

    pub fn scored(&self) -> bool {
        matches!(self, Verdict::Correct { scored: true })
    }

    /// Whether this submission ends the round.
    pub fn resolves_round(&self) -> bool {
        !matches!(self, Verdict::Incorrect)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoundLedger {
    pub current_round: usize,
    pub last_answer: Option<LastAnswer>,
    timed_out: HashSet<usize>,
    scored: HashSet<usize>,
}

impl RoundLedger {
    /// Judge a submission against the expected answer of the current round.
    ///
    /// `round` is the round the client believes is active; a mismatch means the
    /// submission arrived after the round already advanced.
    pub fn judge(
        &mut self,
        player_id: &PlayerId,
        expected: &str,
        answer: &str,
        round: Option<usize>,
        is_timeout: bool,
    ) -> Result<Verdict, RoundError> {
        let current = self.current_round;
        if let Some(submitted) = round
            && submitted != current
        {
            return Err(RoundError::StaleRound { submitted, current });
        }

        let normalized = normalize_answer(answer);
        if is_timeout || normalized == TIMEOUT_SENTINEL {
            if !self.timed_out.insert(current) {
                return Err(RoundError::DuplicateTimeout(current));
            }
            // A round already won keeps its winning answer on display.
            if !self.scored.contains(&current) {
                self.last_answer = Some(LastAnswer {
                    player_id: player_id.clone(),
                    answer: TIMEOUT_SENTINEL.to_string(),
                    correct: false,
                });
            }
            return Ok(Verdict::Timeout);
        }

        let correct = normalized == normalize_answer(expected);
        let scored = correct && self.scored.insert(current);
        self.last_answer = Some(LastAnswer {
            player_id: player_id.clone(),
            answer: answer.to_string(),
            correct,
        });

        Ok(if correct {
            Verdict::Correct { scored }
        } else {
            Verdict::Incorrect
        })
    }

    pub fn advance(&mut self) {
        self.current_round += 1;
        self.last_answer = None;
    }

    /// Drop the per-round sets once the game is over.
    pub fn release(&mut self) {
        self.timed_out.clear();
        self.scored.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(value: &str) -> PlayerId {
        PlayerId::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_normalize_answer_ignores_case_and_spacing() {
        // テスト項目: 大文字小文字と空白の違いは無視され、ウムラウトは保持される
        // given (前提条件):
        let answer = "  Wir   LAUFEN ";

        // when (操作):
        let normalized = normalize_answer(answer);

        // then (期待する結果):
        assert_eq!(normalized, "wir laufen");
        assert_eq!(normalize_answer("Über"), "über");
    }

    #[test]
    fn test_first_correct_answer_scores_once() {
        // テスト項目: ラウンド内で最初の正解だけが得点し、後続の正解は得点しない
        // given (前提条件):
        let mut ledger = RoundLedger::default();

        // when (操作):
        let first = ledger.judge(&pid("alice"), "der", "der", None, false);
        let wrong = ledger.judge(&pid("bob"), "der", "die", None, false);
        let late = ledger.judge(&pid("bob"), "der", "DER", None, false);

        // then (期待する結果):
        assert_eq!(first, Ok(Verdict::Correct { scored: true }));
        assert_eq!(wrong, Ok(Verdict::Incorrect));
        assert_eq!(late, Ok(Verdict::Correct { scored: false }));
    }

    #[test]
    fn test_timeout_is_accepted_once_per_round() {
        // テスト項目: 同じラウンドのタイムアウトは一度だけ受理される
        // given (前提条件):
        let mut ledger = RoundLedger::default();

        // when (操作):
        let first = ledger.judge(&pid("alice"), "der", TIMEOUT_SENTINEL, None, false);
        let second = ledger.judge(&pid("bob"), "der", "", None, true);

        // then (期待する結果):
        assert_eq!(first, Ok(Verdict::Timeout));
        assert_eq!(second, Err(RoundError::DuplicateTimeout(0)));
        let last = ledger.last_answer.unwrap();
        assert!(!last.correct);
        assert_eq!(last.answer, TIMEOUT_SENTINEL);
    }

    #[test]
    fn test_late_timeout_keeps_winning_answer() {
        // テスト項目: 正解の後に届いたタイムアウトは受理されるが、表示中の正解は上書きしない
        // given (前提条件):
        let mut ledger = RoundLedger::default();
        ledger.judge(&pid("alice"), "der", "der", None, false).unwrap();

        // when (操作):
        let result = ledger.judge(&pid("bob"), "der", "", Some(0), true);

        // then (期待する結果):
        assert_eq!(result, Ok(Verdict::Timeout));
        let last = ledger.last_answer.unwrap();
        assert!(last.correct);
        assert_eq!(last.player_id, pid("alice"));
        assert_eq!(last.answer, "der");
    }

    #[test]
    fn test_timeout_allowed_again_after_advance() {
        // テスト項目: ラウンドが進めば次のラウンドのタイムアウトは受理される
        // given (前提条件):
        let mut ledger = RoundLedger::default();
        ledger
            .judge(&pid("alice"), "der", "", None, true)
            .unwrap();

        // when (操作):
        ledger.advance();
        let result = ledger.judge(&pid("alice"), "die", "", None, true);

        // then (期待する結果):
        assert_eq!(result, Ok(Verdict::Timeout));
        assert_eq!(ledger.current_round, 1);
    }

    #[test]
    fn test_stale_round_submission_is_rejected() {
        // テスト項目: 既に進んだラウンド宛ての提出は拒否される
        // given (前提条件):
        let mut ledger = RoundLedger::default();
        ledger.advance();

        // when (操作):
        let result = ledger.judge(&pid("alice"), "das", "", Some(0), true);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoundError::StaleRound {
                submitted: 0,
                current: 1
            })
        );
        assert!(ledger.last_answer.is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        // テスト項目: reset で現在ラウンドと記録がすべて初期化される
        // given (前提条件):
        let mut ledger = RoundLedger::default();
        ledger.judge(&pid("alice"), "der", "der", None, false).unwrap();
        ledger.advance();

        // when (操作):
        ledger.reset();
        let again = ledger.judge(&pid("alice"), "der", "der", None, false);

        // then (期待する結果):
        assert_eq!(ledger.current_round, 0);
        assert_eq!(again, Ok(Verdict::Correct { scored: true }));
    }
}
