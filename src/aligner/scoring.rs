use serde::{Deserialize, Serialize};

/// Linear gap scoring used by the graph aligner. Scores are maximized,
/// so the match reward is positive and the penalties are negative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_score: i32,
}

impl Scoring {
    pub fn new(match_score: i32, mismatch_score: i32, gap_score: i32) -> Self {
        Self { match_score, mismatch_score, gap_score }
    }

    #[inline(always)]
    pub fn substitution(&self, a: u8, b: u8) -> i32 {
        if a == b {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    #[inline(always)]
    pub fn gap(&self) -> i32 {
        self.gap_score
    }
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            match_score: 8,
            mismatch_score: -6,
            gap_score: -8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Scoring;

    #[test]
    fn test_substitution() {
        let scoring = Scoring::default();

        assert_eq!(scoring.substitution(b'A', b'A'), 8);
        assert_eq!(scoring.substitution(b'A', b'C'), -6);
        assert_eq!(scoring.gap(), -8);
    }

    #[test]
    fn test_partial_json() {
        let scoring: Scoring = serde_json::from_str(r#"{"gap_score": -4}"#).unwrap();

        assert_eq!(scoring, Scoring::new(8, -6, -4));
    }
}
