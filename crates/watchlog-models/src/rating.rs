use serde::{Deserialize, Serialize};

/// Internal five-bucket rating used by the library views.
///
/// Variants are ordered worst-to-best so the derived `Ord` matches the
/// ordinal meaning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RatingBucket {
    Awful,
    Weak,
    Average,
    Good,
    Excellent,
}

impl RatingBucket {
    /// Map a Trakt rating (1-10 integer) onto the internal bucket.
    ///
    /// Out-of-range input is not validated here; Trakt documents its scale
    /// as 1-10 and the wire layer only hands through integers.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 9 => RatingBucket::Excellent,
            s if s >= 7 => RatingBucket::Good,
            s if s >= 5 => RatingBucket::Average,
            s if s >= 3 => RatingBucket::Weak,
            _ => RatingBucket::Awful,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_thresholds() {
        assert_eq!(RatingBucket::from_score(10), RatingBucket::Excellent);
        assert_eq!(RatingBucket::from_score(9), RatingBucket::Excellent);
        assert_eq!(RatingBucket::from_score(8), RatingBucket::Good);
        assert_eq!(RatingBucket::from_score(7), RatingBucket::Good);
        assert_eq!(RatingBucket::from_score(6), RatingBucket::Average);
        assert_eq!(RatingBucket::from_score(5), RatingBucket::Average);
        assert_eq!(RatingBucket::from_score(4), RatingBucket::Weak);
        assert_eq!(RatingBucket::from_score(3), RatingBucket::Weak);
        assert_eq!(RatingBucket::from_score(2), RatingBucket::Awful);
        assert_eq!(RatingBucket::from_score(1), RatingBucket::Awful);
    }

    #[test]
    fn test_every_score_maps_to_a_bucket() {
        for score in 1..=10u8 {
            // Total over the documented scale; the match has no panic arm.
            let _ = RatingBucket::from_score(score);
        }
    }

    #[test]
    fn test_bucket_ordering() {
        assert!(RatingBucket::Excellent > RatingBucket::Good);
        assert!(RatingBucket::Good > RatingBucket::Average);
        assert!(RatingBucket::Average > RatingBucket::Weak);
        assert!(RatingBucket::Weak > RatingBucket::Awful);
    }
}
