use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::review::Review;
use crate::services::storefront_client::StorefrontApi;

/// Review counts per star, 1 through 5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingHistogram([u32; 5]);

impl RatingHistogram {
    pub fn from_counts(counts: [u32; 5]) -> Self {
        Self(counts)
    }

    /// Zero for stars outside 1..=5.
    pub fn get(&self, star: u8) -> u32 {
        match star {
            1..=5 => self.0[usize::from(star - 1)],
            _ => 0,
        }
    }

    fn record(&mut self, rating: i32) {
        if (1..=5).contains(&rating) {
            self.0[(rating - 1) as usize] += 1;
        }
    }
}

impl Serialize for RatingHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        for (idx, count) in self.0.iter().enumerate() {
            map.serialize_entry(&(idx + 1).to_string(), count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    /// Mean rating rounded to one decimal; 0 when there are no reviews.
    pub average: f64,
    pub histogram: RatingHistogram,
    pub total_count: usize,
}

impl ReviewSummary {
    pub fn average_label(&self) -> String {
        format!("{:.1}", self.average)
    }

    pub fn bar_width(&self, star: u8) -> f64 {
        bar_width(star, &self.histogram, self.total_count)
    }
}

/// Reviews not flagged hidden, in their original order.
pub fn filter_visible(reviews: Vec<Review>) -> Vec<Review> {
    reviews.into_iter().filter(|r| !r.hidden).collect()
}

pub fn aggregate(visible: &[Review]) -> ReviewSummary {
    let mut histogram = RatingHistogram::default();
    if visible.is_empty() {
        return ReviewSummary {
            average: 0.0,
            histogram,
            total_count: 0,
        };
    }

    let sum: i64 = visible.iter().map(|r| i64::from(r.rating)).sum();
    for review in visible {
        histogram.record(review.rating);
    }
    let mean = sum as f64 / visible.len() as f64;

    ReviewSummary {
        average: round_one_decimal(mean),
        histogram,
        total_count: visible.len(),
    }
}

/// Width of a histogram bar in percent of `total`.
pub fn bar_width(star: u8, histogram: &RatingHistogram, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(histogram.get(star)) / total as f64 * 100.0
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Outcome of loading a vehicle's reviews. An empty `Loaded` means nobody
/// has reviewed the vehicle yet; `Failed` means the list never arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewLoad {
    Loaded {
        reviews: Vec<Review>,
        summary: ReviewSummary,
    },
    Failed {
        message: String,
    },
}

pub struct ReviewAggregator;

impl ReviewAggregator {
    pub fn summarize(reviews: Vec<Review>) -> ReviewLoad {
        let visible = filter_visible(reviews);
        let summary = aggregate(&visible);
        ReviewLoad::Loaded {
            reviews: visible,
            summary,
        }
    }

    pub async fn load(api: &dyn StorefrontApi, vehicle_id: i32) -> ReviewLoad {
        match api.list_reviews(vehicle_id).await {
            Ok(reviews) => Self::summarize(reviews),
            Err(err) => {
                tracing::warn!(vehicle_id, error = %err, "failed to load reviews");
                ReviewLoad::Failed {
                    message: "Could not load reviews".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storefront_client::{ApiError, MockStorefrontApi};
    use chrono::{TimeZone, Utc};

    fn review(id: i32, rating: i32, hidden: bool) -> Review {
        Review {
            id,
            appointment_id: id,
            user_id: 1,
            vehicle_id: 9,
            rating,
            content: format!("review {}", id),
            reviewed_at: Utc.with_ymd_and_hms(2025, 1, id as u32, 9, 0, 0).unwrap(),
            hidden,
            user: None,
        }
    }

    #[test]
    fn empty_set_is_all_zero() {
        let summary = aggregate(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.histogram, RatingHistogram::default());
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.bar_width(5), 0.0);
    }

    #[test]
    fn average_and_histogram() {
        let reviews: Vec<Review> = [5, 5, 4, 3]
            .into_iter()
            .enumerate()
            .map(|(i, r)| review(i as i32 + 1, r, false))
            .collect();
        let summary = aggregate(&reviews);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summary.average_label(), "4.3");
        assert_eq!(summary.histogram, RatingHistogram::from_counts([0, 0, 1, 1, 2]));
        assert_eq!(summary.bar_width(5), 50.0);
        assert_eq!(summary.bar_width(1), 0.0);
    }

    #[test]
    fn out_of_range_ratings_skip_the_histogram() {
        let reviews = vec![review(1, 0, false), review(2, 6, false), review(3, 4, false)];
        let summary = aggregate(&reviews);
        assert_eq!(summary.histogram, RatingHistogram::from_counts([0, 0, 0, 1, 0]));
        assert_eq!(summary.total_count, 3);
    }

    #[test]
    fn visibility_filter_keeps_order() {
        let reviews = vec![review(1, 5, false), review(2, 1, true), review(3, 3, false)];
        let visible = filter_visible(reviews);
        let ids: Vec<i32> = visible.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn histogram_serializes_as_star_map() {
        let json = serde_json::to_value(RatingHistogram::from_counts([0, 0, 1, 1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"1": 0, "2": 0, "3": 1, "4": 1, "5": 2}));
    }

    #[tokio::test]
    async fn load_excludes_hidden_reviews() {
        let mut api = MockStorefrontApi::new();
        api.expect_list_reviews()
            .withf(|id| *id == 9)
            .times(1)
            .returning(|_| Ok(vec![review(1, 5, false), review(2, 1, true)]));

        match ReviewAggregator::load(&api, 9).await {
            ReviewLoad::Loaded { reviews, summary } => {
                assert_eq!(reviews.len(), 1);
                assert_eq!(summary.average, 5.0);
                assert_eq!(summary.total_count, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failed_fetch_is_not_an_empty_result() {
        let mut api = MockStorefrontApi::new();
        api.expect_list_reviews()
            .returning(|_| Err(ApiError::Transport("connection refused".into())));

        let outcome = tokio_test::block_on(ReviewAggregator::load(&api, 9));
        assert!(matches!(outcome, ReviewLoad::Failed { .. }));

        let mut empty = MockStorefrontApi::new();
        empty.expect_list_reviews().returning(|_| Ok(Vec::new()));
        let outcome = tokio_test::block_on(ReviewAggregator::load(&empty, 9));
        assert!(matches!(
            outcome,
            ReviewLoad::Loaded { ref reviews, .. } if reviews.is_empty()
        ));
    }
}
