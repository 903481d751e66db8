use serde::{Deserialize, Serialize};

use crate::services::review_aggregator::{RatingHistogram, ReviewSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityPayload {
    #[serde(rename = "AnHien")]
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummaryResponse {
    #[serde(rename = "idXe")]
    pub vehicle_id: i32,
    pub average: f64,
    pub average_label: String,
    pub total: usize,
    pub histogram: RatingHistogram,
    /// Bar widths in percent, index 0 is one star.
    pub bar_widths: [f64; 5],
}

impl ReviewSummaryResponse {
    pub fn new(vehicle_id: i32, summary: &ReviewSummary) -> Self {
        Self {
            vehicle_id,
            average: summary.average,
            average_label: summary.average_label(),
            total: summary.total_count,
            histogram: summary.histogram,
            bar_widths: [1u8, 2, 3, 4, 5].map(|star| summary.bar_width(star)),
        }
    }
}
