//! Per-channel statistics and the fixed colour-cast decision tables.

use serde::{Deserialize, Serialize};

use crate::frame::RgbFrame;

/// Ratio by which one channel must exceed the others to count as a cast.
pub const CAST_RATIO: f64 = 1.4;
/// Below this fraction of max(R, G), blue counts as low.
pub const LOW_BLUE_RATIO: f64 = 0.6;

pub const BLUE_CAST: &str = "Blue much higher than R/G → AWB or gains issue likely.";
pub const RED_CAST: &str = "Red much higher than G/B → Scene warm or gains skewed.";
pub const BALANCED: &str = "Channel means look balanced for typical indoor light.";

pub const HINT_BLUE_LOW: &str = "Hint: BLUE low in RGB (normal if scene warm).";
pub const HINT_RED_HIGH: &str = "Hint: RED very high — AWB/gains?";
pub const HINT_BLUE_HIGH: &str = "Hint: BLUE very high — AWB/gains?";

/// Channel statistics, always in R, G, B order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub means_rgb: [f64; 3],
    pub stds_rgb: [f64; 3],
    /// "R", "G" or "B".
    pub dominant: String,
    pub ratios_to_mean: [f64; 3],
}

impl ChannelStats {
    pub fn from_frame(frame: &RgbFrame) -> Self {
        let n = frame.pixel_count().max(1) as f64;
        let mut sum = [0f64; 3];
        let mut sum_sq = [0f64; 3];
        for px in frame.as_bytes().chunks_exact(3) {
            for c in 0..3 {
                let v = px[c] as f64;
                sum[c] += v;
                sum_sq[c] += v * v;
            }
        }

        let stored_means = sum.map(|s| s / n);
        let mut stored_stds = [0f64; 3];
        for c in 0..3 {
            stored_stds[c] = (sum_sq[c] / n - stored_means[c].powi(2)).max(0.0).sqrt();
        }
        let (means_rgb, stds_rgb) = match frame.order {
            crate::frame::ChannelOrder::Rgb => (stored_means, stored_stds),
            crate::frame::ChannelOrder::Bgr => (reverse(stored_means), reverse(stored_stds)),
        };

        let overall = means_rgb.iter().sum::<f64>() / 3.0;
        let ratios_to_mean = means_rgb.map(|m| m / (overall + 1e-6));

        Self {
            dominant: dominant_channel(means_rgb).to_string(),
            means_rgb,
            stds_rgb,
            ratios_to_mean,
        }
    }
}

fn reverse(values: [f64; 3]) -> [f64; 3] {
    [values[2], values[1], values[0]]
}

/// Channel label with the largest mean; ties go to the earlier channel.
pub fn dominant_channel(means: [f64; 3]) -> &'static str {
    let mut best = 0;
    for c in 1..3 {
        if means[c] > means[best] {
            best = c;
        }
    }
    ["R", "G", "B"][best]
}

/// Canned verdict for a capture's channel means.
pub fn verdict(stats: &ChannelStats) -> String {
    let [r, g, b] = stats.means_rgb;
    let mut msgs = Vec::new();
    if b > CAST_RATIO * r.max(g) {
        msgs.push(BLUE_CAST);
    }
    if r > CAST_RATIO * g.max(b) {
        msgs.push(RED_CAST);
    }
    if msgs.is_empty() {
        msgs.push(BALANCED);
    }
    msgs.join(" ")
}

/// Quick dominance hint shown by the live compare tool.
pub fn hint(means_rgb: [f64; 3]) -> Option<&'static str> {
    let [r, g, b] = means_rgb;
    if b < LOW_BLUE_RATIO * r.max(g) {
        Some(HINT_BLUE_LOW)
    } else if r > CAST_RATIO * g.max(b) {
        Some(HINT_RED_HIGH)
    } else if b > CAST_RATIO * r.max(g) {
        Some(HINT_BLUE_HIGH)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    #[test]
    fn blue_dominant_frame_gets_blue_verdict() {
        let frame = RgbFrame::filled(4, 4, [50, 60, 100]);
        let stats = ChannelStats::from_frame(&frame);
        assert_eq!(stats.dominant, "B");
        assert_eq!(verdict(&stats), BLUE_CAST);
    }

    #[test]
    fn uniform_gray_is_balanced() {
        let frame = RgbFrame::filled(4, 4, [128, 128, 128]);
        let stats = ChannelStats::from_frame(&frame);
        assert_eq!(verdict(&stats), BALANCED);
        assert_eq!(stats.stds_rgb, [0.0, 0.0, 0.0]);
        assert_eq!(stats.dominant, "R");
        for ratio in stats.ratios_to_mean {
            assert!((ratio - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn red_dominant_frame_gets_red_verdict() {
        let stats = ChannelStats::from_frame(&RgbFrame::filled(2, 2, [200, 100, 90]));
        assert_eq!(verdict(&stats), RED_CAST);
    }

    #[test]
    fn just_below_threshold_is_balanced() {
        let stats = ChannelStats::from_frame(&RgbFrame::filled(2, 2, [100, 100, 139]));
        assert_eq!(verdict(&stats), BALANCED);
    }

    #[test]
    fn stats_are_reported_in_rgb_order_for_bgr_frames() {
        let frame = RgbFrame::filled(2, 2, [50, 60, 100]).to_order(ChannelOrder::Bgr);
        let stats = ChannelStats::from_frame(&frame);
        assert_eq!(stats.means_rgb, [50.0, 60.0, 100.0]);
        assert_eq!(&frame.as_bytes()[..3], &[100, 60, 50]);
    }

    #[test]
    fn std_of_two_level_image() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0]);
        data.extend_from_slice(&[100, 0, 0]);
        let frame = RgbFrame::new(data, 2, 1, ChannelOrder::Rgb).unwrap();
        let stats = ChannelStats::from_frame(&frame);
        assert!((stats.means_rgb[0] - 50.0).abs() < 1e-9);
        assert!((stats.stds_rgb[0] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn hints_follow_check_order() {
        assert_eq!(hint([200.0, 150.0, 60.0]), Some(HINT_BLUE_LOW));
        assert_eq!(hint([200.0, 100.0, 130.0]), Some(HINT_RED_HIGH));
        assert_eq!(hint([60.0, 70.0, 150.0]), Some(HINT_BLUE_HIGH));
        assert_eq!(hint([128.0, 128.0, 128.0]), None);
    }
}
