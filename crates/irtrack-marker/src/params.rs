use serde::{Deserialize, Serialize};

/// Tunable constants of the marker detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerDetectorParams {
    /// Intensity level at or above which a (dilated) pixel is foreground.
    pub threshold: u8,
    /// Number of 3x3 square dilation passes applied before contour extraction.
    pub dilate_iterations: u8,
    /// Radius of the filled disc drawn at each centroid in the visualization.
    pub marker_radius: i32,
    /// Draw `(x,y)` labels next to each centroid.
    pub draw_labels: bool,
}

impl Default for MarkerDetectorParams {
    fn default() -> Self {
        Self {
            threshold: 200,
            dilate_iterations: 3,
            marker_radius: 5,
            draw_labels: true,
        }
    }
}
