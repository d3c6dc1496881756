//! Indicator placement inside the room model.
//!
//! The renderer owns the scene; this module only decides where each metric's
//! indicator sphere and label go, given the room's bounding box.

use crate::reading::Metric;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Horizontal offset of each indicator from the room center.
pub const INDICATOR_SPACING: f64 = 1.5;

/// Indicator height above the room floor.
pub const INDICATOR_HEIGHT: f64 = 6.0;

/// Label height above its indicator.
pub const LABEL_OFFSET: f64 = 0.7;

/// Axis-aligned bounding box of the room model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomBounds {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl RoomBounds {
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self::new(Vector3::new(-5.0, 0.0, -5.0), Vector3::new(5.0, 8.0, 5.0))
    }
}

/// Anchor positions of every metric's indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorLayout {
    anchors: [Vector3<f64>; Metric::COUNT],
}

impl IndicatorLayout {
    /// PM2.5 and CO2 sit at the back, humidity and temperature at the front;
    /// PM2.5 and humidity on the left.
    pub fn from_bounds(bounds: &RoomBounds) -> Self {
        let center = bounds.center();
        let y = bounds.min.y + INDICATOR_HEIGHT;
        let at = |dx: f64, dz: f64| {
            Vector3::new(
                center.x + dx * INDICATOR_SPACING,
                y,
                center.z + dz * INDICATOR_SPACING,
            )
        };

        let mut anchors = [Vector3::zeros(); Metric::COUNT];
        anchors[Metric::Pm25.index()] = at(-1.0, -1.0);
        anchors[Metric::Co2.index()] = at(1.0, -1.0);
        anchors[Metric::Humidity.index()] = at(-1.0, 1.0);
        anchors[Metric::Temperature.index()] = at(1.0, 1.0);
        Self { anchors }
    }

    pub fn anchor(&self, metric: Metric) -> Vector3<f64> {
        self.anchors[metric.index()]
    }

    pub fn label_anchor(&self, metric: Metric) -> Vector3<f64> {
        self.anchor(metric) + Vector3::new(0.0, LABEL_OFFSET, 0.0)
    }

    /// Whether the metric also tints a particle cloud.
    pub fn tints_particles(metric: Metric) -> bool {
        matches!(metric, Metric::Pm25 | Metric::Co2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_anchors_around_center() {
        let bounds = RoomBounds::new(Vector3::new(0.0, 1.0, 0.0), Vector3::new(4.0, 3.0, 6.0));
        let layout = IndicatorLayout::from_bounds(&bounds);

        let pm25 = layout.anchor(Metric::Pm25);
        assert_relative_eq!(pm25.x, 0.5);
        assert_relative_eq!(pm25.y, 7.0);
        assert_relative_eq!(pm25.z, 1.5);

        let temp = layout.anchor(Metric::Temperature);
        assert_relative_eq!(temp.x, 3.5);
        assert_relative_eq!(temp.z, 4.5);

        let label = layout.label_anchor(Metric::Co2);
        assert_relative_eq!(label.y, 7.7);
    }

    #[test]
    fn test_particle_tint() {
        assert!(IndicatorLayout::tints_particles(Metric::Pm25));
        assert!(!IndicatorLayout::tints_particles(Metric::Humidity));
    }
}
