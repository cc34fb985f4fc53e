//! Colors and marker styles shared by the renderer and the HTML page

use serde::{Deserialize, Serialize};

use crate::models::{PoiCategory, StopKind};

/// Six-class yellow-orange-red sequential scale
pub const YL_OR_RD: [&str; 6] = [
    "#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#f03b20", "#bd0026",
];

/// Fill for regions without a matching aggregate
pub const NO_DATA_COLOR: &str = "#9e9e9e";

pub const CHOROPLETH_FILL_OPACITY: f64 = 0.4;
pub const CHOROPLETH_LINE_OPACITY: f64 = 0.2;

pub const ROUTE_COLOR: &str = "red";
pub const ROUTE_WEIGHT: u8 = 4;
pub const ROUTE_OPACITY: f64 = 0.7;

/// Circle marker look of a place layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleStyle {
    pub color: String,
    pub radius: u8,
    pub fill: bool,
}

#[must_use]
pub fn category_style(category: PoiCategory) -> CircleStyle {
    let (color, radius) = match category {
        PoiCategory::Restaurant => ("green", 4),
        PoiCategory::Hotel => ("blue", 4),
        PoiCategory::Attraction => ("purple", 5),
    };
    CircleStyle {
        color: color.to_string(),
        radius,
        fill: true,
    }
}

/// Marker color and icon of an itinerary stop
#[must_use]
pub fn stop_style(kind: StopKind) -> (&'static str, &'static str) {
    match kind {
        StopKind::Food => ("orange", "cutlery"),
        StopKind::View | StopKind::Walk => ("blue", "camera"),
    }
}

/// Equal-width classes over `[min, max]`
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Scale spanning the given values; `None` when there are none
    #[must_use]
    pub fn spanning(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut values = values.into_iter().filter(|v| v.is_finite());
        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    fn class_of(&self, value: f64) -> usize {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0;
        }
        let position = (value - self.min) / span * YL_OR_RD.len() as f64;
        (position.floor().max(0.0) as usize).min(YL_OR_RD.len() - 1)
    }

    #[must_use]
    pub fn color(&self, value: f64) -> &'static str {
        YL_OR_RD[self.class_of(value)]
    }

    /// `(lower, upper, color)` for every class
    #[must_use]
    pub fn bins(&self) -> Vec<(f64, f64, &'static str)> {
        let width = (self.max - self.min) / YL_OR_RD.len() as f64;
        YL_OR_RD
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let lower = self.min + width * i as f64;
                let upper = if i + 1 == YL_OR_RD.len() {
                    self.max
                } else {
                    self.min + width * (i + 1) as f64
                };
                (lower, upper, *color)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints() {
        let scale = ColorScale::spanning([10.0, 70.0, 40.0]).unwrap();
        assert_eq!(scale.color(10.0), YL_OR_RD[0]);
        assert_eq!(scale.color(70.0), YL_OR_RD[5]);
        assert_eq!(scale.color(39.9), YL_OR_RD[2]);
        assert_eq!(scale.color(40.0), YL_OR_RD[3]);
    }

    #[test]
    fn test_scale_degenerate() {
        assert!(ColorScale::spanning(Vec::<f64>::new()).is_none());
        let flat = ColorScale::spanning([5.0, 5.0]).unwrap();
        assert_eq!(flat.color(5.0), YL_OR_RD[0]);
    }

    #[test]
    fn test_bins_cover_range() {
        let scale = ColorScale::spanning([0.0, 60.0]).unwrap();
        let bins = scale.bins();
        assert_eq!(bins.len(), 6);
        assert_eq!(bins[0].0, 0.0);
        assert_eq!(bins[0].1, 10.0);
        assert_eq!(bins[5].1, 60.0);
    }

    #[test]
    fn test_styles() {
        assert_eq!(category_style(PoiCategory::Restaurant).color, "green");
        assert_eq!(category_style(PoiCategory::Attraction).radius, 5);
        assert_eq!(stop_style(StopKind::Food), ("orange", "cutlery"));
        assert_eq!(stop_style(StopKind::Walk), ("blue", "camera"));
    }
}
