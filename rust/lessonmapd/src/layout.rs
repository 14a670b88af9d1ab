use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Geometry shared by the zig-zag layout and the path builder.
///
/// All lengths are in container pixels; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapGeometry {
    pub node_diameter: f64,
    pub gap: f64,
    pub container_width: f64,
    pub horizontal_amplitude: f64,
    pub control_offset: f64,
}

impl Default for MapGeometry {
    fn default() -> Self {
        Self {
            node_diameter: 80.0,
            gap: 48.0,
            container_width: 360.0,
            horizontal_amplitude: 72.0,
            control_offset: 56.0,
        }
    }
}

impl MapGeometry {
    /// Distance between the centres of two consecutive nodes.
    pub fn row_pitch(&self) -> f64 {
        self.node_diameter + self.gap
    }

    pub fn center_x(&self) -> f64 {
        self.container_width / 2.0
    }

    /// Reads a stored setup section, falling back to the default for any
    /// missing or non-numeric field.
    pub fn from_setup(obj: &Map<String, JsonValue>) -> Self {
        let d = Self::default();
        let num = |key: &str, fallback: f64| {
            obj.get(key)
                .and_then(|v| v.as_f64())
                .filter(|v| v.is_finite())
                .unwrap_or(fallback)
        };
        let g = Self {
            node_diameter: num("nodeDiameter", d.node_diameter),
            gap: num("gap", d.gap),
            container_width: num("containerWidth", d.container_width),
            horizontal_amplitude: num("horizontalAmplitude", d.horizontal_amplitude),
            control_offset: num("controlOffset", d.control_offset),
        };
        // A hand-edited section that no longer validates is ignored wholesale.
        if g.validate().is_ok() {
            g
        } else {
            d
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.node_diameter <= 0.0 {
            return Err("nodeDiameter must be > 0".into());
        }
        if self.gap < 0.0 {
            return Err("gap must be >= 0".into());
        }
        if self.container_width <= 0.0 {
            return Err("containerWidth must be > 0".into());
        }
        if self.horizontal_amplitude < 0.0 {
            return Err("horizontalAmplitude must be >= 0".into());
        }
        if self.control_offset < 0.0 {
            return Err("controlOffset must be >= 0".into());
        }
        if self.horizontal_amplitude + self.node_diameter / 2.0 > self.center_x() {
            return Err(
                "horizontalAmplitude + nodeDiameter/2 must fit in half the containerWidth".into(),
            );
        }
        Ok(())
    }
}

/// Horizontal slot of a node in the 4-step zig-zag cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Lane {
    Center,
    Left,
    Right,
}

pub fn lane_for_index(i: usize) -> Lane {
    match i % 4 {
        1 => Lane::Left,
        3 => Lane::Right,
        _ => Lane::Center,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// Places `count` nodes top to bottom in a center, left, center, right cycle.
pub fn zigzag_layout(count: usize, geometry: &MapGeometry) -> Vec<NodePosition> {
    let pitch = geometry.row_pitch();
    let center = geometry.center_x();
    (0..count)
        .map(|i| {
            let x = match lane_for_index(i) {
                Lane::Center => center,
                Lane::Left => center - geometry.horizontal_amplitude,
                Lane::Right => center + geometry.horizontal_amplitude,
            };
            NodePosition {
                x,
                y: i as f64 * pitch + geometry.node_diameter / 2.0,
            }
        })
        .collect()
}

/// Height of the drawing surface for a zone of `count` nodes.
pub fn zone_height(count: usize, geometry: &MapGeometry) -> f64 {
    count as f64 * geometry.row_pitch()
}
