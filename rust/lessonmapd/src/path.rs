use crate::layout::{zone_height, MapGeometry, NodePosition};
use serde::Serialize;
use std::fmt::Write as _;

/// One cubic Bézier hop between consecutive nodes. Points are `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CubicSegment {
    pub from: [f64; 2],
    pub control1: [f64; 2],
    pub control2: [f64; 2],
    pub to: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDescriptor {
    pub segments: Vec<CubicSegment>,
    /// SVG path data, empty when there is nothing to connect.
    pub d: String,
    pub width: f64,
    pub height: f64,
}

/// Connects `nodes` with S-shaped cubic segments.
///
/// Control points sit `control_offset` below the start node and above the
/// end node, so each hop leaves and arrives vertically.
pub fn build_path(nodes: &[NodePosition], geometry: &MapGeometry) -> PathDescriptor {
    let offset = geometry.control_offset;
    let segments: Vec<CubicSegment> = nodes
        .windows(2)
        .map(|w| {
            let (curr, next) = (w[0], w[1]);
            CubicSegment {
                from: [curr.x, curr.y],
                control1: [curr.x, curr.y + offset],
                control2: [next.x, next.y - offset],
                to: [next.x, next.y],
            }
        })
        .collect();

    PathDescriptor {
        d: svg_path_data(&segments),
        segments,
        width: geometry.container_width,
        height: zone_height(nodes.len(), geometry),
    }
}

fn svg_path_data(segments: &[CubicSegment]) -> String {
    let Some(first) = segments.first() else {
        return String::new();
    };
    let mut d = format!("M {} {}", first.from[0], first.from[1]);
    for s in segments {
        // Writing into a String cannot fail.
        let _ = write!(
            d,
            " C {} {}, {} {}, {} {}",
            s.control1[0], s.control1[1], s.control2[0], s.control2[1], s.to[0], s.to[1]
        );
    }
    d
}
