//! Fixed helper nodes shown in every viewer scene.

use glam::Vec3;

use super::{DirectionalLight, LineSet, LineTopology, NodeKind, Object3D};
use crate::color::Color;

/// Color of the two lines crossing at the origin
pub const GRID_CENTER_COLOR: Color = Color::from_hex(0x00FF00);

/// Color of every other grid line
pub const GRID_LINE_COLOR: Color = Color::from_hex(0x888888);

/// Square grid on the XZ plane, centered at the origin.
pub fn grid_helper(size: f32, divisions: u32, center_color: Color, line_color: Color) -> Object3D {
    let divisions = divisions.max(1);
    let step = size / divisions as f32;
    let half = size / 2.0;
    let center = divisions / 2;

    let center_rgb = rgb(center_color);
    let line_rgb = rgb(line_color);

    let mut positions = Vec::with_capacity((divisions as usize + 1) * 4);
    let mut colors = Vec::with_capacity(positions.capacity());

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center { center_rgb } else { line_rgb };

        positions.extend_from_slice(&[[-half, 0.0, k], [half, 0.0, k], [k, 0.0, -half], [k, 0.0, half]]);
        colors.extend_from_slice(&[color; 4]);
    }

    Object3D::new(
        "grid",
        NodeKind::Lines(LineSet {
            positions,
            colors,
            topology: LineTopology::List,
        }),
    )
}

/// Blue reference polyline through (-10,0,0), (0,10,0), (10,0,0).
pub fn reference_line() -> Object3D {
    let blue = rgb(Color::from_hex(0x0000FF));
    Object3D::new(
        "reference-line",
        NodeKind::Lines(LineSet {
            positions: vec![[-10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 0.0, 0.0]],
            colors: vec![blue; 3],
            topology: LineTopology::Strip,
        }),
    )
}

/// White key light shining down from +Y.
pub fn key_light() -> Object3D {
    let mut light = Object3D::new(
        "key-light",
        NodeKind::Light(DirectionalLight {
            color: Color::from_hex(0xFFFFFF),
            intensity: 1.0,
            position: Vec3::Y,
        }),
    );
    light.cast_shadow = true;
    light
}

fn rgb(color: Color) -> [f32; 3] {
    let [r, g, b, _] = color.to_rgba();
    [r, g, b]
}
