use foundation::math::Vec3;

/// Indexed triangle mesh in local model coordinates.
///
/// Every builder returns freshly allocated buffers; meshes are never patched
/// in place after construction.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    /// Flat triangle list, three indices per triangle.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// Full ellipsoid parameterized by a latitude/longitude grid.
///
/// `vertical_slices` counts steps around the equator, `horizontal_slices`
/// counts rows from pole to pole.
pub fn ellipsoid(
    radius_x: f64,
    radius_y: f64,
    radius_z: f64,
    vertical_slices: u32,
    horizontal_slices: u32,
) -> TriangleMesh {
    grid_of_revolution(
        radius_x,
        radius_y,
        radius_z,
        vertical_slices.max(3),
        horizontal_slices.max(2),
        std::f64::consts::PI,
    )
}

/// Upper hemisphere of an ellipsoid: the polar angle stops at the equator.
pub fn dome(
    radius_x: f64,
    radius_y: f64,
    radius_z: f64,
    vertical_slices: u32,
    horizontal_slices: u32,
) -> TriangleMesh {
    grid_of_revolution(
        radius_x,
        radius_y,
        radius_z,
        vertical_slices.max(3),
        horizontal_slices.max(2),
        std::f64::consts::FRAC_PI_2,
    )
}

fn grid_of_revolution(
    radius_x: f64,
    radius_y: f64,
    radius_z: f64,
    vertical_slices: u32,
    horizontal_slices: u32,
    max_polar_angle: f64,
) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();

    for row in 0..=horizontal_slices {
        let phi = (row as f64 / horizontal_slices as f64) * max_polar_angle;
        for col in 0..=vertical_slices {
            let theta = (col as f64 / vertical_slices as f64) * std::f64::consts::TAU;
            mesh.positions.push(Vec3::new(
                theta.cos() * phi.sin() * radius_x,
                theta.sin() * phi.sin() * radius_y,
                phi.cos() * radius_z,
            ));
        }
    }

    let row_start = |row: u32| row * (vertical_slices + 1);
    for row in 0..horizontal_slices {
        for col in 0..vertical_slices {
            let i0 = row_start(row) + col;
            let i1 = i0 + 1;
            let i2 = row_start(row + 1) + col;
            let i3 = i2 + 1;
            mesh.push_triangle(i0, i2, i1);
            mesh.push_triangle(i1, i2, i3);
        }
    }

    mesh
}

/// Open cone: an apex over a base circle, sides only (no base cap).
///
/// Position 0 is the apex at `(0, 0, height)`; positions 1..=slices form the
/// base ring at z = 0.
pub fn cone(radius: f64, height: f64, slices: u32) -> TriangleMesh {
    let slices = slices.max(3);
    let mut mesh = TriangleMesh::default();
    mesh.positions.push(Vec3::new(0.0, 0.0, height));
    push_ring(&mut mesh.positions, radius, 0.0, slices);

    for i in 0..slices {
        let b = 1 + i;
        let next = 1 + (i + 1) % slices;
        mesh.push_triangle(0, b, next);
    }

    mesh
}

/// Closed cylinder: two rings plus explicit bottom/top center points.
///
/// Positions: `[bottom center, top center, bottom ring, top ring]`, so a
/// cylinder with `slices = n` has `2 + 2n` positions. Sides contribute two
/// triangles per slice, each cap one fan triangle per slice.
pub fn cylinder(radius: f64, height: f64, slices: u32) -> TriangleMesh {
    let slices = slices.max(3);
    let mut mesh = TriangleMesh::default();

    let bottom_center = 0;
    let top_center = 1;
    mesh.positions.push(Vec3::new(0.0, 0.0, 0.0));
    mesh.positions.push(Vec3::new(0.0, 0.0, height));

    let bottom_start = mesh.positions.len() as u32;
    push_ring(&mut mesh.positions, radius, 0.0, slices);
    let top_start = mesh.positions.len() as u32;
    push_ring(&mut mesh.positions, radius, height, slices);

    for i in 0..slices {
        let b = bottom_start + i;
        let bn = bottom_start + (i + 1) % slices;
        let t = top_start + i;
        let tn = top_start + (i + 1) % slices;
        mesh.push_triangle(b, t, bn);
        mesh.push_triangle(bn, t, tn);
    }
    for i in 0..slices {
        let b = bottom_start + i;
        let bn = bottom_start + (i + 1) % slices;
        mesh.push_triangle(bottom_center, bn, b);
    }
    for i in 0..slices {
        let t = top_start + i;
        let tn = top_start + (i + 1) % slices;
        mesh.push_triangle(top_center, t, tn);
    }

    mesh
}

/// Arrow: a cylinder shaft with a cone tip sitting flush on top.
///
/// Both parts share one vertex/index space; the tip's vertices are lifted by
/// the shaft length and its indices offset past the shaft's.
pub fn arrow(
    shaft_radius: f64,
    shaft_length: f64,
    tip_radius: f64,
    tip_length: f64,
    slices: u32,
) -> TriangleMesh {
    let mut mesh = cylinder(shaft_radius, shaft_length, slices);
    let tip = cone(tip_radius, tip_length, slices);

    let offset = mesh.positions.len() as u32;
    for p in &tip.positions {
        mesh.positions.push(Vec3::new(p.x, p.y, p.z + shaft_length));
    }
    for idx in &tip.indices {
        mesh.indices.push(idx + offset);
    }

    mesh
}

fn push_ring(positions: &mut Vec<Vec3>, radius: f64, z: f64, slices: u32) {
    for i in 0..slices {
        let a = (i as f64 / slices as f64) * std::f64::consts::TAU;
        positions.push(Vec3::new(a.cos() * radius, a.sin() * radius, z));
    }
}

#[cfg(test)]
mod tests {
    use super::{arrow, cone, cylinder, dome, ellipsoid};

    #[test]
    fn ellipsoid_grid_counts() {
        let m = ellipsoid(10.0, 10.0, 10.0, 24, 16);
        assert_eq!(m.positions.len(), 25 * 17);
        assert_eq!(m.triangle_count(), 24 * 16 * 2);
    }

    #[test]
    fn dome_stops_at_the_equator() {
        let m = dome(10.0, 10.0, 10.0, 12, 8);
        assert!(m.positions.iter().all(|p| p.z >= -1e-9));
        // The last row sits on the equator plane.
        let last_row = &m.positions[m.positions.len() - 13..];
        assert!(last_row.iter().all(|p| p.z.abs() < 1e-9));
    }

    #[test]
    fn cone_is_open() {
        let m = cone(8.0, 20.0, 6);
        assert_eq!(m.positions.len(), 1 + 6);
        assert_eq!(m.triangle_count(), 6);
        assert_eq!(m.positions[0].z, 20.0);
    }

    #[test]
    fn cylinder_vertex_and_index_counts() {
        let m = cylinder(8.0, 20.0, 6);
        assert_eq!(m.positions.len(), 2 + 2 * 6);
        // 6*6 side indices (two triangles per slice) plus 2*6 cap triangles.
        assert_eq!(m.indices.len(), 6 * 6 + 3 * (2 * 6));
        assert_eq!(m.triangle_count(), 2 * 6 + 2 * 6);
    }

    #[test]
    fn arrow_tip_sits_flush_on_the_shaft() {
        let m = arrow(5.0, 40.0, 10.0, 20.0, 8);
        let shaft = cylinder(5.0, 40.0, 8);
        let tip = cone(10.0, 20.0, 8);
        assert_eq!(m.positions.len(), shaft.positions.len() + tip.positions.len());
        assert_eq!(m.indices.len(), shaft.indices.len() + tip.indices.len());

        // Tip apex is the first cone vertex, lifted by the shaft length.
        let apex = m.positions[shaft.positions.len()];
        assert_eq!(apex.z, 40.0 + 20.0);

        // All tip indices land in the tip's vertex range.
        let tip_indices = &m.indices[shaft.indices.len()..];
        assert!(
            tip_indices
                .iter()
                .all(|&i| (i as usize) >= shaft.positions.len())
        );
    }

    #[test]
    fn builders_return_fresh_buffers() {
        let a = cone(8.0, 20.0, 12);
        let b = cone(8.0, 20.0, 12);
        assert_eq!(a, b);
        assert_ne!(a.positions.as_ptr(), b.positions.as_ptr());
    }

    #[test]
    fn degenerate_slice_counts_are_clamped() {
        let m = cylinder(1.0, 1.0, 0);
        assert_eq!(m.positions.len(), 2 + 2 * 3);
    }
}
