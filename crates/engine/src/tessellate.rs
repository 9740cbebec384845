use earcutr::earcut;
use foundation::math::Vec3;

/// Triangulates polygon rings into a flat triangle list (3 vertices per
/// triangle), in the rings' own coordinates.
///
/// Rings are flattened into the polygon's best-fit plane (Newell normal of
/// the outer ring) before ear cutting; the first ring is the outline, later
/// rings are holes. Degenerate input yields an empty list.
pub fn triangulate_rings(rings: &[Vec<Vec3>]) -> Vec<Vec3> {
    let Some(outer) = rings.first() else {
        return Vec::new();
    };
    if outer.len() < 3 {
        return Vec::new();
    }

    let normal = newell_normal(outer);
    if normal.length() <= 0.0 {
        return Vec::new();
    }
    let n = normal.normalize();

    // Build a basis spanning the polygon plane.
    let up = if n.z.abs() < 0.99 {
        Vec3::new(0.0, 0.0, 1.0)
    } else {
        Vec3::new(0.0, 1.0, 0.0)
    };
    let u = up.cross(n).normalize();
    let v = n.cross(u);

    let origin = centroid(outer);

    // Flatten rings into 2D coordinates + a parallel 3D vertex list.
    // Also remove a closing duplicate point if present.
    let mut vertices_3d: Vec<Vec3> = Vec::new();
    let mut coords_2d: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    for (ring_i, ring) in rings.iter().enumerate() {
        let mut ring_pts: Vec<Vec3> = ring.clone();
        drop_closing_duplicate(&mut ring_pts);
        if ring_pts.len() < 3 {
            continue;
        }

        if ring_i > 0 {
            hole_indices.push(vertices_3d.len());
        }

        for p in ring_pts {
            let d = p - origin;
            coords_2d.push(d.dot(u));
            coords_2d.push(d.dot(v));
            vertices_3d.push(p);
        }
    }

    if vertices_3d.len() < 3 {
        return Vec::new();
    }

    let indices = match earcut(&coords_2d, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };

    let mut out: Vec<Vec3> = Vec::with_capacity(indices.len());
    for idx in indices {
        if let Some(p) = vertices_3d.get(idx) {
            out.push(*p);
        }
    }
    out
}

/// Newell's method: robust polygon normal regardless of winding quirks.
fn newell_normal(ring: &[Vec3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

fn centroid(vertices: &[Vec3]) -> Vec3 {
    let mut sum = Vec3::ZERO;
    for v in vertices {
        sum = sum + *v;
    }
    sum.scale(1.0 / vertices.len() as f64)
}

fn drop_closing_duplicate(points: &mut Vec<Vec3>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first - last).length() < 1e-9 {
            points.pop();
        }
    }
}
