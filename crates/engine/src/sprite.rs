use foundation::color::Rgba;

/// CPU-rasterized RGBA8 image, row-major, straight alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Sprite {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
}

/// Rasterizes a filled, optionally stroked circle marker.
///
/// `size` is the circle radius in pixels; padding leaves room for the stroke
/// so the ring never clips against the sprite edge.
pub fn circle_sprite(size: f64, fill: Rgba, stroke: Option<Stroke>) -> Sprite {
    let radius = size.max(1.0);
    let stroke_width = stroke.map(|s| s.width.max(0.0)).unwrap_or(0.0);
    let pad = stroke_width.max(1.0) + 1.0;
    let side = ((radius * 2.0) + pad * 2.0).ceil() as u32;
    let center = side as f64 / 2.0;

    let mut pixels = vec![0u8; (side * side * 4) as usize];
    for y in 0..side {
        for x in 0..side {
            let dx = x as f64 + 0.5 - center;
            let dy = y as f64 + 0.5 - center;
            let d = (dx * dx + dy * dy).sqrt();

            // One-pixel feathered coverage for fill and stroke ring.
            let fill_cov = (radius - d + 0.5).clamp(0.0, 1.0) as f32;
            let stroke_cov = match stroke {
                Some(s) if s.width > 0.0 => {
                    ((s.width / 2.0) - (d - radius).abs() + 0.5).clamp(0.0, 1.0) as f32
                }
                _ => 0.0,
            };

            let mut r = fill.r * fill.a * fill_cov;
            let mut g = fill.g * fill.a * fill_cov;
            let mut b = fill.b * fill.a * fill_cov;
            let mut a = fill.a * fill_cov;

            if let Some(s) = stroke
                && stroke_cov > 0.0
            {
                let sa = s.color.a * stroke_cov;
                r = s.color.r * sa + r * (1.0 - sa);
                g = s.color.g * sa + g * (1.0 - sa);
                b = s.color.b * sa + b * (1.0 - sa);
                a = sa + a * (1.0 - sa);
            }

            let i = ((y * side + x) * 4) as usize;
            // Un-premultiply back to straight alpha for storage.
            let inv = if a > 0.0 { 1.0 / a } else { 0.0 };
            pixels[i] = ((r * inv).clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels[i + 1] = ((g * inv).clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels[i + 2] = ((b * inv).clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels[i + 3] = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }

    Sprite {
        width: side,
        height: side,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::{Stroke, circle_sprite};
    use foundation::color::Rgba;

    #[test]
    fn sprite_is_square_with_stroke_padding() {
        let s = circle_sprite(8.0, Rgba::opaque(1.0, 0.0, 0.0), Some(Stroke {
            color: Rgba::opaque(1.0, 1.0, 1.0),
            width: 2.0,
        }));
        assert_eq!(s.width, s.height);
        assert_eq!(s.width, 22); // 2*8 + 2*(2+1)
        assert_eq!(s.pixels.len(), (22 * 22 * 4) as usize);
    }

    #[test]
    fn center_is_fill_and_corner_is_transparent() {
        let s = circle_sprite(8.0, Rgba::opaque(1.0, 0.0, 0.0), None);
        let c = s.pixel(s.width / 2, s.height / 2);
        assert_eq!(c[0], 255);
        assert_eq!(c[3], 255);
        assert_eq!(s.pixel(0, 0)[3], 0);
    }

    #[test]
    fn stroke_ring_shows_at_the_radius() {
        let s = circle_sprite(8.0, Rgba::opaque(1.0, 0.0, 0.0), Some(Stroke {
            color: Rgba::opaque(0.0, 0.0, 1.0),
            width: 3.0,
        }));
        // Walk right from center; at the radius the blue stroke dominates.
        let cy = s.height / 2;
        let cx = s.width / 2;
        let ring = s.pixel(cx + 8, cy);
        assert!(ring[2] > ring[0]);
        assert!(ring[3] > 0);
    }
}
