use glam::{DVec2, IVec2};

/// Per-axis affine map: `p * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    scale: DVec2,
    offset: DVec2,
}

impl Transform {
    pub fn new(scale: DVec2, offset: DVec2) -> Self {
        Transform { scale, offset }
    }

    /// Grid cells to world units, with cell (0, 0) landing on the centre of the first cell.
    pub fn grid(cell_size: f64) -> Self {
        Transform::new(DVec2::splat(cell_size), DVec2::splat(cell_size / 2.0))
    }

    pub fn project(&self, p: DVec2) -> DVec2 {
        p * self.scale + self.offset
    }

    // Divides rather than multiplying by a precomputed inverse, so whole cells map back exactly.
    pub fn unproject(&self, p: DVec2) -> DVec2 {
        (p - self.offset) / self.scale
    }
}

/// Half-open rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Area {
    pub min: DVec2,
    pub max: DVec2,
}

impl Area {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Area { min, max }
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

/// Every grid point from `from` to `to` inclusive, interpolated along the segment.
/// The number of steps is the Euclidean length of the segment, rounded.
pub fn segment_cells(from: IVec2, to: IVec2) -> impl Iterator<Item = IVec2> {
    let (a, b) = (from.as_dvec2(), to.as_dvec2());
    let steps = a.distance(b).round() as i32;

    (0..=steps).map(move |i| {
        if steps == 0 {
            from
        } else {
            a.lerp(b, f64::from(i) / f64::from(steps)).round().as_ivec2()
        }
    })
}
