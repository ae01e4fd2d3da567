/// A pending change of mass: weighted coordinate sums plus a point count.
///
/// Storing sums rather than a centroid keeps deltas exactly combinable and
/// invertible: a merge is a positive delta, a split the negated one, and a
/// merge followed by the matching split combines to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClusterDelta {
    pub wx: f64,
    pub wy: f64,
    pub num_points: i64,
}

impl ClusterDelta {
    /// The mass of `num_points` points centred at `(x, y)`.
    pub fn of(x: f64, y: f64, num_points: u32) -> Self {
        let n = f64::from(num_points);
        Self {
            wx: x * n,
            wy: y * n,
            num_points: i64::from(num_points),
        }
    }

    pub fn negated(self) -> Self {
        Self {
            wx: -self.wx,
            wy: -self.wy,
            num_points: -self.num_points,
        }
    }

    pub fn combine(&mut self, other: &ClusterDelta) {
        self.wx += other.wx;
        self.wy += other.wy;
        self.num_points += other.num_points;
    }

    pub fn combined(mut self, other: &ClusterDelta) -> Self {
        self.combine(other);
        self
    }

    /// Centroid of the delta's mass, `None` when it carries no points.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.num_points == 0 {
            return None;
        }
        let n = self.num_points as f64;
        Some((self.wx / n, self.wy / n))
    }

    pub fn is_zero(&self) -> bool {
        self.num_points == 0 && self.wx == 0.0 && self.wy == 0.0
    }
}
