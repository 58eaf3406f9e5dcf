use crate::problem::{Arc, Num};

#[derive(Debug, Clone, Copy)]
pub struct ArcValues {
    pub distance: Num,
    pub time: Num,
}

impl Default for ArcValues {
    fn default() -> Self {
        ArcValues {
            distance: Num::MAX,
            time: Num::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixSizedTravelMatrix {
    n: usize,
    data: Vec<ArcValues>,
    max_distance: Num,
    max_time: Num,
}

impl FixSizedTravelMatrix {
    /// Distances rounded to the nearest integer, travel time equal to distance
    /// unless a speed factor other than 1 is supplied.
    pub fn with_euclidean_distances(coords: &[(f64, f64)], speed: f64) -> Self {
        let n = coords.len();
        let mut data = vec![ArcValues::default(); n * n];

        let mut max_distance = 0.0;
        let mut max_time = 0.0;
        for i in 0..n {
            for j in 0..n {
                let idx = i * n + j;
                if i == j {
                    data[idx] = ArcValues {
                        distance: 0.0,
                        time: 0.0,
                    };
                } else {
                    let (xi, yi) = coords[i];
                    let (xj, yj) = coords[j];
                    let euclidean = ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt();
                    let distance = euclidean.round();
                    let time = if speed > 0.0 { distance / speed } else { distance };
                    if distance > max_distance {
                        max_distance = distance;
                    }
                    if time > max_time {
                        max_time = time;
                    }
                    data[idx] = ArcValues { distance, time };
                }
            }
        }

        Self {
            n,
            data,
            max_distance,
            max_time,
        }
    }

    #[inline(always)]
    fn idx(&self, from: usize, to: usize) -> usize {
        debug_assert!(from < self.n);
        debug_assert!(to < self.n);
        from * self.n + to
    }

    #[inline(always)]
    pub fn distance(&self, from: usize, to: usize) -> Num {
        self.data[self.idx(from, to)].distance
    }

    #[inline(always)]
    pub fn time(&self, from: usize, to: usize) -> Num {
        self.data[self.idx(from, to)].time
    }

    #[inline(always)]
    pub fn arc(&self, from: usize, to: usize) -> &ArcValues {
        &self.data[self.idx(from, to)]
    }

    #[inline(always)]
    pub fn max_distance(&self) -> Num {
        self.max_distance
    }

    #[inline(always)]
    pub fn max_time(&self) -> Num {
        self.max_time
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_symmetric(&self) -> bool {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.data[self.idx(i, j)].distance != self.data[self.idx(j, i)].distance {
                    return false;
                }
            }
        }
        true
    }
}

pub struct FixSizedTravelMatrixBuilder {
    n: usize,
    data: Vec<ArcValues>,
    max_distance: Num,
    max_time: Num,
}

impl FixSizedTravelMatrixBuilder {
    pub fn with_num_nodes(num_nodes: usize) -> Self {
        let mut data = vec![ArcValues::default(); num_nodes * num_nodes];
        for i in 0..num_nodes {
            data[i * num_nodes + i] = ArcValues {
                distance: 0.0,
                time: 0.0,
            };
        }
        Self {
            n: num_nodes,
            data,
            max_distance: 0.0,
            max_time: 0.0,
        }
    }

    pub fn set_arc(&mut self, arc: Arc) -> &mut Self {
        if arc.distance > self.max_distance {
            self.max_distance = arc.distance;
        }
        if arc.time > self.max_time {
            self.max_time = arc.time;
        }
        self.data[arc.from * self.n + arc.to] = ArcValues {
            distance: arc.distance,
            time: arc.time,
        };
        self
    }

    pub fn build(self) -> FixSizedTravelMatrix {
        FixSizedTravelMatrix {
            n: self.n,
            data: self.data,
            max_distance: self.max_distance,
            max_time: self.max_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_distances_are_rounded_to_nearest_integer() {
        let coords = vec![(0.0, 0.0), (3.0, 4.0), (1.0, 1.0)];
        let matrix = FixSizedTravelMatrix::with_euclidean_distances(&coords, 1.0);
        assert_eq!(matrix.distance(0, 1), 5.0);
        // sqrt(2) = 1.414... rounds to 1
        assert_eq!(matrix.distance(0, 2), 1.0);
        assert_eq!(matrix.distance(1, 1), 0.0);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn speed_factor_scales_travel_times_only() {
        let coords = vec![(0.0, 0.0), (10.0, 0.0)];
        let matrix = FixSizedTravelMatrix::with_euclidean_distances(&coords, 2.0);
        assert_eq!(matrix.distance(0, 1), 10.0);
        assert_eq!(matrix.time(0, 1), 5.0);
    }

    #[test]
    fn builder_produces_explicit_matrix() {
        let mut builder = FixSizedTravelMatrixBuilder::with_num_nodes(2);
        builder.set_arc(Arc {
            from: 0,
            to: 1,
            distance: 7.0,
            time: 7.0,
        });
        builder.set_arc(Arc {
            from: 1,
            to: 0,
            distance: 7.0,
            time: 7.0,
        });
        let matrix = builder.build();
        assert_eq!(matrix.distance(0, 1), 7.0);
        assert_eq!(matrix.max_distance(), 7.0);
        assert!(matrix.is_symmetric());
    }
}
