pub mod pdptw;
pub mod travel_matrix;

/// Numeric type for all distance and time arithmetic. Distances are integral
/// (rounded Euclidean or explicit matrix entries) and therefore exact in f64;
/// travel times may be fractional when a speed factor is supplied.
pub type Num = f64;

pub type RequestId = usize;

pub struct Arc {
    pub from: usize,
    pub to: usize,
    pub distance: Num,
    pub time: Num,
}
