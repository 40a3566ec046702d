pub mod intersection;
pub mod vehicle;
