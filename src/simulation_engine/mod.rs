// simulation_engine/mod.rs
pub mod context;
pub mod intersections;
pub mod journey;
pub mod parking;
pub mod simulation;
pub mod vehicles;
