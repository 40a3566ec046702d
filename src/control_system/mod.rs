pub mod emergency;
pub mod relay;
pub mod traffic_light_controller;
