// benches/bench_parking_admission.rs
use criterion::{
    black_box, AxisScale, Criterion, PlotConfiguration, criterion_group, criterion_main,
};
use std::time::Duration;
use two_junction_sim::models::intersection::{IntersectionId, Side};
use two_junction_sim::models::vehicle::{Direction, Vehicle, VehicleAttributes, VehicleType};
use two_junction_sim::simulation_engine::parking::ParkingLot;

fn create_vehicles(count: usize) -> Vec<Vehicle> {
    (1..=count as u64)
        .map(|id| {
            Vehicle::new(
                id,
                VehicleAttributes {
                    vehicle_type: VehicleType::Car,
                    intersection: IntersectionId::F10,
                    side: Side::South,
                    direction: Direction::Straight,
                    wants_parking: true,
                    parking_time: Duration::from_secs(2),
                },
            )
        })
        .collect()
}

// Fill the lot, overflow into the wait queue, then drain both.
fn admit_all(lot: &ParkingLot, vehicles: &[Vehicle]) {
    for vehicle in vehicles {
        if !lot.try_acquire(vehicle) {
            black_box(lot.try_join_wait_queue(vehicle));
        }
    }
    for vehicle in vehicles {
        if !lot.release(vehicle.id) {
            lot.leave_wait_queue(vehicle.id);
        }
    }
}

fn bench_parking_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("parking_admission");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(
        PlotConfiguration::default().summary_scale(AxisScale::Linear),
    );

    for &size in [10, 15, 50].iter() {
        group.bench_function(format!("vehicles_{}", size), |b| {
            let lot = ParkingLot::new(IntersectionId::F10, 10, 5);
            let vehicles = create_vehicles(size);
            b.iter(|| admit_all(&lot, &vehicles));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parking_admission);
criterion_main!(benches);
