// benches/bench_traffic_light_controller.rs
use criterion::{
    black_box, AxisScale, Criterion, PlotConfiguration, criterion_group, criterion_main,
};
use std::time::Duration;
use two_junction_sim::control_system::traffic_light_controller::Phase;
use two_junction_sim::models::intersection::{IntersectionId, IntersectionState, LightState};

// Advances the cycle and applies each phase the way the relay does.
fn run_cycle(state: &mut IntersectionState, steps: usize) -> Phase {
    let mut phase = Phase::NorthSouthGreen;
    for _ in 0..steps {
        match phase.light() {
            LightState::Green => state.open_axis(phase.axis()),
            light => state.set_axis_light(phase.axis(), light),
        }
        phase = phase.next();
    }
    phase
}

fn bench_traffic_light_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("phase_cycle");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(
        PlotConfiguration::default().summary_scale(AxisScale::Linear),
    );

    for &steps in [60, 600, 6000].iter() {
        group.bench_function(format!("steps_{}", steps), |b| {
            let mut state = IntersectionState::new(IntersectionId::F11);
            b.iter(|| {
                black_box(run_cycle(&mut state, steps));
                black_box(state.signals_consistent());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_traffic_light_controller);
criterion_main!(benches);
