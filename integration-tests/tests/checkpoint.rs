use burnup_core::{
    DepletionConfig, SoloCommunicator,
    config::{Interval, IntervalSpan, Normalization, PrintInterval, StepType},
    units::SECONDS_PER_DAY,
};
use burnup_solvers::{
    checkpoint::CheckpointReader, exponential::ExponentialSolver, scheduler::Scheduler,
};
use integration_tests::{Chain, PinEngine};

fn run(print_interval: PrintInterval) -> (Chain, Vec<u8>, Vec<burnup_core::Material>) {
    let chain = Chain::new();
    let config = DepletionConfig {
        print_interval,
        ..DepletionConfig::new(vec![
            Interval {
                step_type: StepType::Burnup,
                span: IntervalSpan::Days(20.0),
                steps: 2,
                normalization: Normalization::Power(1.0e4),
                mass_flows: Vec::new(),
            },
            Interval {
                step_type: StepType::DecayTotal,
                span: IntervalSpan::Days(10.0),
                steps: 1,
                normalization: Normalization::Power(0.0),
                mass_flows: Vec::new(),
            },
        ])
    };

    let mut materials = chain.pins(3, 1);
    let mut scheduler = Scheduler::new(
        &chain.network,
        &config,
        PinEngine::new(&chain, 0),
        ExponentialSolver,
        SoloCommunicator,
    )
    .unwrap()
    .with_checkpoint(Vec::new());
    scheduler.run_unobserved(&mut materials).unwrap();
    let bytes = scheduler.into_checkpoint().unwrap();
    (chain, bytes, materials)
}

#[test]
fn every_step_is_recorded() {
    let (chain, bytes, materials) = run(PrintInterval::All);

    let mut reader = CheckpointReader::new(bytes.as_slice());
    let header = reader.read_header().unwrap();
    assert_eq!(header.materials, 3);
    assert_eq!(header.nuclides.len(), chain.network.len());

    let records = reader.records().unwrap();
    // Two burnup steps, one decay step, and the final state.
    assert_eq!(records.len(), 4 * 3);

    let steps: Vec<u32> = records.chunks(3).map(|c| c[0].step).collect();
    assert_eq!(steps, vec![0, 1, 2, 3]);
    assert_eq!(records[0].burnup_days, 0.0);
    assert_eq!(records[3].burnup_days, 10.0);

    let last = &records[9..];
    assert_eq!(last[0].burn_time, 30.0 * SECONDS_PER_DAY);
    for (record, material) in last.iter().zip(&materials) {
        assert_eq!(record.name, material.name);
        let expected: Vec<f64> = material
            .composition
            .densities()
            .iter()
            .copied()
            .filter(|&d| d != 0.0)
            .collect();
        let found: Vec<f64> = record.densities.iter().map(|&(_, d)| d).collect();
        assert_eq!(found, expected);
    }
}

#[test]
fn final_only_keeps_the_end_state() {
    let (_, bytes, materials) = run(PrintInterval::FinalOnly);

    let mut reader = CheckpointReader::new(bytes.as_slice());
    reader.read_header().unwrap();
    let records = reader.records().unwrap();

    assert_eq!(records.len(), materials.len());
    assert!(records.iter().all(|r| r.step == 3));
    assert!(records.iter().all(|r| r.burnup > 0.0));
}

#[test]
fn no_checkpoint_when_disabled() {
    let (_, bytes, _) = run(PrintInterval::None);
    assert!(bytes.is_empty());
}
