use std::{sync::mpsc, thread};

use approx::assert_relative_eq;
use burnup_core::{
    DepletionConfig, Observer, SoloCommunicator,
    config::{Interval, IntervalSpan, MassFlow, Normalization, StepType},
};
use burnup_observers::{BurnupLimit, ChannelNotifier, LogObserver, Notification, Recorder};
use burnup_solvers::{
    exponential::ExponentialSolver,
    scheduler::{Action, Event, Scheduler, Status},
};
use integration_tests::{Chain, EngineError, PinEngine};

const HISTORY: &str = r#"
    corrector = true
    sie = true
    max_corrector_iterations = 6
    sie_tolerance = 1.0e-5

    [[intervals]]
    step_type = "burnup"
    steps = 4
    span = { burnup = 2.0 }
    normalization = { power = 2.0e4 }

    [[intervals]]
    step_type = "decay-step"
    steps = 3
    span = { days = 100.0 }
    normalization = { power = 0.0 }
"#;

#[test]
fn burnup_then_cooldown_from_toml() {
    let chain = Chain::new();
    let config = DepletionConfig::from_toml_str(HISTORY).unwrap();
    let mut scheduler = Scheduler::new(
        &chain.network,
        &config,
        PinEngine::new(&chain, 0),
        ExponentialSolver,
        SoloCommunicator,
    )
    .unwrap();

    let mut materials = chain.pins(2, 1);
    let mut log = LogObserver::new();
    let mut recorder = Recorder::<Event>::new();
    let solution = scheduler
        .run(&mut materials, |event: &Event| {
            Observer::<Event, Action>::observe(&mut log, event);
            Observer::<Event, Action>::observe(&mut recorder, event)
        })
        .unwrap();

    assert_eq!(solution.status, Status::Complete);
    assert_eq!(solution.steps, 4 + 3 + 1);
    assert_relative_eq!(solution.context.burnup, 2.0, max_relative = 1e-2);

    let history = &solution.history;
    assert!(history[..4].iter().all(|r| r.converged == Some(true)));
    assert!(history.windows(2).all(|w| w[1].burnup >= w[0].burnup));
    assert!(history.windows(2).all(|w| w[1].burn_time >= w[0].burn_time));

    // Decay heat falls off during the cooldown and is fitted.
    let cooling = &history[4..7];
    assert!(cooling.windows(2).all(|w| w[1].decay_heat < w[0].decay_heat));
    assert!(cooling.iter().all(|r| r.power == 0.0));
    assert!(cooling[2].decay_heat_fit.is_some());

    assert_eq!(
        recorder.count(|e| matches!(e, Event::StepBoundary { .. })),
        7
    );
    assert_eq!(
        recorder.count(|e| matches!(e, Event::HistoryComplete { .. })),
        1
    );
    assert_eq!(log.logged(), solution.steps);
}

#[test]
fn burnup_limit_stops_early() {
    let chain = Chain::new();
    let config = DepletionConfig::from_toml_str(HISTORY).unwrap();
    let mut scheduler = Scheduler::new(
        &chain.network,
        &config,
        PinEngine::new(&chain, 0),
        ExponentialSolver,
        SoloCommunicator,
    )
    .unwrap();

    let mut materials = chain.pins(2, 1);
    let solution = scheduler
        .run(&mut materials, BurnupLimit::new(1.0))
        .unwrap();

    assert_eq!(solution.status, Status::StoppedByBreak);
    assert!(solution.context.burnup >= 1.0);
    assert!(solution.steps < 4);
}

#[test]
fn coupled_program_hears_every_boundary() {
    let chain = Chain::new();
    let config = DepletionConfig::from_toml_str(HISTORY).unwrap();
    let (tx, rx) = mpsc::channel();

    let listener = thread::spawn(move || {
        let mut boundaries = 0;
        for notification in rx {
            match notification {
                Notification::StepBoundary(_) => boundaries += 1,
                Notification::HistoryComplete(_) => break,
            }
        }
        boundaries
    });

    let mut scheduler = Scheduler::new(
        &chain.network,
        &config,
        PinEngine::new(&chain, 0),
        ExponentialSolver,
        SoloCommunicator,
    )
    .unwrap();
    let mut materials = chain.pins(1, 1);
    scheduler
        .run(&mut materials, ChannelNotifier::new(tx))
        .unwrap();

    assert_eq!(listener.join().unwrap(), 7);
}

#[test]
fn mass_flow_removes_an_element() {
    let chain = Chain::new();
    let interval = |mass_flows| Interval {
        step_type: StepType::Burnup,
        span: IntervalSpan::Days(90.0),
        steps: 3,
        normalization: Normalization::Power(2.0e4),
        mass_flows,
    };
    let plain = DepletionConfig::new(vec![interval(Vec::new())]);
    let stripped = DepletionConfig::new(vec![interval(vec![MassFlow {
        material: "pin0".to_owned(),
        element: 55,
        removal_constant: 1.0e-6,
    }])]);

    let run = |config: &DepletionConfig| {
        let mut materials = chain.pins(1, 1);
        Scheduler::new(
            &chain.network,
            config,
            PinEngine::new(&chain, 0),
            ExponentialSolver,
            SoloCommunicator,
        )
        .unwrap()
        .run_unobserved(&mut materials)
        .unwrap();
        materials.remove(0)
    };

    let kept = run(&plain);
    let removed = run(&stripped);

    let lost = chain.network.lost();
    assert!(kept.composition.density(lost).is_none());
    assert!(removed.composition.density(lost).unwrap() > 0.0);
    assert!(
        removed.composition.density(chain.cs137).unwrap()
            < 0.5 * kept.composition.density(chain.cs137).unwrap()
    );
    assert_relative_eq!(
        removed.composition.density(chain.sr90).unwrap(),
        kept.composition.density(chain.sr90).unwrap(),
        max_relative = 1e-9
    );
}

#[test]
fn engine_errors_surface() {
    let chain = Chain::new();
    let config = DepletionConfig::new(vec![Interval {
        step_type: StepType::Burnup,
        span: IntervalSpan::Days(10.0),
        steps: 1,
        normalization: Normalization::Flux(1.0e14),
        mass_flows: Vec::new(),
    }]);
    let mut scheduler = Scheduler::new(
        &chain.network,
        &config,
        PinEngine::new(&chain, 0),
        ExponentialSolver,
        SoloCommunicator,
    )
    .unwrap();

    let mut materials = chain.pins(1, 1);
    let err = scheduler.run_unobserved(&mut materials).unwrap_err();
    let source = std::error::Error::source(&err)
        .and_then(|e| e.downcast_ref::<EngineError>())
        .unwrap();
    assert_eq!(
        source,
        &EngineError::Unsupported(Normalization::Flux(1.0e14))
    );
}
