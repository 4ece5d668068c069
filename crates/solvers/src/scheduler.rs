//! Predictor–corrector scheduler of a burnup history.
//!
//! The history is a list of intervals, each split into steps. A step runs:
//!
//! 1. **Predictor**: transport on the beginning-of-step (BOS) composition,
//!    then deplete every owned material from BOS over the step and merge.
//! 2. **Corrector** (optional): transport on the predicted composition,
//!    average the predictor and corrector tallies, re-deplete from BOS, and
//!    merge. In self-iterating mode the corrector repeats until the largest
//!    relative density change falls below the tolerance or the iteration
//!    limit is reached.
//! 3. **Advance**: accumulate burnup, energy, and burn time.
//!
//! Decay and activation intervals skip transport and the corrector; decay
//! steps deplete with zero flux, activation steps with the tallies of the
//! last transport solve. The last interval gets one extra step that only
//! runs transport on the final composition and writes the final checkpoint.
//!
//! # Example
//!
//! ```ignore
//! use burnup_solvers::{exponential::ExponentialSolver, scheduler::Scheduler};
//! use burnup_core::SoloCommunicator;
//!
//! let mut scheduler =
//!     Scheduler::new(&network, &config, engine, ExponentialSolver, SoloCommunicator)?;
//! let solution = scheduler.run_unobserved(&mut materials)?;
//! ```

mod action;
mod error;
mod event;
mod solution;
mod state;


pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status, StepRecord};

use std::io::{self, Write};

use burnup_core::{
    Communicator, ContractViolation, CoupledProgram, DepletionConfig, DepletionSolver, Material,
    NuclideNetwork, Observer, TransportEngine, TransportRequest, TransportResult, Uncoupled,
    config::{Interval, Population, PrintInterval},
    truncate_flux, units,
};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::{
    activity,
    checkpoint::CheckpointWriter,
    merge::merge_compositions,
    reprocessing::Reprocessing,
    step_size,
    transmutation::MatrixBuilder,
};

use state::{RunState, Snapshot, decay_totals, max_relative_change};

/// Drives one worker through the burnup history.
///
/// Every worker of a run builds its own scheduler over its own copy of the
/// materials; the communicator keeps them in lockstep.
pub struct Scheduler<'a, T, S, C, P = Uncoupled, W = io::Sink>
where
    W: Write,
{
    network: &'a NuclideNetwork,
    config: &'a DepletionConfig,
    engine: T,
    solver: S,
    comm: C,
    coupled: P,
    checkpoint: Option<CheckpointWriter<W>>,
}

impl<'a, T, S, C> Scheduler<'a, T, S, C> {
    /// Creates an uncoupled scheduler without a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(
        network: &'a NuclideNetwork,
        config: &'a DepletionConfig,
        engine: T,
        solver: S,
        comm: C,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            network,
            config,
            engine,
            solver,
            comm,
            coupled: Uncoupled,
            checkpoint: None,
        })
    }
}

impl<'a, T, S, C, P, W> Scheduler<'a, T, S, C, P, W>
where
    W: Write,
{
    /// Attaches an externally coupled program.
    pub fn with_coupled<Q>(self, coupled: Q) -> Scheduler<'a, T, S, C, Q, W> {
        Scheduler {
            network: self.network,
            config: self.config,
            engine: self.engine,
            solver: self.solver,
            comm: self.comm,
            coupled,
            checkpoint: self.checkpoint,
        }
    }

    /// Writes checkpoint records to `writer` according to the print policy.
    ///
    /// Only rank 0 writes.
    pub fn with_checkpoint<V: Write>(self, writer: V) -> Scheduler<'a, T, S, C, P, V> {
        Scheduler {
            network: self.network,
            config: self.config,
            engine: self.engine,
            solver: self.solver,
            comm: self.comm,
            coupled: self.coupled,
            checkpoint: Some(CheckpointWriter::new(writer)),
        }
    }

    pub fn engine(&self) -> &T {
        &self.engine
    }

    pub fn coupled(&self) -> &P {
        &self.coupled
    }

    /// Consumes the scheduler and returns the checkpoint writer's sink.
    pub fn into_checkpoint(self) -> Option<W> {
        self.checkpoint.map(CheckpointWriter::into_inner)
    }
}

impl<T, S, C, P, W> Scheduler<'_, T, S, C, P, W>
where
    T: TransportEngine,
    S: DepletionSolver + Sync,
    C: Communicator,
    P: CoupledProgram,
    W: Write,
{
    /// Runs the whole history over `materials`.
    ///
    /// Compositions of burnable materials are first closed over the network,
    /// so every chain member has a matrix slot. With `refresh_inventory` set
    /// they only get the daughters of their populated nuclides, and grow
    /// after every step as new nuclides fill up.
    ///
    /// # Observer
    ///
    /// The observer receives every [`Event`] and may return
    /// [`Action::Break`] to stop at the next step boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if a mass flow names an unknown material, a
    /// collaborator fails, an invariant is violated, or no burn time elapsed
    /// over the whole history. On error the communicator is aborted, so
    /// peers waiting in a collective do not wait forever.
    pub fn run<O>(&mut self, materials: &mut [Material], mut observer: O) -> Result<Solution, Error>
    where
        O: Observer<Event, Action>,
    {
        let result = self.run_history(materials, &mut observer);
        if let Err(error) = &result {
            warn!(rank = self.comm.rank(), %error, "aborting run");
            self.comm.abort();
        }
        result
    }

    /// Runs the whole history without observation.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::run`].
    pub fn run_unobserved(&mut self, materials: &mut [Material]) -> Result<Solution, Error> {
        self.run(materials, ())
    }

    fn run_history<O>(
        &mut self,
        materials: &mut [Material],
        observer: &mut O,
    ) -> Result<Solution, Error>
    where
        O: Observer<Event, Action>,
    {
        let config = self.config;
        let mut state = RunState::new();

        Reprocessing::check_materials(&config.intervals, materials)?;

        for material in materials.iter_mut().filter(|m| m.burnable) {
            if config.refresh_inventory {
                material.composition.refresh_daughters(self.network);
            } else {
                material.composition.close_over(self.network);
            }
        }

        let last = config.intervals.len() - 1;
        let mut status = Status::Complete;

        'history: for (index, interval) in config.intervals.iter().enumerate() {
            state.context.begin_interval(index);
            let reprocessing = Reprocessing::install(interval, self.network, materials)?;
            let steps = interval.steps + usize::from(index == last);

            info!(
                interval = index,
                step_type = %interval.step_type,
                steps,
                "starting interval"
            );
            let context = state.context;
            state.emit(
                observer,
                Event::IntervalStarted {
                    context,
                    step_type: interval.step_type,
                    steps,
                },
            );

            for step in 0..steps {
                if state.break_requested || self.coupled.history_break(&state.context) {
                    self.flush_on_break(&state, materials)?;
                    status = Status::StoppedByBreak;
                    break 'history;
                }

                let record = if index == last && step == interval.steps {
                    self.final_step(&mut state, interval, materials, observer)?
                } else {
                    self.run_step(
                        &mut state,
                        interval,
                        &reprocessing,
                        materials,
                        observer,
                    )?
                };

                let context = state.context;
                state.emit(
                    observer,
                    Event::StepCompleted {
                        context,
                        record: record.clone(),
                    },
                );
                state.history.push(record);
            }
        }

        if let Some(writer) = self.checkpoint.as_mut() {
            writer.flush()?;
        }

        let context = state.context;
        state.emit(observer, Event::HistoryComplete { context });
        info!(
            steps = state.history.len(),
            burnup = context.burnup,
            burn_days = context.burn_time / units::SECONDS_PER_DAY,
            ?status,
            "history complete"
        );

        if context.burn_time <= 0.0 {
            return Err(ContractViolation::NoBurnTime.into());
        }

        let (decay_heat, activity) = decay_totals(self.network, materials);
        Ok(Solution {
            status,
            context,
            steps: state.history.len(),
            history: state.history,
            decay_heat,
            activity,
        })
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(interval = state.context.interval, step = state.context.step)
    )]
    fn run_step<O>(
        &mut self,
        state: &mut RunState,
        interval: &Interval,
        reprocessing: &Reprocessing,
        materials: &mut [Material],
        observer: &mut O,
    ) -> Result<StepRecord, Error>
    where
        O: Observer<Event, Action>,
    {
        let config = self.config;
        let network = self.network;
        let position = state.context;
        state.context.begin_step();

        let time = state.context.burn_time;
        let bos = Snapshot::take(network, materials);
        let skips_transport = interval.step_type.skips_transport();

        debug!("predictor");
        let predictor = if skips_transport {
            state.frozen_tallies(interval.step_type, materials.len())
        } else {
            let tallies = self.transport(state, interval, config.population, materials, observer)?;
            state.last_transport = Some(tallies.clone());
            tallies
        };

        // Checkpoint of the beginning-of-step state.
        self.write_checkpoint(state, materials, false)?;

        if !skips_transport {
            let heavy_metal = burnable_heavy_metal(materials, &bos);
            if heavy_metal > 0.0 {
                let specific = units::megawatts(units::watts(predictor.total_power())) / heavy_metal;
                state.power_history.push(time, specific);
            }
        }
        let dt = step_size::step_length(position.interval, interval, &state.power_history, time)?;

        let mut builder =
            MatrixBuilder::new(network, self.comm.rank()).with_reprocessing(reprocessing);
        if config.refresh_inventory {
            builder = builder.with_lazy_inventory();
        }
        self.deplete(&builder, materials, &bos, &predictor, time, dt)?;
        self.merge(state, materials, observer)?;

        let mut tallies = predictor.clone();
        let mut iterations = 0;
        let mut converged = None;

        let corrector =
            config.corrector && !skips_transport && !self.coupled.skip_corrector(&state.context);
        if corrector {
            state.context.enter_corrector();
            loop {
                state.context.corrector_iteration = iterations;
                if iterations == 0 {
                    self.notify_boundary(state, observer)?;
                }
                debug!(iteration = iterations, "corrector");

                let population: Population = config.corrector_population();
                let corrected = self.transport(state, interval, population, materials, observer)?;
                let averaged = predictor.average(&corrected);

                let previous: Vec<Vec<f64>> = if config.sie {
                    materials
                        .iter()
                        .map(|m| m.composition.densities().to_vec())
                        .collect()
                } else {
                    Vec::new()
                };

                self.deplete(&builder, materials, &bos, &averaged, time, dt)?;
                self.merge(state, materials, observer)?;
                tallies = averaged;
                iterations += 1;

                if !config.sie {
                    break;
                }
                let change = max_relative_change(&previous, materials);
                if change < config.sie_tolerance {
                    converged = Some(true);
                    break;
                }
                if iterations >= config.max_corrector_iterations {
                    warn!(
                        iterations,
                        change,
                        tolerance = config.sie_tolerance,
                        "corrector did not converge, advancing"
                    );
                    converged = Some(false);
                    break;
                }

                let context = state.context;
                state.emit(observer, Event::CorrectorRepeated { context, change });
            }
        } else {
            self.notify_boundary(state, observer)?;
        }

        let power = tallies.total_power();
        let energy = units::megawatts(units::watts(power)) * dt / units::SECONDS_PER_DAY;
        let heavy_metal = burnable_heavy_metal(materials, &bos);
        let burnup = if heavy_metal > 0.0 {
            energy / heavy_metal
        } else {
            0.0
        };
        state.context.advance(burnup, energy, dt);

        let (decay_heat, activity) = decay_totals(network, materials);
        let decay_heat_fit = if skips_transport {
            state
                .decay_heat_points
                .push((state.context.burn_time, decay_heat));
            activity::fit_decay_heat(&state.decay_heat_points)
        } else {
            state.decay_heat_points.clear();
            None
        };

        if config.refresh_inventory {
            let added: usize = materials
                .iter_mut()
                .filter(|m| m.burnable)
                .map(|m| m.composition.refresh_daughters(network))
                .sum();
            debug!(added, "refreshed inventory");
        }

        info!(
            global_step = position.global_step,
            dt,
            burnup = state.context.burnup,
            power,
            corrector_iterations = iterations,
            "step complete"
        );

        Ok(StepRecord {
            interval: position.interval,
            step: position.step,
            global_step: position.global_step,
            dt,
            power,
            burnup: state.context.burnup,
            burn_time: state.context.burn_time,
            corrector_iterations: iterations,
            converged,
            decay_heat,
            activity,
            decay_heat_fit,
            transport_only: false,
        })
    }

    /// The extra last step: transport on the final composition only.
    fn final_step<O>(
        &mut self,
        state: &mut RunState,
        interval: &Interval,
        materials: &mut [Material],
        observer: &mut O,
    ) -> Result<StepRecord, Error>
    where
        O: Observer<Event, Action>,
    {
        let position = state.context;
        state.context.begin_step();

        let power = if interval.step_type.skips_transport() {
            0.0
        } else {
            let tallies =
                self.transport(state, interval, self.config.population, materials, observer)?;
            let power = tallies.total_power();
            state.last_transport = Some(tallies);
            power
        };
        self.write_checkpoint(state, materials, true)?;
        state.context.advance(0.0, 0.0, 0.0);

        let (decay_heat, activity) = decay_totals(self.network, materials);
        debug!(global_step = position.global_step, "final transport step");

        Ok(StepRecord {
            interval: position.interval,
            step: position.step,
            global_step: position.global_step,
            dt: 0.0,
            power,
            burnup: state.context.burnup,
            burn_time: state.context.burn_time,
            corrector_iterations: 0,
            converged: None,
            decay_heat,
            activity,
            decay_heat_fit: None,
            transport_only: true,
        })
    }

    /// Runs transport and reduces the per-material tallies over all workers.
    fn transport<O>(
        &mut self,
        state: &mut RunState,
        interval: &Interval,
        population: Population,
        materials: &[Material],
        observer: &mut O,
    ) -> Result<TransportResult, Error>
    where
        O: Observer<Event, Action>,
    {
        let request = TransportRequest {
            context: state.context,
            normalization: interval.normalization,
            population,
            time: state.context.burn_time,
        };
        let mut result = self
            .engine
            .solve(&request, materials)
            .map_err(Error::transport)?;

        let n = materials.len();
        for (what, found) in [
            ("flux", result.flux.len()),
            ("power", result.power.len()),
            ("fission rate", result.fission_rate.len()),
        ] {
            if found != n {
                return Err(Error::TallyLength {
                    what,
                    expected: n,
                    found,
                });
            }
        }

        let mut partials = Vec::with_capacity(3 * n);
        partials.extend_from_slice(&result.flux);
        partials.extend_from_slice(&result.power);
        partials.extend_from_slice(&result.fission_rate);
        self.comm.sum_reduce(&mut partials);

        result.flux = partials[..n].iter().map(|&f| truncate_flux(f)).collect();
        result.power = partials[n..2 * n].to_vec();
        result.fission_rate = partials[2 * n..].to_vec();

        let power = result.total_power();
        debug!(phase = ?state.context.phase, power, "transport solved");
        let context = state.context;
        state.emit(observer, Event::TransportSolved { context, power });
        Ok(result)
    }

    /// Advances every owned material from its BOS state over `dt`.
    fn deplete(
        &self,
        builder: &MatrixBuilder<'_>,
        materials: &mut [Material],
        bos: &[Snapshot],
        tallies: &TransportResult,
        time: f64,
        dt: f64,
    ) -> Result<(), Error> {
        let matrices = builder.build_all(materials, &tallies.rates, &tallies.flux, time)?;

        let solver = &self.solver;
        let solved = matrices
            .into_par_iter()
            .map(|(position, built)| {
                solver
                    .solve(&built.matrix, &bos[position].densities, dt)
                    .map(|densities| (position, densities))
                    .map_err(Error::solver)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        for (position, densities) in solved {
            let material = &mut materials[position];
            material
                .composition
                .set_densities(&densities)
                .map_err(|source| ContractViolation::Composition {
                    material: material.name.clone(),
                    source,
                })?;
            let power = units::watts(tallies.power[position]);
            material.burnup = bos[position].burnup
                + units::burnup_increment(power, bos[position].heavy_metal, dt);
        }
        Ok(())
    }

    fn merge<O>(
        &self,
        state: &mut RunState,
        materials: &mut [Material],
        observer: &mut O,
    ) -> Result<(), Error>
    where
        O: Observer<Event, Action>,
    {
        let report = merge_compositions(&self.comm, self.network, materials)?;
        let context = state.context;
        state.emit(observer, Event::Merged { context, report });
        Ok(())
    }

    /// Notifies the coupled program once per step and refreshes interfaces.
    fn notify_boundary<O>(&mut self, state: &mut RunState, observer: &mut O) -> Result<(), Error>
    where
        O: Observer<Event, Action>,
    {
        if state.context.mark_notified() {
            let context = state.context;
            state.emit(observer, Event::StepBoundary { context });
        }
        self.coupled
            .refresh_interfaces(&state.context)
            .map_err(Error::Coupling)
    }

    fn write_checkpoint(
        &mut self,
        state: &RunState,
        materials: &[Material],
        final_state: bool,
    ) -> Result<(), Error> {
        let Some(writer) = self.checkpoint.as_mut() else {
            return Ok(());
        };
        let due = match self.config.print_interval {
            PrintInterval::All => true,
            PrintInterval::FinalOnly => final_state,
            PrintInterval::None => false,
        };
        if due && self.comm.rank() == 0 {
            writer.write_step(self.network, &state.context, materials)?;
        }
        Ok(())
    }

    fn flush_on_break(&mut self, state: &RunState, materials: &[Material]) -> Result<(), Error> {
        let (decay_heat, activity) = decay_totals(self.network, materials);
        info!(
            global_step = state.context.global_step,
            decay_heat,
            activity,
            "history break"
        );
        self.write_checkpoint(state, materials, true)?;
        if let Some(writer) = self.checkpoint.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Heavy-metal mass (kg) of the burnable materials at BOS.
fn burnable_heavy_metal(materials: &[Material], bos: &[Snapshot]) -> f64 {
    materials
        .iter()
        .zip(bos)
        .filter(|(m, _)| m.burnable)
        .map(|(_, s)| s.heavy_metal)
        .sum()
}
