//! Simulation state machine and its background worker.
//!
//! A [`Simulation`] owns the stock and a toolpath. It runs in bursts: each
//! burst steps the tool along the path, carving the stock, until a stop
//! policy fires, the path runs out or the time budget elapses, then remeshes
//! the dirty tiles. [`Simulation::spawn`] moves it onto a worker thread and
//! returns a [`SimHandle`] for the GUI side.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use kerf_core::{rotate_x, Error, Result};
use kerf_stock::{SurfaceMesh, VoxelGrid};
use kerf_tool::Bit;
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tracing::{debug, info, trace_span};

use crate::backplot::Backplot;
use crate::toolpath::{StopPolicy, Toolpath};

/// Lifecycle of a simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SimState {
    /// Created, not yet primed
    #[default]
    Idle,
    /// Building the backplot preview
    Priming,
    /// Waiting for a resume
    Paused,
    /// Carving in bursts
    Running,
    /// Toolpath exhausted
    Done,
    /// Stopped on request
    Cancelled,
}

impl SimState {
    /// True for the terminal states.
    #[inline]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Priming => "priming",
            Self::Paused => "paused",
            Self::Running => "running",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Configuration for simulation bursts.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Wall-clock time a burst may run before the mesh is flushed.
    pub burst_budget: Duration,
    /// How often a paused worker checks for commands.
    pub poll_interval: Duration,
    /// Pause at the end of every toolpath segment.
    pub stop_after_segment: bool,
    /// Pause after passing a comment line.
    pub stop_after_comment: bool,
    /// Pause after every burst, even one cut short by the time budget.
    pub pause_after_burst: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            burst_budget: Duration::from_millis(500),
            poll_interval: Duration::from_millis(50),
            stop_after_segment: true,
            stop_after_comment: false,
            pause_after_burst: false,
        }
    }
}

impl SimConfig {
    #[must_use]
    pub fn with_burst_budget(mut self, budget: Duration) -> Self {
        self.burst_budget = budget;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_stop_after_segment(mut self, stop: bool) -> Self {
        self.stop_after_segment = stop;
        self
    }

    #[must_use]
    pub fn with_stop_after_comment(mut self, stop: bool) -> Self {
        self.stop_after_comment = stop;
        self
    }

    #[must_use]
    pub fn with_pause_after_burst(mut self, pause: bool) -> Self {
        self.pause_after_burst = pause;
        self
    }

    /// Stop policy handed to the toolpath.
    pub const fn policy(&self) -> StopPolicy {
        StopPolicy {
            after_segment: self.stop_after_segment,
            after_comment: self.stop_after_comment,
        }
    }
}

/// Statistics for one burst.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BurstReport {
    pub steps: usize,
    pub removed: usize,
    pub remeshed_tiles: usize,
    pub elapsed: Duration,
}

/// Running totals over the whole simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    pub steps: usize,
    pub removed: usize,
    pub bursts: usize,
}

/// Commands sent from the GUI side to the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimCommand {
    Resume,
    Pause,
    Cancel,
}

/// Notifications sent from the worker to the GUI side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    StateChanged(SimState),
    BurstFinished(BurstReport),
}

/// What a finished simulation hands back.
pub struct SimOutcome {
    pub grid: VoxelGrid,
    pub state: SimState,
    pub stats: SimStats,
}

impl fmt::Debug for SimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimOutcome")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("grid", &"<VoxelGrid>")
            .finish()
    }
}

/// A stock-removal simulation.
pub struct Simulation<T> {
    grid: VoxelGrid,
    bit: Arc<RwLock<Bit>>,
    backplot: Arc<RwLock<Backplot>>,
    toolpath: T,
    config: SimConfig,
    state: SimState,
    stats: SimStats,
    /// Mirror of `state` readable from other threads
    shared_state: Arc<Mutex<SimState>>,
    /// Set by the handle to end a burst early
    interrupt: Arc<AtomicBool>,
    events: Option<Sender<SimEvent>>,
}

impl<T: Toolpath> Simulation<T> {
    pub fn new(grid: VoxelGrid, bit: Bit, toolpath: T, config: SimConfig) -> Self {
        Self {
            grid,
            bit: Arc::new(RwLock::new(bit)),
            backplot: Arc::new(RwLock::new(Backplot::default())),
            toolpath,
            config,
            state: SimState::Idle,
            stats: SimStats::default(),
            shared_state: Arc::new(Mutex::new(SimState::Idle)),
            interrupt: Arc::new(AtomicBool::new(false)),
            events: None,
        }
    }

    #[inline]
    pub const fn state(&self) -> SimState {
        self.state
    }

    #[inline]
    pub const fn stats(&self) -> SimStats {
        self.stats
    }

    #[inline]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub const fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    #[inline]
    pub const fn toolpath(&self) -> &T {
        &self.toolpath
    }

    /// Shared handle to the tool. Tool changes replace its parts in place.
    pub fn bit(&self) -> Arc<RwLock<Bit>> {
        Arc::clone(&self.bit)
    }

    pub fn backplot(&self) -> Arc<RwLock<Backplot>> {
        Arc::clone(&self.backplot)
    }

    pub fn surface(&self) -> SurfaceMesh {
        self.grid.surface()
    }

    /// Walk the whole toolpath once to build the backplot, then rewind.
    /// The stock and the tool are left untouched.
    pub fn prime(&mut self) {
        if self.state != SimState::Idle {
            return;
        }
        self.set_state(SimState::Priming);

        let mut points = Vec::new();
        while let Some(pose) = self.toolpath.next_pose(StopPolicy::NEVER) {
            points.push(rotate_x(pose.position, -pose.a));
        }
        self.toolpath.rewind();
        debug!(points = points.len(), "backplot ready");
        self.backplot.write().set_points(points);

        self.set_state(SimState::Paused);
    }

    pub fn resume(&mut self) {
        if self.state == SimState::Paused {
            self.set_state(SimState::Running);
        }
    }

    pub fn pause(&mut self) {
        if self.state == SimState::Running {
            self.set_state(SimState::Paused);
        }
    }

    /// Stop for good. A finished simulation stays as it is.
    pub fn cancel(&mut self) {
        if !self.state.is_finished() {
            self.set_state(SimState::Cancelled);
        }
    }

    /// Advance the tool by one pose and carve. Returns the number of voxels
    /// removed, or `None` when the toolpath yields no pose.
    pub fn step(&mut self) -> Option<usize> {
        let pose = self.toolpath.next_pose(self.config.policy());
        if let Some(shape) = self.toolpath.take_tool_change() {
            info!(%shape, "tool change");
            self.bit.write().replace(shape.parts());
        }
        let pose = pose?;

        let mut bit = self.bit.write();
        bit.set_pose(pose.position, -pose.a);
        let bit = RwLockWriteGuard::downgrade(bit);
        let removed = self.grid.remove_intersection(&bit);
        drop(bit);

        self.backplot.write().incr_steps(1);
        self.stats.steps += 1;
        self.stats.removed += removed;
        Some(removed)
    }

    /// Run one burst and remesh. Does nothing unless running.
    pub fn run_burst(&mut self) -> BurstReport {
        let mut report = BurstReport::default();
        if self.state != SimState::Running {
            return report;
        }
        let _span = trace_span!("burst").entered();
        let started = Instant::now();

        let mut out_of_poses = false;
        loop {
            let Some(removed) = self.step() else {
                out_of_poses = true;
                break;
            };
            report.steps += 1;
            report.removed += removed;
            if started.elapsed() >= self.config.burst_budget
                || self.interrupt.load(Ordering::Relaxed)
            {
                break;
            }
        }

        report.remeshed_tiles = self.grid.marching_cubes();
        report.elapsed = started.elapsed();
        self.stats.bursts += 1;
        debug!(
            steps = report.steps,
            removed = report.removed,
            tiles = report.remeshed_tiles,
            elapsed_ms = report.elapsed.as_secs_f64() * 1e3,
            "burst finished"
        );
        self.emit(SimEvent::BurstFinished(report));

        if out_of_poses {
            if self.toolpath.has_more() {
                self.set_state(SimState::Paused);
            } else {
                self.set_state(SimState::Done);
            }
        } else if self.config.pause_after_burst {
            self.set_state(SimState::Paused);
        }
        report
    }

    /// Final mesh flush; hands back the stock.
    pub fn into_outcome(mut self) -> SimOutcome {
        self.grid.marching_cubes();
        SimOutcome {
            grid: self.grid,
            state: self.state,
            stats: self.stats,
        }
    }

    fn handle(&mut self, command: SimCommand) {
        match command {
            SimCommand::Resume => self.resume(),
            SimCommand::Pause => self.pause(),
            SimCommand::Cancel => self.cancel(),
        }
    }

    fn set_state(&mut self, state: SimState) {
        if self.state == state {
            return;
        }
        if matches!(state, SimState::Running | SimState::Paused) {
            debug!(from = %self.state, to = %state, "simulation state");
        } else {
            info!(from = %self.state, to = %state, "simulation state");
        }
        self.state = state;
        *self.shared_state.lock() = state;
        self.emit(SimEvent::StateChanged(state));
    }

    fn emit(&self, event: SimEvent) {
        if let Some(events) = &self.events {
            // Nobody listening is fine
            let _ = events.send(event);
        }
    }
}

impl<T: Toolpath + 'static> Simulation<T> {
    /// Move the simulation onto a worker thread. The worker primes the
    /// toolpath and then waits, paused, for [`SimHandle::resume`].
    pub fn spawn(mut self) -> Result<SimHandle> {
        let (command_tx, command_rx) = channel::unbounded::<SimCommand>();
        let (event_tx, event_rx) = channel::unbounded::<SimEvent>();
        self.events = Some(event_tx);

        let state = Arc::clone(&self.shared_state);
        let interrupt = Arc::clone(&self.interrupt);
        let bit = self.bit();
        let backplot = self.backplot();
        let surface = self.surface();

        let thread = thread::Builder::new()
            .name("kerf-sim".to_string())
            .spawn(move || self.worker_loop(&command_rx))?;

        Ok(SimHandle {
            commands: command_tx,
            events: event_rx,
            state,
            interrupt,
            bit,
            backplot,
            surface,
            thread: Some(thread),
        })
    }

    fn worker_loop(mut self, commands: &Receiver<SimCommand>) -> SimOutcome {
        self.prime();
        loop {
            self.interrupt.store(false, Ordering::Relaxed);
            loop {
                match commands.try_recv() {
                    Ok(command) => self.handle(command),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.cancel();
                        break;
                    }
                }
            }

            match self.state {
                SimState::Running => {
                    self.run_burst();
                }
                SimState::Done | SimState::Cancelled => break,
                SimState::Idle | SimState::Priming | SimState::Paused => {
                    match commands.recv_timeout(self.config.poll_interval) {
                        Ok(command) => self.handle(command),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => self.cancel(),
                    }
                }
            }
        }
        self.into_outcome()
    }
}

/// GUI-side handle to a simulation running on its worker thread.
///
/// Dropping the handle cancels the simulation and joins the worker.
pub struct SimHandle {
    commands: Sender<SimCommand>,
    events: Receiver<SimEvent>,
    state: Arc<Mutex<SimState>>,
    interrupt: Arc<AtomicBool>,
    bit: Arc<RwLock<Bit>>,
    backplot: Arc<RwLock<Backplot>>,
    surface: SurfaceMesh,
    thread: Option<JoinHandle<SimOutcome>>,
}

impl SimHandle {
    pub fn resume(&self) {
        let _ = self.commands.send(SimCommand::Resume);
    }

    /// Ask the worker to pause; a running burst ends at its next step.
    pub fn pause(&self) {
        let _ = self.commands.send(SimCommand::Pause);
        self.interrupt.store(true, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        let _ = self.commands.send(SimCommand::Cancel);
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Latest state published by the worker
    pub fn state(&self) -> SimState {
        *self.state.lock()
    }

    /// Next pending event, without blocking.
    pub fn try_event(&self) -> Option<SimEvent> {
        self.events.try_recv().ok()
    }

    /// Next event, waiting at most `timeout`.
    pub fn wait_event(&self, timeout: Duration) -> Option<SimEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    pub fn bit(&self) -> Arc<RwLock<Bit>> {
        Arc::clone(&self.bit)
    }

    pub fn backplot(&self) -> Arc<RwLock<Backplot>> {
        Arc::clone(&self.backplot)
    }

    /// Tile meshes for the renderer
    pub fn surface(&self) -> &SurfaceMesh {
        &self.surface
    }

    /// True once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker to finish and take back the stock.
    ///
    /// Blocks until the simulation is done or cancelled.
    pub fn join(mut self) -> Result<SimOutcome> {
        let thread = self.thread.take().ok_or(Error::WorkerPanicked)?;
        thread.join().map_err(|_| Error::WorkerPanicked)
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel();
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolpath::{parse_pose_program, SegmentedToolpath};
    use glam::DVec3;
    use kerf_core::ToolPose;
    use kerf_stock::GridConfig;
    use kerf_tool::ToolShape;

    const BALL: ToolShape = ToolShape::BallMill {
        length: 5.0,
        radius: 1.5,
    };

    fn grid() -> VoxelGrid {
        VoxelGrid::new(GridConfig::new(DVec3::ZERO, DVec3::splat(10.0), 1.0)).unwrap()
    }

    fn pass() -> SegmentedToolpath {
        parse_pose_program("2 8 5\n8 8 5\n8 8 2\n", 0.1).unwrap()
    }

    /// Shuttles back and forth for a fixed number of poses.
    struct Shuttle {
        total: usize,
        remaining: usize,
    }

    impl Shuttle {
        fn new(total: usize) -> Self {
            Self {
                total,
                remaining: total,
            }
        }
    }

    impl Toolpath for Shuttle {
        fn next_pose(&mut self, _policy: StopPolicy) -> Option<ToolPose> {
            self.remaining = self.remaining.checked_sub(1)?;
            let x = if self.remaining % 2 == 0 { 3.0 } else { 7.0 };
            Some(ToolPose::new(DVec3::new(x, 8.0, 5.0), 0.0))
        }

        fn has_more(&self) -> bool {
            self.remaining > 0
        }

        fn rewind(&mut self) {
            self.remaining = self.total;
        }
    }

    fn run_until_settled<T: Toolpath>(sim: &mut Simulation<T>) {
        for _ in 0..10_000 {
            match sim.state() {
                SimState::Running => {
                    sim.run_burst();
                }
                SimState::Paused => sim.resume(),
                _ => return,
            }
        }
        panic!("simulation did not finish");
    }

    fn wait_for(handle: &SimHandle, wanted: SimState) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while handle.state() != wanted {
            assert!(Instant::now() < deadline, "timed out waiting for {wanted}");
            handle.wait_event(Duration::from_millis(10));
        }
    }

    #[test]
    fn priming_builds_backplot_only() {
        let path = pass();
        let poses = path.pose_count();
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), path, SimConfig::default());

        sim.prime();

        assert_eq!(sim.state(), SimState::Paused);
        assert_eq!(sim.backplot().read().len(), poses);
        assert_eq!(sim.backplot().read().steps(), 0);
        assert_eq!(sim.grid().deleted_count(), 0);
        assert!(sim.toolpath().has_more());
        assert_eq!(sim.bit().read().parts(), BALL.parts().as_slice());
    }

    #[test]
    fn backplot_points_follow_rotary_axis() {
        let path = parse_pose_program("0 0 1 90\n", 0.1).unwrap();
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), path, SimConfig::default());
        sim.prime();

        let plot = sim.backplot();
        let point = plot.read().points()[0];
        assert_eq!(point, rotate_x(DVec3::new(0.0, 0.0, 1.0), -90.0));
    }

    #[test]
    fn resume_needs_priming() {
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), SimConfig::default());
        sim.resume();
        assert_eq!(sim.state(), SimState::Idle);
        assert_eq!(sim.run_burst(), BurstReport::default());
    }

    #[test]
    fn runs_to_completion() {
        let path = pass();
        let poses = path.pose_count();
        let config = SimConfig::default().with_stop_after_segment(false);
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), path, config);

        sim.prime();
        sim.resume();
        run_until_settled(&mut sim);

        assert_eq!(sim.state(), SimState::Done);
        assert_eq!(sim.stats().steps, poses);
        assert_eq!(sim.backplot().read().steps(), poses);
        assert!(sim.stats().removed > 0);
        assert_eq!(sim.grid().deleted_count(), sim.stats().removed);
        assert!(!sim.grid().is_dirty());
        assert!(sim.surface().triangle_count() > 0);
    }

    #[test]
    fn pauses_at_segment_ends() {
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), SimConfig::default());
        sim.prime();

        sim.resume();
        let first = sim.run_burst();
        assert_eq!(first.steps, 1);
        assert_eq!(sim.state(), SimState::Paused);

        sim.resume();
        let second = sim.run_burst();
        assert_eq!(second.steps, 61);
        assert_eq!(sim.state(), SimState::Paused);

        sim.resume();
        sim.run_burst();
        assert_eq!(sim.state(), SimState::Done);
    }

    #[test]
    fn burst_runs_for_its_budget() {
        let budget = Duration::from_millis(20);
        let config = SimConfig::default().with_burst_budget(budget);
        let shuttle = Shuttle::new(1_000_000);
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), shuttle, config);
        sim.prime();
        sim.resume();

        let report = sim.run_burst();
        assert!(report.elapsed >= budget);
        assert!(report.steps > 0);
        assert_eq!(sim.state(), SimState::Running);
    }

    #[test]
    fn pause_after_burst() {
        let config = SimConfig::default()
            .with_burst_budget(Duration::from_millis(5))
            .with_pause_after_burst(true);
        let shuttle = Shuttle::new(1_000_000);
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), shuttle, config);
        sim.prime();
        sim.resume();

        sim.run_burst();
        assert_eq!(sim.state(), SimState::Paused);
    }

    #[test]
    fn tool_changes_replace_parts() {
        let text = "(FlatMill 5 1)\n2 8 5\n(BallMill 5 2)\n8 8 5\n";
        let path = parse_pose_program(text, 0.5).unwrap();
        let config = SimConfig::default().with_stop_after_segment(false);
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), path, config);
        let bit = sim.bit();

        sim.prime();
        assert_eq!(bit.read().parts(), BALL.parts().as_slice());

        sim.resume();
        run_until_settled(&mut sim);
        let expected = ToolShape::BallMill {
            length: 5.0,
            radius: 2.0,
        };
        assert_eq!(bit.read().parts(), expected.parts().as_slice());
        assert_eq!(bit.read().position(), DVec3::new(8.0, 8.0, 5.0));
    }

    #[test]
    fn cancel_is_terminal() {
        let mut sim = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), SimConfig::default());
        sim.prime();
        sim.cancel();
        sim.resume();
        assert_eq!(sim.state(), SimState::Cancelled);

        let outcome = sim.into_outcome();
        assert_eq!(outcome.state, SimState::Cancelled);
        assert_eq!(outcome.grid.deleted_count(), 0);
    }

    #[test]
    fn worker_runs_to_done() {
        let config = SimConfig::default().with_poll_interval(Duration::from_millis(5));
        let handle = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), config)
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while handle.state() != SimState::Done {
            assert!(Instant::now() < deadline, "worker did not finish");
            if let Some(SimEvent::StateChanged(SimState::Paused)) =
                handle.wait_event(Duration::from_millis(10))
            {
                handle.resume();
            }
        }

        let outcome = handle.join().unwrap();
        assert_eq!(outcome.state, SimState::Done);
        assert!(outcome.grid.deleted_count() > 0);
        assert_eq!(outcome.stats.removed, outcome.grid.deleted_count());
    }

    #[test]
    fn worker_publishes_meshes() {
        let config = SimConfig::default()
            .with_stop_after_segment(false)
            .with_poll_interval(Duration::from_millis(5));
        let handle = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), config)
            .spawn()
            .unwrap();
        wait_for(&handle, SimState::Paused);
        handle.resume();
        wait_for(&handle, SimState::Done);

        let surface = handle.surface().clone();
        assert!(surface.needs_upload());
        let uploaded = surface.take_uploads(|_, buffers| assert!(!buffers.is_empty()));
        assert!(uploaded > 0);
        assert!(!surface.needs_upload());
    }

    #[test]
    fn cancel_interrupts_running_worker() {
        let config = SimConfig::default()
            .with_burst_budget(Duration::from_secs(60))
            .with_poll_interval(Duration::from_millis(5));
        let shuttle = Shuttle::new(2_000_000);
        let handle = Simulation::new(grid(), Bit::from_shape(&BALL), shuttle, config)
            .spawn()
            .unwrap();
        wait_for(&handle, SimState::Paused);
        handle.resume();
        wait_for(&handle, SimState::Running);

        let started = Instant::now();
        handle.cancel();
        let outcome = handle.join().unwrap();
        assert_eq!(outcome.state, SimState::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn cancel_while_paused() {
        let config = SimConfig::default().with_poll_interval(Duration::from_millis(5));
        let handle = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), config)
            .spawn()
            .unwrap();
        wait_for(&handle, SimState::Paused);
        handle.cancel();

        let outcome = handle.join().unwrap();
        assert_eq!(outcome.state, SimState::Cancelled);
        assert_eq!(outcome.grid.deleted_count(), 0);
    }

    #[test]
    fn dropping_handle_stops_worker() {
        let config = SimConfig::default().with_poll_interval(Duration::from_millis(5));
        let handle = Simulation::new(grid(), Bit::from_shape(&BALL), pass(), config)
            .spawn()
            .unwrap();
        let backplot = handle.backplot();
        wait_for(&handle, SimState::Paused);
        drop(handle);
        assert_eq!(backplot.read().steps(), 0);
    }
}
