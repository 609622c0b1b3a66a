//! Integration tests for the cadence-io audio system.
//!
//! A mock device captures the data and error callbacks the system registers
//! so the tests can fire hardware blocks and driver errors deterministically
//! from the test thread.

use cadence_config::AudioSettings;
use cadence_core::{AudioProcess, ProcessSetup, SampleBuffer};
use cadence_io::{
    AudioDevice, AudioSystem, BlockInfo, DataCallback, DeviceFactory, DummyDevice, Error,
    ErrorCallback, OpenRequest, Result, StreamError, StreamFormat, SystemState,
};
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Mock device
// ---------------------------------------------------------------------------

/// Where the mock device should fail.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Failure {
    None,
    Create,
    Open,
    Start,
}

/// State shared between the test and every mock device it creates.
#[derive(Default)]
struct Probe {
    callback: Mutex<Option<DataCallback>>,
    errors: Mutex<Option<ErrorCallback>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    /// When set, the next `stop` signals the first channel and waits on the second.
    stop_gate: Mutex<Option<Gate>>,
}

type Gate = (crossbeam_channel::Sender<()>, crossbeam_channel::Receiver<()>);

impl Probe {
    /// Fire one hardware block. Returns `false` if no callback is registered.
    fn fire(&self, input: &[f32], output: &mut [f32], info: &BlockInfo) -> bool {
        match self.callback.lock().as_mut() {
            Some(callback) => {
                callback(input, output, info);
                true
            }
            None => false,
        }
    }

    fn report(&self, error: StreamError) {
        if let Some(errors) = self.errors.lock().as_mut() {
            errors(error);
        }
    }

    fn is_registered(&self) -> bool {
        self.callback.lock().is_some()
    }
}

struct MockDevice {
    probe: Arc<Probe>,
    negotiated_block: Option<u32>,
    failure: Failure,
    format: Option<StreamFormat>,
    running: bool,
}

impl AudioDevice for MockDevice {
    fn backend_name(&self) -> &str {
        "mock"
    }

    fn open(&mut self, request: &OpenRequest, callback: DataCallback, errors: ErrorCallback) -> Result<StreamFormat> {
        self.close();
        if self.failure == Failure::Open {
            return Err(Error::DeviceNotFound("mock device unplugged".into()));
        }
        let format = StreamFormat {
            device_name: "Mock".into(),
            bit_depth: request.bit_depth,
            sample_rate: request.sample_rate,
            block_size: self.negotiated_block.unwrap_or(request.block_size),
            input_channels: if request.enable_input { 2 } else { 0 },
            output_channels: 2,
        };
        *self.probe.callback.lock() = Some(callback);
        *self.probe.errors.lock() = Some(errors);
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        self.format = Some(format.clone());
        Ok(format)
    }

    fn close(&mut self) {
        if self.format.take().is_some() {
            self.probe.callback.lock().take();
            self.probe.errors.lock().take();
            self.probe.closed.fetch_add(1, Ordering::SeqCst);
        }
        self.running = false;
    }

    fn start(&mut self) -> Result<()> {
        if self.format.is_none() {
            return Err(Error::NotOpen);
        }
        if self.failure == Failure::Start {
            return Err(Error::Stream("mock start failed".into()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let gate = self.probe.stop_gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        self.running = false;
        Ok(())
    }

    fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

struct MockFactory {
    probe: Arc<Probe>,
    negotiated_block: Option<u32>,
    failure: Failure,
}

impl DeviceFactory for MockFactory {
    fn create(&self, _settings: &AudioSettings) -> Result<Box<dyn AudioDevice>> {
        if self.failure == Failure::Create {
            return Err(Error::NoDevice);
        }
        Ok(Box::new(MockDevice {
            probe: Arc::clone(&self.probe),
            negotiated_block: self.negotiated_block,
            failure: self.failure,
            format: None,
            running: false,
        }))
    }

    fn probe(&self, _backend: &str, device: Option<&str>) -> Result<bool> {
        Ok(device.is_none_or(|d| d == "Mock"))
    }
}

fn mock_system(negotiated_block: Option<u32>, failure: Failure) -> (AudioSystem, Arc<Probe>) {
    let probe = Arc::new(Probe::default());
    let system = AudioSystem::with_factory(Box::new(MockFactory {
        probe: Arc::clone(&probe),
        negotiated_block,
        failure,
    }));
    (system, probe)
}

// ---------------------------------------------------------------------------
// Processing graph
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Calls {
    blocks: Mutex<Vec<(usize, f64)>>,
    prepared: Mutex<Option<ProcessSetup>>,
}

impl Calls {
    fn count(&self) -> usize {
        self.blocks.lock().len()
    }
}

/// Doubles every input channel into the matching output channel and
/// records each call.
struct Doubler {
    calls: Arc<Calls>,
}

impl AudioProcess for Doubler {
    fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, stream_time: f64) {
        self.calls.blocks.lock().push((frames, stream_time));
        for (src, dst) in input.iter_channels().zip(output.iter_channels_mut()) {
            for (s, d) in src[..frames].iter().zip(&mut dst[..frames]) {
                *d = s * 2.0;
            }
        }
    }

    fn prepare(&mut self, setup: &ProcessSetup) {
        *self.calls.prepared.lock() = Some(*setup);
    }
}

fn doubler() -> (Box<dyn AudioProcess>, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    (
        Box::new(Doubler {
            calls: Arc::clone(&calls),
        }),
        calls,
    )
}

fn settings(block_size: u32) -> AudioSettings {
    AudioSettings {
        backend: "mock".into(),
        block_size,
        ..AudioSettings::default()
    }
}

/// Interleaved stereo ramp: frame `i` carries `(i, -i) / 1024`.
fn stereo_ramp(frames: usize) -> Vec<f32> {
    (0..frames)
        .flat_map(|i| {
            let v = i as f32 / 1024.0;
            [v, -v]
        })
        .collect()
}

fn stereo_block(frames: usize, stream_time: f64) -> BlockInfo {
    BlockInfo {
        frames,
        input_channels: 2,
        output_channels: 2,
        stream_time,
    }
}

/// Fire one block of ramp input into garbage-filled output and return it.
fn fire_ramp(probe: &Probe, frames: usize) -> Vec<f32> {
    let input = stereo_ramp(frames);
    let mut output = vec![9.0f32; frames * 2];
    assert!(probe.fire(&input, &mut output, &stereo_block(frames, 0.0)), "no callback registered");
    output
}

fn is_doubled_ramp(output: &[f32]) -> bool {
    let expected = stereo_ramp(output.len() / 2);
    output.iter().zip(&expected).all(|(o, e)| *o == e * 2.0)
}

// ---------------------------------------------------------------------------
// Device round trip and negotiation
// ---------------------------------------------------------------------------

#[test]
fn dummy_device_reports_requested_format_through_trait_object() {
    let mut device: Box<dyn AudioDevice> = Box::new(DummyDevice::new());
    let request = OpenRequest::new(24, 96000, 200);
    device.open(&request, Box::new(|_, _, _| {}), Box::new(|_| {})).unwrap();

    assert_eq!(device.backend_name(), "dummy");
    assert_eq!(device.bit_depth(), Some(24));
    assert_eq!(device.sample_rate(), Some(96000));
    assert_eq!(device.block_size(), Some(200));
    assert_eq!(device.channel_count(), Some(2));

    device.close();
    assert_eq!(device.block_size(), None);
}

#[test]
fn buffers_use_negotiated_not_requested_block_size() {
    let (system, probe) = mock_system(Some(128), Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);

    let format = system.start(&settings(512)).unwrap();
    assert_eq!(format.block_size, 128);
    assert_eq!(system.format().map(|f| f.block_size), Some(128));

    let prepared = calls.prepared.lock().expect("graph prepared before start");
    assert_eq!(prepared.block_size, 128);
    assert_eq!(prepared.sample_rate, 48000.0);
    assert_eq!((prepared.input_channels, prepared.output_channels), (2, 2));

    // A 128-frame hardware block is one graph call of 128 frames.
    let output = fire_ramp(&probe, 128);
    assert!(is_doubled_ramp(&output));
    assert_eq!(calls.blocks.lock().as_slice(), &[(128, 0.0)]);
}

#[test]
fn oversized_hardware_block_is_processed_in_chunks() {
    let (system, probe) = mock_system(Some(128), Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(512)).unwrap();

    let frames = 300;
    let input = stereo_ramp(frames);
    let mut output = vec![9.0f32; frames * 2];
    assert!(probe.fire(&input, &mut output, &stereo_block(frames, 2.0)));

    assert!(is_doubled_ramp(&output), "every frame passes through the graph once");
    let blocks = calls.blocks.lock().clone();
    let sizes: Vec<usize> = blocks.iter().map(|(frames, _)| *frames).collect();
    assert_eq!(sizes, vec![128, 128, 44]);

    let chunk = 128.0 / 48000.0;
    for (i, (_, time)) in blocks.iter().enumerate() {
        assert!((time - (2.0 + i as f64 * chunk)).abs() < 1e-12, "chunk {i} at {time}");
    }
}

#[test]
fn disabled_input_feeds_silence_to_graph() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    let format = system
        .start(&AudioSettings {
            enable_input: false,
            ..settings(64)
        })
        .unwrap();
    assert_eq!(format.input_channels, 0);

    let mut output = vec![9.0f32; 64 * 2];
    let info = BlockInfo {
        frames: 64,
        input_channels: 0,
        output_channels: 2,
        stream_time: 0.0,
    };
    assert!(probe.fire(&[], &mut output, &info));
    assert_eq!(calls.count(), 1);
    assert!(output.iter().all(|&s| s == 0.0));
}

#[test]
fn restart_resizes_buffers_for_new_format() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);

    system.start(&settings(64)).unwrap();
    system.restart(&settings(256)).unwrap();
    assert_eq!(calls.prepared.lock().map(|s| s.block_size), Some(256));
    assert_eq!(probe.opened.load(Ordering::SeqCst), 2);
    assert_eq!(probe.closed.load(Ordering::SeqCst), 1);

    let output = fire_ramp(&probe, 256);
    assert!(is_doubled_ramp(&output));
    assert_eq!(calls.blocks.lock().last().map(|b| b.0), Some(256));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn failed_open_leaves_system_closed() {
    let (system, probe) = mock_system(None, Failure::Open);
    let result = system.start(&settings(256));

    assert!(matches!(result, Err(Error::DeviceNotFound(_))));
    assert_eq!(system.state(), SystemState::Closed);
    assert!(system.format().is_none());
    assert!(!probe.is_registered());

    system.stop();
    assert_eq!(system.state(), SystemState::Closed);
}

#[test]
fn failed_device_start_closes_the_device() {
    let (system, probe) = mock_system(None, Failure::Start);
    assert!(matches!(system.start(&settings(256)), Err(Error::Stream(_))));

    assert_eq!(system.state(), SystemState::Closed);
    assert_eq!(probe.opened.load(Ordering::SeqCst), 1);
    assert_eq!(probe.closed.load(Ordering::SeqCst), 1);
    assert!(!probe.is_registered(), "no dangling callback");
    system.stop();
}

#[test]
fn unavailable_device_fails_start() {
    let (system, _probe) = mock_system(None, Failure::Create);
    assert!(matches!(system.start(&settings(256)), Err(Error::NoDevice)));
    assert_eq!(system.state(), SystemState::Closed);
    system.stop();
}

#[test]
fn start_while_running_is_refused() {
    let (system, probe) = mock_system(None, Failure::None);
    system.start(&settings(256)).unwrap();

    assert!(matches!(system.start(&settings(128)), Err(Error::AlreadyRunning)));
    assert_eq!(probe.opened.load(Ordering::SeqCst), 1);
    assert_eq!(system.format().map(|f| f.block_size), Some(256));
}

#[test]
fn stop_unregisters_callback_and_is_idempotent() {
    let (system, probe) = mock_system(None, Failure::None);
    system.start(&settings(256)).unwrap();
    assert!(probe.is_registered());

    system.stop();
    system.stop();
    assert!(!probe.is_registered());
    assert_eq!(probe.closed.load(Ordering::SeqCst), 1);
    assert_eq!(system.state(), SystemState::Closed);
}

#[test]
fn dropping_the_system_closes_the_device() {
    let (system, probe) = mock_system(None, Failure::None);
    system.start(&settings(256)).unwrap();
    drop(system);
    assert_eq!(probe.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn probe_goes_through_factory() {
    let (system, _probe) = mock_system(None, Failure::None);
    assert!(system.probe_device("mock", None).unwrap());
    assert!(system.probe_device("mock", Some("Mock")).unwrap());
    assert!(!system.probe_device("mock", Some("Other")).unwrap());
}

// ---------------------------------------------------------------------------
// Suspend / resume
// ---------------------------------------------------------------------------

#[test]
fn suspended_blocks_are_silent_and_skip_graph() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(64)).unwrap();

    assert!(is_doubled_ramp(&fire_ramp(&probe, 64)));
    assert_eq!(calls.count(), 1);

    system.suspend();
    assert!(system.is_suspended());
    assert_eq!(system.state(), SystemState::Suspended);
    for _ in 0..5 {
        let output = fire_ramp(&probe, 64);
        assert!(output.iter().all(|&s| s == 0.0));
    }
    assert_eq!(calls.count(), 1, "graph not invoked while suspended");

    system.resume().unwrap();
    assert_eq!(system.state(), SystemState::Running);
    assert!(is_doubled_ramp(&fire_ramp(&probe, 64)));
    assert_eq!(calls.count(), 2);
}

#[test]
fn stop_clears_suspension() {
    let (system, _probe) = mock_system(None, Failure::None);
    system.start(&settings(64)).unwrap();
    system.suspend();
    system.stop();
    assert!(!system.is_suspended());

    system.start(&settings(64)).unwrap();
    assert_eq!(system.state(), SystemState::Running);
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

#[test]
fn fatal_error_silences_until_stop_and_start() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(64)).unwrap();
    let flag = system.error_flag();

    probe.report(StreamError::fatal("device removed"));
    assert!(flag.is_set());
    assert_eq!(system.state(), SystemState::Error);

    for _ in 0..10 {
        let output = fire_ramp(&probe, 64);
        assert!(output.iter().all(|&s| s == 0.0));
    }
    assert_eq!(calls.count(), 0, "graph not invoked after fatal error");

    assert!(matches!(system.resume(), Err(Error::AudioUnavailable(_))));
    assert!(matches!(system.start(&settings(64)), Err(Error::AlreadyRunning)));
    assert!(flag.is_set(), "refused start leaves the flag raised");

    system.stop();
    system.start(&settings(64)).unwrap();
    assert!(!flag.is_set());
    assert_eq!(system.state(), SystemState::Running);
    assert!(is_doubled_ramp(&fire_ramp(&probe, 64)));
    assert_eq!(calls.count(), 1);
}

#[test]
fn warnings_are_logged_only() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(64)).unwrap();

    probe.report(StreamError::warning("buffer underrun"));
    system.report_error(StreamError::warning("xrun"));

    assert!(!system.error_flag().is_set());
    assert_eq!(system.state(), SystemState::Running);
    assert!(is_doubled_ramp(&fire_ramp(&probe, 64)));
    assert_eq!(calls.count(), 1);
}

#[test]
fn report_error_classifies_like_backend_callback() {
    let (system, probe) = mock_system(None, Failure::None);
    system.set_processor(doubler().0);
    system.start(&settings(64)).unwrap();

    system.report_error(StreamError::fatal("driver crashed"));
    assert_eq!(system.state(), SystemState::Error);
    assert!(fire_ramp(&probe, 64).iter().all(|&s| s == 0.0));
}

// ---------------------------------------------------------------------------
// Real-time callback contract
// ---------------------------------------------------------------------------

#[test]
fn missing_processor_yields_silence() {
    let (system, probe) = mock_system(None, Failure::None);
    system.start(&settings(64)).unwrap();

    let output = fire_ramp(&probe, 64);
    assert!(output.iter().all(|&s| s == 0.0));

    let (graph, calls) = doubler();
    assert!(system.set_processor(graph).is_none());
    assert_eq!(calls.prepared.lock().map(|s| s.block_size), Some(64));
    assert!(is_doubled_ramp(&fire_ramp(&probe, 64)));

    assert!(system.take_processor().is_some());
    assert!(fire_ramp(&probe, 64).iter().all(|&s| s == 0.0));
}

/// Graph whose `prepare` parks the calling thread until released.
struct ParkedPrepare {
    entered: crossbeam_channel::Sender<()>,
    release: crossbeam_channel::Receiver<()>,
}

impl AudioProcess for ParkedPrepare {
    fn process(&mut self, _: &SampleBuffer, _: &mut SampleBuffer, _: usize, _: f64) {}

    fn prepare(&mut self, _setup: &ProcessSetup) {
        let _ = self.entered.send(());
        let _ = self.release.recv();
    }
}

#[test]
fn contended_lock_yields_silence_instead_of_blocking() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(64)).unwrap();

    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    *probe.stop_gate.lock() = Some((entered_tx, release_rx));

    std::thread::scope(|scope| {
        let control = scope.spawn(|| system.stop());

        entered_rx.recv().unwrap();
        // stop() holds the lock while the device stops; the callback must not wait.
        let output = fire_ramp(&probe, 64);
        assert!(output.iter().all(|&s| s == 0.0));
        assert_eq!(calls.count(), 0);

        release_tx.send(()).unwrap();
        control.join().unwrap();
    });
    assert_eq!(system.state(), SystemState::Closed);
}

#[test]
fn old_graph_keeps_running_while_new_graph_prepares() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(64)).unwrap();

    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);

    std::thread::scope(|scope| {
        let control = scope.spawn(|| {
            system.set_processor(Box::new(ParkedPrepare {
                entered: entered_tx,
                release: release_rx,
            }))
        });

        entered_rx.recv().unwrap();
        for _ in 0..4 {
            assert!(is_doubled_ramp(&fire_ramp(&probe, 64)));
        }
        assert_eq!(calls.count(), 4);

        release_tx.send(()).unwrap();
        assert!(control.join().unwrap().is_some());
    });

    // The prepared graph is installed and writes nothing.
    assert!(fire_ramp(&probe, 64).iter().all(|&s| s == 0.0));
    assert_eq!(calls.count(), 4);
}

/// Graph that records the block size of every `prepare` call.
struct RecordingPrepare {
    prepared: Arc<Mutex<Vec<usize>>>,
    entered: crossbeam_channel::Sender<()>,
    release: crossbeam_channel::Receiver<()>,
}

impl AudioProcess for RecordingPrepare {
    fn process(&mut self, _: &SampleBuffer, _: &mut SampleBuffer, _: usize, _: f64) {}

    fn prepare(&mut self, setup: &ProcessSetup) {
        self.prepared.lock().push(setup.block_size);
        // Only the first call parks.
        let _ = self.entered.try_send(());
        let _ = self.release.recv_timeout(Duration::from_secs(5));
    }
}

#[test]
fn graph_is_prepared_again_if_format_changes_during_prepare() {
    let (system, _probe) = mock_system(None, Failure::None);
    system.start(&settings(64)).unwrap();

    let prepared = Arc::new(Mutex::new(Vec::new()));
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(2);

    std::thread::scope(|scope| {
        let control = scope.spawn(|| {
            system.set_processor(Box::new(RecordingPrepare {
                prepared: Arc::clone(&prepared),
                entered: entered_tx,
                release: release_rx,
            }))
        });

        entered_rx.recv().unwrap();
        system.restart(&settings(256)).unwrap();
        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        assert!(control.join().unwrap().is_none());
    });

    assert_eq!(prepared.lock().as_slice(), &[64, 256]);
}

#[test]
fn status_queries_never_silence_blocks() {
    let (system, probe) = mock_system(None, Failure::None);
    let (graph, calls) = doubler();
    system.set_processor(graph);
    system.start(&settings(64)).unwrap();

    let done = std::sync::atomic::AtomicBool::new(false);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                assert_eq!(system.state(), SystemState::Running);
                assert!(!system.is_suspended());
                assert_eq!(system.format().map(|f| f.block_size), Some(64));
            }
        });

        for _ in 0..2000 {
            assert!(is_doubled_ramp(&fire_ramp(&probe, 64)), "status poll silenced a block");
        }
        done.store(true, Ordering::Relaxed);
    });
    assert_eq!(calls.count(), 2000);
}

#[test]
fn short_output_slice_never_panics() {
    let (system, probe) = mock_system(None, Failure::None);
    system.set_processor(doubler().0);
    system.start(&settings(64)).unwrap();

    // Host claims 64 frames but hands over fewer samples than that.
    let input = stereo_ramp(10);
    let mut output = vec![9.0f32; 30];
    assert!(probe.fire(&input, &mut output, &stereo_block(64, 0.0)));
    assert_eq!(&output[..20], &stereo_ramp(10).iter().map(|s| s * 2.0).collect::<Vec<_>>()[..]);
    assert!(output[20..].iter().all(|&s| s == 0.0));
}

// ---------------------------------------------------------------------------
// Dummy backend end to end
// ---------------------------------------------------------------------------

#[test]
fn dummy_backend_drives_graph_until_stopped() {
    let blocks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&blocks);

    let system = AudioSystem::new();
    system.set_processor(Box::new(cadence_core::from_fn(
        move |_input: &SampleBuffer, output: &mut SampleBuffer, _frames, _time| {
            counter.fetch_add(1, Ordering::SeqCst);
            output.clear();
        },
    )));

    let format = system
        .start(&AudioSettings {
            block_size: 64,
            ..AudioSettings::dummy()
        })
        .unwrap();
    assert_eq!(format.device_name, "Dummy");
    assert_eq!(format.block_size, 64);

    std::thread::sleep(Duration::from_millis(60));
    system.stop();

    let processed = blocks.load(Ordering::SeqCst);
    assert!(processed > 0, "dummy clock never drove the graph");
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(blocks.load(Ordering::SeqCst), processed, "graph ran after stop");
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_hardware_block_is_covered_by_bounded_chunks(
            block in 16u32..=512,
            frames in 1usize..2048,
        ) {
            let (system, probe) = mock_system(Some(block), Failure::None);
            let (graph, calls) = doubler();
            system.set_processor(graph);
            system.start(&settings(512)).unwrap();

            let output = fire_ramp(&probe, frames);
            prop_assert!(is_doubled_ramp(&output));

            let blocks = calls.blocks.lock().clone();
            prop_assert!(blocks.iter().all(|(n, _)| *n > 0 && *n <= block as usize));
            prop_assert_eq!(blocks.iter().map(|(n, _)| n).sum::<usize>(), frames);
            prop_assert_eq!(blocks.len(), frames.div_ceil(block as usize));
        }
    }
}
