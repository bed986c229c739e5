// End-to-end behaviour of the wait engine over Logic 2 exports
use logic2_input::{
    DigitalCsv, FnEvaluator, InputConfig, JsonLinesSink, Logic2Input, PinCondition, PinEvaluator,
    PinPattern, Sample, TraceError, WaitCondition, WaitEngine, Window,
};
use std::fs;
use std::path::Path;

const SCENARIO: &str = "Time [s],Channel 0,Channel 1\n\
                        0.000000000,1,0\n\
                        0.000000002,0,1\n\
                        0.000000004,1,1\n";

/// Two-channel capture: channel 0 toggles every 3 samples, channel 1 every 7
fn clock_capture(rows: usize) -> String {
    let mut text = String::from("Time [s],CLK,DATA\n");
    let mut changes: Vec<u64> = (0..rows as u64)
        .flat_map(|i| [i * 3, i * 7])
        .collect();
    changes.sort_unstable();
    changes.dedup();

    for index in changes.into_iter().take(rows) {
        let clk = (index / 3) % 2;
        let data = (index / 7) % 2;
        // 2 ns per sample at 500 MHz
        let nanos = index * 2;
        text.push_str(&format!(
            "{}.{:09},{},{}\n",
            nanos / 1_000_000_000,
            nanos % 1_000_000_000,
            clk,
            data
        ));
    }
    text
}

fn memory_engine<'a>(text: &'a str, config: &InputConfig) -> WaitEngine<DigitalCsv<&'a [u8]>> {
    let rows = DigitalCsv::from_reader(text.as_bytes()).unwrap();
    WaitEngine::new(rows, config, PinEvaluator, Vec::new()).unwrap()
}

fn write_export(dir: &Path, text: &str) {
    fs::write(dir.join("digital.csv"), text).unwrap();
}

#[test]
fn test_scenario_from_export_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), SCENARIO);

    let mut input: Logic2Input =
        Logic2Input::open(dir.path(), &InputConfig::new(), PinEvaluator, Vec::new()).unwrap();
    assert_eq!(input.logic_channels(), ["Channel 0", "Channel 1"]);
    assert_eq!(input.samplerate(), 500_000_000);

    let levels = input.wait(&[WaitCondition::skip(1)]).unwrap();
    assert_eq!(levels, vec![0, 1]);
    assert_eq!(input.into_sink(), vec![Window::logic(0, 1, Sample(0b01))]);
}

#[test]
fn test_scenario_from_capture_file() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path(), SCENARIO);

    let mut input: Logic2Input = Logic2Input::open(
        &dir.path().join("digital.csv"),
        &InputConfig::new(),
        PinEvaluator,
        Vec::new(),
    )
    .unwrap();
    assert_eq!(input.wait(&[WaitCondition::skip(1)]).unwrap(), vec![0, 1]);
}

#[test]
fn test_malformed_export_paths() {
    let dir = tempfile::tempdir().unwrap();

    let empty_dir: Result<Logic2Input, _> =
        Logic2Input::open(dir.path(), &InputConfig::new(), PinEvaluator, Vec::new());
    assert!(matches!(empty_dir, Err(TraceError::FormatError(_))));

    let other = dir.path().join("capture.csv");
    fs::write(&other, SCENARIO).unwrap();
    let wrong_name: Result<Logic2Input, _> =
        Logic2Input::open(&other, &InputConfig::new(), PinEvaluator, Vec::new());
    assert!(matches!(wrong_name, Err(TraceError::FormatError(_))));
}

#[test]
fn test_windows_partition_the_capture() {
    let text = clock_capture(40);
    let mut engine = memory_engine(&text, &InputConfig::new());

    let conditions = [
        WaitCondition::pattern(PinPattern::new().pin(0, PinCondition::Rising)),
        WaitCondition::skip(5),
    ];
    loop {
        match engine.wait(&conditions) {
            Ok(_) => {}
            Err(e) => {
                assert!(e.is_end_of_stream());
                break;
            }
        }
    }
    // The failed advance still closes the window it stepped over
    let end = engine.samplenum();

    let windows = engine.into_sink();
    assert!(!windows.is_empty());
    assert_eq!(windows.first().map(|w| w.start), Some(0));
    assert_eq!(windows.last().map(|w| w.end), Some(end));
    for pair in windows.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
        assert!(pair[0].start < pair[0].end);
    }
}

#[test]
fn test_samplenum_is_monotonic() {
    let text = clock_capture(60);
    let mut engine = memory_engine(&text, &InputConfig::new());

    let rounds: [Vec<WaitCondition>; 4] = [
        vec![WaitCondition::skip(4)],
        vec![WaitCondition::pattern(PinPattern::new().pin(1, PinCondition::Edge))],
        vec![],
        vec![WaitCondition::skip(0)],
    ];

    let mut previous = engine.samplenum();
    for round in rounds.iter().cycle().take(200) {
        if engine.wait(round).is_err() {
            break;
        }
        assert!(engine.samplenum() >= previous);
        previous = engine.samplenum();
    }
}

#[test]
fn test_skip_zero_never_consumes() {
    let mut engine = memory_engine(SCENARIO, &InputConfig::new());
    engine.wait(&[]).unwrap();
    let before = engine.state().clone();

    let conditions = [
        WaitCondition::pattern(PinPattern::new().pin(0, PinCondition::Falling)),
        WaitCondition::skip(7),
        WaitCondition::skip(0),
    ];
    for _ in 0..5 {
        assert_eq!(engine.wait(&conditions).unwrap(), vec![1, 0]);
        assert_eq!(engine.matched(), &[false, false, true]);
    }
    assert_eq!(engine.state(), &before);
    assert!(engine.sink().is_empty());
}

#[test]
fn test_wait_is_deterministic() {
    let text = clock_capture(50);
    let conditions = [
        WaitCondition::pattern(PinPattern::new().pin(0, PinCondition::Falling).pin(1, PinCondition::High)),
        WaitCondition::skip(9),
    ];

    let run = || {
        let mut engine = memory_engine(&text, &InputConfig::new());
        let mut seen = Vec::new();
        while let Ok(levels) = engine.wait(&conditions) {
            seen.push((engine.samplenum(), levels, engine.matched().to_vec()));
        }
        (seen, engine.into_sink())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_sample_budget_exhaustion() {
    let text = clock_capture(30);
    let budget = 4;
    let mut engine = memory_engine(&text, &InputConfig::new().with_sample_budget(budget));

    for _ in 0..budget {
        engine.wait(&[]).unwrap();
    }
    assert!(matches!(engine.wait(&[]), Err(TraceError::EndOfStream)));
    assert!(matches!(engine.wait(&[]), Err(TraceError::EndOfStream)));
    assert_eq!(engine.sink().len() as u64, budget);
}

#[test]
fn test_pre_trigger_rows_set_initial_level() {
    let text = "Time [s],D0\n\
                -0.000000100,0\n\
                -0.000000050,1\n\
                0.000000010,0\n\
                0.000000020,1\n\
                0.000000030,0\n";
    let mut engine = memory_engine(text, &InputConfig::new());
    assert_eq!(engine.state().last_sample, Sample(1));

    // First candidate (sample 5) is a falling edge relative to the pre-trigger level
    let falling = [WaitCondition::pattern(PinPattern::new().pin(0, PinCondition::Falling))];
    assert_eq!(engine.wait(&falling).unwrap(), vec![0]);
    assert_eq!(engine.samplenum(), 5);
}

#[test]
fn test_custom_evaluator() {
    // Pattern is the exact bitmask the capture must show
    let evaluator = FnEvaluator::new(|wanted: &u64, _previous: Sample, current: Sample| current.0 == *wanted);
    let rows = DigitalCsv::from_reader(SCENARIO.as_bytes()).unwrap();
    let mut engine = WaitEngine::new(rows, &InputConfig::new(), evaluator, Vec::<Window>::new()).unwrap();

    let sample = engine.wait_sample(&[WaitCondition::Pattern(0b10)]).unwrap();
    assert_eq!(sample, Sample(0b10));
    assert_eq!(engine.samplenum(), 1);
}

#[test]
fn test_format_error_mid_stream_exhausts_input() {
    let text = "Time [s],D0,D1\n0.0,1,0\n0.000000002,0\n0.000000004,1,1\n";
    let mut engine = memory_engine(text, &InputConfig::new());

    assert!(matches!(engine.wait(&[]), Err(TraceError::FormatError(_))));
    assert!(matches!(engine.wait(&[]), Err(TraceError::EndOfStream)));
}

#[test]
fn test_json_lines_sink_receives_windows() {
    let rows = DigitalCsv::from_reader(SCENARIO.as_bytes()).unwrap();
    let mut engine =
        WaitEngine::new(rows, &InputConfig::new(), PinEvaluator, JsonLinesSink::new(Vec::new())).unwrap();
    while engine.wait(&[]).is_ok() {}

    let sink = engine.into_sink();
    assert_eq!(sink.written(), 2);
    let text = String::from_utf8(sink.into_inner()).unwrap();
    let windows: Vec<Window> = text.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(
        windows,
        vec![Window::logic(0, 1, Sample(0b01)), Window::logic(1, 2, Sample(0b10))]
    );
}

#[test]
fn test_config_from_toml() {
    let config: InputConfig = toml::from_str("sample_budget = 8").unwrap();
    assert_eq!(config.budget(), Some(8));
    assert_eq!(config.initial_state, None);

    let defaults: InputConfig = toml::from_str("").unwrap();
    assert_eq!(defaults, InputConfig::new());
}

#[test]
fn test_config_from_json() {
    let config: InputConfig =
        serde_json::from_str(r#"{"initial_state": {"0": 1, "1": 0}, "sample_budget": 0}"#).unwrap();

    assert_eq!(config.budget(), None);
    assert_eq!(config.seed(2).unwrap(), Sample(0b01));
}
