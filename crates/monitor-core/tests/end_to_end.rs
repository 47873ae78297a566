//! Drives real shell commands through the provider registry and sampler.

#![cfg(unix)]

use std::sync::atomic::AtomicBool;

use monitor_core::collector::{
    CommandRunner, MockSystem, NvidiaProvider, ProviderRegistry, RocmProvider, ShellRunner, Vendor,
};
use monitor_core::{
    Error, GpuSource, MetricKind, OutputFormat, Readings, Resource, SampleConfig, Sampler,
};

fn echo_registry(output: &str) -> ProviderRegistry<ShellRunner> {
    ProviderRegistry::new(ShellRunner::new())
        .with_vendor(Vendor::Nvidia)
        .with_provider(
            Vendor::Nvidia,
            Box::new(
                NvidiaProvider::new(MetricKind::Percent)
                    .with_command(format!("echo \"{output}\"")),
            ),
        )
}

#[test]
fn shell_output_is_parsed_into_readings() {
    let mut registry = echo_registry("0, 42.0");
    assert_eq!(
        registry.telemetry(MetricKind::Percent).unwrap(),
        Readings::from([(0, 42.0)])
    );
}

#[test]
fn rocm_output_with_header_through_shell() {
    let mut registry = ProviderRegistry::new(ShellRunner::new())
        .with_vendor(Vendor::Rocm)
        .with_provider(
            Vendor::Rocm,
            Box::new(
                RocmProvider::new(MetricKind::Power)
                    .with_command("printf 'device,Power (W)\\ncard0,35.5\\ncard1,20\\n'"),
            ),
        );
    assert_eq!(
        registry.telemetry(MetricKind::Power).unwrap(),
        Readings::from([(0, 35.5), (1, 20.0)])
    );
}

#[test]
fn garbage_output_names_command() {
    let mut registry = echo_registry("N/A");
    match registry.telemetry(MetricKind::Percent) {
        Err(Error::Parse { command, .. }) => assert_eq!(command, "echo \"N/A\""),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_vendor_binary_is_command_not_found() {
    let runner = ShellRunner::new();
    assert!(!runner.probe("monitor-no-such-tool").unwrap());
    assert!(matches!(
        runner.run("monitor-no-such-tool --csv"),
        Err(Error::CommandNotFound { .. })
    ));
}

#[test]
fn one_csv_tick_from_shell_provider() {
    let config = SampleConfig {
        interval_secs: 0.001,
        format: OutputFormat::Csv,
        ..SampleConfig::new(Resource::Gpu(MetricKind::Percent))
    };
    let source = GpuSource::new(echo_registry("0, 42.0"), MetricKind::Percent);
    let mut sampler = Sampler::new(&config, Box::new(source), Vec::new())
        .unwrap()
        .with_hostname("node1")
        .with_tick_limit(1);

    let running = AtomicBool::new(true);
    assert_eq!(sampler.run(&running).unwrap(), 1);

    let out = String::from_utf8(sampler.into_inner()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "timestamp,hostname,resource,gpu_id,gpu_percent");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",node1,gpu.percent,0,42.0"), "line: {}", lines[1]);
}

#[test]
fn host_resources_do_not_spawn_commands() {
    let config = SampleConfig {
        interval_secs: 0.001,
        ..SampleConfig::new(Resource::Memory)
    };
    let runner = monitor_core::collector::MockRunner::new();
    let runs = runner.run_counter();
    let mut sampler =
        Sampler::from_config(&config, MockSystem::typical_system(), runner, Vec::new())
            .unwrap()
            .with_tick_limit(2);
    sampler.run(&AtomicBool::new(true)).unwrap();
    assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);
}
