//! NetOps Core - Demo Entry Point
//!
//! Runs the full pipeline against a simulated device fleet: periodic
//! telemetry with occasional load spikes, plus injected traffic events to
//! exercise the threat and remediation paths.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use netops_core::metrics::MetricSample;
use netops_core::{Pipeline, PipelineConfig};

const DEVICES: &[(&str, &str)] = &[
    ("dev-core-01", "core-router"),
    ("dev-edge-01", "edge-switch"),
    ("dev-fw-01", "perimeter-firewall"),
];

fn simulated_sample(rng: &mut StdRng, spike: bool) -> MetricSample {
    if spike {
        MetricSample::new(
            rng.gen_range(88.0..99.0),
            rng.gen_range(70.0..90.0),
            rng.gen_range(120.0..200.0),
            rng.gen_range(700.0..950.0),
            rng.gen_range(4.0..9.0),
        )
    } else {
        MetricSample::new(
            rng.gen_range(20.0..55.0),
            rng.gen_range(30.0..60.0),
            rng.gen_range(10.0..45.0),
            rng.gen_range(200.0..500.0),
            rng.gen_range(0.0..1.0),
        )
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting NetOps Core pipeline demo...");

    let config = PipelineConfig::default();
    let pipeline = Pipeline::new(&config);
    let _worker = pipeline.start_worker();
    let mut rng = StdRng::from_entropy();

    for cycle in 0u32.. {
        for (device_id, device_name) in DEVICES {
            // Roughly one spike per device every ~20 cycles once warmed up
            let spike = cycle > 25 && rng.gen_bool(0.05);
            let report = pipeline.ingest(device_id, device_name, simulated_sample(&mut rng, spike));

            if !report.anomalies.is_empty() {
                log::warn!(
                    "{}: {} anomalies, advisory: {}",
                    device_id,
                    report.anomalies.len(),
                    report.advisory.recommendation
                );
            }
            if let Some(diagnosis) = &report.inference.primary_diagnosis {
                log::warn!(
                    "{}: diagnosis '{}' ({:.0}% confidence) - {}",
                    device_id,
                    diagnosis.diagnosis,
                    diagnosis.confidence * 100.0,
                    diagnosis.recommendation
                );
            }
        }

        // Occasional hostile traffic against the core router
        if cycle % 15 == 10 {
            let source = format!("198.51.100.{}", rng.gen_range(1..=254));
            let threat_type = ["ddos", "port_scan", "brute_force"][rng.gen_range(0..3)];
            if let Some(threat) = pipeline.inspect_traffic(
                threat_type,
                &source,
                "10.0.0.1",
                Some(443),
                None,
            ) {
                log::warn!(
                    "threat {} from {} -> {:?}",
                    threat.threat_type,
                    threat.source_ip,
                    threat.status
                );
            }
        }

        if cycle % 30 == 29 {
            let stats = pipeline.remediation.get_statistics();
            log::info!(
                "remediation: {} actions ({} ok, {} failed, {} queued)",
                stats.total_actions,
                stats.succeeded,
                stats.failed,
                stats.queue_depth
            );
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}
