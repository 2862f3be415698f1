use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use fleet_workshop::models::{Contract, Maintenance, Reading, Vehicle};
use fleet_workshop::models::AlarmThresholds;
use fleet_workshop::services::dashboard::{assemble, summarize_vehicle};
use fleet_workshop::time_utils::format_utc_rfc3339;
use std::hint::black_box;

const VEHICLES: usize = 500;
const MAINTENANCES_PER_VEHICLE: usize = 12;

fn benchmark_dashboard(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
    let lead = Contract::basic().lead_time();

    // A fleet with a spread of odometers, limits and due dates
    let fleet: Vec<(Vehicle, Reading, Vec<Maintenance>)> = (0..VEHICLES)
        .map(|i| {
            let vehicle = Vehicle {
                id: format!("v{}", i),
                owner_id: format!("d{}", i % 40),
                plate: format!("BRA{:04}", i),
                vin: None,
                brand: "Fiat".to_string(),
                model: "Argo".to_string(),
                year: 2020,
                initial_km: (i * 137 % 90_000) as f64,
                thresholds: AlarmThresholds {
                    max_engine_temp: Some(105.0),
                    max_rpm: Some(5_500.0),
                    ..Default::default()
                },
                created_at: "2026-01-01T00:00:00Z".to_string(),
            };
            let reading = Reading {
                id: format!("r{}", i),
                vehicle_id: vehicle.id.clone(),
                obd_distance: Some((i * 53 % 8_000) as f64),
                gps_distance: None,
                engine_temp: Some(80.0 + (i % 40) as f64),
                rpm: Some(1_000.0 + (i * 17 % 6_000) as f64),
                speed: None,
                battery_voltage: None,
                recorded_at: "2026-06-15T11:00:00Z".to_string(),
            };
            let maintenances = (0..MAINTENANCES_PER_VEHICLE)
                .map(|j| Maintenance {
                    id: format!("m{}-{}", i, j),
                    vehicle_id: vehicle.id.clone(),
                    workshop_id: "w1".to_string(),
                    service: "Revisão".to_string(),
                    price: 300.0,
                    km_limit: (j % 2 == 0).then(|| ((i + j) * 997 % 100_000) as f64),
                    date_limit: (j % 3 == 0)
                        .then(|| format_utc_rfc3339(now + Duration::days((j as i64) * 5 - 20))),
                    done: j % 5 == 0,
                    created_at: "2026-01-01T00:00:00Z".to_string(),
                })
                .collect();
            (vehicle, reading, maintenances)
        })
        .collect();

    let mut group = c.benchmark_group("dashboard");

    group.bench_function("summarize_fleet", |b| {
        b.iter(|| {
            let summaries: Vec<_> = fleet
                .iter()
                .map(|(vehicle, reading, maintenances)| {
                    summarize_vehicle(
                        black_box(vehicle),
                        None,
                        Some(reading),
                        maintenances,
                        |_| lead,
                        now,
                    )
                })
                .collect();
            assemble(summaries, now)
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_dashboard);
criterion_main!(benches);
