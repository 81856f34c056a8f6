//! Drive a shield from a console without any rendering.
//!
//! Loads a preset, binds a console, powers the shield, then feeds damage
//! and slider drags through the rate-limited console client. Run with
//! `RUST_LOG=debug` to see the world's own logging.

use std::path::Path;
use std::time::Duration;

use bulwark_core::angle::Angle;
use bulwark_core::command_queue::ShieldCommand;
use bulwark_core::console::ConsoleClient;
use bulwark_core::shield::GeometryUpdate;
use bulwark_core::world::ShieldWorld;
use bulwark_data::schema::ShieldPresetData;
use bulwark_data::{DataLoadError, PresetLibrary};
use tracing_subscriber::EnvFilter;

const PRESETS: &str = r#"[
    (
        name: "frigate",
        config: (
            max_radius: 40,
            consumption_per_unit_area: 10.0,
            power_draw_limit: 60000.0,
            reset_power: 40000.0,
            cooldown: 50,
        ),
        angle: Some(0.0),
        width: Some(120.0),
        radius: Some(20),
    ),
]"#;

const DT: f64 = 1.0 / 60.0;

fn main() -> Result<(), DataLoadError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let presets: Vec<ShieldPresetData> =
        ron::from_str(PRESETS).map_err(|e| DataLoadError::Parse {
            file: Path::new("inline").to_path_buf(),
            detail: e.to_string(),
        })?;
    let library = PresetLibrary::from_presets(presets, Path::new("inline"))?;

    let mut world = ShieldWorld::new();
    let shield = library.spawn(&mut world, "frigate")?;
    let console = world.add_console();
    world.bind(console, shield)?;

    let mut client = world
        .console_client(console)
        .unwrap_or_else(|| ConsoleClient::new(console, Duration::ZERO));

    world.submit(ShieldCommand::SetPowered {
        shield,
        powered: true,
    });
    client.request_toggle();

    for frame in 0u32..600 {
        let now = Duration::from_secs_f64(f64::from(frame) * DT);

        // The operator drags the radius slider every frame; the client
        // throttles what actually reaches the world.
        client.request_parameter_change(
            now,
            GeometryUpdate {
                angle: Some(Angle::from_degrees(f64::from(frame) * 0.5)),
                width: None,
                radius: Some(20 + i64::from(frame % 40) / 2),
            },
        );
        if frame % 120 == 60 {
            world.submit(ShieldCommand::Damage {
                shield,
                points: 150.0,
            });
        }

        for message in client.take_outbox() {
            world.submit_console(console, message);
        }

        let report = world.step(DT);
        for event in &report.events {
            tracing::info!(tick = report.tick, ?event, "shield event");
        }
        for push in report.snapshots {
            if push.console == console {
                client.receive(push.snapshot);
            }
        }
    }

    if let Some(snapshot) = client.snapshot() {
        tracing::info!(
            angle = snapshot.angle.degrees(),
            radius = snapshot.radius,
            draw = snapshot.desired_draw,
            can_work = snapshot.can_work,
            dropped = client.dropped(),
            "final console view"
        );
    }

    Ok(())
}
