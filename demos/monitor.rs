use std::env;
use std::time::Duration;

use venstar::Monitor;

#[tokio::main]
async fn main() -> venstar::Result<()> {
    tracing_subscriber::fmt::init();

    let hosts: Vec<String> = env::args().skip(1).collect();
    if hosts.is_empty() {
        eprintln!("usage: monitor <host> [host...]");
        std::process::exit(2);
    }

    let devices = hosts
        .iter()
        .map(venstar::Thermostat::new)
        .collect::<venstar::Result<Vec<_>>>()?;
    let monitor = Monitor::builder()
        .devices(devices)
        .interval(Duration::from_secs(10))
        .capacity(hosts.len())
        .build();

    let (mut results, mut errors, _handle) = monitor.start();
    println!("Polling {} thermostat(s)...", hosts.len());

    loop {
        tokio::select! {
            Some(r) = results.recv() => {
                let info = &r.query_info;
                println!(
                    "[{}] {} {} | {:.1}\u{00b0} (heat {:.0} / cool {:.0}) | {} | fan {} | schedule {} ({})",
                    r.timestamp.format("%H:%M:%S"),
                    r.host,
                    info.name,
                    info.space_temp,
                    info.heat_temp,
                    info.cool_temp,
                    info.state,
                    info.fan_state,
                    info.schedule,
                    info.schedule_part,
                );
                if info.override_active.code() == 1 {
                    println!("    override: {} remaining", info.override_remaining);
                }
            }
            Some(e) = errors.recv() => eprintln!("poll error: {e}"),
            else => break,
        }
    }
    Ok(())
}
