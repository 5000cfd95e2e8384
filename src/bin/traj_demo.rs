use std::env;
use std::path::Path;
use traj_walker::config::load_config;
use traj_walker::io::{load_planes, write_json_file};
use traj_walker::TrajClusterer;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let planes = load_planes(&config.input)?;
    let clusterer = TrajClusterer::new(config.params);
    let report = clusterer.process(&planes);

    write_json_file(&config.output.result_json, &report)?;

    for plane in &report.planes {
        match &plane.aborted {
            Some(reason) => println!("{}: aborted ({reason})", plane.plane),
            None => println!(
                "{}: {} trajectories, {} vertices, {}/{} hits owned",
                plane.plane,
                plane.trajectories.len(),
                plane.vertices.len(),
                plane.n_owned_hits(),
                plane.stats.hits
            ),
        }
    }
    println!(
        "Saved report for {} planes to {} ({:.3} ms)",
        report.planes.len(),
        config.output.result_json.display(),
        report.timings.total_ms
    );

    Ok(())
}

fn usage() -> String {
    "Usage: traj_demo <config.json>".to_string()
}
