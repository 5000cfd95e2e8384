use traj_walker::prelude::*;
use traj_walker::TrajClass;

/// A long track with a kinked daughter leaving from wire 30.
fn synthetic_event() -> Vec<Hit> {
    let mut hits = Vec::new();
    for w in 0..=30u32 {
        hits.push(Hit::new(w, 100.0 + 1.5 * w as f32, 1.0, 120.0));
    }
    for w in 31..=45u32 {
        let dw = (w - 30) as f32;
        hits.push(Hit::new(w, 145.0 - 2.0 * dw, 1.0, 90.0));
    }
    hits
}

fn main() {
    let hits = synthetic_event();
    let plane = match PlaneHits::new(PlaneId::new(0, 0, 2), DetectorGeometry::unit_scale(), 64, 500.0, hits, &[]) {
        Ok(plane) => plane,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    let clusterer = TrajClusterer::new(TrajParams::default());
    let report = clusterer.process(&[plane]);
    for result in &report.planes {
        println!(
            "{}: hits={} trajectories={} vertices={} track-like={} shower-like={}",
            result.plane,
            result.stats.hits,
            result.trajectories.len(),
            result.vertices.len(),
            result.count_class(TrajClass::TrackLike),
            result.count_class(TrajClass::ShowerLike)
        );
        for traj in &result.trajectories {
            println!(
                "  {:?} pass={} points={} length={:.1} flags={:?}",
                traj.id,
                traj.pass,
                traj.n_pts_with_charge(),
                traj.length(),
                traj.flags
            );
        }
    }
    println!("total_ms={:.3}", report.timings.total_ms);
}
