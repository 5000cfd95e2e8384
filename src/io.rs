//! JSON input and output for the tools.
//!
//! - `load_planes`: read an array of [`PlaneRecord`]s and build [`PlaneHits`].
//! - `write_json_file`: pretty-print a serializable value to disk.

use crate::hits::{DetectorGeometry, Hit, PlaneHits, PlaneId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk description of one plane's hits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneRecord {
    pub plane: PlaneId,
    #[serde(default)]
    pub geometry: DetectorGeometry,
    pub num_wires: u32,
    pub max_tick: f32,
    #[serde(default)]
    pub dead_wires: Vec<u32>,
    pub hits: Vec<Hit>,
}

impl PlaneRecord {
    pub fn into_plane_hits(self) -> Result<PlaneHits, String> {
        let plane = self.plane;
        PlaneHits::new(
            plane,
            self.geometry,
            self.num_wires,
            self.max_tick,
            self.hits,
            &self.dead_wires,
        )
        .map_err(|e| format!("Invalid plane {plane}: {e}"))
    }
}

pub fn parse_planes(data: &str) -> Result<Vec<PlaneHits>, String> {
    let records: Vec<PlaneRecord> =
        serde_json::from_str(data).map_err(|e| format!("Failed to parse planes: {e}"))?;
    records.into_iter().map(PlaneRecord::into_plane_hits).collect()
}

/// Read plane records from a JSON file.
pub fn load_planes(path: &Path) -> Result<Vec<PlaneHits>, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read planes {}: {e}", path.display()))?;
    parse_planes(&data).map_err(|e| format!("{}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_records_parse_with_defaults() {
        let planes = parse_planes(
            r#"[{
                "plane": { "cryostat": 0, "tpc": 1, "plane": 2 },
                "numWires": 8,
                "maxTick": 100.0,
                "deadWires": [3],
                "hits": [
                    { "wire": 5, "peak_time": 20.0, "rms": 1.0, "integral": 40.0 },
                    { "wire": 4, "peak_time": 18.0, "rms": 1.0, "integral": 35.0 }
                ]
            }]"#,
        )
        .unwrap();
        assert_eq!(planes.len(), 1);
        let p = &planes[0];
        assert_eq!(p.plane(), PlaneId::new(0, 1, 2));
        assert_eq!(p.hit(0).wire, 4);
        assert_eq!(p.hit(0).multiplicity, 1);
        assert_eq!(p.geometry(), &DetectorGeometry::default());
    }

    #[test]
    fn out_of_range_wire_is_reported() {
        let err = parse_planes(
            r#"[{ "plane": { "cryostat": 0, "tpc": 0, "plane": 0 }, "numWires": 2,
                  "maxTick": 10.0, "hits": [ { "wire": 7, "peak_time": 1.0, "rms": 1.0, "integral": 1.0 } ] }]"#,
        )
        .unwrap_err();
        assert!(err.contains("C0:T0:P0"));
    }
}
