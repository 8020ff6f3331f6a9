//! CSV export for tick telemetry and vehicle summaries.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::{TickRecord, VehicleSummary};

/// Fixed leading columns of the tick telemetry; one `q_i_j` column per
/// intersection follows.
const TICK_HEADER: &str = "tick,time_s,total_queue,completed,completed_this_tick,\
                           in_network,emissions_total_g,emissions_delta_g,\
                           ns_green,ew_green,yellow";

const VEHICLE_HEADER: &str = "id,origin,destination,hops,travel_time_s,delay_s,\
                              emissions_g,distance_m,completed,completed_tick";

/// Exports tick records to a CSV file at the given path.
///
/// `grid_size` names the per-intersection queue columns. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_ticks_csv(records: &[TickRecord], grid_size: usize, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_ticks_csv(records, grid_size, io::BufWriter::new(file))
}

/// Writes tick records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails or a record's queue vector does
/// not have `grid_size²` entries.
pub fn write_ticks_csv(records: &[TickRecord], grid_size: usize, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let width = grid_size * grid_size;

    let mut header: Vec<String> = TICK_HEADER.split(',').map(|h| h.trim().to_string()).collect();
    for i in 0..grid_size {
        for j in 0..grid_size {
            header.push(format!("q_{i}_{j}"));
        }
    }
    wtr.write_record(&header)?;

    for r in records {
        if r.queue_lengths.len() != width {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "tick {} has {} queue lengths, expected {width}",
                    r.tick,
                    r.queue_lengths.len()
                ),
            ));
        }
        let mut row = vec![
            r.tick.to_string(),
            format!("{:.1}", r.time_s),
            r.total_queue.to_string(),
            r.completed_count.to_string(),
            r.completed_this_tick.to_string(),
            r.in_network.to_string(),
            format!("{:.3}", r.emissions_total_g),
            format!("{:.3}", r.emissions_delta_g),
            r.ns_green.to_string(),
            r.ew_green.to_string(),
            r.yellow.to_string(),
        ];
        row.extend(r.queue_lengths.iter().map(u32::to_string));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports vehicle summaries to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_vehicles_csv(vehicles: &[VehicleSummary], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_vehicles_csv(vehicles, io::BufWriter::new(file))
}

/// Writes vehicle summaries as CSV to any writer. Nodes are written as `i:j`
/// and an unfinished trip has an empty `completed_tick`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_vehicles_csv(vehicles: &[VehicleSummary], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(VEHICLE_HEADER.split(',').map(str::trim))?;

    for v in vehicles {
        wtr.write_record(&[
            v.id.to_string(),
            format!("{}:{}", v.origin.i(), v.origin.j()),
            format!("{}:{}", v.destination.i(), v.destination.j()),
            v.hops.to_string(),
            format!("{:.1}", v.travel_time_s),
            format!("{:.1}", v.delay_s),
            format!("{:.3}", v.emissions_g),
            format!("{:.1}", v.distance_m),
            v.completed.to_string(),
            v.completed_tick.map(|t| t.to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
