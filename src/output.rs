//! Submission writer for emitted schedules

use std::io::{self, Write};

use crate::simulation::SchedulePlan;

/// Write the plan in submission format
///
/// Line 1 is the number of scheduled intersections, then for each one its
/// id, its phase count and one `street_name green_duration` line per phase.
pub fn write_plan<W: Write>(plan: &SchedulePlan, mut out: W) -> io::Result<()> {
    writeln!(out, "{}", plan.len())?;
    for entry in &plan.intersections {
        writeln!(out, "{}", entry.intersection.0)?;
        writeln!(out, "{}", entry.cycle.phases().len())?;
        for phase in entry.cycle.phases() {
            writeln!(out, "{} {}", phase.name, phase.duration)?;
        }
    }
    out.flush()
}

pub fn render_plan(plan: &SchedulePlan) -> String {
    let mut buf = Vec::new();
    write_plan(plan, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}
