//! Native execution of a compiled cab: spawn, stream, wrangle, clean up.

mod io_pump;
mod run;

pub use io_pump::{pump_lines, LineStream, LineTap};
pub use run::{run_cab, RunOutcome};
