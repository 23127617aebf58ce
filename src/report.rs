//! Final summary rendering.
//!
//! Output is `{key=min/mean/max, key=min/mean/max}\n` with keys ascending by
//! raw byte value. Every number carries exactly one fractional digit. The
//! mean is rounded half to even in integer arithmetic, so the same table
//! always renders to the same bytes.

use crate::measurements::Result;
use crate::station::StationTable;
use crate::streaming::output::SummaryWriter;
use std::io::Write;

/// Write the sorted summary for `table`. Returns the number of stations written.
pub fn write_report<W: Write>(table: &StationTable, output: W) -> Result<usize> {
    let mut writer = SummaryWriter::new(output);
    writer.begin()?;
    for (key, stats) in table.sorted() {
        writer.write_station(key, stats)?;
    }
    writer.finish()
}

/// Render the summary into a byte vector.
pub fn render_report(table: &StationTable) -> Vec<u8> {
    let mut output = Vec::with_capacity(16 + table.len() * 24);
    write_report(table, &mut output).expect("writing to a Vec cannot fail");
    output
}
