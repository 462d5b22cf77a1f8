/*!
 * Emulated File Table Probe
 *
 * Builds a table from the environment, fills it with in-memory files,
 * round-trips data through the emulated descriptors and tears it down.
 */

use std::error::Error;
use std::io::SeekFrom;
use tracing::{info, warn};

use emufile::{init_tracing, EmuFileTable, EmulatedFile, MemFile, TableConfig, INVALID_DESCRIPTOR};

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = TableConfig::from_env()?.with_log_registrations(false);
    info!(
        base = %format_args!("{:#x}", config.descriptor_base),
        lock_timeout = ?config.lock_timeout,
        "Emulated file probe starting"
    );

    let table: EmuFileTable<MemFile> = EmuFileTable::with_config(config)?;

    let mut descriptors = Vec::with_capacity(table.capacity());
    loop {
        let name = format!("probe-{}.bin", descriptors.len());
        match table.register(MemFile::new(name)) {
            Ok(object) => {
                descriptors.push(table.descriptor_of(&object).unwrap_or(INVALID_DESCRIPTOR));
            }
            Err(rejected) => {
                info!(
                    capacity = rejected.capacity(),
                    name = ?rejected.file().name(),
                    "Table full, registration refused"
                );
                break;
            }
        }
    }

    for &fd in &descriptors {
        let payload = format!("descriptor {:#x}", fd);
        table.write(fd, payload.as_bytes())?;
        table.seek(fd, SeekFrom::Start(0))?;

        let mut readback = Vec::new();
        table.read_to_end(fd, &mut readback)?;
        if readback != payload.as_bytes() {
            warn!(fd, "Read back different bytes than written");
        }
    }

    if let Some(&first) = descriptors.first() {
        let file = table.unregister_by_descriptor(first);
        info!(
            fd = first,
            bytes = ?file.map(|f| f.contents().len()),
            still_emulated = table.is_emulated_descriptor(first),
            "Handed back first file"
        );
    }

    let stats = table.stats();
    info!(stats = %serde_json::to_string(&stats)?, "Table statistics");

    let report = table.clean_up();
    info!(
        closed = report.closed,
        failures = report.failures.len(),
        "Probe finished"
    );
    Ok(())
}
