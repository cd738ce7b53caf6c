//! Free memory on Linux.

use flashbuf::MemoryBudget;

/// Memory budget backed by the running Linux system.
///
/// Reads `MemAvailable` from `/proc/meminfo`, which counts reclaimable page
/// cache. Falls back to `sysinfo(2)` free plus buffer RAM when the file is
/// missing, and to zero (passthrough) if both fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl SystemMemory {
    fn from_meminfo() -> Option<usize> {
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        parse_mem_available(&meminfo)
    }

    fn from_sysinfo() -> Option<usize> {
        // SAFETY: sysinfo only writes into the zeroed struct we own.
        let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
        if unsafe { libc::sysinfo(&mut info) } != 0 {
            return None;
        }
        let units = (info.freeram as u64).saturating_add(info.bufferram as u64);
        let bytes = units.saturating_mul(info.mem_unit as u64);
        Some(usize::try_from(bytes).unwrap_or(usize::MAX))
    }
}

impl MemoryBudget for SystemMemory {
    fn free_memory(&self) -> usize {
        Self::from_meminfo()
            .or_else(Self::from_sysinfo)
            .unwrap_or(0)
    }
}

/// `MemAvailable` in bytes from the text of `/proc/meminfo`.
fn parse_mem_available(meminfo: &str) -> Option<usize> {
    let line = meminfo.lines().find(|l| l.starts_with("MemAvailable:"))?;
    let mut fields = line.split_whitespace().skip(1);
    let value: usize = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") => value.checked_mul(1024),
        None => Some(value),
        Some(_) => None,
    }
}
