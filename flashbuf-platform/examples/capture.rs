//! Copy stdin into a file through a buffered writer and report the write pattern.
//!
//! ```text
//! RUST_LOG=debug cargo run -p flashbuf-platform --example capture --features logging -- \
//!     --out /tmp/capture.bin --record 64 < /dev/urandom
//! ```

use std::io::Read;

use anyhow::Context;
use clap::Parser;
use flashbuf::{BufferedWriter, MemoryBudget, WriterConfig};
use flashbuf_platform::FileBackend;

#[derive(Parser, Debug)]
#[command(about = "Buffer stdin into a file in chunk-sized writes")]
struct Args {
    /// Output file
    #[arg(long)]
    out: std::path::PathBuf,

    /// Preferred buffer size in bytes (0 = half of free memory)
    #[arg(long, default_value_t = 0)]
    buffer: usize,

    /// Bytes read from stdin per write() call
    #[arg(long, default_value_t = 64)]
    record: usize,

    /// Stop after this many bytes
    #[arg(long, default_value_t = 1 << 20)]
    limit: usize,
}

#[cfg(target_os = "linux")]
fn budget() -> impl MemoryBudget {
    flashbuf_platform::SystemMemory
}

#[cfg(not(target_os = "linux"))]
fn budget() -> impl MemoryBudget {
    flashbuf::FixedBudget::new(64 * 1024 * 1024)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dir = args.out.parent().context("output path has no parent")?;
    let name = args
        .out
        .file_name()
        .and_then(|n| n.to_str())
        .context("output file name is not UTF-8")?;

    let config = WriterConfig::new().with_preferred_size(args.buffer);
    let mut writer = BufferedWriter::with_config(FileBackend::new(dir), budget(), config);
    writer.open(name)?;
    log::info!(
        "capturing into {} with a {} buffer ({:?})",
        args.out.display(),
        writer.capacity(),
        writer.mode()
    );

    let mut stdin = std::io::stdin().lock();
    let mut record = vec![0u8; args.record.max(1)];
    let mut total = 0;
    while total < args.limit {
        let want = record.len().min(args.limit - total);
        let n = stdin.read(&mut record[..want])?;
        if n == 0 {
            break;
        }
        writer.write(&record[..n])?;
        total += n;
    }

    let tail = writer.close()?;
    let stats = writer.last_session_stats().copied().unwrap_or_default();
    println!(
        "{} bytes in {} physical writes ({} flushed at close)",
        stats.bytes_flushed, stats.physical_writes, tail
    );
    Ok(())
}
