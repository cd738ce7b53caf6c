//! Buffered sessions written to real files.

use flashbuf::{BufferedWriter, FixedBudget, WriteMode, WriterConfig};
use flashbuf_platform::FileBackend;

#[test]
fn test_buffered_session_round_trips_to_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let record = b"2026-10-17T12:00:00,410,0.1234\n";

    {
        let config = WriterConfig::new().with_preferred_size(4096);
        let mut writer =
            BufferedWriter::with_config(FileBackend::new(dir.path()), FixedBudget::new(1 << 20), config);
        writer.open("/spectra.csv")?;
        for _ in 0..500 {
            writer.write(record)?;
        }
        let stats = *writer.stats().unwrap();
        assert_eq!(stats.physical_writes, (500 * record.len()) / 4096);
        writer.close()?;
    }

    let stored = std::fs::read(dir.path().join("spectra.csv"))?;
    assert_eq!(stored, record.repeat(500));
    Ok(())
}

#[test]
fn test_passthrough_session_to_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let backend = FileBackend::new(dir.path()).sync_on_close(true);

    let mut writer = BufferedWriter::new(backend, FixedBudget::without_allocation(1 << 20));
    writer.open("raw.bin")?;
    assert_eq!(writer.mode(), Some(WriteMode::Passthrough));
    writer.write(b"abc")?;
    writer.write(b"def")?;
    assert_eq!(writer.close()?, 0);

    assert_eq!(std::fs::read(dir.path().join("raw.bin"))?, b"abcdef");
    Ok(())
}

#[test]
fn test_reopening_truncates_previous_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut writer = BufferedWriter::new(FileBackend::new(dir.path()), FixedBudget::new(1 << 20));

    writer.open("log.txt")?;
    writer.write(b"first session, longer")?;
    writer.close()?;

    writer.open("log.txt")?;
    writer.write(b"second")?;
    writer.close()?;

    assert_eq!(std::fs::read_to_string(dir.path().join("log.txt"))?, "second");
    Ok(())
}

#[test]
fn test_missing_directory_still_accepts_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer =
        BufferedWriter::new(FileBackend::new(dir.path().join("nope")), FixedBudget::new(1 << 20));

    assert!(writer.open("lost.bin").is_err());
    assert!(writer.is_open());
    assert_eq!(writer.write(b"into the void").unwrap(), 13);
    assert_eq!(writer.close().unwrap(), 13);
    assert_eq!(writer.last_session_stats().unwrap().bytes_dropped, 13);
}
