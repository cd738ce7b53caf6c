//! How the writer behaves when storage misbehaves.

use flashbuf::{
    BufferedWriter, CHUNK_SIZE, FixedBudget, MemoryBackend, MemoryBackendError,
    OpenFailurePolicy, WriterConfig, WriterError,
};

fn read_only_backend() -> MemoryBackend {
    let mut backend = MemoryBackend::new();
    backend.set_read_only(true);
    backend
}

#[test]
fn test_open_failure_proceeds_by_default() {
    let mut writer = BufferedWriter::new(read_only_backend(), FixedBudget::new(20_000));

    let err = writer.open("ro.bin").unwrap_err();
    assert!(matches!(err, WriterError::Open(MemoryBackendError::ReadOnly)));

    // The session is live but has nowhere to put bytes.
    assert!(writer.is_open());
    assert!(!writer.has_stream());

    assert_eq!(writer.write(&[0xAB; 10_000]).unwrap(), 10_000);
    assert_eq!(writer.filled(), 1808);
    assert_eq!(writer.stats().unwrap().bytes_dropped, 8192);

    assert_eq!(writer.close().unwrap(), 1808);
    let stats = writer.last_session_stats().unwrap();
    assert_eq!(stats.bytes_dropped, 10_000);
    assert_eq!(stats.physical_writes, 0);
    assert!(writer.backend().write_log().is_empty());
}

#[test]
fn test_open_failure_can_reject() {
    let config = WriterConfig::new().with_open_failure(OpenFailurePolicy::Reject);
    let mut writer =
        BufferedWriter::with_config(read_only_backend(), FixedBudget::new(20_000), config);

    assert!(matches!(writer.open("ro.bin"), Err(WriterError::Open(_))));
    assert!(!writer.is_open());
    assert!(matches!(writer.write(b"x"), Err(WriterError::NotOpen)));
    assert_eq!(writer.close().unwrap(), 0);
}

#[test]
fn test_full_storage_surfaces_write_and_flush_errors() {
    let config = WriterConfig::new().with_preferred_size(CHUNK_SIZE);
    let mut writer =
        BufferedWriter::with_config(MemoryBackend::with_limit(10_000), FixedBudget::new(1 << 20), config);
    writer.open("full.bin").unwrap();

    match writer.write(&[1u8; 3 * CHUNK_SIZE]) {
        Err(WriterError::Write { accepted, source }) => {
            assert_eq!(accepted, 3 * CHUNK_SIZE);
            assert_eq!(
                source,
                MemoryBackendError::Full {
                    requested: CHUNK_SIZE,
                    available: 10_000 - 2 * CHUNK_SIZE,
                }
            );
        }
        other => panic!("expected a write error, got {:?}", other),
    }
    assert_eq!(writer.filled(), CHUNK_SIZE);

    assert!(matches!(
        writer.close(),
        Err(WriterError::Flush { pending, .. }) if pending == CHUNK_SIZE
    ));
    assert!(!writer.is_open());
    assert_eq!(writer.backend().open_streams(), 0);
    assert_eq!(writer.backend().contents("full.bin").map(<[u8]>::len), Some(2 * CHUNK_SIZE));
}

#[test]
fn test_passthrough_write_failure_accepts_nothing() {
    let mut writer =
        BufferedWriter::new(MemoryBackend::with_limit(4), FixedBudget::without_allocation(1 << 20));
    writer.open("tiny.bin").unwrap();

    assert!(matches!(
        writer.write(b"too long"),
        Err(WriterError::Write { accepted: 0, .. })
    ));
    assert_eq!(writer.write(b"ok").unwrap(), 2);
    assert_eq!(writer.close().unwrap(), 0);
}

#[test]
fn test_errors_propagate_through_anyhow() {
    fn record(writer: &mut BufferedWriter<MemoryBackend, FixedBudget>) -> anyhow::Result<usize> {
        writer.open("ro.bin")?;
        Ok(writer.write(b"never")?)
    }

    let mut writer = BufferedWriter::new(read_only_backend(), FixedBudget::new(20_000));
    let err = record(&mut writer).unwrap_err();
    assert!(err.to_string().contains("Failed to open storage"));
    assert!(err.chain().any(|cause| cause.to_string().contains("read-only")));
}
