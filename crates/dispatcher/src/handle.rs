//! SinkHandle - one destination table and its staging table

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, instrument, warn};

use contracts::{
    ContractError, QualifiedTable, RecordDecoder, SinkTarget, StagingStore, TopicName,
};

use crate::metrics::SinkMetrics;

/// One record of a batch that could not be staged
#[derive(Debug)]
pub struct RecordFailure {
    /// 1-based record number within the batch
    pub line: u64,
    pub error: ContractError,
}

/// Outcome of scanning one ndjson batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records read from the body
    pub scanned: u64,
    /// Records written to the staging table
    pub written: u64,
    /// Per-record failures, in body order
    pub failures: Vec<RecordFailure>,
    /// Body read error that ended the scan early
    pub read_error: Option<io::Error>,
}

impl BatchReport {
    /// Number of failed records
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }

    /// No record failed and the body was read to the end
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.read_error.is_none()
    }
}

/// Handle for a registered sink, held for the process lifetime
#[derive(Debug)]
pub struct SinkHandle {
    /// Changefeed source table
    source_table: TopicName,
    /// Receiving table
    destination: QualifiedTable,
    /// Staging table in the sink database
    staging: QualifiedTable,
    /// Longest record held in memory, newline excluded
    max_record_bytes: usize,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
}

impl SinkHandle {
    pub fn new(
        source_table: TopicName,
        destination: QualifiedTable,
        staging: QualifiedTable,
        max_record_bytes: usize,
    ) -> Self {
        Self {
            source_table,
            destination,
            staging,
            max_record_bytes,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn source_table(&self) -> &TopicName {
        &self.source_table
    }

    pub fn destination(&self) -> &QualifiedTable {
        &self.destination
    }

    pub fn staging(&self) -> &QualifiedTable {
        &self.staging
    }

    pub fn max_record_bytes(&self) -> usize {
        self.max_record_bytes
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// View handed to the checkpoint collaborator
    pub fn target(&self) -> SinkTarget {
        SinkTarget {
            source_table: self.source_table.clone(),
            destination: self.destination.clone(),
            staging: self.staging.clone(),
        }
    }

    /// Stream an ndjson body into the staging table, one record at a time.
    ///
    /// A record that fails to decode or write is logged and reported, and the
    /// scan moves on to the next record. A record longer than
    /// `max_record_bytes` is skipped up to its newline and reported the same
    /// way. Only a body read error stops the scan.
    #[instrument(
        name = "sink_handle_batch",
        skip(self, store, decoder, body),
        fields(staging = %self.staging)
    )]
    pub async fn handle_batch<S, D, R>(&self, store: &S, decoder: &D, mut body: R) -> BatchReport
    where
        S: StagingStore + Sync,
        D: RecordDecoder,
        R: AsyncBufRead + Unpin + Send,
    {
        self.metrics.inc_batch_count();

        let mut report = BatchReport::default();
        let mut record = Vec::new();

        loop {
            let result = match read_bounded_record(&mut body, &mut record, self.max_record_bytes)
                .await
            {
                Ok(ReadRecord::Eof) => break,
                Ok(ReadRecord::Record) => {
                    report.scanned += 1;
                    let line = record.strip_suffix(b"\r").unwrap_or(&record);
                    self.stage_record(store, decoder, line).await
                }
                Ok(ReadRecord::TooLarge { len }) => {
                    report.scanned += 1;
                    Err(ContractError::record_too_large(len, self.max_record_bytes))
                }
                Err(e) => {
                    self.metrics.inc_read_error_count();
                    error!(
                        staging = %self.staging,
                        scanned = report.scanned,
                        error = %e,
                        "Body read failed"
                    );
                    report.read_error = Some(e);
                    break;
                }
            };

            match result {
                Ok(()) => {
                    self.metrics.inc_write_count();
                    report.written += 1;
                }
                Err(e) => {
                    self.metrics.inc_failure_count();
                    warn!(
                        staging = %self.staging,
                        line = report.scanned,
                        error = %e,
                        "Record failed"
                    );
                    // Keep scanning
                    report.failures.push(RecordFailure {
                        line: report.scanned,
                        error: e,
                    });
                }
            }
        }

        debug!(
            staging = %self.staging,
            scanned = report.scanned,
            written = report.written,
            failed = report.failed(),
            "Batch scanned"
        );
        report
    }

    async fn stage_record<S, D>(
        &self,
        store: &S,
        decoder: &D,
        record: &[u8],
    ) -> Result<(), ContractError>
    where
        S: StagingStore + Sync,
        D: RecordDecoder,
    {
        let mutation = decoder.decode_record(record)?;
        store.write_to_staging_table(&self.staging, &mutation).await
    }
}

/// Result of reading one record from the body
#[derive(Debug, PartialEq, Eq)]
enum ReadRecord {
    /// The record is in the buffer, newline stripped
    Record,
    /// The record ran past the limit and was consumed without being kept
    TooLarge { len: usize },
    /// End of body
    Eof,
}

/// Read one newline-terminated record, holding at most `max_len` bytes.
///
/// A longer record is consumed through its newline (or end of body) and
/// dropped. A final record without a newline is still returned.
async fn read_bounded_record<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_len: usize,
) -> io::Result<ReadRecord>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();

    let mut started = false;
    let mut len = 0usize;
    let mut too_large = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        started = true;

        let newline = available.iter().position(|&b| b == b'\n');
        let chunk = &available[..newline.unwrap_or(available.len())];
        let chunk_len = chunk.len();

        len += chunk_len;
        if !too_large {
            if len > max_len {
                too_large = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }

        reader.consume(chunk_len + usize::from(newline.is_some()));
        if newline.is_some() {
            break;
        }
    }

    Ok(match (started, too_large) {
        (false, _) => ReadRecord::Eof,
        (true, true) => ReadRecord::TooLarge { len },
        (true, false) => ReadRecord::Record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, MockStore};
    use contracts::{RowMutation, DEFAULT_MAX_RECORD_BYTES};
    use ingestion::JsonRecordDecoder;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, AsyncReadExt, BufReader, ReadBuf};

    fn handle() -> SinkHandle {
        let destination = QualifiedTable::new("defaultdb", "orders");
        let staging = QualifiedTable::staging_for("_cdc_sink", &destination);
        SinkHandle::new("orders".into(), destination, staging, DEFAULT_MAX_RECORD_BYTES)
    }

    fn body(lines: &[String]) -> String {
        lines.iter().map(|l| format!("{l}\n")).collect()
    }

    #[tokio::test]
    async fn test_clean_batch() {
        let store = MockStore::default();
        let handle = handle();
        let body = body(&(1..=3).map(record).collect::<Vec<_>>());

        let report = handle
            .handle_batch(&store, &JsonRecordDecoder, body.as_bytes())
            .await;

        assert!(report.is_clean());
        assert_eq!(report.scanned, 3);
        assert_eq!(report.written, 3);
        let written = store.written(handle.staging());
        assert_eq!(written.len(), 3);
        assert_eq!(written[0].key, "[1]");
        assert_eq!(handle.metrics().snapshot().write_count, 3);
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_abort_batch() {
        let store = MockStore::default();
        let handle = handle();
        let mut lines: Vec<String> = (1..=10).map(record).collect();
        lines[4] = "{this is not json".to_string();

        let report = handle
            .handle_batch(&store, &JsonRecordDecoder, body(&lines).as_bytes())
            .await;

        assert_eq!(report.scanned, 10);
        assert_eq!(report.written, 9);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].line, 5);
        assert!(matches!(
            report.failures[0].error,
            ContractError::RecordDecode { .. }
        ));
        assert_eq!(store.written(handle.staging()).len(), 9);

        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.write_count, 9);
        assert_eq!(snapshot.failure_count, 1);
    }

    #[tokio::test]
    async fn test_write_failure_does_not_abort_batch() {
        let store = MockStore {
            fail_key: Some("[2]".to_string()),
            ..Default::default()
        };
        let handle = handle();
        let body = body(&(1..=4).map(record).collect::<Vec<_>>());

        let report = handle
            .handle_batch(&store, &JsonRecordDecoder, body.as_bytes())
            .await;

        assert_eq!(report.scanned, 4);
        assert_eq!(report.written, 3);
        assert_eq!(report.failures[0].line, 2);
        assert!(matches!(
            report.failures[0].error,
            ContractError::StagingWrite { .. }
        ));
    }

    #[tokio::test]
    async fn test_crlf_and_missing_final_newline() {
        let store = MockStore::default();
        let handle = handle();
        let body = format!("{}\r\n{}", record(1), record(2));

        let report = handle
            .handle_batch(&store, &JsonRecordDecoder, body.as_bytes())
            .await;

        assert!(report.is_clean());
        assert_eq!(report.written, 2);
    }

    #[tokio::test]
    async fn test_empty_body() {
        let store = MockStore::default();
        let report = handle()
            .handle_batch(&store, &JsonRecordDecoder, &b""[..])
            .await;
        assert_eq!(report.scanned, 0);
        assert!(report.is_clean());
    }

    /// Yields one record, then fails
    struct BrokenBody {
        first: Option<Vec<u8>>,
    }

    impl AsyncRead for BrokenBody {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.first.take() {
                Some(bytes) => {
                    buf.put_slice(&bytes);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "client went away",
                ))),
            }
        }
    }

    #[tokio::test]
    async fn test_read_error_ends_scan() {
        let store = MockStore::default();
        let handle = handle();
        let body = BufReader::new(BrokenBody {
            first: Some(format!("{}\n", record(1)).into_bytes()),
        });

        let report = handle
            .handle_batch(&store, &JsonRecordDecoder, body)
            .await;

        assert_eq!(report.written, 1);
        assert!(report.read_error.is_some());
        assert!(!report.is_clean());
        assert_eq!(handle.metrics().snapshot().read_error_count, 1);
    }

    /// Remembers the longest record it was handed
    #[derive(Default)]
    struct LongestRecord {
        longest: AtomicUsize,
    }

    impl RecordDecoder for LongestRecord {
        fn decode_record(&self, line: &[u8]) -> Result<RowMutation, ContractError> {
            self.longest.fetch_max(line.len(), Ordering::Relaxed);
            JsonRecordDecoder.decode_record(line)
        }
    }

    #[tokio::test]
    async fn test_oversized_record_is_not_buffered() {
        const LIMIT: usize = 4 * 1024;
        const OVERSIZED: u64 = 16 * 1024 * 1024;

        let store = MockStore::default();
        let destination = QualifiedTable::new("defaultdb", "orders");
        let staging = QualifiedTable::staging_for("_cdc_sink", &destination);
        let handle = SinkHandle::new("orders".into(), destination, staging, LIMIT);
        let decoder = LongestRecord::default();

        // 16 MiB without a newline, then one good record
        let tail = Cursor::new(format!("\n{}\n", record(1)).into_bytes());
        let body = BufReader::new(tokio::io::repeat(b'x').take(OVERSIZED).chain(tail));

        let report = handle.handle_batch(&store, &decoder, body).await;

        assert_eq!(report.scanned, 2);
        assert_eq!(report.written, 1);
        assert_eq!(report.failures[0].line, 1);
        assert!(matches!(
            report.failures[0].error,
            ContractError::RecordTooLarge { len, limit }
                if len == OVERSIZED as usize && limit == LIMIT
        ));
        assert!(report.read_error.is_none());
        assert!(decoder.longest.load(Ordering::Relaxed) <= LIMIT);
        assert_eq!(store.written(handle.staging())[0].key, "[1]");
    }

    #[tokio::test]
    async fn test_oversized_final_record_without_newline() {
        let store = MockStore::default();
        let destination = QualifiedTable::new("defaultdb", "orders");
        let staging = QualifiedTable::staging_for("_cdc_sink", &destination);
        let handle = SinkHandle::new("orders".into(), destination, staging, 8);
        let body = format!("{}\n{}", "y".repeat(4), "z".repeat(9));

        let report = handle
            .handle_batch(&store, &JsonRecordDecoder, body.as_bytes())
            .await;

        assert_eq!(report.scanned, 2);
        assert!(matches!(
            report.failures[1].error,
            ContractError::RecordTooLarge { len: 9, limit: 8 }
        ));
    }

    #[tokio::test]
    async fn test_read_bounded_record_across_small_reads() {
        let mut body = BufReader::with_capacity(3, &b"abcdef\n\nlast"[..]);
        let mut buf = Vec::new();

        let read = read_bounded_record(&mut body, &mut buf, 6).await.unwrap();
        assert_eq!(read, ReadRecord::Record);
        assert_eq!(buf, b"abcdef");

        let read = read_bounded_record(&mut body, &mut buf, 6).await.unwrap();
        assert_eq!(read, ReadRecord::Record);
        assert!(buf.is_empty());

        let read = read_bounded_record(&mut body, &mut buf, 3).await.unwrap();
        assert_eq!(read, ReadRecord::TooLarge { len: 4 });
        assert!(buf.is_empty());

        let read = read_bounded_record(&mut body, &mut buf, 6).await.unwrap();
        assert_eq!(read, ReadRecord::Eof);
    }
}
