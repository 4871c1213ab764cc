use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::io::AsyncRead;
use futures::{Stream, StreamExt, stream};
use tokio::fs::File;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, warn};

use super::error::IoError;
use super::parse::{BatchRecord, RawPaymentRecord, RawRefundRecord};

/// Async stream of batch requests from CSV input
pub struct CsvRequestStream<R: BatchRecord> {
    inner: Pin<Box<dyn Stream<Item = Result<R::Request, IoError>> + Send>>,
}

pub type PaymentCsvStream = CsvRequestStream<RawPaymentRecord>;
pub type RefundCsvStream = CsvRequestStream<RawRefundRecord>;

impl<R: BatchRecord> CsvRequestStream<R> {
    /// Create a new request stream from an async reader
    pub fn new<Rd>(reader: Rd) -> Self
    where
        Rd: AsyncRead + Unpin + Send + 'static,
    {
        let mut csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .flexible(true)
            .create_reader(reader);

        let stream = stream::once(async move {
            let headers = csv_reader.headers().await.cloned();
            (headers, csv_reader)
        })
        .flat_map(|(headers, csv_reader)| match headers {
            Ok(headers) => csv_reader
                .into_records()
                .enumerate()
                .map(move |(row, result)| decode_row::<R>(&headers, row, result))
                .left_stream(),
            Err(e) => stream::iter([Err(IoError::from(e))]).right_stream(),
        });

        Self {
            inner: Box::pin(stream),
        }
    }

    /// Open `path` and stream its rows
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::new(file.compat()))
    }
}

impl<R: BatchRecord> CsvRequestStream<R>
where
    R::Request: Default,
{
    /// Drain the stream into a batch, one item per data row.
    ///
    /// A row the CSV layer cannot decode becomes an empty request, which
    /// fails validation in the batch and keeps its position.
    pub async fn collect_batch(mut self) -> Vec<R::Request> {
        let mut items = Vec::new();
        while let Some(result) = self.next().await {
            match result {
                Ok(request) => items.push(request),
                Err(e) => {
                    warn!(row = items.len(), error = %e, "Undecodable CSV row");
                    items.push(R::Request::default());
                }
            }
        }
        debug!(rows = items.len(), "Loaded batch from CSV");
        items
    }
}

/// Decode one record by header name. Short rows are padded with empty
/// fields, so the columns they do carry still reach the request.
fn decode_row<R: BatchRecord>(
    headers: &StringRecord,
    row: usize,
    result: Result<StringRecord, csv_async::Error>,
) -> Result<R::Request, IoError> {
    let mut record = result?;
    if record.len() < headers.len() {
        debug!(row, fields = record.len(), "Padding short CSV row");
        while record.len() < headers.len() {
            record.push_field("");
        }
    }
    let raw: R = record.deserialize(Some(headers))?;
    Ok(raw.into_request(row))
}

impl<R: BatchRecord> Stream for CsvRequestStream<R> {
    type Item = Result<R::Request, IoError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
