use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::error::IoError;
use crate::batch::BatchSummary;
use crate::domain::{PaymentResponse, RefundResponse};

/// Short description of a successful response for the report's `detail` column
pub trait ReportDetail {
    fn detail(&self) -> String;
}

impl ReportDetail for PaymentResponse {
    fn detail(&self) -> String {
        with_reference(self.status.as_str(), &self.trade_no)
    }
}

impl ReportDetail for RefundResponse {
    fn detail(&self) -> String {
        with_reference(self.status.as_str(), &self.refund_no)
    }
}

fn with_reference(status: &str, reference: &str) -> String {
    if reference.is_empty() {
        status.to_string()
    } else {
        format!("{status} {reference}")
    }
}

/// Write one `index,status,reference,detail` row per batch item, in input order.
///
/// `references` holds the caller's identifier for each input item.
pub async fn write_report<R, W>(
    summary: &BatchSummary<R>,
    references: &[String],
    mut writer: W,
) -> Result<(), IoError>
where
    R: ReportDetail,
    W: AsyncWrite + Unpin + Send,
{
    let reference = |index: usize| references.get(index).map(String::as_str).unwrap_or("");

    let mut rows: Vec<(usize, &str, String)> = summary
        .indexed_results()
        .map(|(index, response)| (index, "SUCCESS", response.detail()))
        .chain(summary.failures.iter().map(|failure| {
            let detail = format!("{} failed: {}", failure.kind, failure.reason);
            (failure.index, "FAILED", detail)
        }))
        .collect();
    rows.sort_by_key(|(index, _, _)| *index);

    let mut out = csv::Writer::from_writer(Vec::new());
    out.write_record(["index", "status", "reference", "detail"])?;
    for (index, status, detail) in &rows {
        let position = index.to_string();
        out.write_record([position.as_str(), *status, reference(*index), detail.as_str()])?;
    }
    let buffer = out.into_inner().map_err(|e| e.into_error())?;

    writer.write_all(&buffer).await?;
    writer.flush().await?;
    Ok(())
}
