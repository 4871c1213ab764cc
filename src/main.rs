use autopay::prelude::*;
use tokio::io::{BufWriter, Stdout};

#[tokio::main]
async fn main() {
    let code = CliApp::new("autopay").run(run_batch).await;
    std::process::exit(code);
}

/// Load a CSV batch, dispatch it and write the per-item report to stdout
async fn run_batch(ctx: Context, mut stdout: BufWriter<Stdout>) -> Result<(), AppError> {
    let args = BatchArgs::parse(std::env::args().collect())?;
    let config = Config::from_env()?;
    init_tracing(&config);

    let client = AutoPayClient::new(config)?;

    let (request, references) = match args.kind {
        BatchKind::Payments => {
            let items = PaymentCsvStream::from_file(&args.input)
                .await?
                .collect_batch()
                .await;
            let references = items.iter().map(|r| r.out_trade_no.clone()).collect::<Vec<_>>();
            (BatchRequest::Payments(items), references)
        }
        BatchKind::Refunds => {
            let items = RefundCsvStream::from_file(&args.input)
                .await?
                .collect_batch()
                .await;
            let references = items.iter().map(|r| r.reference().to_string()).collect::<Vec<_>>();
            (BatchRequest::Refunds(items), references)
        }
    };

    // Cancellation still yields a summary, so the partial report is written
    let result = client
        .batch_process(&ctx, request, args.max_workers)
        .await?;

    match result {
        BatchResult::Payments(summary) => write_report(&summary, &references, &mut stdout).await?,
        BatchResult::Refunds(summary) => write_report(&summary, &references, &mut stdout).await?,
    }

    client.close();
    Ok(())
}
