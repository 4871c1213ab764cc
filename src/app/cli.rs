use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use tokio::io::{BufWriter, Stdout};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use super::error::AppError;
use crate::config::Config;
use crate::context::Context;

/// Reusable CLI application runner that handles:
/// - Signal handling (SIGINT, SIGTERM, SIGHUP) mapped onto context cancellation
/// - Stdout buffering
/// - Exit codes (0 = success, 1 = error, 130 = SIGINT, 143 = SIGTERM)
pub struct CliApp {
    name: String,
}

impl CliApp {
    /// Create a new CLI application runner
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `main_fn` and return the process exit code.
    ///
    /// A signal cancels the context handed to `main_fn` instead of killing the
    /// process, so in-flight work fails fast and `main_fn` can still write its
    /// partial results.
    pub async fn run<F, Fut>(self, main_fn: F) -> i32
    where
        F: FnOnce(Context, BufWriter<Stdout>) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        self.run_until(wait_for_signal(), main_fn).await
    }

    /// `run` with the interrupt source supplied by the caller
    async fn run_until<S, F, Fut>(self, interrupt: S, main_fn: F) -> i32
    where
        S: Future<Output = i32> + Send + 'static,
        F: FnOnce(Context, BufWriter<Stdout>) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        let writer = BufWriter::new(tokio::io::stdout());
        let ctx = Context::new();

        // 0 until a signal arrives; stored before the context is cancelled
        let interrupted = Arc::new(AtomicI32::new(0));

        let signal_ctx = ctx.clone();
        let signal_code = interrupted.clone();
        let signal_task = tokio::spawn(async move {
            let code = interrupt.await;
            signal_code.store(code, Ordering::SeqCst);
            signal_ctx.cancel();
        });

        let result = main_fn(ctx, writer).await;
        signal_task.abort();

        let signal_code = match interrupted.load(Ordering::SeqCst) {
            0 => None,
            code => Some(code),
        };

        match (result, signal_code) {
            (Err(e), _) => {
                eprintln!("{}: {}", self.name, e);
                1
            }
            (Ok(()), Some(code)) => {
                eprintln!("{}: interrupted, partial results written", self.name);
                code
            }
            (Ok(()), None) => 0,
        }
    }
}

/// Install the stderr `tracing` subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &Config) {
    if !config.enable_logging {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // A subscriber may already be installed (tests, embedding applications)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Wait for any Unix signal (SIGINT, SIGTERM, SIGHUP) or Ctrl+C
/// Returns the exit code to use (130 for SIGINT, 143 for SIGTERM, etc.)
async fn wait_for_signal() -> i32 {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let handlers = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::hangup()),
        );
        let (mut sigterm, mut sigint, mut sighup) = match handlers {
            (Ok(term), Ok(int), Ok(hup)) => (term, int, hup),
            _ => {
                warn!("Failed to install signal handlers, interrupts will not be handled");
                return std::future::pending().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                eprintln!("Received SIGTERM");
                143 // 128 + 15
            }
            _ = sigint.recv() => {
                eprintln!("Received SIGINT");
                130 // 128 + 2
            }
            _ = sighup.recv() => {
                eprintln!("Received SIGHUP");
                129 // 128 + 1
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            return std::future::pending().await;
        }
        eprintln!("Received Ctrl+C");
        130
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn cli_app_new() {
        let app = CliApp::new("test-app");
        assert_eq!(app.name(), "test-app");
    }

    #[tokio::test]
    async fn successful_run_exits_zero() {
        let code = CliApp::new("test-app")
            .run(|ctx, mut writer| async move {
                assert!(!ctx.is_cancelled());
                writer.flush().await?;
                Ok(())
            })
            .await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn failed_run_exits_one() {
        let code = CliApp::new("test-app")
            .run(|_, _| async { Err(AppError::InvalidArguments("no input".to_string())) })
            .await;
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn interrupt_sets_exit_code_even_if_main_returns_at_once() {
        let code = CliApp::new("test-app")
            .run_until(async { 143 }, |ctx, _| async move {
                // Return as soon as cancellation is visible
                ctx.done().await;
                Ok(())
            })
            .await;
        assert_eq!(code, 143);
    }

    #[tokio::test]
    async fn error_wins_over_interrupt() {
        let code = CliApp::new("test-app")
            .run_until(async { 130 }, |ctx, _| async move {
                ctx.done().await;
                Err(AppError::InvalidArguments("stopped".to_string()))
            })
            .await;
        assert_eq!(code, 1);
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let config = Config {
            enable_logging: false,
            ..Default::default()
        };
        init_tracing(&config);
    }
}
