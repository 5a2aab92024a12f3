use crate::traits::{Script, ScriptReport};
use anyhow::Result;
use std::io::Write;
use tracing::{info, Instrument};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

pub struct ScriptRunner;

impl ScriptRunner {
    /// Runs one script to completion inside a span named after it.
    pub async fn run<Ctx, S>(script: &S, ctx: Ctx) -> Result<ScriptReport>
    where
        S: Script<Ctx> + ?Sized,
        Ctx: Send,
    {
        let span = tracing::info_span!("script", name = script.name());
        let start_time = std::time::Instant::now();

        let result = script.run(ctx).instrument(span).await;

        match &result {
            Ok(report) => info!(
                "SUCCESS {} in {:.2?}: {}",
                script.name(),
                start_time.elapsed(),
                report.message
            ),
            // report() prints the error to stderr
            Err(e) => info!("FAILED {}: {:#}", script.name(), e),
        }

        result
    }

    /// Map a script result onto process output and an exit code.
    ///
    /// Success writes exactly one line to `stdout`; failure writes the full
    /// error chain to `stderr` and nothing to `stdout`.
    pub fn report<O: Write, E: Write>(
        result: &Result<ScriptReport>,
        stdout: &mut O,
        stderr: &mut E,
    ) -> u8 {
        match result {
            Ok(report) => match writeln!(stdout, "{}", report.message).and_then(|_| stdout.flush())
            {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    let _ = writeln!(stderr, "Failed to write result: {}", e);
                    EXIT_FAILURE
                }
            },
            Err(e) => {
                let _ = writeln!(stderr, "{:?}", e);
                EXIT_FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl Script<()> for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(&self, _ctx: ()) -> Result<ScriptReport> {
            match self.0 {
                Some(addr) => Ok(ScriptReport {
                    message: format!("Deployed Fixed Address: {}", addr),
                    address: Some(addr.to_string()),
                    tx_hash: None,
                }),
                None => Err(anyhow::anyhow!("insufficient funds for gas")),
            }
        }
    }

    #[tokio::test]
    async fn test_success_writes_one_stdout_line() {
        let result = ScriptRunner::run(&Fixed(Some("0xabc")), ()).await;
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let code = ScriptRunner::report(&result, &mut out, &mut err);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("0xabc"));
        assert!(err.is_empty());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_is_not_echoed_at_default_console_level() {
        let console = Captured::default();
        let writer = console.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = ScriptRunner::run(&Fixed(None), ()).await;
        assert!(result.is_err());

        let logged = String::from_utf8(console.0.lock().unwrap().clone()).unwrap();
        assert!(logged.is_empty(), "unexpected console output: {}", logged);
    }

    #[tokio::test]
    async fn test_failure_writes_stderr_only() {
        let result = ScriptRunner::run(&Fixed(None), ()).await;
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let code = ScriptRunner::report(&result, &mut out, &mut err);

        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        assert!(String::from_utf8(err)
            .unwrap()
            .contains("insufficient funds for gas"));
    }
}
