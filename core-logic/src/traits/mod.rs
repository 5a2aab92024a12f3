use anyhow::Result;
use async_trait::async_trait;

/// What a successful script run reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    /// The single line printed to stdout.
    pub message: String,
    pub address: Option<String>,
    pub tx_hash: Option<String>,
}

#[async_trait]
pub trait Script<Ctx>: Send + Sync {
    /// Returns the name of the script
    fn name(&self) -> &str;

    /// Executes the script. Any error aborts the run.
    async fn run(&self, ctx: Ctx) -> Result<ScriptReport>;
}
