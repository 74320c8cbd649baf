use async_trait::async_trait;
use strata_protocol::Response;

/// A line-oriented service: one command line in, one response out.
///
/// Each accepted connection gets its own `Session` from
/// [`LineService::open_session`]; anything stored there is dropped with the
/// connection. Process-wide state lives on the service itself and must be
/// safe to share across connection tasks.
#[async_trait]
pub trait LineService: Send + Sync + 'static {
    type Session: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn open_session(&self) -> Self::Session;

    /// Handle one command line (newline stripped). Never fails: every
    /// problem is reported through the returned response.
    async fn handle(&self, session: &mut Self::Session, line: &str) -> Response;
}
