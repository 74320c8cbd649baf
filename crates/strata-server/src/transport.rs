use std::sync::Arc;

use async_trait::async_trait;
use strata_protocol::{Response, TransportRequest};
use strata_store::ObjectTable;
use tracing::debug;

use crate::config::ObjectScope;
use crate::service::LineService;

/// Front tier: hands out short identifiers for posted payloads.
///
/// `GET <id>` echoes the identifier back without consulting any table; the
/// resolve-and-fetch path lives in the client-side gateway.
#[derive(Debug)]
pub struct TransportService {
    scope: ObjectScope,
    shared: Arc<ObjectTable>,
}

impl TransportService {
    pub fn new(scope: ObjectScope) -> Self {
        Self {
            scope,
            shared: Arc::new(ObjectTable::new()),
        }
    }

    pub fn scope(&self) -> ObjectScope {
        self.scope
    }

    /// The process-wide table. Only written to under [`ObjectScope::Process`].
    pub fn shared_table(&self) -> &Arc<ObjectTable> {
        &self.shared
    }
}

impl Default for TransportService {
    fn default() -> Self {
        Self::new(ObjectScope::default())
    }
}

#[async_trait]
impl LineService for TransportService {
    type Session = Arc<ObjectTable>;

    fn name(&self) -> &'static str {
        "transport"
    }

    fn open_session(&self) -> Self::Session {
        match self.scope {
            ObjectScope::Connection => Arc::new(ObjectTable::new()),
            ObjectScope::Process => Arc::clone(&self.shared),
        }
    }

    async fn handle(&self, table: &mut Self::Session, line: &str) -> Response {
        match TransportRequest::parse(line) {
            Ok(TransportRequest::Get { id }) => Response::Line(id),
            Ok(TransportRequest::Post { payload }) => {
                let id = table.insert(payload);
                debug!(%id, records = table.len(), "stored object");
                Response::Line(id.to_string())
            }
            Err(err) => {
                debug!(%err, "rejecting transport command");
                Response::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::{ObjectId, OBJECT_ID_LEN};

    fn id_of(response: Response) -> String {
        match response {
            Response::Line(id) => id,
            other => panic!("expected an id, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_returns_short_id_and_stores_payload() {
        let service = TransportService::default();
        let mut table = service.open_session();
        let id = id_of(service.handle(&mut table, "POST abc").await);
        assert_eq!(id.len(), OBJECT_ID_LEN);
        assert_eq!(table.get(&ObjectId::from_wire(id)).as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn get_echoes_identifier() {
        let service = TransportService::default();
        let mut table = service.open_session();
        let id = id_of(service.handle(&mut table, "POST abc").await);
        let echoed = service.handle(&mut table, &format!("GET {id}")).await;
        assert_eq!(echoed, Response::Line(id));
        // Unknown ids are echoed too.
        assert_eq!(
            service.handle(&mut table, "GET nope!").await,
            Response::Line("nope!".into())
        );
    }

    #[tokio::test]
    async fn malformed_commands_are_errors() {
        let service = TransportService::default();
        let mut table = service.open_session();
        for line in ["", "GET", "POST", "POST a b", "PUT x", "get x", "GET  x"] {
            assert_eq!(service.handle(&mut table, line).await, Response::Error, "{line:?}");
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn connection_scope_isolates_sessions() {
        let service = TransportService::new(ObjectScope::Connection);
        let mut first = service.open_session();
        let second = service.open_session();
        let id = id_of(service.handle(&mut first, "POST x").await);
        assert!(first.contains(&ObjectId::from_wire(id.clone())));
        assert!(!second.contains(&ObjectId::from_wire(id)));
        assert!(service.shared_table().is_empty());
    }

    #[tokio::test]
    async fn process_scope_shares_table() {
        let service = TransportService::new(ObjectScope::Process);
        let mut first = service.open_session();
        let second = service.open_session();
        let id = id_of(service.handle(&mut first, "POST x").await);
        assert_eq!(second.get(&ObjectId::from_wire(id)).as_deref(), Some("x"));
        assert_eq!(service.shared_table().len(), 1);
    }
}
