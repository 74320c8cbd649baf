//! Typed clients for each tier.

use strata_index::{NodeDescriptor, PartitionMap, PartitionSnapshot};
use strata_protocol::{validate_token, IndexRequest, Response, StorageRequest, TransportRequest};
use strata_store::ObjectId;

use crate::error::{ClientError, ClientResult};
use crate::line::LineClient;

fn unexpected(client: &LineClient, reply: Response) -> ClientError {
    ClientError::UnexpectedReply {
        peer: client.peer().to_owned(),
        reply: reply.encode().trim_end_matches('\n').to_owned(),
    }
}

/// Client for the Transport tier.
#[derive(Debug)]
pub struct TransportClient {
    conn: LineClient,
}

impl TransportClient {
    pub fn new(conn: LineClient) -> Self {
        Self { conn }
    }

    pub async fn connect(addr: &str) -> ClientResult<Self> {
        Ok(Self::new(LineClient::connect(addr).await?))
    }

    /// Register `payload` and return its new identifier.
    pub async fn post(&mut self, payload: &str) -> ClientResult<ObjectId> {
        validate_token(payload)?;
        let line = TransportRequest::Post { payload: payload.to_owned() }.to_string();
        match Response::decode_text(&self.conn.request(&line).await?) {
            Response::Line(id) => Ok(ObjectId::from_wire(id)),
            Response::Error => Err(ClientError::Rejected(self.conn.peer().to_owned())),
            other => Err(unexpected(&self.conn, other)),
        }
    }

    /// `GET <id>`; the tier answers with the identifier itself.
    pub async fn get(&mut self, id: &ObjectId) -> ClientResult<String> {
        validate_token(id.as_str())?;
        let line = TransportRequest::Get { id: id.to_string() }.to_string();
        match Response::decode_text(&self.conn.request(&line).await?) {
            Response::Line(text) => Ok(text),
            Response::Error => Err(ClientError::Rejected(self.conn.peer().to_owned())),
            other => Err(unexpected(&self.conn, other)),
        }
    }
}

/// Client for the Index tier.
#[derive(Debug)]
pub struct IndexClient {
    conn: LineClient,
}

impl IndexClient {
    pub fn new(conn: LineClient) -> Self {
        Self { conn }
    }

    pub async fn connect(addr: &str) -> ClientResult<Self> {
        Ok(Self::new(LineClient::connect(addr).await?))
    }

    /// Fetch the full partition map.
    pub async fn partitions(&mut self) -> ClientResult<PartitionSnapshot> {
        let line = IndexRequest::Get.to_string();
        match Response::decode_text(&self.conn.request(&line).await?) {
            Response::Line(json) => Ok(PartitionMap::parse_snapshot(&json)?),
            Response::Error => Err(ClientError::Rejected(self.conn.peer().to_owned())),
            other => Err(unexpected(&self.conn, other)),
        }
    }

    /// Append `node` to partition 0.
    pub async fn register(&mut self, node: &NodeDescriptor) -> ClientResult<()> {
        let descriptor = node.to_string();
        validate_token(&descriptor)?;
        let line = IndexRequest::Post { descriptor }.to_string();
        match Response::decode_text(&self.conn.request(&line).await?) {
            Response::Empty => Ok(()),
            Response::Error => Err(ClientError::Rejected(self.conn.peer().to_owned())),
            other => Err(unexpected(&self.conn, other)),
        }
    }
}

/// Client for one Storage node.
#[derive(Debug)]
pub struct StorageClient {
    conn: LineClient,
}

impl StorageClient {
    pub fn new(conn: LineClient) -> Self {
        Self { conn }
    }

    pub async fn connect(addr: &str) -> ClientResult<Self> {
        Ok(Self::new(LineClient::connect(addr).await?))
    }

    pub fn peer(&self) -> &str {
        self.conn.peer()
    }

    /// Overwrite the blob under `key` with `body`.
    pub async fn put(&mut self, key: &str, body: &str) -> ClientResult<()> {
        validate_token(key)?;
        validate_token(body)?;
        let line = StorageRequest::Post { path: key.to_owned(), body: body.to_owned() }.to_string();
        match Response::decode_storage(&self.conn.request(&line).await?)? {
            Response::Ok(None) => Ok(()),
            Response::Fail(reason) => Err(ClientError::Storage(reason)),
            Response::Error => Err(ClientError::Rejected(self.conn.peer().to_owned())),
            other => Err(unexpected(&self.conn, other)),
        }
    }

    /// Read the blob under `key` as text.
    pub async fn get(&mut self, key: &str) -> ClientResult<String> {
        validate_token(key)?;
        let line = StorageRequest::Get { path: key.to_owned() }.to_string();
        match Response::decode_storage(&self.conn.request(&line).await?)? {
            Response::Ok(Some(body)) => Ok(body),
            Response::Fail(reason) => Err(ClientError::Storage(reason)),
            Response::Error => Err(ClientError::Rejected(self.conn.peer().to_owned())),
            other => Err(unexpected(&self.conn, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_server::{ServerConfig, StrataServer, Tier};

    async fn cluster(root: &std::path::Path) -> strata_server::BoundServer {
        let mut config = ServerConfig::ephemeral();
        config.storage.root = Some(root.to_path_buf());
        StrataServer::new(config).bind(&Tier::ALL).await.unwrap()
    }

    fn addr(server: &strata_server::BoundServer, tier: Tier) -> String {
        server.local_addr(tier).unwrap().to_string()
    }

    #[tokio::test]
    async fn transport_client() {
        let dir = tempfile::tempdir().unwrap();
        let server = cluster(dir.path()).await;
        let mut client = TransportClient::connect(&addr(&server, Tier::Transport)).await.unwrap();

        let id = client.post("payload").await.unwrap();
        assert_eq!(id.as_str().len(), 5);
        assert_eq!(client.get(&id).await.unwrap(), id.as_str());
        assert!(matches!(
            client.post("has space").await,
            Err(ClientError::Protocol(_))
        ));
        server.shutdown();
    }

    #[tokio::test]
    async fn index_client() {
        let dir = tempfile::tempdir().unwrap();
        let server = cluster(dir.path()).await;
        let mut client = IndexClient::connect(&addr(&server, Tier::Index)).await.unwrap();

        client.register(&NodeDescriptor::from_addr("n1:1")).await.unwrap();
        client
            .register(&NodeDescriptor::parse(r#"{"addr":"n2:2"}"#).unwrap())
            .await
            .unwrap();
        let map = client.partitions().await.unwrap();
        let addrs: Vec<_> = map[&0].iter().map(|n| n.address().unwrap().to_owned()).collect();
        assert_eq!(addrs, vec!["localhost:12002", "n1:1", "n2:2"]);
        server.shutdown();
    }

    #[tokio::test]
    async fn storage_client() {
        let dir = tempfile::tempdir().unwrap();
        let server = cluster(dir.path()).await;
        let mut client = StorageClient::connect(&addr(&server, Tier::Storage)).await.unwrap();

        client.put("k", "v1").await.unwrap();
        assert_eq!(client.get("k").await.unwrap(), "v1");
        assert!(matches!(client.get("missing").await, Err(ClientError::Storage(_))));
        assert!(matches!(client.get("../k").await, Err(ClientError::Storage(_))));
        server.shutdown();
    }

    #[tokio::test]
    async fn multi_line_blob_keeps_connection_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("k"), b"line1\nline2").unwrap();
        let server = cluster(dir.path()).await;
        let mut client = StorageClient::connect(&addr(&server, Tier::Storage)).await.unwrap();

        assert!(matches!(client.get("k").await, Err(ClientError::Storage(_))));
        client.put("other", "v").await.unwrap();
        assert_eq!(client.get("other").await.unwrap(), "v");
        server.shutdown();
    }
}
