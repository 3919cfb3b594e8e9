//! The remote session registry boundary.
//!
//! [`SessionRegistry`] is the async façade the sync engine consumes. The
//! registry itself is an external service; [`NatsRegistry`] reaches it over
//! NATS request/reply.

use async_trait::async_trait;
use lobby_model::{Attributes, MemberId, Session, SessionId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::connection::NatsConnection;
use crate::error::RegistryError;
use crate::messages::{
    CreateSessionRequest, JoinByCodeRequest, JoinByIdRequest, RegistryReply, RemoveMemberRequest,
    SessionFilter, SessionRequest, UpdateMemberRequest, headers,
};
use crate::subjects;

/// Options for joining an existing session.
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    /// Public attributes of the joining member's record.
    pub member_attributes: Attributes,
}

/// Async calls against the remote session registry.
///
/// Every call is made on behalf of one authenticated member; implementations
/// carry that identity themselves.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Create a session with the caller as host.
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session, RegistryError>;

    /// Join by id. Fails with [`RegistryError::NotFound`] or
    /// [`RegistryError::Full`].
    async fn join_session_by_id(
        &self,
        session_id: &SessionId,
        options: JoinOptions,
    ) -> Result<Session, RegistryError>;

    /// Join by shareable code. Same failures as
    /// [`join_session_by_id`](Self::join_session_by_id).
    async fn join_session_by_code(
        &self,
        join_code: &str,
        options: JoinOptions,
    ) -> Result<Session, RegistryError>;

    /// Fetch the current snapshot. Fails with [`RegistryError::NotFound`]
    /// once the session is gone and [`RegistryError::Forbidden`] once the
    /// caller was removed from it.
    async fn query_session(&self, session_id: &SessionId) -> Result<Session, RegistryError>;

    /// Replace a member's attributes and return the resulting snapshot.
    async fn update_member(
        &self,
        session_id: &SessionId,
        member_id: &MemberId,
        attributes: Attributes,
    ) -> Result<Session, RegistryError>;

    async fn remove_member(
        &self,
        session_id: &SessionId,
        member_id: &MemberId,
    ) -> Result<(), RegistryError>;

    async fn heartbeat(&self, session_id: &SessionId) -> Result<(), RegistryError>;

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), RegistryError>;

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>, RegistryError>;
}

/// A [`SessionRegistry`] reached over NATS request/reply.
#[derive(Debug, Clone)]
pub struct NatsRegistry {
    conn: NatsConnection,
    member_id: MemberId,
    prefix: String,
}

impl NatsRegistry {
    /// Create a registry client calling as `member_id` under the default
    /// subject prefix.
    #[must_use]
    pub fn new(conn: NatsConnection, member_id: MemberId) -> Self {
        Self {
            conn,
            member_id,
            prefix: subjects::DEFAULT_PREFIX.to_string(),
        }
    }

    /// Override the subject prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    async fn call<T, R>(&self, operation: &str, request: &T) -> Result<R, RegistryError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let subject = subjects::operation(&self.prefix, operation);
        let mut header_map = async_nats::HeaderMap::new();
        header_map.insert(headers::MEMBER_ID, self.member_id.as_str());

        debug!(subject = %subject, member_id = %self.member_id, "registry request");
        let reply: RegistryReply<R> = self
            .conn
            .request_with_headers(&subject, header_map, request)
            .await?;
        reply.into_result()
    }
}

#[async_trait]
impl SessionRegistry for NatsRegistry {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session, RegistryError> {
        self.call(subjects::CREATE, &request).await
    }

    async fn join_session_by_id(
        &self,
        session_id: &SessionId,
        options: JoinOptions,
    ) -> Result<Session, RegistryError> {
        let request = JoinByIdRequest {
            session_id: session_id.clone(),
            member_attributes: options.member_attributes,
        };
        self.call(subjects::JOIN_BY_ID, &request).await
    }

    async fn join_session_by_code(
        &self,
        join_code: &str,
        options: JoinOptions,
    ) -> Result<Session, RegistryError> {
        let request = JoinByCodeRequest {
            join_code: join_code.to_string(),
            member_attributes: options.member_attributes,
        };
        self.call(subjects::JOIN_BY_CODE, &request).await
    }

    async fn query_session(&self, session_id: &SessionId) -> Result<Session, RegistryError> {
        let request = SessionRequest {
            session_id: session_id.clone(),
        };
        self.call(subjects::QUERY, &request).await
    }

    async fn update_member(
        &self,
        session_id: &SessionId,
        member_id: &MemberId,
        attributes: Attributes,
    ) -> Result<Session, RegistryError> {
        let request = UpdateMemberRequest {
            session_id: session_id.clone(),
            member_id: member_id.clone(),
            attributes,
        };
        self.call(subjects::UPDATE_MEMBER, &request).await
    }

    async fn remove_member(
        &self,
        session_id: &SessionId,
        member_id: &MemberId,
    ) -> Result<(), RegistryError> {
        let request = RemoveMemberRequest {
            session_id: session_id.clone(),
            member_id: member_id.clone(),
        };
        self.call(subjects::REMOVE_MEMBER, &request).await
    }

    async fn heartbeat(&self, session_id: &SessionId) -> Result<(), RegistryError> {
        let request = SessionRequest {
            session_id: session_id.clone(),
        };
        self.call(subjects::HEARTBEAT, &request).await
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), RegistryError> {
        let request = SessionRequest {
            session_id: session_id.clone(),
        };
        self.call(subjects::DELETE, &request).await
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>, RegistryError> {
        self.call(subjects::LIST, filter).await
    }
}
