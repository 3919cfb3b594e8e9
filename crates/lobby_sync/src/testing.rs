//! Scripted registry double and fixtures for controller tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use lobby_model::{Attributes, Member, MemberId, Session, SessionId};
use lobby_net::{CreateSessionRequest, JoinOptions, RegistryError, SessionFilter, SessionRegistry};

use crate::controller::TeardownHandle;

/// Build a session snapshot hosted by `p1`.
pub fn session(id: &str, members: Vec<Member>) -> Session {
    Session {
        id: SessionId::new(id),
        name: "Alpha".to_string(),
        max_members: 2,
        is_private: false,
        join_code: Some("QX7P".to_string()),
        host_id: MemberId::new("p1"),
        created_at_ms: 1_700_000_000_000,
        attributes: Attributes::new(),
        members,
    }
}

/// A registry call as observed by [`FakeRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(CreateSessionRequest),
    JoinById(SessionId, Attributes),
    JoinByCode(String, Attributes),
    Query(SessionId),
    UpdateMember(SessionId, MemberId, Attributes),
    RemoveMember(SessionId, MemberId),
    Heartbeat(SessionId),
    Delete(SessionId),
    List(SessionFilter),
}

type Script<T> = VecDeque<Result<T, RegistryError>>;

#[derive(Default)]
struct Scripts {
    create: Script<Session>,
    join: Script<Session>,
    query: Script<Session>,
    update: Script<Session>,
    remove: Script<()>,
    heartbeat: Script<()>,
    delete: Script<()>,
    list: Script<Vec<Session>>,
}

/// Registry double answering from per-operation queues.
///
/// Session-returning calls with an empty queue fail with
/// [`RegistryError::Rejected`]; unit calls succeed.
#[derive(Default)]
pub struct FakeRegistry {
    scripts: Mutex<Scripts>,
    calls: Mutex<Vec<Call>>,
    teardown_on_call: Mutex<Option<TeardownHandle>>,
}

fn next<T>(script: &mut Script<T>, default: impl FnOnce() -> Result<T, RegistryError>) -> Result<T, RegistryError> {
    script.pop_front().unwrap_or_else(default)
}

fn unscripted<T>() -> Result<T, RegistryError> {
    Err(RegistryError::Rejected("unscripted call".to_string()))
}

impl FakeRegistry {
    pub fn push_create(&self, result: Result<Session, RegistryError>) {
        self.scripts.lock().unwrap().create.push_back(result);
    }

    pub fn push_join(&self, result: Result<Session, RegistryError>) {
        self.scripts.lock().unwrap().join.push_back(result);
    }

    pub fn push_query(&self, result: Result<Session, RegistryError>) {
        self.scripts.lock().unwrap().query.push_back(result);
    }

    pub fn push_update(&self, result: Result<Session, RegistryError>) {
        self.scripts.lock().unwrap().update.push_back(result);
    }

    pub fn push_remove(&self, result: Result<(), RegistryError>) {
        self.scripts.lock().unwrap().remove.push_back(result);
    }

    pub fn push_heartbeat(&self, result: Result<(), RegistryError>) {
        self.scripts.lock().unwrap().heartbeat.push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), RegistryError>) {
        self.scripts.lock().unwrap().delete.push_back(result);
    }

    pub fn push_list(&self, result: Result<Vec<Session>, RegistryError>) {
        self.scripts.lock().unwrap().list.push_back(result);
    }

    /// Tear the controller down the next time any call arrives, simulating
    /// teardown while that call is in flight.
    pub fn tear_down_on_next_call(&self, handle: TeardownHandle) {
        *self.teardown_on_call.lock().unwrap() = Some(handle);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        if let Some(handle) = self.teardown_on_call.lock().unwrap().take() {
            handle.tear_down();
        }
    }
}

#[async_trait]
impl SessionRegistry for FakeRegistry {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session, RegistryError> {
        self.record(Call::Create(request));
        next(&mut self.scripts.lock().unwrap().create, unscripted)
    }

    async fn join_session_by_id(
        &self,
        session_id: &SessionId,
        options: JoinOptions,
    ) -> Result<Session, RegistryError> {
        self.record(Call::JoinById(session_id.clone(), options.member_attributes));
        next(&mut self.scripts.lock().unwrap().join, unscripted)
    }

    async fn join_session_by_code(
        &self,
        join_code: &str,
        options: JoinOptions,
    ) -> Result<Session, RegistryError> {
        self.record(Call::JoinByCode(join_code.to_string(), options.member_attributes));
        next(&mut self.scripts.lock().unwrap().join, unscripted)
    }

    async fn query_session(&self, session_id: &SessionId) -> Result<Session, RegistryError> {
        self.record(Call::Query(session_id.clone()));
        next(&mut self.scripts.lock().unwrap().query, unscripted)
    }

    async fn update_member(
        &self,
        session_id: &SessionId,
        member_id: &MemberId,
        attributes: Attributes,
    ) -> Result<Session, RegistryError> {
        self.record(Call::UpdateMember(session_id.clone(), member_id.clone(), attributes));
        next(&mut self.scripts.lock().unwrap().update, unscripted)
    }

    async fn remove_member(
        &self,
        session_id: &SessionId,
        member_id: &MemberId,
    ) -> Result<(), RegistryError> {
        self.record(Call::RemoveMember(session_id.clone(), member_id.clone()));
        next(&mut self.scripts.lock().unwrap().remove, || Ok(()))
    }

    async fn heartbeat(&self, session_id: &SessionId) -> Result<(), RegistryError> {
        self.record(Call::Heartbeat(session_id.clone()));
        next(&mut self.scripts.lock().unwrap().heartbeat, || Ok(()))
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), RegistryError> {
        self.record(Call::Delete(session_id.clone()));
        next(&mut self.scripts.lock().unwrap().delete, || Ok(()))
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<Session>, RegistryError> {
        self.record(Call::List(filter.clone()));
        next(&mut self.scripts.lock().unwrap().list, || Ok(Vec::new()))
    }
}
