//! Member service port and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::MemberId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestrationError, Result};
use crate::services::MEMBER_SERVICE;

/// Account status reported by the member service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
    #[serde(other)]
    Unknown,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Inactive => "INACTIVE",
            MemberStatus::Suspended => "SUSPENDED",
            MemberStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member as described by the member service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub status: MemberStatus,
    #[serde(default)]
    pub grade: Option<String>,
}

impl MemberInfo {
    /// Builds a member with placeholder contact details.
    pub fn new(id: MemberId, status: MemberStatus) -> Self {
        Self {
            id,
            name: format!("Member {id}"),
            email: format!("member{id}@example.com"),
            status,
            grade: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// Looks up buyers.
#[async_trait]
pub trait MemberValidator: Send + Sync {
    /// Fetches a member. `Ok(None)` means the member does not exist.
    async fn get_member(&self, member_id: MemberId) -> Result<Option<MemberInfo>>;
}

#[derive(Debug, Default)]
struct InMemoryMemberState {
    members: HashMap<MemberId, MemberInfo>,
    calls: usize,
    unavailable: bool,
    latency: Option<Duration>,
}

/// In-memory member service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemberValidator {
    state: Arc<RwLock<InMemoryMemberState>>,
}

impl InMemoryMemberValidator {
    /// Creates a new in-memory member service with no members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a member with the given status.
    pub fn add_member(&self, member_id: MemberId, status: MemberStatus) {
        self.state
            .write()
            .members
            .insert(member_id, MemberInfo::new(member_id, status));
    }

    /// Makes every lookup fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Delays every lookup by the given duration.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().latency = latency;
    }

    /// Returns how many lookups were made.
    pub fn call_count(&self) -> usize {
        self.state.read().calls
    }
}

#[async_trait]
impl MemberValidator for InMemoryMemberValidator {
    async fn get_member(&self, member_id: MemberId) -> Result<Option<MemberInfo>> {
        let latency = {
            let mut state = self.state.write();
            state.calls += 1;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.read();
        if state.unavailable {
            return Err(OrchestrationError::external(
                MEMBER_SERVICE,
                "Failed to get member: service unavailable",
            ));
        }
        Ok(state.members.get(&member_id).cloned())
    }
}
