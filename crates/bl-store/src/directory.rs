use std::collections::HashMap;

use async_trait::async_trait;
use bl_crypto::PrivatizeKey;
use bl_types::{Workgroup, WorkgroupMember};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::WorkgroupDirectory;

/// Workgroups and members as they appear in configuration files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub workgroups: Vec<Workgroup>,
    pub members: Vec<WorkgroupMember>,
}

/// Read-only workgroup directory built from configuration.
pub struct StaticWorkgroupDirectory {
    workgroups: HashMap<Uuid, Workgroup>,
    members: Vec<WorkgroupMember>,
}

impl StaticWorkgroupDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            workgroups: config
                .workgroups
                .into_iter()
                .map(|wg| (wg.id, wg))
                .collect(),
            members: config.members,
        }
    }

    pub fn workgroup_count(&self) -> usize {
        self.workgroups.len()
    }
}

impl std::fmt::Debug for StaticWorkgroupDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticWorkgroupDirectory")
            .field("workgroup_count", &self.workgroups.len())
            .field("member_count", &self.members.len())
            .finish()
    }
}

/// Parse a workgroup's hex key.
pub fn workgroup_key(workgroup: &Workgroup) -> StoreResult<PrivatizeKey> {
    PrivatizeKey::from_hex(&workgroup.privatize_key).map_err(|e| StoreError::InvalidKey {
        workgroup_id: workgroup.id,
        reason: e.to_string(),
    })
}

#[async_trait]
impl WorkgroupDirectory for StaticWorkgroupDirectory {
    async fn resolve_key(&self, workgroup_id: Uuid) -> StoreResult<PrivatizeKey> {
        let workgroup = self
            .workgroups
            .get(&workgroup_id)
            .ok_or(StoreError::WorkgroupNotFound(workgroup_id))?;
        workgroup_key(workgroup)
    }

    async fn find_member(
        &self,
        workgroup_id: Uuid,
        organization_id: Uuid,
    ) -> StoreResult<Option<WorkgroupMember>> {
        Ok(self
            .members
            .iter()
            .find(|m| m.workgroup_id == workgroup_id && m.organization_id == organization_id)
            .cloned())
    }
}
