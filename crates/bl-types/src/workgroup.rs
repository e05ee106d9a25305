use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A group of organizations sharing one payload privatization key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workgroup {
    pub id: Uuid,
    #[serde(default)]
    pub description: String,
    /// 64-character hex AES-256 key.
    pub privatize_key: String,
}

impl fmt::Debug for Workgroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workgroup")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("privatize_key", &"<redacted>")
            .finish()
    }
}

/// Membership of an organization in a workgroup, with the endpoint its
/// offchain messages are delivered to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkgroupMember {
    pub id: Uuid,
    pub workgroup_id: Uuid,
    pub organization_id: Uuid,
    pub organization_endpoint: String,
    #[serde(default)]
    pub organization_token: String,
}

impl fmt::Debug for WorkgroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkgroupMember")
            .field("id", &self.id)
            .field("workgroup_id", &self.workgroup_id)
            .field("organization_id", &self.organization_id)
            .field("organization_endpoint", &self.organization_endpoint)
            .field("organization_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
}
