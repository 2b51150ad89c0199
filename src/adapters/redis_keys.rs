//! Key layout of the Redis-backed stores.

use crate::domain::foundation::UserId;
use crate::domain::registration::FlowType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn session(&self, user_id: &UserId) -> String {
        format!("{}:session:{}", self.prefix, user_id)
    }

    pub fn draft(&self, flow_type: FlowType, user_id: &UserId) -> String {
        format!("{}:draft:{}:{}", self.prefix, flow_type.as_str(), user_id)
    }

    pub fn intents(&self, user_id: &UserId) -> String {
        format!("{}:intents:{}", self.prefix, user_id)
    }
}
