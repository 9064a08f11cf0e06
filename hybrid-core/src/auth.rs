//! Authentication and capability types

use serde::{Deserialize, Serialize};

/// User name and password for the external system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Authentication data used to reach the external system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    /// Base URL of the PLM instance.
    pub plm_url: String,
    /// Pre-issued token, when the system authenticates by token.
    pub auth_token: String,
    pub credentials: Option<Credentials>,
    pub licenses: Vec<String>,
    /// Opaque context string forwarded from the hub.
    pub context: String,
}

/// Special operations an external system may or may not support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedOperation {
    #[default]
    CreateChangeOrder,
    /// Part choices created from item attributes.
    ExtractPartChoicesFromAttributes,
    IncrementalPartChoicesSync,
    AdvanceChangeOrder,
    CreateInfoNumbering,
    PublishWithNoBomSectionInConfig,
    CreateMfrParts,
}

impl SupportedOperation {
    pub const ALL: [SupportedOperation; 7] = [
        SupportedOperation::CreateChangeOrder,
        SupportedOperation::ExtractPartChoicesFromAttributes,
        SupportedOperation::IncrementalPartChoicesSync,
        SupportedOperation::AdvanceChangeOrder,
        SupportedOperation::CreateInfoNumbering,
        SupportedOperation::PublishWithNoBomSectionInConfig,
        SupportedOperation::CreateMfrParts,
    ];
}
