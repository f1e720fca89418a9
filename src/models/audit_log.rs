use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorType {
    /// Admin operator acting through the /admin API
    Admin,
    /// The payment processor's fraud-management partner (ENS delivery)
    Gateway,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    RunMigration,
    CancelMigration,
    ReceiveEnsBatch,
    RejectEnsRequest,
    ValidateCredentials,
    GenerateClientToken,
}

