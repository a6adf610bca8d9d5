use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
}
