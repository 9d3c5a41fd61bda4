use chrono::{DateTime, Utc};

/// Session token value object: a signed bearer credential and its expiry.
#[derive(Clone, Debug)]
pub struct SessionToken {
    pub token: String,
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
}
