use crate::application::{AccountService, ComplaintService, TokenService};
use crate::infrastructure::TopicBroadcaster;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
    pub complaint_service: Arc<ComplaintService>,
    pub token_service: Arc<TokenService>,
    pub broadcaster: Arc<TopicBroadcaster>,
    /// Directory served under `/uploads`.
    pub upload_dir: PathBuf,
}
