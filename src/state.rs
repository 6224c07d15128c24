use std::sync::Arc;

use crate::config::Config;
use crate::drafts::DraftStore;
use crate::forms::FormKind;
use crate::forms::flow::FormFlow;
use crate::gateway::{Gateway, SubmissionService};
use crate::rate_limit::SubmissionRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub service: Arc<SubmissionService>,
    /// Gateway used by server-held drafts.
    pub gateway: Arc<dyn Gateway>,
    pub drafts: DraftStore,
    pub submission_limiter: SubmissionRateLimiter,
}

impl AppState {
    pub fn new_flow(&self, kind: FormKind) -> FormFlow {
        if self.config.is_development() {
            FormFlow::prefilled(kind)
        } else {
            FormFlow::new(kind)
        }
    }
}
