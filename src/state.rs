use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::service::analytics::GaClient;
use crate::service::mail::Mailer;
use crate::service::storage::DiskClient;

/// Shared per-process resources, built once in `main` and cloned into
/// every worker. Store and mailer sit behind traits so the test suite
/// swaps in in-memory fakes.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub ga: Arc<GaClient>,
    pub disk: Option<Arc<DiskClient>>,
    pub config: Config,
}
