use std::sync::Arc;

use crate::observer::FlagObserver;
use crate::repository::FlagRepository;

#[derive(Clone)]
pub struct AppState {
    pub flags: Arc<FlagRepository>,
    pub observer: Arc<dyn FlagObserver>,
}
