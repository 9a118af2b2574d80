use calc_core::Config;
use calc_scheduler::TaskStore;

pub struct AppState {
    pub store: TaskStore,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = TaskStore::new(config.timings, config.scheduler);
        Self { store, config }
    }
}
