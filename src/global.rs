use std::sync::Arc;

use crate::config::AppConfig;
use crate::mailer::Mailer;
use crate::store::UserStore;
use crate::utils::context::Context;

pub struct GlobalState {
    pub config: AppConfig,
    pub store: Arc<dyn UserStore>,
    pub mailer: Mailer,
    pub ctx: Context,
}

impl GlobalState {
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>, ctx: Context) -> Self {
        Self {
            mailer: Mailer::new(config.mailer.clone()),
            config,
            store,
            ctx,
        }
    }
}
