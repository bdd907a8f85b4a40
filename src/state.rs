use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    gateway::{MobileMoneyGateway, SimulatedGateway},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn MobileMoneyGateway>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        Self::with_gateway(pool, config, Arc::new(SimulatedGateway))
    }

    pub fn with_gateway(
        pool: DbPool,
        config: AppConfig,
        payments: Arc<dyn MobileMoneyGateway>,
    ) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            payments,
        }
    }
}
