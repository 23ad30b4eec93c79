//! Dashboard queries. Read-only and eventually consistent with in-flight writes.

use std::sync::Arc;

use crate::error::EngineResult;
use crate::store::{CategoryShare, DashboardStats, PriceTrend, ReportingStore};

pub const DEFAULT_TREND_DAYS: u32 = 30;

pub struct ReportingService<S: ?Sized> {
    store: Arc<S>,
}

impl<S> ReportingService<S>
where
    S: ReportingStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn dashboard_stats(&self) -> EngineResult<DashboardStats> {
        Ok(self.store.dashboard_stats().await?)
    }

    pub async fn category_distribution(&self) -> EngineResult<Vec<CategoryShare>> {
        Ok(self.store.category_distribution().await?)
    }

    /// At most `days` rows, newest day first.
    pub async fn price_trends(&self, days: u32) -> EngineResult<Vec<PriceTrend>> {
        Ok(self.store.price_trends(days).await?)
    }
}
