pub mod batch_tracking;
pub mod common;
pub mod health;
pub mod hold_material;
pub mod masterlist;
pub mod packing_area;
pub mod reconcile;
pub mod rm_receiving;
pub mod stages;
pub mod tags;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    batch_tracking::BatchTrackingService, hold_material::HoldMaterialService,
    masterlist::MasterlistService, packing_area::PackingAreaService,
    reconciliation::ReconciliationService, rm_receiving::RmReceivingService,
    stage_progress::StageProgressService, tags::TagService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub rm_receiving: Arc<RmReceivingService>,
    pub hold_material: Arc<HoldMaterialService>,
    pub batch_tracking: Arc<BatchTrackingService>,
    pub packing_area: Arc<PackingAreaService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub stage_progress: Arc<StageProgressService>,
    pub tags: Arc<TagService>,
    pub masterlist: Arc<MasterlistService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let tolerance = config.status_tolerance_kg;

        Self {
            rm_receiving: Arc::new(RmReceivingService::new(
                db_pool.clone(),
                event_sender.clone(),
                tolerance,
            )),
            hold_material: Arc::new(HoldMaterialService::new(
                db_pool.clone(),
                event_sender.clone(),
                tolerance,
            )),
            batch_tracking: Arc::new(BatchTrackingService::new(
                db_pool.clone(),
                event_sender.clone(),
                tolerance,
                config.issue_id_max_attempts,
            )),
            packing_area: Arc::new(PackingAreaService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            reconciliation: Arc::new(ReconciliationService::new(
                db_pool.clone(),
                event_sender,
                tolerance,
            )),
            stage_progress: Arc::new(StageProgressService::new(db_pool.clone())),
            tags: Arc::new(TagService::new(db_pool.clone())),
            masterlist: Arc::new(MasterlistService::new(db_pool)),
        }
    }
}
