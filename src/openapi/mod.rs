use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plant Ledger API",
        version = "1.0.0",
        description = r#"
# Plant Ledger API

Inventory ledger for a forging and machining plant.

## Flow

- **RM receiving**: raw material lots arrive with a weight in kg.
- **Hold material**: lots are split into hold batches (`PP-YYYYMMDD-XX-NN`).
- **Batch tracking**: material is issued from a batch to the shop floor.
- **Packing area**: finished pieces move IN and OUT of packing locations.
- **Stages and tags**: per-stage production entries and process tags.

Lot and batch `hold_weight_kg`, `issue_qty_kg`, `remaining` and `status` are
derived from their children and never accepted from clients. The
reconciliation endpoints rebuild them from scratch.

## Errors

Every error body carries `error`, `message`, `timestamp` and, when present,
`request_id` plus `details` (field errors or rejected bulk entries).

## Pagination

List endpoints accept `page` (default 1) and `per_page` (bounded by config).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "rm-receivings", description = "Raw material intake"),
        (name = "hold-materials", description = "Hold batches carved from lots"),
        (name = "batch-trackings", description = "Issuance from hold batches"),
        (name = "packing", description = "Packing-area IN/OUT ledger"),
        (name = "stages", description = "Shop-floor production entries"),
        (name = "tags", description = "Process tags"),
        (name = "masterlist", description = "Component catalog"),
        (name = "reconciliation", description = "Counter rebuild sweeps")
    ),
    paths(
        crate::handlers::rm_receiving::list_rm_receivings,
        crate::handlers::rm_receiving::create_rm_receiving,
        crate::handlers::rm_receiving::create_rm_receivings_bulk,
        crate::handlers::rm_receiving::get_rm_receiving,
        crate::handlers::rm_receiving::update_rm_receiving,
        crate::handlers::rm_receiving::recompute_rm_receiving,

        crate::handlers::hold_material::list_hold_materials,
        crate::handlers::hold_material::create_hold_material,
        crate::handlers::hold_material::create_hold_materials_bulk,
        crate::handlers::hold_material::search_batches,
        crate::handlers::hold_material::get_hold_material,
        crate::handlers::hold_material::recompute_hold_material,
        crate::handlers::hold_material::packing_details,

        crate::handlers::batch_tracking::list_batch_trackings,
        crate::handlers::batch_tracking::create_batch_tracking,
        crate::handlers::batch_tracking::create_batch_trackings_bulk,
        crate::handlers::batch_tracking::get_batch_tracking,

        crate::handlers::packing_area::list_locations,
        crate::handlers::packing_area::create_location,
        crate::handlers::packing_area::available_for_location,
        crate::handlers::packing_area::location_summary,
        crate::handlers::packing_area::stock_in,
        crate::handlers::packing_area::stock_out,
        crate::handlers::packing_area::inventory_summary,
        crate::handlers::packing_area::in_history,
        crate::handlers::packing_area::out_history,
        crate::handlers::packing_area::component_filter_options,

        crate::handlers::stages::record_entry,
        crate::handlers::stages::stage_remaining,
        crate::handlers::stages::department_remaining,

        crate::handlers::tags::create_tag,
        crate::handlers::tags::recent_tags,
        crate::handlers::tags::get_tag,
        crate::handlers::tags::mark_printed,
        crate::handlers::tags::can_proceed,

        crate::handlers::masterlist::list_components,
        crate::handlers::masterlist::suggest_components,
        crate::handlers::masterlist::child_components,
        crate::handlers::masterlist::operation_target,
        crate::handlers::masterlist::component_options,

        crate::handlers::reconcile::reconcile_all,
        crate::handlers::reconcile::reconcile_hold_materials,
        crate::handlers::reconcile::reconcile_rm_receivings,
    ),
    components(
        schemas(
            crate::handlers::common::PaginationMeta,
            crate::entities::rm_receiving::ApprovalStatus,
            crate::entities::process_tag::TagStatus,
            crate::services::stage_progress::ProcessStage,
            crate::errors::ErrorResponse,
            crate::errors::FieldError,
            crate::errors::EntryError
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_ledger_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Plant Ledger API"));
        assert!(json.contains("/api/v1/hold-materials"));
        assert!(json.contains("/api/v1/packing/stock-out"));
        assert!(json.contains("ErrorResponse"));
    }
}
