//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]`-annotated handlers and `ToSchema` types
//! into one OpenAPI document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "calc orchestrator API",
        version = "0.1.0",
        description = "Distributed arithmetic: expressions are split into binary operations and evaluated by remote agents.",
    ),
    tags(
        (name = "Health", description = "Liveness and scheduler counters"),
        (name = "Expressions", description = "Expression submission and status"),
        (name = "Tasks", description = "Task dispatch and result collection for agents"),
    ),
    paths(
        crate::api::health::health,
        crate::api::expressions::calculate,
        crate::api::expressions::expressions_list,
        crate::api::expressions::expression_get,
        crate::api::tasks::task_next,
        crate::api::tasks::task_report,
    ),
    components(schemas(
        calc_core::wire::ErrorResponse,
        calc_core::wire::SubmitRequest,
        calc_core::wire::SubmitResponse,
        calc_core::wire::ExpressionsResponse,
        calc_core::wire::ExpressionResponse,
        calc_core::wire::TaskResponse,
        calc_core::wire::TaskReport,
        calc_core::Expression,
        calc_core::ExpressionId,
        calc_core::ExpressionStatus,
        calc_core::ReadyTask,
        calc_scheduler::StoreStats,
        crate::api::health::HealthResponse,
    ))
)]
pub struct ApiDoc;
