use crate::control::{ControllerError, ErrorResponse, Response};
use actix::Addr;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, JsonConfig, Path, Query, QueryConfig},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use subscription_types::date::{optional_month_year, MonthYear};
use subscription_types::subscription::{
    self, service::SubscriptionService, CostFilter, NewSubscription, Subscription, UserId,
};
use typesafe_repository::IdentityOf;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Subscription aggregation service",
        description = "CRUD over user subscriptions and their total cost over a period"
    ),
    paths(
        create_subscription,
        list_subscriptions,
        get_subscription,
        update_subscription,
        remove_subscription,
        total_cost
    ),
    components(schemas(Subscription, SubscriptionDto, TotalCostResponse, ErrorResponse))
)]
pub struct ApiDoc;

/// Request body of create and update. A client supplied `id` is ignored.
#[derive(Deserialize, ToSchema)]
pub struct SubscriptionDto {
    #[schema(example = "Yandex Plus")]
    service_name: String,
    #[schema(example = 400)]
    price: i32,
    #[schema(value_type = Uuid)]
    user_id: UserId,
    #[schema(value_type = String, example = "07-2025")]
    start_date: MonthYear,
    #[schema(value_type = Option<String>, example = "12-2025")]
    #[serde(default, deserialize_with = "optional_month_year")]
    end_date: Option<MonthYear>,
}

impl Into<NewSubscription> for SubscriptionDto {
    fn into(self) -> NewSubscription {
        let Self {
            service_name,
            price,
            user_id,
            start_date,
            end_date,
        } = self;
        NewSubscription {
            service_name,
            price,
            user_id,
            start_date,
            end_date,
        }
    }
}

impl SubscriptionDto {
    fn with_id(self, id: IdentityOf<Subscription>) -> Subscription {
        Into::<NewSubscription>::into(self).with_id(id)
    }
}

fn parse_id(id: &str) -> Result<IdentityOf<Subscription>, ControllerError> {
    Uuid::parse_str(id).map_err(|_| ControllerError::invalid("id", "Invalid UUID"))
}

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    request_body = SubscriptionDto,
    responses(
        (status = 201, description = "Subscription created", body = Subscription),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
#[post("/subscriptions")]
async fn create_subscription(
    subscription_service: Data<Addr<SubscriptionService>>,
    subscription: Json<SubscriptionDto>,
) -> Response {
    let subscription = subscription_service
        .send(subscription::service::Add(subscription.into_inner().into()))
        .await??;
    Ok(HttpResponse::Created().json(&subscription))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Every stored subscription", body = [Subscription]),
        (status = 500, body = ErrorResponse)
    )
)]
#[get("/subscriptions")]
async fn list_subscriptions(subscription_service: Data<Addr<SubscriptionService>>) -> Response {
    let subscriptions = subscription_service
        .send(subscription::service::List)
        .await??;
    Ok(HttpResponse::Ok().json(&subscriptions))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = Uuid, Path, description = "Subscription id")),
    responses(
        (status = 200, body = Subscription),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
#[get("/subscriptions/{id}")]
async fn get_subscription(
    path: Path<String>,
    subscription_service: Data<Addr<SubscriptionService>>,
) -> Response {
    let id = parse_id(&path)?;
    let subscription = subscription_service
        .send(subscription::service::Get(id))
        .await??
        .ok_or(ControllerError::NotFound)?;
    Ok(HttpResponse::Ok().json(&subscription))
}

#[utoipa::path(
    put,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = Uuid, Path, description = "Subscription id")),
    request_body = SubscriptionDto,
    responses(
        (status = 200, description = "Stored subscription, owner unchanged", body = Subscription),
        (status = 400, description = "Malformed id or body", body = ErrorResponse),
        (status = 500, description = "Store failure, including an unknown id", body = ErrorResponse)
    )
)]
#[put("/subscriptions/{id}")]
async fn update_subscription(
    path: Path<String>,
    subscription: Json<SubscriptionDto>,
    subscription_service: Data<Addr<SubscriptionService>>,
) -> Response {
    let id = parse_id(&path)?;
    let subscription = subscription_service
        .send(subscription::service::Update(
            subscription.into_inner().with_id(id),
        ))
        .await??;
    Ok(HttpResponse::Ok().json(&subscription))
}

#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = Uuid, Path, description = "Subscription id")),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 500, description = "Store failure, including an unknown id", body = ErrorResponse)
    )
)]
#[delete("/subscriptions/{id}")]
async fn remove_subscription(
    path: Path<String>,
    subscription_service: Data<Addr<SubscriptionService>>,
) -> Response {
    let id = parse_id(&path)?;
    subscription_service
        .send(subscription::service::Remove(id))
        .await??;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
pub struct CostQuery {
    user_id: Option<String>,
    service_name: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl TryFrom<CostQuery> for CostFilter {
    type Error = ControllerError;

    fn try_from(query: CostQuery) -> Result<Self, Self::Error> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        let (Some(user_id), Some(start_date), Some(end_date)) = (
            non_empty(query.user_id),
            non_empty(query.start_date),
            non_empty(query.end_date),
        ) else {
            return Err(ControllerError::invalid(
                "query",
                "Missing required params: user_id, start_date, end_date",
            ));
        };
        let user_id =
            Uuid::parse_str(&user_id).map_err(|_| ControllerError::invalid("user_id", "Invalid UUID"))?;
        let start_date = MonthYear::parse(&start_date)
            .map_err(|err| ControllerError::invalid("start_date", err))?;
        let end_date =
            MonthYear::parse(&end_date).map_err(|err| ControllerError::invalid("end_date", err))?;
        Ok(CostFilter::new(
            user_id,
            query.service_name,
            start_date,
            end_date,
        ))
    }
}

#[derive(Serialize, ToSchema)]
pub struct TotalCostResponse {
    #[schema(example = 650)]
    total_cost: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/cost",
    tag = "subscriptions",
    params(
        ("user_id" = Uuid, Query, description = "Owner of the subscriptions"),
        ("service_name" = Option<String>, Query, description = "Only this service; empty means every service"),
        ("start_date" = String, Query, description = "First month of the period, MM-YYYY"),
        ("end_date" = String, Query, description = "Last month of the period, MM-YYYY")
    ),
    responses(
        (status = 200, description = "Sum of prices of subscriptions active during the period", body = TotalCostResponse),
        (status = 400, description = "Missing or malformed parameter", body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
#[get("/subscriptions/cost")]
async fn total_cost(
    query: Query<CostQuery>,
    subscription_service: Data<Addr<SubscriptionService>>,
) -> Response {
    let filter = CostFilter::try_from(query.into_inner())?;
    let total_cost = subscription_service
        .send(subscription::service::TotalCost(filter))
        .await??;
    Ok(HttpResponse::Ok().json(TotalCostResponse { total_cost }))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Registers the API under `/api/v1` and Swagger UI at `/swagger/index.html`.
/// `/subscriptions/cost` goes before `/subscriptions/{id}` so it is not
/// captured as an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(crate::control::json_error_handler))
        .app_data(QueryConfig::default().error_handler(crate::control::query_error_handler))
        .service(health)
        .service(
            SwaggerUi::new("/swagger/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .service(
            web::scope("/api/v1")
                .service(total_cost)
                .service(create_subscription)
                .service(list_subscriptions)
                .service(get_subscription)
                .service(update_subscription)
                .service(remove_subscription),
        );
}
