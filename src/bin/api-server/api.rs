use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use restaurant_browse::{
    data::{Order, SortBy},
    db as db_api,
};
use serde::Deserialize;

pub(super) struct ApiState {
    db_pool: sqlx::SqlitePool,
}

impl ApiState {
    pub(super) fn new(db_pool: sqlx::SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[derive(serde::Serialize)]
struct ErrJsonResp {
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub(super) enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Database(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::BadRequest(msg) => tracing::warn!("rejected request: {msg}"),
            Self::Database(err) => tracing::error!("database error: {err:#}"),
        }
        HttpResponse::build(self.status_code()).json(ErrJsonResp {
            message: self.to_string(),
        })
    }
}

/// Register routes and JSON errors for malformed query strings.
pub(super) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(restaurants)
    .service(cuisines)
    .service(boroughs);
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RestaurantParams {
    sort_by: Option<SortBy>,
    order: Option<Order>,
    limit: Option<u32>,
    filter_cuisine: Option<String>,
    filter_borough: Option<String>,
}

impl RestaurantParams {
    fn is_empty(&self) -> bool {
        self.sort_by.is_none()
            && self.order.is_none()
            && self.limit.is_none()
            && self.filter_cuisine.is_none()
            && self.filter_borough.is_none()
    }

    fn to_query(&self) -> Result<db_api::RestaurantQuery, ApiError> {
        let mut builder = db_api::RestaurantQueryBuilder::default();
        if let Some(sort_by) = self.sort_by {
            builder.sort_by(sort_by);
        }
        if let Some(order) = self.order {
            builder.order(order);
        }
        if let Some(limit) = self.limit {
            builder.limit(limit);
        }
        // empty filter means no filter
        if let Some(cuisine) = self.filter_cuisine.as_deref().filter(|c| !c.is_empty()) {
            builder.cuisine(cuisine);
        }
        if let Some(borough) = self.filter_borough.as_deref().filter(|b| !b.is_empty()) {
            builder.borough(borough);
        }

        builder
            .build()
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// Without parameters this is the featured listing, otherwise a filtered query.
#[actix_web::get("/api/restaurants")]
pub(super) async fn restaurants(
    data: web::Data<ApiState>,
    params: web::Query<RestaurantParams>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    tracing::debug!(?params, "restaurants request");

    let rows = if params.is_empty() {
        db_api::featured_restaurants(&data.db_pool).await?
    } else {
        let query = params.to_query()?;
        db_api::query_restaurants(&data.db_pool, &query).await?
    };

    Ok(HttpResponse::Ok().json(rows))
}

#[actix_web::get("/api/cuisines")]
pub(super) async fn cuisines(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let values = db_api::distinct_cuisines(&data.db_pool).await?;
    Ok(HttpResponse::Ok().json(values))
}

#[actix_web::get("/api/boroughs")]
pub(super) async fn boroughs(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let values = db_api::distinct_boroughs(&data.db_pool).await?;
    Ok(HttpResponse::Ok().json(values))
}
