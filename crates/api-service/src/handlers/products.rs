//! 商品相关的 HTTP 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use pods_orders::{ProductId, ProductQuery};
use tracing::instrument;

use crate::dto::{
    CreateProductRequest, MessageResponse, ProductListParams, ProductListResponse,
    ProductResponse, UpdateProductRequest,
};
use crate::error::Result;
use crate::state::AppState;

/// 商品列表
///
/// GET /api/products?search&category&minPrice&maxPrice&sort
#[instrument(skip_all, fields(category = ?params.category))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<ProductListResponse>> {
    let query = ProductQuery::from(params);
    let products = state.catalog.list_products(&query).await?;
    let categories = state.catalog.category_names().await?;

    Ok(Json(ProductListResponse {
        products,
        categories,
    }))
}

/// GET /api/products/{id}
#[instrument(skip_all, fields(product_id = %id))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog.get_product(&ProductId::new(id)).await?;
    Ok(Json(ProductResponse { product }))
}

/// POST /api/products
#[instrument(skip_all, fields(name = %req.name))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let product = state.catalog.create_product(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// PUT /api/products/{id}
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>> {
    let product = state
        .catalog
        .update_product(&ProductId::new(id), req.into())
        .await?;
    Ok(Json(ProductResponse { product }))
}

/// DELETE /api/products/{id}
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.catalog.delete_product(&ProductId::new(id)).await?;
    Ok(Json(MessageResponse::new("Produto removido com sucesso")))
}
