//! 商品目录服务
//!
//! 公开的商品查询，以及后台的商品增删改

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{OrderError, Result};
use crate::models::{
    DEFAULT_PRODUCT_IMAGE, NewProduct, Product, ProductId, ProductPatch, ProductQuery,
};
use crate::repository::{CategoryRepositoryTrait, ProductRepositoryTrait};
use crate::service::id_gen::IdGenerator;

const REQUIRED_FIELDS_MESSAGE: &str = "Nome, sabor, preço e categoria são obrigatórios";

/// 商品目录服务
pub struct CatalogService {
    products: Arc<dyn ProductRepositoryTrait>,
    categories: Arc<dyn CategoryRepositoryTrait>,
    id_gen: Arc<dyn IdGenerator>,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductRepositoryTrait>,
        categories: Arc<dyn CategoryRepositoryTrait>,
        id_gen: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            products,
            categories,
            id_gen,
        }
    }

    /// 分类名称列表（按排序权重）
    pub async fn category_names(&self) -> Result<Vec<String>> {
        Ok(self
            .categories
            .list()
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// 按条件查询商品，推荐商品总在最前
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let products = self.products.list().await?;
        Ok(query.apply(products))
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::ProductNotFound(id.to_string()))
    }

    async fn ensure_known_category(&self, category: &str) -> Result<()> {
        let known = self.category_names().await?;
        if known.iter().any(|c| c == category) {
            Ok(())
        } else {
            Err(OrderError::Validation(format!(
                "Categoria inválida: {}",
                category
            )))
        }
    }

    fn ensure_stock(stock: Option<i32>) -> Result<()> {
        if stock.is_some_and(|s| s < 0) {
            return Err(OrderError::Validation("Estoque inválido".to_string()));
        }
        Ok(())
    }

    /// 新建商品
    #[instrument(skip(self, input), fields(name = %input.name, category = %input.category))]
    pub async fn create_product(&self, input: NewProduct) -> Result<Product> {
        let name = input.name.trim();
        let flavor = input.flavor.trim();
        let category = input.category.trim();
        let price = input.price.filter(|p| p.is_sign_positive() && !p.is_zero());

        let Some(price) = price.filter(|_| !name.is_empty() && !flavor.is_empty() && !category.is_empty())
        else {
            return Err(OrderError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        };
        Self::ensure_stock(input.stock)?;
        self.ensure_known_category(category).await?;

        let product = Product {
            id: ProductId::new(self.id_gen.generate("prod")),
            name: name.to_string(),
            flavor: flavor.to_string(),
            description: input.description.unwrap_or_default(),
            price,
            original_price: input.original_price,
            image: input
                .image
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
            category: category.to_string(),
            stock: input.stock.unwrap_or(0),
            is_new: input.is_new.unwrap_or(false),
            is_best_seller: input.is_best_seller.unwrap_or(false),
            is_featured: input.is_featured.unwrap_or(false),
            flavors: input.flavors.unwrap_or_default(),
            created_at: Utc::now(),
        };

        self.products.insert(&product).await?;
        info!(product_id = %product.id, "商品已创建");

        Ok(product)
    }

    /// 部分更新商品
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(&self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        Self::ensure_stock(patch.stock)?;
        if let Some(category) = patch.category.as_deref() {
            self.ensure_known_category(category).await?;
        }

        let product = self
            .products
            .update(id, patch)
            .await?
            .ok_or_else(|| OrderError::ProductNotFound(id.to_string()))?;

        info!(product_id = %id, stock = product.stock, "商品已更新");
        Ok(product)
    }

    /// 删除商品
    ///
    /// 历史订单中的商品快照不受影响
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        if !self.products.delete(id).await? {
            return Err(OrderError::ProductNotFound(id.to_string()));
        }
        info!(product_id = %id, "商品已删除");
        Ok(())
    }
}
