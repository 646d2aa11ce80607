//! 商品与分类实体定义

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::ProductId;

/// 默认分类（初始化时写入）
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Premium",
    "Life Pod",
    "Ignite",
    "Waka",
    "Ice King",
    "Sed Adicct",
    "Black Sheep",
    "Refil",
];

/// 分类筛选中表示"全部"的取值
pub const ALL_CATEGORIES: &str = "Todos";

/// 未上传图片时使用的占位图
pub const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1560913210-46c2f2944c6f?w=400&h=400&fit=crop";

/// 低库存阈值，后台看板会列出库存低于该值的商品
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// 商品
///
/// 库存只会被下单、订单状态流转和后台编辑修改，且任何已提交的操作后都不小于 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// 默认口味
    pub flavor: String,
    pub description: String,
    pub price: Decimal,
    /// 划线价
    #[sqlx(default)]
    pub original_price: Option<Decimal>,
    /// 图片 URL
    pub image: String,
    pub category: String,
    pub stock: i32,
    pub is_new: bool,
    pub is_best_seller: bool,
    pub is_featured: bool,
    /// 可选口味列表
    #[sqlx(json)]
    pub flavors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// 新建商品输入
///
/// 必填字段已由服务层校验，其余字段缺省时使用默认值
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub category: String,
    pub stock: Option<i32>,
    pub is_new: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_featured: Option<bool>,
    pub flavors: Option<Vec<String>>,
}

/// 商品部分更新
///
/// `None` 表示不修改；`original_price` 为 `Some(None)` 时清空划线价
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub flavor: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Option<Decimal>>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub is_new: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub is_featured: Option<bool>,
    pub flavors: Option<Vec<String>>,
}

impl ProductPatch {
    /// 将补丁应用到商品上
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(flavor) = self.flavor {
            product.flavor = flavor;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(original_price) = self.original_price {
            product.original_price = original_price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(is_new) = self.is_new {
            product.is_new = is_new;
        }
        if let Some(is_best_seller) = self.is_best_seller {
            product.is_best_seller = is_best_seller;
        }
        if let Some(is_featured) = self.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(flavors) = self.flavors {
            product.flavors = flavors;
        }
    }
}

/// 商品排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    Name,
    Newest,
}

impl FromStr for ProductSort {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            "newest" => Ok(Self::Newest),
            _ => Err(()),
        }
    }
}

impl ProductSort {
    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Newest => b.created_at.cmp(&a.created_at),
        }
    }
}

/// 商品列表查询条件
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// 在名称、口味、描述中做不区分大小写的匹配
    pub search: Option<String>,
    /// 分类，`Todos` 表示全部
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<ProductSort>,
}

impl ProductQuery {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [&product.name, &product.flavor, &product.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        let category = self
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);
        if category.is_some_and(|c| product.category != c) {
            return false;
        }

        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }

        true
    }

    /// 过滤并排序
    ///
    /// 先按指定方式排序，再做一次稳定排序把推荐商品放到最前
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut result: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();

        if let Some(sort) = self.sort {
            result.sort_by(|a, b| sort.compare(a, b));
        }

        result.sort_by_key(|p| !p.is_featured);
        result
    }
}

/// 商品分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub sort_order: i32,
}
