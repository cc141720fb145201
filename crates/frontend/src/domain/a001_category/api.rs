use async_trait::async_trait;
use contracts::domain::a001_category::{
    CategoryDto, CategoryOrchestrator, CategoryRecord, CategoryStore, CategoryTreeNode, RecordId,
    TreeOptions, TreeQuery,
};
use contracts::shared::error::CatalogError;

use crate::shared::api_client::ApiClient;

const RESOURCE: &str = "/api/products/categories";

pub type HttpCategoryOrchestrator = CategoryOrchestrator<HttpCategoryStore>;

/// The category REST resource as a [`CategoryStore`].
#[derive(Debug, Clone)]
pub struct HttpCategoryStore {
    client: ApiClient,
}

impl HttpCategoryStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn item_path(id: &RecordId) -> String {
        format!("{}/{}", RESOURCE, urlencoding::encode(&id.to_string()))
    }

    pub async fn get(&self, id: &RecordId) -> Result<CategoryRecord, CatalogError> {
        self.client.get_json(&Self::item_path(id)).await
    }

    /// Tree built by the backend with the given options.
    pub async fn tree(&self, options: &TreeOptions) -> Result<Vec<CategoryTreeNode>, CatalogError> {
        let query = serde_qs::to_string(&TreeQuery::from(options))
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        self.client
            .get_json(&format!("{}/tree?{}", RESOURCE, query))
            .await
    }
}

#[async_trait(?Send)]
impl CategoryStore for HttpCategoryStore {
    async fn list(&self) -> Result<Vec<CategoryRecord>, CatalogError> {
        self.client.get_json(RESOURCE).await
    }

    async fn create(&self, dto: &CategoryDto) -> Result<CategoryRecord, CatalogError> {
        self.client.post_json(RESOURCE, dto).await
    }

    async fn update(&self, id: &RecordId, dto: &CategoryDto) -> Result<CategoryRecord, CatalogError> {
        self.client.put_json(&Self::item_path(id), dto).await
    }

    async fn remove(&self, id: &RecordId) -> Result<(), CatalogError> {
        self.client.delete(&Self::item_path(id)).await
    }
}
