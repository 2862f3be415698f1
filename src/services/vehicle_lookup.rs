// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vehicle make/model/year reference lookups (FIPE API).
//!
//! The reference data changes monthly at most, so responses are cached for
//! the lifetime of the process.

use crate::error::AppError;
use crate::services::http::{check_response_json, transport_error};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const SERVICE: &str = "vehicle_lookup";
/// Vehicle category queried (passenger cars).
const CATEGORY: &str = "carros";

/// A brand, model or model-year entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LookupItem {
    pub code: String,
    pub name: String,
}

/// FIPE entries carry codes as strings or numbers depending on the endpoint.
#[derive(Deserialize)]
struct FipeItem {
    codigo: serde_json::Value,
    nome: String,
}

#[derive(Deserialize)]
struct FipeModels {
    modelos: Vec<FipeItem>,
}

impl From<FipeItem> for LookupItem {
    fn from(item: FipeItem) -> Self {
        let code = match item.codigo {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            code,
            name: item.nome,
        }
    }
}

/// Cached client for the vehicle reference API.
#[derive(Clone)]
pub struct VehicleLookupClient {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<DashMap<String, Vec<LookupItem>>>,
}

impl VehicleLookupClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(DashMap::new()),
        }
    }

    pub async fn brands(&self) -> Result<Vec<LookupItem>, AppError> {
        self.cached(format!("{}/marcas", CATEGORY), false).await
    }

    pub async fn models(&self, brand: &str) -> Result<Vec<LookupItem>, AppError> {
        let brand = validate_code("brand", brand)?;
        self.cached(format!("{}/marcas/{}/modelos", CATEGORY, brand), true)
            .await
    }

    pub async fn years(&self, brand: &str, model: &str) -> Result<Vec<LookupItem>, AppError> {
        let brand = validate_code("brand", brand)?;
        let model = validate_code("model", model)?;
        self.cached(
            format!("{}/marcas/{}/modelos/{}/anos", CATEGORY, brand, model),
            false,
        )
        .await
    }

    /// Fetch `path` once and serve later calls from the cache.
    ///
    /// `nested` selects the `{"modelos": [...]}` response shape.
    async fn cached(&self, path: String, nested: bool) -> Result<Vec<LookupItem>, AppError> {
        if let Some(hit) = self.cache.get(&path) {
            return Ok(hit.clone());
        }

        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let raw: Vec<FipeItem> = if nested {
            check_response_json::<FipeModels>(SERVICE, response)
                .await?
                .modelos
        } else {
            check_response_json(SERVICE, response).await?
        };

        let items: Vec<LookupItem> = raw.into_iter().map(LookupItem::from).collect();
        tracing::debug!(path = %path, count = items.len(), "Vehicle lookup cached");
        self.cache.insert(path, items.clone());
        Ok(items)
    }
}

/// Reference codes are numeric; reject anything else before building a URL.
fn validate_code<'a>(field: &str, code: &'a str) -> Result<&'a str, AppError> {
    if code.is_empty() || code.len() > 10 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "Invalid '{}' code: must be numeric",
            field
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_normalize_to_strings() {
        let brands: Vec<FipeItem> =
            serde_json::from_str(r#"[{"codigo":"21","nome":"Fiat"}]"#).unwrap();
        let models: FipeModels =
            serde_json::from_str(r#"{"modelos":[{"codigo":4828,"nome":"Uno Mille"}],"anos":[]}"#)
                .unwrap();

        let brand = LookupItem::from(brands.into_iter().next().unwrap());
        let model = LookupItem::from(models.modelos.into_iter().next().unwrap());

        assert_eq!(brand.code, "21");
        assert_eq!(model.code, "4828");
        assert_eq!(model.name, "Uno Mille");
    }

    #[test]
    fn test_validate_code_rejects_path_segments() {
        assert!(validate_code("brand", "21").is_ok());
        assert!(validate_code("brand", "../admin").is_err());
        assert!(validate_code("brand", "").is_err());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        // Unroutable base URL: only a cache hit can succeed.
        let client = VehicleLookupClient::new("http://127.0.0.1:9");
        let cached = vec![LookupItem {
            code: "21".to_string(),
            name: "Fiat".to_string(),
        }];
        client
            .cache
            .insert(format!("{}/marcas", CATEGORY), cached.clone());

        assert_eq!(client.brands().await.unwrap(), cached);
    }
}
