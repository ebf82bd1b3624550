//! Elevation product catalogue queries.
//!
//! The catalogue only lists products; the rasters themselves are large and
//! are placed in `raw/dem` by hand.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::AcquisitionError;
use crate::coord::GeoBounds;
use crate::download::USER_AGENT;

/// USGS The National Map products endpoint.
pub const TNM_PRODUCTS_URL: &str = "https://tnmaccess.nationalmap.gov/api/v1/products";

/// Page size requested from the catalogue.
pub const TNM_MAX_RESULTS: u32 = 100;

/// File name of the saved product list under `raw/dem`.
pub const PRODUCTS_FILE: &str = "usgs_products.json";

/// Source of elevation product listings.
pub trait DemCatalog {
    /// Returns the raw product items for one dataset inside `bounds`.
    fn query(&self, bounds: &GeoBounds, dataset: &str) -> Result<Vec<Value>, AcquisitionError>;
}

/// Blocking client for the TNM products API.
pub struct TnmCatalog {
    client: Client,
    base_url: String,
}

impl TnmCatalog {
    pub fn new(timeout: Duration) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AcquisitionError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: TNM_PRODUCTS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request URL for one dataset query.
    pub fn query_url(&self, bounds: &GeoBounds, dataset: &str) -> Result<Url, AcquisitionError> {
        let bbox = format!(
            "{},{},{},{}",
            bounds.west(),
            bounds.south(),
            bounds.east(),
            bounds.north()
        );
        let max = TNM_MAX_RESULTS.to_string();
        Url::parse_with_params(
            &self.base_url,
            [
                ("bbox", bbox.as_str()),
                ("outputFormat", "JSON"),
                ("max", max.as_str()),
                ("datasets", dataset),
            ],
        )
        .map_err(|e| AcquisitionError::Http(format!("Invalid catalogue URL: {}", e)))
    }
}

impl DemCatalog for TnmCatalog {
    fn query(&self, bounds: &GeoBounds, dataset: &str) -> Result<Vec<Value>, AcquisitionError> {
        let url = self.query_url(bounds, dataset)?;
        debug!(url = %url, "Querying elevation catalogue");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| AcquisitionError::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AcquisitionError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| AcquisitionError::InvalidResponse(format!("catalogue response: {}", e)))?;
        Ok(items_of(&body))
    }
}

fn items_of(body: &Value) -> Vec<Value> {
    body.get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Product items gathered across datasets; saved as-is to [`PRODUCTS_FILE`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemProducts {
    pub items: Vec<Value>,
    pub total: usize,
}

impl DemProducts {
    pub fn save(&self, path: &Path) -> Result<(), AcquisitionError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), products = self.total, "Saved product list");
        Ok(())
    }
}

/// Queries every dataset in order, pausing `delay` after each query.
///
/// A failed query is logged and contributes no items.
pub fn fetch_products(
    catalog: &dyn DemCatalog,
    bounds: &GeoBounds,
    datasets: &[String],
    delay: Duration,
) -> DemProducts {
    let mut products = DemProducts::default();

    for dataset in datasets {
        match catalog.query(bounds, dataset) {
            Ok(items) => {
                info!(dataset = %dataset, found = items.len(), "Catalogue query complete");
                products.total += items.len();
                products.items.extend(items);
            }
            Err(e) => warn!(dataset = %dataset, error = %e, "Catalogue query failed"),
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    products
}

/// One downloadable file advertised by a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadLink {
    pub title: String,
    pub url: String,
    pub format: String,
    pub size: u64,
    pub publication_date: String,
}

/// Collects `downloadURL` entries from each item and from its nested
/// `urls.<kind>.downloadURL` entries.
pub fn download_links(items: &[Value]) -> Vec<DownloadLink> {
    let text = |v: Option<&Value>| v.and_then(Value::as_str).unwrap_or("Unknown").to_string();
    let mut links = Vec::new();

    for item in items {
        let title = text(item.get("title"));
        let publication_date = text(item.get("publicationDate"));

        if let Some(url) = item.get("downloadURL").and_then(Value::as_str) {
            links.push(DownloadLink {
                title: title.clone(),
                url: url.to_string(),
                format: text(item.get("format")),
                size: item.get("sizeInBytes").and_then(Value::as_u64).unwrap_or(0),
                publication_date: publication_date.clone(),
            });
        }

        if let Some(urls) = item.get("urls").and_then(Value::as_object) {
            for (kind, info) in urls {
                if let Some(url) = info.get("downloadURL").and_then(Value::as_str) {
                    links.push(DownloadLink {
                        title: format!("{} ({})", title, kind),
                        url: url.to_string(),
                        format: text(info.get("format")),
                        size: info.get("sizeInBytes").and_then(Value::as_u64).unwrap_or(0),
                        publication_date: publication_date.clone(),
                    });
                }
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    struct FakeCatalog {
        queries: RefCell<Vec<String>>,
    }

    impl DemCatalog for FakeCatalog {
        fn query(
            &self,
            _bounds: &GeoBounds,
            dataset: &str,
        ) -> Result<Vec<Value>, AcquisitionError> {
            self.queries.borrow_mut().push(dataset.to_string());
            if dataset.contains("broken") {
                return Err(AcquisitionError::Http("HTTP 500".into()));
            }
            Ok(vec![json!({"title": dataset, "downloadURL": "https://example.com/a.tif"})])
        }
    }

    #[test]
    fn test_query_url() {
        let catalog = TnmCatalog::new(Duration::from_secs(5)).unwrap();
        let url = catalog
            .query_url(&GeoBounds::charlotte(), "3D Elevation Program (3DEP) 1 meter")
            .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("tnmaccess.nationalmap.gov"));
        assert!(pairs.contains(&("bbox".into(), "-81,35.08,-80.65,35.37".into())));
        assert!(pairs.contains(&("outputFormat".into(), "JSON".into())));
        assert!(pairs.contains(&("max".into(), "100".into())));
        assert!(pairs.contains(&("datasets".into(), "3D Elevation Program (3DEP) 1 meter".into())));
    }

    #[test]
    fn test_fetch_products_continues_after_failure() {
        let catalog = FakeCatalog {
            queries: RefCell::new(Vec::new()),
        };
        let datasets = vec!["one".to_string(), "broken".to_string(), "two".to_string()];

        let products = fetch_products(&catalog, &GeoBounds::charlotte(), &datasets, Duration::ZERO);

        assert_eq!(*catalog.queries.borrow(), datasets);
        assert_eq!(products.total, 2);
        assert_eq!(products.items.len(), 2);
    }

    #[test]
    fn test_download_links_top_level_and_nested() {
        let items = vec![
            json!({
                "title": "USGS 1m x51y395",
                "downloadURL": "https://example.com/x51y395.tif",
                "format": "GeoTIFF",
                "sizeInBytes": 1024,
                "publicationDate": "2020-01-01",
                "urls": {
                    "TIFF": {"downloadURL": "https://example.com/x51y395_alt.tif", "format": "GeoTIFF"},
                    "Metadata": {"format": "XML"}
                }
            }),
            json!({"title": "No links"}),
        ];

        let links = download_links(&items);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://example.com/x51y395.tif");
        assert_eq!(links[0].size, 1024);
        assert_eq!(links[1].title, "USGS 1m x51y395 (TIFF)");
        assert_eq!(links[1].size, 0);
        assert_eq!(links[1].publication_date, "2020-01-01");
    }

    #[test]
    fn test_save_products() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dem").join(PRODUCTS_FILE);
        let products = DemProducts {
            items: vec![json!({"title": "a"})],
            total: 1,
        };

        products.save(&path).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["total"], 1);
        assert_eq!(saved["items"][0]["title"], "a");
    }
}
