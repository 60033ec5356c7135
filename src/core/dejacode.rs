//! DejaCode product API client.
//!
//! Creates a product and imports a scan result file into it. No retries;
//! every call creates a new remote resource.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::log_status;
use crate::utils::io;

pub const URL_VAR: &str = "DEJACODE_URL";
pub const API_KEY_VAR: &str = "DEJACODE_API_KEY";
pub const OUTPUTS_VAR: &str = "PROJECT_OUTPUTS";

pub const DEFAULT_PRODUCT_NAME: &str = "Demo Push Product";
pub const DEFAULT_PRODUCT_VERSION: &str = "1.0";

const TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_FIELD: &str = "upload_file";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductData {
    pub name: String,
    pub version: String,
}

impl Default for ProductData {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRODUCT_NAME.to_string(),
            version: DEFAULT_PRODUCT_VERSION.to_string(),
        }
    }
}

/// A product created on DejaCode and the body the API returned for it.
#[derive(Debug, Clone)]
pub struct CreatedProduct {
    pub uuid: Uuid,
    pub response: Value,
}

/// Scan result loaded into memory, ready for upload.
#[derive(Debug, Clone)]
pub struct ScanFile {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ScanFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::validation_invalid_argument(
                "scan_file",
                format!("Scan file not found: {}", path.display()),
                None,
            ));
        }

        let bytes = io::read_bytes(path, &format!("read scan file {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "scan.json".to_string());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            bytes,
        })
    }
}

/// Outcome of a full create-then-import push.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub product_uuid: Uuid,
    pub product: ProductData,
    pub scan_file: String,
    pub product_response: Value,
    pub import_response: Value,
}

pub struct DejacodeClient {
    client: Client,
    products_url: String,
    auth_header: String,
}

impl DejacodeClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim();
        let api_key = api_key.trim();

        if base_url.is_empty() {
            return Err(Error::config_missing_key("url", Some(URL_VAR.to_string())));
        }
        if api_key.is_empty() {
            return Err(Error::config_missing_key(
                "api_key",
                Some(API_KEY_VAR.to_string()),
            ));
        }

        let client = Client::builder()
            .user_agent(format!("scanflow/{}", VERSION))
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some("create HTTP client".to_string()))
            })?;

        Ok(Self {
            client,
            products_url: products_url(base_url),
            auth_header: format!("Token {}", api_key),
        })
    }

    /// Create a product and return its identifier with the parsed body.
    ///
    /// The body is parsed whatever the status code: validation errors come
    /// back as JSON and are kept in the error details.
    pub fn create_product(&self, data: &ProductData) -> Result<CreatedProduct> {
        let url = self.products_url.clone();
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .form(data)
            .send()
            .map_err(|e| Error::http_request_failed(&url, e))?;

        let status = response.status().as_u16();
        let body = read_body(&url, response)?;
        let json = parse_json(&url, &body)?;

        let uuid = json
            .get("uuid")
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| {
                Error::http_invalid_response(
                    &url,
                    format!("product creation returned no valid uuid (HTTP {})", status),
                    Some(body.clone()),
                )
            })?;

        log_status!("push", "Created product '{}' ({})", data.name, uuid);
        Ok(CreatedProduct {
            uuid,
            response: json,
        })
    }

    /// Upload `scan` as the scan import for `product`.
    pub fn push_scan(&self, product: &Uuid, scan: &ScanFile) -> Result<Value> {
        let url = import_url(&self.products_url, product);
        let part = Part::bytes(scan.bytes.clone()).file_name(scan.file_name.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .multipart(form)
            .send()
            .map_err(|e| Error::http_request_failed(&url, e))?;

        let status = response.status();
        let body = read_body(&url, response)?;
        if !status.is_success() {
            return Err(Error::http_status(&url, status.as_u16(), body));
        }

        let json = parse_json(&url, &body)?;
        log_status!("push", "Imported {} into product {}", scan.path.display(), product);
        Ok(json)
    }

    /// Load the scan, create the product, then import the scan.
    ///
    /// No request is sent when the scan file cannot be read, and nothing is
    /// uploaded when creation fails.
    pub fn push(&self, data: &ProductData, scan_file: &Path) -> Result<PushReport> {
        let scan = ScanFile::load(scan_file)?;
        let product = self.create_product(data)?;
        let import_response = self.push_scan(&product.uuid, &scan)?;

        Ok(PushReport {
            product_uuid: product.uuid,
            product: data.clone(),
            scan_file: scan.path.display().to_string(),
            product_response: product.response,
            import_response,
        })
    }
}

pub fn products_url(base_url: &str) -> String {
    format!("{}/api/v2/products/", base_url.trim_end_matches('/'))
}

pub fn import_url(products_url: &str, product: &Uuid) -> String {
    format!("{}{}/import_from_scan/", products_url, product)
}

/// First `*.json` file in `outputs_dir`, by name.
pub fn find_scan_file(outputs_dir: &Path) -> Result<PathBuf> {
    let escaped = glob::Pattern::escape(&outputs_dir.to_string_lossy());
    let pattern = format!("{}/*.json", escaped.trim_end_matches('/'));

    let entries = glob::glob(&pattern).map_err(|e| {
        Error::validation_invalid_argument(
            "outputs_dir",
            format!("Invalid outputs directory pattern: {}", e),
            None,
        )
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    files.into_iter().next().ok_or_else(|| {
        Error::validation_invalid_argument(
            "outputs_dir",
            format!("No JSON scan file found in {}", outputs_dir.display()),
            Some(vec![pattern.clone()]),
        )
        .with_hint("Run `scanflow run` with the json output format first")
    })
}

fn read_body(url: &str, response: Response) -> Result<String> {
    response
        .text()
        .map_err(|e| Error::http_request_failed(url, e))
}

fn parse_json(url: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| {
        Error::http_invalid_response(url, format!("body is not JSON: {}", e), Some(body.to_string()))
    })
}
