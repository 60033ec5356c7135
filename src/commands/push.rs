use std::path::PathBuf;

use clap::Args;

use scanflow::dejacode::{
    self, DejacodeClient, ProductData, PushReport, API_KEY_VAR, DEFAULT_PRODUCT_NAME,
    DEFAULT_PRODUCT_VERSION, OUTPUTS_VAR, URL_VAR,
};
use scanflow::paths;
use scanflow::Error;

use super::{CmdResult, GlobalArgs};

#[derive(Args, Debug)]
pub struct PushArgs {
    /// DejaCode base URL
    #[arg(long, env = URL_VAR)]
    pub url: Option<String>,

    /// DejaCode API key
    #[arg(long, env = API_KEY_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Name of the product to create
    #[arg(long, default_value = DEFAULT_PRODUCT_NAME)]
    pub product_name: String,

    /// Version of the product to create
    #[arg(long, default_value = DEFAULT_PRODUCT_VERSION)]
    pub product_version: String,

    /// Scan result file to upload; takes precedence over --outputs-dir
    #[arg(long)]
    pub scan_file: Option<String>,

    /// Directory searched for the first *.json scan file
    #[arg(long, env = OUTPUTS_VAR)]
    pub outputs_dir: Option<String>,
}

impl PushArgs {
    fn scan_file(&self) -> scanflow::Result<PathBuf> {
        if let Some(file) = self.scan_file.as_deref() {
            return Ok(paths::expand(file));
        }
        match self.outputs_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => dejacode::find_scan_file(&paths::expand(dir)),
            _ => Err(Error::validation_missing_argument(vec![
                "--scan-file".to_string(),
                "--outputs-dir".to_string(),
            ])
            .with_hint(format!(
                "Set {} to the project's output directory",
                OUTPUTS_VAR
            ))),
        }
    }
}

pub fn run(args: PushArgs, _global: &GlobalArgs) -> CmdResult<PushReport> {
    let client = DejacodeClient::new(
        args.url.as_deref().unwrap_or_default(),
        args.api_key.as_deref().unwrap_or_default(),
    )?;
    let scan_file = args.scan_file()?;

    let product = ProductData {
        name: args.product_name.clone(),
        version: args.product_version.clone(),
    };

    let report = client.push(&product, &scan_file)?;
    Ok((report, 0))
}
