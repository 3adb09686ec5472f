use std::fs;
use std::path::PathBuf;

use rust_embed::Embed;

use crate::bank::{BankLoadError, Category};

#[derive(Embed)]
#[folder = "assets/banks/"]
struct BankAssets;

/// Where raw bank payloads come from.
pub trait BankSource {
    fn fetch(&self, category: Category) -> Result<String, BankLoadError>;

    fn describe(&self) -> String;
}

/// Banks bundled into the binary.
#[derive(Default)]
pub struct EmbeddedSource;

impl BankSource for EmbeddedSource {
    fn fetch(&self, category: Category) -> Result<String, BankLoadError> {
        let name = format!("{category}.json");
        let file = BankAssets::get(&name).ok_or_else(|| BankLoadError::Unreachable {
            category,
            reason: format!("bundled asset {name} missing"),
        })?;
        String::from_utf8(file.data.into_owned()).map_err(|e| BankLoadError::Malformed {
            category,
            reason: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        "bundled".to_string()
    }
}

/// Banks read from a directory: `<dir>/<C>.json`, or the legacy `<dir>/data_<C>.js`.
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BankSource for DirSource {
    fn fetch(&self, category: Category) -> Result<String, BankLoadError> {
        let candidates = [
            self.dir.join(format!("{category}.json")),
            self.dir.join(format!("data_{category}.js")),
        ];
        let mut last_err = None;
        for path in &candidates {
            match fs::read_to_string(path) {
                Ok(content) => return Ok(content),
                Err(e) => last_err = Some(format!("{}: {e}", path.display())),
            }
        }
        Err(BankLoadError::Unreachable {
            category,
            reason: last_err.unwrap_or_else(|| "no candidate paths".to_string()),
        })
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Banks fetched over HTTP from `<base_url>/<C>.json`.
#[cfg(feature = "network")]
pub struct HttpSource {
    base_url: String,
}

#[cfg(feature = "network")]
impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(feature = "network")]
impl BankSource for HttpSource {
    fn fetch(&self, category: Category) -> Result<String, BankLoadError> {
        let url = format!("{}/{category}.json", self.base_url);
        let unreachable = |reason: String| BankLoadError::Unreachable { category, reason };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| unreachable(e.to_string()))?;
        let response = client
            .get(&url)
            .send()
            .map_err(|e| unreachable(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(unreachable(format!("{url}: HTTP {}", response.status())));
        }
        response.text().map_err(|e| unreachable(e.to_string()))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// A boxed source lets the app pick an implementation at startup.
impl BankSource for Box<dyn BankSource> {
    fn fetch(&self, category: Category) -> Result<String, BankLoadError> {
        (**self).fetch(category)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
