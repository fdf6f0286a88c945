// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use serde_json::{Map, Value};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const ENV_API_KEY: &str = "BPMN_ASSIST_API_KEY";
pub const ENV_ENDPOINT: &str = "BPMN_ASSIST_ENDPOINT";
pub const ENV_MODEL: &str = "BPMN_ASSIST_MODEL";

const KEY_API_KEY: &str = "apiKey";
const KEY_ENDPOINT: &str = "endpoint";
const KEY_MODEL: &str = "model";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings file {path:?} must contain a JSON object")]
    NotAnObject { path: PathBuf },
}

/// A flat JSON object on disk, one value per key.
///
/// Writes go to a temp file next to the target and are renamed into place.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored entry; a missing file reads as empty.
    pub fn load(&self) -> Result<Map<String, Value>, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => return Err(SettingsError::Io { path: self.path.clone(), source }),
        };
        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SettingsError::NotAnObject { path: self.path.clone() }),
            Err(source) => Err(SettingsError::Json { path: self.path.clone(), source }),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.load()?.remove(key))
    }

    pub fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value);
        self.save(&entries)
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool, SettingsError> {
        let mut entries = self.load()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.save(&entries)?;
        }
        Ok(existed)
    }

    pub fn save(&self, entries: &Map<String, Value>) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(entries)
            .map_err(|source| SettingsError::Json { path: self.path.clone(), source })?;
        write_atomic(&self.path, text.as_bytes())
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SettingsError> {
    let io_err = |path: &Path, source: io::Error| SettingsError::Io { path: path.to_path_buf(), source };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| io_err(parent, source))?;

    let Some(file_name) = path.file_name() else {
        return Err(io_err(path, io::Error::other("path has no file name")));
    };
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path =
        parent.join(format!(".bpmn-assist.tmp.{}.{nanos}", file_name.to_string_lossy()));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| io_err(tmp_path.as_path(), source))?;
    file.write_all(contents).map_err(|source| io_err(tmp_path.as_path(), source))?;
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_err(path, source));
    }
    Ok(())
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Obfuscates a credential for storage. Base64 keeps the key out of casual view; it is not
/// encryption.
fn obfuscate(secret: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(secret.as_bytes())
}

fn reveal(stored: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(stored.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Connection settings for the assistant endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSettings {
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self { api_key: None, endpoint: DEFAULT_ENDPOINT.to_owned(), model: DEFAULT_MODEL.to_owned() }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

impl AssistantSettings {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Blank keys are treated as absent.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = non_blank(api_key);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        if let Some(endpoint) = non_blank(Some(endpoint.into())) {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        if let Some(model) = non_blank(Some(model.into())) {
            self.model = model;
        }
        self
    }

    /// Reads the stored settings; anything missing or unreadable falls back to the default.
    pub fn load_from(store: &SettingsStore) -> Result<Self, SettingsError> {
        let entries = store.load()?;
        let text = |key: &str| entries.get(key).and_then(Value::as_str).map(str::to_owned);

        let mut settings = Self::default();
        if let Some(stored) = text(KEY_API_KEY) {
            match reveal(&stored) {
                Some(api_key) => settings = settings.with_api_key(Some(api_key)),
                None => tracing::warn!(path = ?store.path(), "ignoring undecodable stored API key"),
            }
        }
        if let Some(endpoint) = text(KEY_ENDPOINT) {
            settings = settings.with_endpoint(endpoint);
        }
        if let Some(model) = text(KEY_MODEL) {
            settings = settings.with_model(model);
        }
        Ok(settings)
    }

    /// Writes these settings, keeping unrelated keys in the store.
    pub fn save_to(&self, store: &SettingsStore) -> Result<(), SettingsError> {
        let mut entries = store.load()?;
        match &self.api_key {
            Some(api_key) => {
                entries.insert(KEY_API_KEY.to_owned(), Value::String(obfuscate(api_key)));
            }
            None => {
                entries.remove(KEY_API_KEY);
            }
        }
        entries.insert(KEY_ENDPOINT.to_owned(), Value::String(self.endpoint.clone()));
        entries.insert(KEY_MODEL.to_owned(), Value::String(self.model.clone()));
        store.save(&entries)
    }

    /// Applies overrides from `lookup` (normally the process environment).
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = self;
        if let Some(api_key) = non_blank(lookup(ENV_API_KEY)) {
            settings = settings.with_api_key(Some(api_key));
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            settings = settings.with_endpoint(endpoint);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            settings = settings.with_model(model);
        }
        settings
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use rstest::{fixture, rstest};
    use serde_json::{json, Value};

    use super::{
        AssistantSettings, SettingsError, SettingsStore, DEFAULT_ENDPOINT, DEFAULT_MODEL,
        ENV_API_KEY, ENV_MODEL,
    };

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = env::temp_dir();
            path.push(format!("bpmn-assist-{prefix}-{}-{nanos}-{counter}", std::process::id()));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    struct StoreCtx {
        tmp: TempDir,
        store: SettingsStore,
    }

    #[fixture]
    fn ctx() -> StoreCtx {
        let tmp = TempDir::new("settings");
        let store = SettingsStore::in_dir(tmp.path().join("config"));
        StoreCtx { tmp, store }
    }

    #[rstest]
    fn missing_file_reads_as_defaults(ctx: StoreCtx) {
        assert!(ctx.store.load().unwrap().is_empty());
        assert_eq!(AssistantSettings::load_from(&ctx.store).unwrap(), AssistantSettings::default());
    }

    #[rstest]
    fn key_value_entries_persist(ctx: StoreCtx) {
        ctx.store.set("theme", json!("dark")).unwrap();
        ctx.store.set("fontSize", json!(14)).unwrap();
        assert_eq!(ctx.store.get("theme").unwrap(), Some(json!("dark")));

        assert!(ctx.store.remove("theme").unwrap());
        assert!(!ctx.store.remove("theme").unwrap());
        assert_eq!(ctx.store.get("theme").unwrap(), None);
        assert_eq!(ctx.store.get("fontSize").unwrap(), Some(json!(14)));

        let leftovers = std::fs::read_dir(ctx.store.path().parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[rstest]
    fn api_key_is_stored_obfuscated(ctx: StoreCtx) {
        let settings = AssistantSettings::default()
            .with_api_key(Some("sk-secret".to_owned()))
            .with_model("gpt-4o");
        settings.save_to(&ctx.store).unwrap();

        let raw = std::fs::read_to_string(ctx.store.path()).unwrap();
        assert!(!raw.contains("sk-secret"));
        let stored: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["apiKey"], "c2stc2VjcmV0");

        assert_eq!(AssistantSettings::load_from(&ctx.store).unwrap(), settings);
    }

    #[rstest]
    fn saving_without_a_key_forgets_it_but_keeps_other_entries(ctx: StoreCtx) {
        ctx.store.set("theme", json!("dark")).unwrap();
        AssistantSettings::default().with_api_key(Some("k".to_owned())).save_to(&ctx.store).unwrap();
        AssistantSettings::default().save_to(&ctx.store).unwrap();

        assert_eq!(ctx.store.get("apiKey").unwrap(), None);
        assert_eq!(ctx.store.get("theme").unwrap(), Some(json!("dark")));
    }

    #[rstest]
    fn corrupt_files_are_reported(ctx: StoreCtx) {
        std::fs::create_dir_all(ctx.store.path().parent().unwrap()).unwrap();
        std::fs::write(ctx.store.path(), "{not json").unwrap();
        assert!(matches!(ctx.store.load(), Err(SettingsError::Json { .. })));

        std::fs::write(ctx.store.path(), "[1, 2]").unwrap();
        assert!(matches!(ctx.store.load(), Err(SettingsError::NotAnObject { .. })));
        assert!(ctx.tmp.path().exists());
    }

    #[rstest]
    fn undecodable_key_is_ignored(ctx: StoreCtx) {
        ctx.store.set("apiKey", json!("***not base64***")).unwrap();
        assert_eq!(AssistantSettings::load_from(&ctx.store).unwrap().api_key(), None);
    }

    #[test]
    fn overrides_beat_stored_values_and_blank_ones_are_ignored() {
        let env = HashMap::from([
            (ENV_API_KEY, "from-env".to_owned()),
            (ENV_MODEL, "   ".to_owned()),
        ]);
        let settings = AssistantSettings::default()
            .with_api_key(Some("stored".to_owned()))
            .with_overrides(|key| env.get(key).cloned());

        assert_eq!(settings.api_key(), Some("from-env"));
        assert_eq!(settings.model(), DEFAULT_MODEL);
        assert_eq!(settings.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        assert_eq!(AssistantSettings::default().with_api_key(Some("  ".to_owned())).api_key(), None);
    }
}
