//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use qchat_release::bundler::{
    Error, HostPlatform, Result, Settings,
    platform::PostSigningStage,
    remote::{SigningResponse, SigningTransport},
    sign::{DetachedSigner, signature_path},
    storage::ObjectStore,
    toolchain::Toolchain,
};
use reqwest::Method;
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Toolchain that records stage calls and writes a fixed binary on build.
#[derive(Clone, Default)]
pub struct FakeToolchain {
    pub calls: Arc<Mutex<Vec<&'static str>>>,
    pub fail_on: Option<&'static str>,
    pub contents: Vec<u8>,
}

impl FakeToolchain {
    pub fn new(contents: &[u8]) -> Self {
        Self {
            contents: contents.to_vec(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, stage: &'static str) -> Self {
        self.fail_on = Some(stage);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, stage: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(stage);
        if self.fail_on == Some(stage) {
            return Err(Error::ToolInvocation {
                command: format!("cargo {stage}"),
                code: Some(101),
                stderr: "boom".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn test(&self, _settings: &Settings) -> Result<()> {
        self.record("test")
    }

    async fn lint(&self, _settings: &Settings) -> Result<()> {
        self.record("lint")
    }

    async fn build(&self, settings: &Settings, platform: HostPlatform) -> Result<PathBuf> {
        self.record("build")?;
        let name = match platform {
            HostPlatform::MacOs => "qchat-universal-apple-darwin".to_string(),
            HostPlatform::Linux => format!("bin/qchat-{}", settings.targets()[0].triple()),
        };
        let path = settings.build_dir().join(name);
        tokio::fs::create_dir_all(path.parent().unwrap()).await?;
        tokio::fs::write(&path, &self.contents).await?;
        Ok(path)
    }
}

/// In-memory bucket.
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    pub objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Default::default(),
            calls: Default::default(),
        }
    }

    pub fn put(&self, key: &str, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("rm {prefix}"));
        let prefix = format!("{prefix}/");
        self.objects
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    async fn upload(&self, local: &Path, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("upload {key}"));
        let bytes = tokio::fs::read(local).await?;
        self.put(key, bytes);
        Ok(())
    }

    async fn download(&self, key: &str, local: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(format!("download {key}"));
        let bytes = self
            .get(key)
            .ok_or_else(|| Error::GenericError(format!("no such key: {key}")))?;
        tokio::fs::write(local, bytes).await?;
        Ok(())
    }
}

/// A request seen by a fake transport.
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport replaying canned responses in order; the last one repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<SigningResponse>>,
    pub requests: Mutex<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = SigningResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Default::default(),
        })
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SigningTransport for ScriptedTransport {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<SigningResponse> {
        self.requests.lock().unwrap().push(SeenRequest {
            method,
            path: path.to_string(),
            body,
        });
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        Ok(response.expect("scripted transport has no responses"))
    }
}

pub fn status(code: u16) -> SigningResponse {
    SigningResponse::new(code, "")
}

pub fn json_response(body: Value) -> SigningResponse {
    SigningResponse::new(200, body.to_string())
}

pub fn poll(status: &str) -> SigningResponse {
    json_response(json!({ "signingRequest": { "status": status } }))
}

/// Zip holding a single `qchat` entry.
pub fn signed_zip(contents: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    writer.start_file("qchat", options).unwrap();
    writer.write_all(contents).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Signing service that writes a signed zip into the bucket when a job is
/// started and then reports `final_status`.
pub struct FakeSigningService {
    store: MemoryStore,
    signed: Vec<u8>,
    final_status: String,
    pub requests: Mutex<Vec<SeenRequest>>,
}

impl FakeSigningService {
    pub fn new(store: MemoryStore, signed_binary: &[u8], final_status: &str) -> Arc<Self> {
        Arc::new(Self {
            store,
            signed: signed_zip(signed_binary),
            final_status: final_status.to_string(),
            requests: Default::default(),
        })
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SigningTransport for FakeSigningService {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<SigningResponse> {
        self.requests.lock().unwrap().push(SeenRequest {
            method: method.clone(),
            path: path.to_string(),
            body: body.clone(),
        });

        if method == Method::POST && path == "/signing_requests" {
            return Ok(json_response(json!({ "signingRequestId": "req-1" })));
        }
        if method == Method::POST && path == "/signing_requests/req-1/start" {
            let body = body.unwrap_or_default();
            let location = &body["s3Location"];
            let source = location["sourceKey"].as_str().unwrap_or_default();
            if self.store.get(source).is_none() {
                return Ok(status(400));
            }
            let destination = location["destinationKey"].as_str().unwrap_or_default();
            self.store.put(destination, self.signed.clone());
            return Ok(json_response(json!({})));
        }
        if method == Method::GET && path == "/signing_requests/req-1" {
            return Ok(poll(&self.final_status));
        }
        Ok(status(404))
    }
}

/// Detached signer that records what it signed and how often it was cleaned.
#[derive(Clone, Default)]
pub struct RecordingSigner {
    /// `(file, checksum already present)` per sign call
    pub signed: Arc<Mutex<Vec<(PathBuf, bool)>>>,
    pub cleans: Arc<Mutex<usize>>,
    pub fail_on_call: Option<usize>,
    pub fail_clean: bool,
}

impl RecordingSigner {
    pub fn signed(&self) -> Vec<(PathBuf, bool)> {
        self.signed.lock().unwrap().clone()
    }

    pub fn cleans(&self) -> usize {
        *self.cleans.lock().unwrap()
    }
}

#[async_trait]
impl DetachedSigner for RecordingSigner {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn sign_file(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        let mut checksum = path.as_os_str().to_owned();
        checksum.push(".sha256");
        let call = {
            let mut signed = self.signed.lock().unwrap();
            signed.push((path.to_path_buf(), Path::new(&checksum).exists()));
            signed.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(Error::GenericError(format!("cannot sign {}", path.display())));
        }
        let sig = signature_path(path);
        tokio::fs::write(&sig, b"sig").await?;
        Ok(Some(sig))
    }

    async fn clean(&mut self) -> Result<()> {
        *self.cleans.lock().unwrap() += 1;
        if self.fail_clean {
            return Err(Error::GenericError("agent would not die".into()));
        }
        Ok(())
    }
}

/// Post-signing stage that records the binary contents it was run on.
#[derive(Clone, Default)]
pub struct RecordingStage {
    pub seen: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingStage {
    pub fn seen(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostSigningStage for RecordingStage {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn run(&self, _settings: &Settings, binary: &Path) -> Result<()> {
        let contents = tokio::fs::read(binary).await?;
        self.seen.lock().unwrap().push(contents);
        Ok(())
    }
}
