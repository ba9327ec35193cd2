//! End-to-end release runs with fake cargo, bucket and signing service.

mod common;

use common::{FakeSigningService, FakeToolchain, MemoryStore, RecordingSigner, RecordingStage};
use qchat_release::bundler::{
    ArtifactFormat, Error, HostPlatform, PackageSettings, ReleaseOrchestrator, Settings,
    SettingsBuilder,
    builder::checksum,
    platform::{Packager, RemoteSigning},
    remote::SigningClient,
    storage::ObjectStore,
};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BUILT: &[u8] = b"unsigned qchat";
const SIGNED: &[u8] = b"signed qchat";

fn some(value: &str) -> Option<String> {
    Some(value.to_string())
}

fn linux_settings(dir: &TempDir) -> SettingsBuilder {
    SettingsBuilder::new()
        .platform(HostPlatform::Linux)
        .workspace_dir(dir.path())
        .build_dir(dir.path().join("build"))
}

fn signed_macos_settings(dir: &TempDir) -> Settings {
    SettingsBuilder::new()
        .platform(HostPlatform::MacOs)
        .package_settings(PackageSettings {
            apple_team_id: some("TEAMID"),
            ..Default::default()
        })
        .workspace_dir(dir.path())
        .build_dir(dir.path().join("build"))
        .signing_bucket(some("signing-bucket"))
        .aws_account_id(some("123456789012"))
        .apple_id_secret(some("notarize-secret"))
        .signing_role_name(some("signer"))
        .build()
        .unwrap()
}

fn remote_signing(settings: &Settings, service: Arc<FakeSigningService>, store: &MemoryStore) -> RemoteSigning {
    RemoteSigning::new(
        SigningClient::new(service),
        Arc::new(store.clone()),
        settings.signing().cloned().unwrap(),
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn linux_release_stages_signed_archives() {
    let dir = TempDir::new().unwrap();
    let settings = linux_settings(&dir).build().unwrap();
    let toolchain = FakeToolchain::new(BUILT);
    let signer = RecordingSigner::default();
    let output = MemoryStore::new("artifacts");

    let artifact = ReleaseOrchestrator::new(
        settings,
        HostPlatform::Linux,
        Box::new(toolchain.clone()),
        Packager::new(HostPlatform::Linux),
    )
    .with_signer(Box::new(signer.clone()))
    .with_output_store(Some(Arc::new(output.clone()) as Arc<dyn ObjectStore>))
    .run()
    .await
    .unwrap();

    assert_eq!(toolchain.calls(), ["test", "lint", "build"]);
    assert_eq!(artifact.outputs.len(), 4);
    assert_eq!(signer.cleans(), 1);

    let mut expected = Vec::new();
    for ext in ["tar.gz", "tar.xz", "tar.zst", "zip"] {
        expected.push(format!("staging/qchat.{ext}"));
        expected.push(format!("staging/qchat.{ext}.sha256"));
        expected.push(format!("staging/qchat.{ext}.sig"));
    }
    expected.sort();
    assert_eq!(output.keys(), expected);

    let tar_gz = dir.path().join("build").join("qchat.tar.gz");
    assert_eq!(
        output.get("staging/qchat.tar.gz").unwrap(),
        tokio::fs::read(&tar_gz).await.unwrap()
    );
}

#[tokio::test]
async fn linux_release_without_gpg_is_unsigned() {
    let dir = TempDir::new().unwrap();
    let settings = linux_settings(&dir)
        .run_tests(false)
        .run_lints(false)
        .build()
        .unwrap();
    let toolchain = FakeToolchain::new(BUILT);

    let artifact = ReleaseOrchestrator::new(
        settings,
        HostPlatform::Linux,
        Box::new(toolchain.clone()),
        Packager::new(HostPlatform::Linux),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(toolchain.calls(), ["build"]);
    assert_eq!(artifact.outputs.len(), 4);
    assert_eq!(artifact.files().len(), 8);
    assert_eq!(artifact.signatures().count(), 0);
    for output in &artifact.outputs {
        assert!(output.path.is_file());
        assert!(output.checksum_path.is_file());
    }
    assert!(!dir.path().join("build").join("qchat").exists());
}

#[tokio::test]
async fn failing_lint_stops_before_build() {
    let dir = TempDir::new().unwrap();
    let settings = linux_settings(&dir).build().unwrap();
    let toolchain = FakeToolchain::new(BUILT).failing_on("lint");
    let output = MemoryStore::new("artifacts");

    let err = ReleaseOrchestrator::new(
        settings,
        HostPlatform::Linux,
        Box::new(toolchain.clone()),
        Packager::new(HostPlatform::Linux),
    )
    .with_output_store(Some(Arc::new(output.clone()) as Arc<dyn ObjectStore>))
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, Error::ToolInvocation { .. }), "{err:?}");
    assert_eq!(toolchain.calls(), ["test", "lint"]);
    assert!(output.keys().is_empty());
    assert!(!dir.path().join("build").join("qchat.tar.gz").exists());
}

#[tokio::test]
async fn macos_release_ships_the_signed_binary() {
    let dir = TempDir::new().unwrap();
    let settings = signed_macos_settings(&dir);
    let signing_store = MemoryStore::new("signing-bucket");
    signing_store.put("signed/stale.zip", b"old".to_vec());
    signing_store.put("pre-signed/stale.tar.gz", b"old".to_vec());
    let service = FakeSigningService::new(signing_store.clone(), SIGNED, "success");
    let stage = RecordingStage::default();
    let output = MemoryStore::new("artifacts");

    let packager = Packager::new(HostPlatform::MacOs)
        .with_remote_signing(Some(remote_signing(&settings, service.clone(), &signing_store)))
        .with_post_signing_stages(vec![Box::new(stage.clone())]);
    let artifact = ReleaseOrchestrator::new(
        settings,
        HostPlatform::MacOs,
        Box::new(FakeToolchain::new(BUILT)),
        packager,
    )
    .with_output_store(Some(Arc::new(output.clone()) as Arc<dyn ObjectStore>))
    .run()
    .await
    .unwrap();

    let build_dir = dir.path().join("build");
    let binary = build_dir.join("qchat");
    assert_eq!(tokio::fs::read(&binary).await.unwrap(), SIGNED);
    assert_eq!(artifact.outputs.len(), 1);
    assert_eq!(artifact.outputs[0].format, ArtifactFormat::Executable);
    assert!(checksum::verify(&binary, &artifact.outputs[0].checksum_path).await.unwrap());
    assert_eq!(stage.seen(), [SIGNED.to_vec()]);

    assert_eq!(
        signing_store.calls()[..3],
        ["rm signed", "rm pre-signed", "upload pre-signed/package.tar.gz"]
    );
    assert_eq!(
        signing_store.keys(),
        ["pre-signed/package.tar.gz", "signed/signed.zip"]
    );

    let requests: Vec<_> = service
        .requests()
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    assert_eq!(
        requests,
        [
            (Method::POST, "/signing_requests".to_string()),
            (Method::POST, "/signing_requests/req-1/start".to_string()),
            (Method::GET, "/signing_requests/req-1".to_string()),
        ]
    );

    assert_eq!(output.keys(), ["staging/qchat", "staging/qchat.sha256"]);
    assert_eq!(output.get("staging/qchat").unwrap(), SIGNED);

    assert!(!build_dir.join("package").exists());
    assert!(!build_dir.join("package.tar.gz").exists());
    assert!(!build_dir.join("signed.zip").exists());
}

#[tokio::test]
async fn macos_release_without_signing_ships_the_built_binary() {
    let dir = TempDir::new().unwrap();
    let settings = SettingsBuilder::new()
        .platform(HostPlatform::MacOs)
        .workspace_dir(dir.path())
        .build_dir(dir.path().join("build"))
        .build()
        .unwrap();
    let stage = RecordingStage::default();

    let packager = Packager::new(HostPlatform::MacOs)
        .with_post_signing_stages(vec![Box::new(stage.clone())]);
    let artifact = ReleaseOrchestrator::new(
        settings,
        HostPlatform::MacOs,
        Box::new(FakeToolchain::new(BUILT)),
        packager,
    )
    .run()
    .await
    .unwrap();

    let binary = dir.path().join("build").join("qchat");
    assert_eq!(artifact.binary_path, binary);
    assert_eq!(tokio::fs::read(&binary).await.unwrap(), BUILT);
    assert!(stage.seen().is_empty());
}

#[tokio::test(start_paused = true)]
async fn macos_signing_failure_aborts_release() {
    let dir = TempDir::new().unwrap();
    let settings = signed_macos_settings(&dir);
    let signing_store = MemoryStore::new("signing-bucket");
    let service = FakeSigningService::new(signing_store.clone(), SIGNED, "failure");
    let stage = RecordingStage::default();
    let output = MemoryStore::new("artifacts");

    let packager = Packager::new(HostPlatform::MacOs)
        .with_remote_signing(Some(remote_signing(&settings, service, &signing_store)))
        .with_post_signing_stages(vec![Box::new(stage.clone())]);
    let err = ReleaseOrchestrator::new(
        settings,
        HostPlatform::MacOs,
        Box::new(FakeToolchain::new(BUILT)),
        packager,
    )
    .with_output_store(Some(Arc::new(output.clone()) as Arc<dyn ObjectStore>))
    .run()
    .await
    .unwrap_err();

    assert!(
        matches!(&err, Error::SigningFailed { request_id } if request_id == "req-1"),
        "{err:?}"
    );
    assert!(stage.seen().is_empty());
    assert!(output.keys().is_empty());

    let build_dir = dir.path().join("build");
    assert!(!build_dir.join("package").exists());
    assert!(!build_dir.join("package.tar.gz").exists());
    assert!(!build_dir.join("signed.zip").exists());
}

#[tokio::test]
async fn macos_release_cleans_an_injected_signer() {
    let dir = TempDir::new().unwrap();
    let settings = SettingsBuilder::new()
        .platform(HostPlatform::MacOs)
        .workspace_dir(dir.path())
        .build_dir(dir.path().join("build"))
        .build()
        .unwrap();
    let signer = RecordingSigner::default();

    let artifact = ReleaseOrchestrator::new(
        settings,
        HostPlatform::MacOs,
        Box::new(FakeToolchain::new(BUILT)),
        Packager::new(HostPlatform::MacOs),
    )
    .with_signer(Box::new(signer.clone()))
    .run()
    .await
    .unwrap();

    assert_eq!(signer.cleans(), 1);
    assert!(signer.signed().is_empty());
    assert_eq!(artifact.signatures().count(), 0);
}

#[tokio::test]
async fn macos_signer_cleanup_failure_fails_the_release() {
    let dir = TempDir::new().unwrap();
    let settings = SettingsBuilder::new()
        .platform(HostPlatform::MacOs)
        .workspace_dir(dir.path())
        .build_dir(dir.path().join("build"))
        .build()
        .unwrap();
    let signer = RecordingSigner {
        fail_clean: true,
        ..Default::default()
    };

    let err = ReleaseOrchestrator::new(
        settings,
        HostPlatform::MacOs,
        Box::new(FakeToolchain::new(BUILT)),
        Packager::new(HostPlatform::MacOs),
    )
    .with_signer(Box::new(signer.clone()))
    .run()
    .await
    .unwrap_err();

    assert!(err.to_string().contains("agent would not die"), "{err}");
    assert_eq!(signer.cleans(), 1);
}

#[tokio::test]
async fn partial_signing_config_builds_unsigned() {
    let dir = TempDir::new().unwrap();
    let settings = SettingsBuilder::new()
        .platform(HostPlatform::MacOs)
        .workspace_dir(dir.path())
        .build_dir(dir.path().join("build"))
        .signing_bucket(some("signing-bucket"))
        .aws_account_id(some("123456789012"))
        .build()
        .unwrap();
    assert!(settings.signing().is_none());

    let signing_store = MemoryStore::new("signing-bucket");
    let stage = RecordingStage::default();
    let output = MemoryStore::new("artifacts");
    let remote = RemoteSigning::from_settings(&settings).unwrap();
    assert!(remote.is_none());

    let packager = Packager::new(HostPlatform::MacOs)
        .with_remote_signing(remote)
        .with_post_signing_stages(vec![Box::new(stage.clone())]);
    let artifact = ReleaseOrchestrator::new(
        settings,
        HostPlatform::MacOs,
        Box::new(FakeToolchain::new(BUILT)),
        packager,
    )
    .with_output_store(Some(Arc::new(output.clone()) as Arc<dyn ObjectStore>))
    .run()
    .await
    .unwrap();

    assert_eq!(artifact.outputs.len(), 1);
    assert_eq!(artifact.outputs[0].format, ArtifactFormat::Executable);
    assert_eq!(artifact.signatures().count(), 0);
    assert_eq!(tokio::fs::read(&artifact.binary_path).await.unwrap(), BUILT);
    assert!(stage.seen().is_empty());
    assert!(signing_store.calls().is_empty());
    assert_eq!(output.keys(), ["staging/qchat", "staging/qchat.sha256"]);
}
