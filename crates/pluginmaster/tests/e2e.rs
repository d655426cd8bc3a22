// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete pluginmaster pipeline.
//!
//! Release archives are turned into a document, served over a real socket
//! and resolved by the HTTP client. Each test uses its own temp directory
//! and ephemeral port.

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pluginmaster_builder::{BuildOptions, ManifestBuilder};
use pluginmaster_config::model::BuilderConfig;
use pluginmaster_gateway::{router, AuthConfig, GatewayState, ServerConfig};
use pluginmaster_manifest::{ManifestStore, PublishOutcome};
use pluginmaster_resolver::Resolver;

fn write_release(plugins: &Path, name: &str, version: &str, deps: &[&str]) {
    let dir = plugins.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let manifest = serde_json::json!({
        "Author": "WigglyMuffin",
        "Name": name,
        "InternalName": name,
        "Description": format!("{name} plugin"),
        "RepoUrl": format!("https://github.com/WigglyMuffin/{name}"),
        "AssemblyVersion": version,
        "DalamudApiLevel": 12,
        "Dependencies": deps,
    });

    let file = std::fs::File::create(dir.join("latest.zip")).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    zip.start_file(format!("{name}.json"), options).unwrap();
    zip.write_all(manifest.to_string().as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn build_store(plugins: &Path) -> ManifestStore {
    let options = BuildOptions::from_config(
        &BuilderConfig {
            plugins_dir: plugins.display().to_string(),
            ..BuilderConfig::default()
        },
        None,
    );
    ManifestBuilder::new(options).build().unwrap()
}

async fn serve(store: Arc<ManifestStore>) -> SocketAddr {
    let app = router(
        &ServerConfig::default(),
        GatewayState::new(store, AuthConfig::default()),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn generated_document_is_served_and_resolved() {
    let dir = tempfile::tempdir().unwrap();
    let plugins = dir.path().join("plugins");
    write_release(&plugins, "Questionable", "7.2.0.1", &["vnavmesh", "Lifestream", "TextAdvance"]);
    write_release(&plugins, "vnavmesh", "0.3.0.0", &[]);
    write_release(&plugins, "Lifestream", "2.5.0.0", &["vnavmesh"]);
    write_release(&plugins, "TextAdvance", "1.9.0.0", &[]);

    let store = Arc::new(build_store(&plugins));
    assert_eq!(store.get_all().len(), 4);
    let addr = serve(Arc::clone(&store)).await;

    let url = format!("http://{addr}/pluginmaster.json");
    let resolver = Resolver::from_urls(&[url], Duration::from_secs(5)).unwrap();
    let order = resolver.resolve("Questionable").await.unwrap();

    let names: Vec<_> = order.iter().map(|p| p.descriptor.name.as_str()).collect();
    assert_eq!(names, vec!["vnavmesh", "Lifestream", "TextAdvance", "Questionable"]);
    assert_eq!(order[3].descriptor.version.as_deref(), Some("7.2.0.1"));
}

#[tokio::test]
async fn published_version_is_visible_to_next_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let plugins = dir.path().join("plugins");
    write_release(&plugins, "vnavmesh", "0.3.0.0", &[]);

    let store = Arc::new(build_store(&plugins));
    let addr = serve(Arc::clone(&store)).await;
    let resolver = Resolver::from_urls(
        &[format!("http://{addr}/pluginmaster.json")],
        Duration::from_secs(5),
    )
    .unwrap();

    let before = resolver.resolve("vnavmesh").await.unwrap();
    assert_eq!(before[0].descriptor.version.as_deref(), Some("0.3.0.0"));

    let mut next = store.get("vnavmesh").unwrap();
    next.version = Some("0.4.0.0".to_string());
    assert_eq!(store.publish(next).unwrap(), PublishOutcome::NewVersion);

    let after = resolver.resolve("vnavmesh").await.unwrap();
    assert_eq!(after[0].descriptor.version.as_deref(), Some("0.4.0.0"));
}

#[tokio::test]
async fn written_document_round_trips_through_validation() {
    let dir = tempfile::tempdir().unwrap();
    let plugins = dir.path().join("plugins");
    write_release(&plugins, "Questionable", "7.2.0.1", &["vnavmesh"]);
    let output = dir.path().join("repo").join("pluginmaster.json");

    let options = BuildOptions::from_config(
        &BuilderConfig {
            plugins_dir: plugins.display().to_string(),
            ..BuilderConfig::default()
        },
        Some("refs/heads/testing"),
    );
    ManifestBuilder::new(options).build_to(&output).unwrap();

    let reloaded = ManifestStore::load(&output).unwrap();
    let questionable = reloaded.get("Questionable").unwrap();
    assert!(questionable.download_url.contains("/raw/testing/"));
    assert_eq!(questionable.dependencies, vec!["vnavmesh"]);
    assert_eq!(std::fs::read(&output).unwrap(), reloaded.serve().body.to_vec());
}
