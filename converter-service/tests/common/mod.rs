use converter_service::config::ConverterConfig;
use converter_service::startup::Application;
use std::path::PathBuf;
use uuid::Uuid;

/// Fake converter that copies the input file to the output path,
/// mimicking dwg2dxf's `<input> -v2000 -y <output>` argument order.
pub const COPY_CONVERTER: &str = "#!/bin/sh\ncp \"$1\" \"$4\"\n";

/// Fake converter that fails with diagnostics on both streams.
pub const FAILING_CONVERTER: &str =
    "#!/bin/sh\necho \"reading header\"\necho \"bad entity at offset 42\" >&2\nexit 3\n";

/// Fake converter that exits cleanly without writing the output file.
pub const SILENT_CONVERTER: &str = "#!/bin/sh\necho \"nothing to do\"\nexit 0\n";

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

/// Write an executable fake converter script under target/ and return its path.
pub fn write_fake_converter(script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = PathBuf::from(format!("target/test-converter-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create fake converter dir");
    let path = dir.join("dwg2dxf");
    std::fs::write(&path, script).expect("write fake converter script");

    let mut perms = std::fs::metadata(&path)
        .expect("stat fake converter script")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake converter script");

    path
}

/// Load the configuration with a random port and the given fake converter.
pub fn test_config(script: &str) -> ConverterConfig {
    let binary = write_fake_converter(script);
    let mut config = ConverterConfig::load().expect("Failed to load configuration");
    config.common.port = 0; // Random port for testing
    config.converter.binary_path = binary.to_string_lossy().into_owned();
    config
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_converter(COPY_CONVERTER).await
    }

    pub async fn spawn_with_converter(script: &str) -> Self {
        let config = test_config(script);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the HTTP server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
        }
    }
}
