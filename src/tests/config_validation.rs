#[cfg(test)]
mod test {

    use httpmock::{Method::GET, MockServer};

    use crate::client::VarhubClient;
    use crate::config::loader::load_config;
    use crate::error::ClientError;
    use crate::tests::common::rest_body;

    fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn yaml_configuration_loads_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "client.yaml",
            "rest:\n  host: varhub.example.org/varhub\n  timeout_seconds: 30\nversion: v2\n",
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.rest.timeout_seconds, Some(30));
        assert_eq!(
            config.api_root().unwrap().as_str(),
            "http://varhub.example.org/varhub/webservices/rest/v2/"
        );
    }

    #[test]
    fn json_configuration_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "client.json",
            r#"{"rest": {"host": "https://varhub.example.org"}}"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.version, "v2", "version defaults to v2");
    }

    #[test]
    fn missing_host_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "client.yaml", "version: v2\n");
        assert!(matches!(
            load_config(&path),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_version_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "client.yaml",
            "rest:\n  host: varhub.example.org\nversion: latest\n",
        );
        assert!(matches!(
            load_config(&path),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "client.toml", "rest = {}\n");
        assert!(matches!(
            load_config(&path),
            Err(ClientError::Configuration(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn loaded_configuration_builds_a_working_client() {
        let server = MockServer::start_async().await;
        let ping = server
            .mock_async(|when, then| {
                when.method(GET).path("/webservices/rest/v2/meta/ping");
                then.status(200).json_body(rest_body(vec![]));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "client.yaml",
            &format!("rest:\n  host: {}\n", server.base_url()),
        );

        let client = VarhubClient::new(load_config(&path).unwrap()).unwrap();
        client.ping().await.unwrap();
        ping.assert_async().await;
    }
}
