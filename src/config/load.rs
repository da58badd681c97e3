//! Configuration document loading

use std::fs;
use std::path::Path;

use super::schema::MatrixConfig;
use super::ConfigError;

/// Default location of the configuration document, relative to the repo root
pub const DEFAULT_CONFIG_PATH: &str = ".github/mcus.json";

/// Load a configuration document, choosing TOML for `.toml` files and JSON
/// otherwise
pub fn load_file(path: &Path) -> Result<MatrixConfig, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        parse_toml(&contents)
    } else {
        parse_json(&contents)
    }
}

/// Parse a JSON configuration document
pub fn parse_json(contents: &str) -> Result<MatrixConfig, ConfigError> {
    serde_json::from_str(contents)
        .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
}

/// Parse a TOML configuration document
pub fn parse_toml(contents: &str) -> Result<MatrixConfig, ConfigError> {
    toml::from_str(contents).map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::SdkDescriptor;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_json_document() {
        let config = parse_json(
            r#"{
                "defaults": {"toolchain": "gcc-arm-none-eabi", "apt": ["cmake"]},
                "targets": [
                    {"id": "rp2040", "sdk": {"method": "git", "path": "sdk/pico", "repo": "https://github.com/raspberrypi/pico-sdk"}},
                    {"id": "native"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.defaults.toolchain.as_deref(), Some("gcc-arm-none-eabi"));
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].id, "rp2040");
        assert!(matches!(config.targets[0].sdk, Some(SdkDescriptor::Git(_))));
    }

    #[test]
    fn test_parse_json_error() {
        let err = parse_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_parse_toml_document() {
        let config = parse_toml(
            r#"
            [defaults]
            apt = ["cmake", "ninja-build"]
            cmake_args = ["-DCMAKE_BUILD_TYPE=Release"]

            [[targets]]
            id = "rp2040"
            desc = "Raspberry Pi Pico"

            [targets.sdk]
            method = "archive"
            path = "sdk/pico"
            url = "https://example.com/pico-sdk.tar.gz"
            strip_components = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.apt, vec!["cmake", "ninja-build"]);
        assert_eq!(config.targets[0].desc.as_deref(), Some("Raspberry Pi Pico"));
        match config.targets[0].sdk {
            Some(SdkDescriptor::Archive(ref archive)) => assert_eq!(archive.strip_components(), 1),
            ref other => panic!("expected archive descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_toml_pass_through_fields() {
        let config = parse_toml(
            r#"
            [[targets]]
            id = "rp2040"
            example = "examples/rp2040/spi"

            [targets.sdk]
            method = "git"
            path = "sdk/pico"
            repo = "https://github.com/raspberrypi/pico-sdk"
            submodules = true
            note = "pinned"
            "#,
        )
        .unwrap();

        let target = &config.targets[0];
        assert_eq!(target.extra["example"], "examples/rp2040/spi");
        match target.sdk {
            Some(SdkDescriptor::Git(ref git)) => {
                assert!(git.submodules());
                assert_eq!(git.extra["note"], "pinned");
            }
            ref other => panic!("expected git descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_toml_error() {
        let err = parse_toml("[[targets]\nid =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_file_by_extension() {
        let mut json_file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, r#"{{"targets": [{{"id": "a"}}]}}"#).unwrap();
        assert_eq!(load_file(json_file.path()).unwrap().targets[0].id, "a");

        let mut toml_file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "[[targets]]").unwrap();
        writeln!(toml_file, "id = \"b\"").unwrap();
        assert_eq!(load_file(toml_file.path()).unwrap().targets[0].id, "b");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_file(Path::new("/nonexistent/mcus.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
