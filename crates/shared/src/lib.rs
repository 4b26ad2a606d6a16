pub mod events;
pub mod generation;
pub mod mockup;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    fn default_timeout_secs() -> u64 {
        120
    }

    fn default_log_filter() -> String {
        "info".to_string()
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelProvider {
        pub gemini_model: String, // e.g., "gemini-2.5-flash-image"
        pub gemini_auth: ProviderAuth,
        /// HTTP timeout for a single generation call
        #[serde(default = "default_timeout_secs")]
        pub request_timeout_secs: u64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct StudioSettings {
        pub model: ModelProvider,
        /// Where mockups.db lives; platform data dir when unset
        #[serde(default)]
        pub data_dir: Option<PathBuf>,
        #[serde(default = "default_log_filter")]
        pub log_filter: String,
    }

    impl Default for ModelProvider {
        fn default() -> Self {
            Self {
                gemini_model: "gemini-2.5-flash-image".into(),
                gemini_auth: ProviderAuth::default(),
                request_timeout_secs: default_timeout_secs(),
            }
        }
    }

    impl Default for StudioSettings {
        fn default() -> Self {
            Self {
                model: ModelProvider::default(),
                data_dir: None,
                log_filter: default_log_filter(),
            }
        }
    }

}
