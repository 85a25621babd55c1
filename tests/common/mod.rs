#![allow(dead_code)]

use std::path::PathBuf;

use jobbot::config::AppConfig;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

pub fn sample_dataset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/profiles.csv")
}

/// 指向 mock 服务的配置；`with_key` 为假时不写密钥文件
pub fn config_for(server: &MockServer, dir: &TempDir, with_key: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.llm.base_url = Some(server.uri());
    config.data.dataset_path = sample_dataset();
    config.data.credential_path = dir.path().join("key.txt");
    if with_key {
        std::fs::write(&config.data.credential_path, "test-key\n").unwrap();
    }
    config
}

pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

/// 问题文本出现在提示词中时返回给定表达式
pub async fn translate_to(server: &MockServer, question: &str, expression: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains(format!("Query: {question}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(expression)))
        .mount(server)
        .await;
}
