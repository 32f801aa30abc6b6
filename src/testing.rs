use std::{path::PathBuf, sync::Mutex};

use crate::assets::{AssetResolver, attachment_name};

pub fn get_test_file_path<P: AsRef<str>>(name: P) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name.as_ref())
}

pub fn get_test_file_contents<P: AsRef<str>>(name: P) -> String {
    let path = get_test_file_path(name);
    std::fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read test file"))
}

/// Resolves every image to its attachment name without touching the network, recording each request.
#[derive(Default)]
pub struct RecordingResolver {
    calls: Mutex<Vec<String>>,
}

impl RecordingResolver {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AssetResolver for RecordingResolver {
    async fn resolve(&self, src: &str) -> String {
        self.calls.lock().unwrap().push(src.to_string());
        attachment_name(src).to_string()
    }
}
