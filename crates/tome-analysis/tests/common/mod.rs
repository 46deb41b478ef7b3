#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use tome_core::{CallError, CallParams, ModelCaller};
use tome_telemetry::{Encoding, TokenEstimator};

pub fn words() -> TokenEstimator {
    TokenEstimator::for_encoding(Encoding::Words).unwrap()
}

/// Records every (system, user) pair; chunk calls get "chunk gist", the final
/// analysis call gets "verdict"
#[derive(Default)]
pub struct RecordingCaller {
    pub seen: Mutex<Vec<(String, String)>>,
}

impl RecordingCaller {
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_user_prompt(&self) -> String {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|(_, user)| user.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelCaller for RecordingCaller {
    fn name(&self) -> &str {
        "recording"
    }

    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CallParams,
    ) -> Result<String, CallError> {
        self.seen
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        if params.max_output_tokens.is_some() {
            Ok("chunk gist".to_string())
        } else {
            Ok("verdict".to_string())
        }
    }
}
