//! Serves recorded interactions back in order.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use super::format::{Cassette, Interaction};
use crate::error::{ErrorKind, GenerationError, GenerationResult};

/// Queues interactions per `port::method` and hands them out sequentially.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<(String, String), VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Index a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Take the next interaction recorded for `port::method`.
    ///
    /// # Errors
    ///
    /// Returns a config error when the cassette holds no further interaction
    /// for that pair.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> GenerationResult<Interaction> {
        let key = (port.to_string(), method.to_string());
        if let Some(interaction) = self.queues.get_mut(&key).and_then(VecDeque::pop_front) {
            return Ok(interaction);
        }
        let mut available: Vec<String> = self
            .queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|((p, m), q)| format!("{p}::{m} ({})", q.len()))
            .collect();
        available.sort();
        Err(GenerationError::Config(format!(
            "Cassette exhausted: nothing left for {port}::{method}. Remaining: [{}]",
            available.join(", ")
        )))
    }

    /// Take the next interaction and decode its recorded result.
    ///
    /// # Errors
    ///
    /// Returns the recorded failure, or a config error when the cassette is
    /// exhausted or the entry is unreadable.
    pub fn next_result(&mut self, port: &str, method: &str) -> GenerationResult<String> {
        let interaction = self.next_interaction(port, method)?;
        decode_output(&interaction.output)
    }
}

fn decode_output(output: &Value) -> GenerationResult<String> {
    if let Some(err) = output.get("Err") {
        let kind = err
            .get("kind")
            .cloned()
            .and_then(|k| serde_json::from_value::<ErrorKind>(k).ok())
            .unwrap_or(ErrorKind::ApiError);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| err.as_str())
            .unwrap_or("replayed error")
            .to_string();
        return Err(GenerationError::Replayed { kind, message });
    }
    output
        .get("Ok")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GenerationError::Config(format!("Unreadable cassette output: {output}")))
}
