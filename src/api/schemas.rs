use serde::Serialize;
use uuid::Uuid;

/// The wire reply for a send call. Once decided it carries exactly one
/// `results` entry, and exactly one of `success`/`failure` is 1.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub multicast_id: String,
    pub success: u8,
    pub failure: u8,
    pub canonical_ids: u8,
    pub results: Vec<String>,
}

impl SendResponse {
    /// A fresh, undecided reply with a new multicast id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multicast_id: Uuid::new_v4().simple().to_string(),
            success: 0,
            failure: 0,
            canonical_ids: 0,
            results: Vec::new(),
        }
    }

    pub fn accept(&mut self, message_id: &str) {
        self.success = 1;
        self.results = vec![format!("message_id:{message_id}")];
    }

    pub fn reject(&mut self, code: &str) {
        self.failure = 1;
        self.results = vec![format!("error:{code}")];
    }
}

impl Default for SendResponse {
    fn default() -> Self {
        Self::new()
    }
}
