use crate::{
    http_transport::{
        ExportRequest,
        Transport,
    },
    ExportError,
};
use std::sync::{
    Arc,
    Mutex,
};

/// Records every request; optionally answers with an HTTP error status.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTransport {
    requests: Arc<Mutex<Vec<ExportRequest>>>,
    fail_with: Option<u16>,
}

impl RecordingTransport {
    pub(crate) fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Default::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<ExportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: &ExportRequest) -> Result<(), ExportError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.fail_with {
            Some(status) => Err(ExportError::status(status, "recorded failure")),
            None => Ok(()),
        }
    }
}
