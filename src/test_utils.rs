//! Shared fakes and proptest strategies for unit tests.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use thiserror::Error as ThisError;

use crate::context::Cancellation;
use crate::db::Driver;
use crate::value::{ExecResult, Rows, Value};

/// One call observed by [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub operation: &'static str,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, ThisError)]
#[error("recording driver: {0}")]
pub(crate) struct FakeError(pub String);

/// Driver fake that records every call it receives.
///
/// Clones share the same call log, so a test can keep one clone and move
/// the other into a `Db`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingDriver {
    calls: Arc<Mutex<Vec<Call>>>,
    failure: Option<String>,
}

impl RecordingDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(
        &self,
        operation: &'static str,
        scope: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<(), FakeError> {
        self.calls.lock().unwrap().push(Call {
            operation,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if scope.is_done() {
            return Err(FakeError("cancelled".to_string()));
        }
        match &self.failure {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(()),
        }
    }
}

impl Driver for RecordingDriver {
    const NAME: &'static str = "recording";
    type Error = FakeError;

    fn query(&self, scope: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows, FakeError> {
        self.record("query", scope, sql, params)?;
        Ok(Rows::default())
    }

    fn execute(
        &self,
        scope: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult, FakeError> {
        self.record("execute", scope, sql, params)?;
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }
}

/// Generates capability names, including ones applications rarely use.
pub(crate) fn arb_capability() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("read".to_string()),
        Just("write".to_string()),
        Just("delete".to_string()),
        prop::string::string_regex("[a-z_]{1,12}").unwrap(),
    ]
}

/// Generates arbitrary bound parameters.
pub(crate) fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        any::<String>().prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Blob),
    ]
}
