//! Scriptable in-memory actuator.

use crate::transport::{Actuator, TransportError};
use crate::types::ServoAngle;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::time::Duration;

/// An actuator that records every angle it is sent.
///
/// Useful for exercising [`Controller`](crate::Controller) and the loops
/// without an actuator board on the network.
///
/// # Example
///
/// ```
/// use tilt_servo::{Actuator, MockActuator, ServoAngle};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let mock = MockActuator::new();
/// rt.block_on(mock.send(ServoAngle::new(30).unwrap())).unwrap();
/// assert_eq!(mock.sent(), vec![ServoAngle::new(30).unwrap()]);
/// ```
pub struct MockActuator {
    sent: Mutex<Vec<ServoAngle>>,
    position: Mutex<ServoAngle>,
    failure: Mutex<Option<TransportError>>,
    latency: Option<Duration>,
}

impl MockActuator {
    pub fn new() -> Self {
        MockActuator {
            sent: Mutex::new(Vec::new()),
            position: Mutex::new(ServoAngle::NEUTRAL),
            failure: Mutex::new(None),
            latency: None,
        }
    }

    /// Every request takes `latency` before it completes.
    pub fn with_latency(latency: Duration) -> Self {
        MockActuator {
            latency: Some(latency),
            ..Self::new()
        }
    }

    /// Make every following request fail with `error`.
    pub fn fail_with(&self, error: TransportError) {
        *self.failure.lock() = Some(error);
    }

    pub fn succeed(&self) {
        *self.failure.lock() = None;
    }

    pub fn sent(&self) -> Vec<ServoAngle> {
        self.sent.lock().clone()
    }

    pub fn set_position(&self, angle: ServoAngle) {
        *self.position.lock() = angle;
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(&self) -> Result<(), TransportError> {
        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn record(&self, angle: ServoAngle) -> Result<(), TransportError> {
        self.wait().await;
        self.check()?;
        self.sent.lock().push(angle);
        *self.position.lock() = angle;
        Ok(())
    }

    async fn report(&self) -> Result<ServoAngle, TransportError> {
        self.wait().await;
        self.check()?;
        Ok(*self.position.lock())
    }
}

impl Default for MockActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for MockActuator {
    fn send(&self, angle: ServoAngle) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(self.record(angle))
    }

    fn read(&self) -> BoxFuture<'_, Result<ServoAngle, TransportError>> {
        Box::pin(self.report())
    }
}
