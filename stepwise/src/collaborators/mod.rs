//! Narrow interfaces to the backends that workflow steps wrap.
//!
//! The executor never calls these itself; callers build steps around them.
//! In-memory implementations are provided for tests and local runs.

mod auth;
mod email;
mod error;
mod objects;
mod records;

pub use auth::UserContext;
pub use email::{EmailDispatcher, MessageId, RecordingEmailDispatcher, SentEmail};
pub use error::CollaboratorError;
pub use objects::{InMemoryObjectStore, ObjectEntry, ObjectStore};
pub use records::{InMemoryRecordStore, KeyExpression, Record, RecordKey, RecordStore};

#[cfg(test)]
pub use email::MockEmailDispatcher;
#[cfg(test)]
pub use objects::MockObjectStore;
#[cfg(test)]
pub use records::MockRecordStore;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Failure;
    use crate::executor::Executor;
    use crate::steps::Step;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_step_wraps_record_store() {
        let mut store = MockRecordStore::new();
        store
            .expect_put()
            .withf(|record| record.key.partition == "client#c-1")
            .times(1)
            .returning(|record| Ok(record));
        let store: Arc<dyn RecordStore> = Arc::new(store);

        let put_client = Step::<CollaboratorError>::new("put_client", move |_ctx| async move {
            let record = Record::new(RecordKey::new("client#c-1", "profile"))
                .with_attribute("name", json!("Acme"));
            let stored = store.put(record).await?;
            Ok(json!(stored.key.sort))
        });

        let mut executor = Executor::begin(Some(put_client));
        let report = executor.run().await.unwrap();

        assert!(report.is_success());
        assert_eq!(executor.context().output("put_client"), Some(json!("profile")));
    }

    #[tokio::test]
    async fn test_collaborator_error_reaches_failure_handler() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_move_prefix()
            .returning(|from, _| Err(CollaboratorError::NotFound(from.to_string())));
        let objects: Arc<dyn ObjectStore> = Arc::new(objects);

        let mut email = MockEmailDispatcher::new();
        email.expect_send_templated().never();
        let email: Arc<dyn EmailDispatcher> = Arc::new(email);

        let seen = Arc::new(Mutex::new(None));
        let mut executor = Executor::new();
        let sink = Arc::clone(&seen);
        executor
            .next(Step::<CollaboratorError>::new("move_docs", move |_ctx| async move {
                objects.move_prefix("pending/c-1/", "clients/c-1/").await?;
                Ok(json!(null))
            }))
            .unwrap()
            .next(Step::<CollaboratorError>::new("notify", move |_ctx| async move {
                let id = email
                    .send_templated("ops@example.com", "docs_moved", &json!({}))
                    .await?;
                Ok(json!(id.to_string()))
            }))
            .unwrap()
            .on_failure(move |failure: Failure<CollaboratorError>| {
                *sink.lock() = Some(failure);
            })
            .unwrap();

        let report = executor.run().await.unwrap();

        assert!(!report.is_success());
        let failure = seen.lock().take().unwrap();
        assert_eq!(failure.step_name(), Some("move_docs"));
        assert!(matches!(
            failure.into_step_error(),
            Some(CollaboratorError::NotFound(ref prefix)) if prefix == "pending/c-1/"
        ));
    }
}
