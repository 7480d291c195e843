use std::sync::Arc;

use docchat_model::MockChatModel;
use docchat_rag::{
    ChatSession, Document, Embedder, HashingEmbedder, RagConfig, RagError, SessionManager,
};

fn manager(model: Arc<MockChatModel>) -> SessionManager {
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(128).unwrap());
    SessionManager::new(move |id| {
        ChatSession::builder()
            .id(id)
            .config(RagConfig::builder().chunk_size(4).top_k(1).build()?)
            .embedder(embedder.clone())
            .model(model.clone())
            .build()
    })
}

#[tokio::test]
async fn sessions_are_isolated() {
    let manager = manager(Arc::new(MockChatModel::replying("ok")));
    let first = manager.create_session().await.unwrap();
    let second = manager.create_session().await.unwrap();
    assert_ne!(first, second);
    assert_eq!(manager.len().await, 2);

    manager.upload(&first, &Document::new("The sky is blue.")).await.unwrap();
    manager.ask(&first, "sky?").await.unwrap();

    assert_eq!(manager.history(&first).await.unwrap().len(), 3);
    assert_eq!(manager.history(&second).await.unwrap().len(), 1);
    assert!(matches!(manager.ask(&second, "sky?").await, Err(RagError::NotReady)));

    let handle = manager.get(&first).await.unwrap();
    assert_eq!(handle.lock().await.id(), first);
}

#[tokio::test]
async fn unknown_session_is_reported() {
    let manager = manager(Arc::new(MockChatModel::replying("ok")));

    let err = manager.ask("missing", "hello?").await.unwrap_err();
    assert!(matches!(err, RagError::SessionNotFound(ref id) if id == "missing"));
    assert!(manager.history("missing").await.is_err());
}

#[tokio::test]
async fn removed_session_is_gone() {
    let manager = manager(Arc::new(MockChatModel::replying("ok")));
    let id = manager.create_session().await.unwrap();

    assert!(manager.remove_session(&id).await);
    assert!(!manager.remove_session(&id).await);
    assert!(manager.is_empty().await);
    assert!(matches!(manager.get(&id).await, Err(RagError::SessionNotFound(_))));
}

#[tokio::test]
async fn concurrent_questions_to_one_session_are_serialized() {
    let model = Arc::new(MockChatModel::replying("ok"));
    let manager = manager(model.clone());
    let id = manager.create_session().await.unwrap();
    manager.upload(&id, &Document::new("The sky is blue. Grass is green.")).await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let manager = manager.clone();
            let id = id.clone();
            tokio::spawn(async move { manager.ask(&id, &format!("question {i}?")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Each turn saw the full history of every turn before it.
    let mut sizes: Vec<usize> =
        model.requests().await.iter().map(|r| r.messages.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 4, 6, 8]);
    assert_eq!(manager.history(&id).await.unwrap().len(), 9);
}
