//! Integration tests against the hosted APIs.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use gamechat::{
        BackendKind, CompletionBackend, Error, GenerationParams, Message, Personality,
    };

    fn live_backend(kind: BackendKind) -> Option<Box<dyn CompletionBackend>> {
        let var = kind.credential_name();
        let api_key = std::env::var(var).ok().filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            eprintln!("Skipping test: {var} not set");
            return None;
        }
        Some(
            kind.connect(api_key, None, None)
                .expect("Failed to create backend"),
        )
    }

    async fn collect_reply(kind: BackendKind) -> Option<Result<String, Error>> {
        let backend = live_backend(kind)?;
        let transcript = vec![
            Message::system(Personality::Professional.prompt()),
            Message::user("Name one video game in at most three words."),
        ];
        let params = GenerationParams::new(kind.default_model()).with_max_tokens(32);

        let mut stream = match backend.stream_completion(&transcript, &params).await {
            Ok(stream) => stream,
            Err(err) => return Some(Err(err)),
        };
        let mut reply = String::new();
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(text) => reply.push_str(&text),
                Err(err) => return Some(Err(err)),
            }
        }
        Some(Ok(reply))
    }

    #[tokio::test]
    async fn test_groq_streaming_reply() {
        let Some(result) = collect_reply(BackendKind::Groq).await else {
            return;
        };
        let reply = result.expect("Stream should succeed with valid API key");
        assert!(!reply.trim().is_empty());
    }

    #[tokio::test]
    async fn test_gemini_streaming_reply() {
        let Some(result) = collect_reply(BackendKind::Gemini).await else {
            return;
        };
        let reply = result.expect("Stream should succeed with valid API key");
        assert!(!reply.trim().is_empty());
    }

    #[tokio::test]
    async fn test_groq_rejects_bad_key() {
        if live_backend(BackendKind::Groq).is_none() {
            return;
        }
        let backend = BackendKind::Groq
            .connect(Some("gsk_not_a_real_key".to_string()), None, None)
            .expect("Failed to create backend");
        let params = GenerationParams::new(BackendKind::Groq.default_model());
        let err = match backend
            .stream_completion(&[Message::user("hi")], &params)
            .await
        {
            Ok(_) => panic!("Request should fail with an invalid key"),
            Err(err) => err,
        };
        assert!(err.is_authentication());
    }
}
