mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use study_helper_api::services::generation::REFUSAL_PHRASE;
use study_helper_api::services::QuizQuestion;

const NOTES: &str = "Photosynthesis is how plants turn light into chemical energy.";

#[tokio::test]
async fn summarize_caches_first_result() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "bio.txt", NOTES).await?;
    let uri = format!("/api/materials/{}/summarize", id);

    let (status, first) = app.send(Method::POST, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["type"], "summary");
    assert_eq!(first["material"], id.as_str());
    assert!(first["content"].as_str().unwrap().starts_with("Summary:"));

    let (status, second) = app.send(Method::POST, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["_id"], first["_id"]);
    assert_eq!(second["content"], first["content"]);

    assert_eq!(app.generator.calls(), 1);
    assert_eq!(app.repo.content_count(Uuid::parse_str(&id)?).await, 1);
    Ok(())
}

#[tokio::test]
async fn quiz_is_stored_as_json_text() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "bio.txt", NOTES).await?;
    let uri = format!("/api/materials/{}/generate-quiz", id);

    let (status, body) = app.send(Method::POST, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["type"], "questions");

    let quiz: Vec<QuizQuestion> = serde_json::from_str(body["content"].as_str().unwrap())?;
    assert_eq!(quiz.len(), common::QUIZ_QUESTIONS);
    for question in &quiz {
        assert_eq!(question.options.len(), 4);
        assert!(question.options.contains(&question.correct_answer));
    }

    let (status, again) = app.send(Method::POST, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["_id"], body["_id"]);
    Ok(())
}

#[tokio::test]
async fn malformed_quiz_is_rejected_and_not_stored() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "bio.txt", NOTES).await?;
    app.generator
        .reply_to_quiz_with(&common::valid_quiz(common::QUIZ_QUESTIONS - 1).to_string());

    let (status, body) = app
        .send(Method::POST, &format!("/api/materials/{}/generate-quiz", id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to generate quiz.");
    assert_eq!(body["error"], "AI service returned an invalid format for the quiz.");
    assert_eq!(app.repo.content_count(Uuid::parse_str(&id)?).await, 0);
    Ok(())
}

#[tokio::test]
async fn whitespace_only_file_is_empty_content() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "blank.txt", "  \n\t  \n").await?;

    let (status, body) = app
        .send(Method::POST, &format!("/api/materials/{}/summarize", id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Could not process the uploaded file.");
    assert!(body["error"].as_str().unwrap().contains("No text content found"));
    assert_eq!(app.generator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn non_owner_cannot_trigger_generation() -> Result<()> {
    let app = common::spawn_app();
    let (_, owner) = app.provision("owner").await?;
    let (_, stranger) = app.provision("stranger").await?;
    let id = app.txt_material(&owner, "bio.txt", NOTES).await?;

    for path in ["summarize", "generate-quiz"] {
        let (status, _) = app
            .send(Method::POST, &format!("/api/materials/{}/{}", id, path), Some(&stranger), None)
            .await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/chat/{}", id),
            Some(&stranger),
            Some(json!({ "question": "What is photosynthesis?" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.generator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn content_lists_generated_artifacts() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "bio.txt", NOTES).await?;

    let (_, body) = app
        .send(Method::GET, &format!("/api/materials/{}/content", id), Some(&token), None)
        .await?;
    assert_eq!(body, json!([]));

    app.send(Method::POST, &format!("/api/materials/{}/summarize", id), Some(&token), None)
        .await?;
    app.send(Method::POST, &format!("/api/materials/{}/generate-quiz", id), Some(&token), None)
        .await?;

    let (status, body) = app
        .send(Method::GET, &format!("/api/materials/{}/content", id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let mut kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["type"].as_str().unwrap())
        .collect();
    kinds.sort();
    assert_eq!(kinds, vec!["questions", "summary"]);
    Ok(())
}

#[tokio::test]
async fn chat_answers_from_context_with_history() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "bio.txt", NOTES).await?;
    let uri = format!("/api/chat/{}", id);

    let (status, body) = app
        .send(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({
                "question": "What is photosynthesis?",
                "history": [
                    { "role": "user", "parts": [{ "text": "Hello" }] },
                    { "role": "model", "parts": [{ "text": "Hi, ask me about the notes." }] }
                ]
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Photosynthesis turns light into chemical energy.");

    let (_, body) = app
        .send(Method::POST, &uri, Some(&token), Some(json!({ "question": "Who won the 1998 World Cup?" })))
        .await?;
    assert_eq!(body["answer"], REFUSAL_PHRASE);

    assert_eq!(app.generator.calls(), 2);
    assert_eq!(app.repo.content_count(Uuid::parse_str(&id)?).await, 0);
    Ok(())
}

#[tokio::test]
async fn chat_requires_question() -> Result<()> {
    let app = common::spawn_app();
    let (_, token) = app.provision("owner").await?;
    let id = app.txt_material(&token, "bio.txt", NOTES).await?;

    let (status, body) = app
        .send(Method::POST, &format!("/api/chat/{}", id), Some(&token), Some(json!({})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A question is required.");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/chat/{}", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "question": "Anything?" })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
