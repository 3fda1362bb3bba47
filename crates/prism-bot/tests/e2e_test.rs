//! End-to-end integration tests for the Prism bot.

mod common;

use common::{incoming, message_json, TestBot, CHANNEL_ID, COMMANDER_ROLE, GUILD_ID};
use prism_bot::router::REJECTED_CALL;
use prism_bot::{Dispatch, Module};
use prism_store::NewQuote;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn expect_reply(bot: &TestBot, text: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(body_json(serde_json::json!({ "content": text })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("900", "999", text)))
        .expect(1)
        .mount(&bot.discord)
        .await;
}

#[tokio::test]
async fn test_plain_text_is_silent() {
    let bot = TestBot::start().await;

    let outcome = bot.router.handle(&incoming("7", "just chatting")).await;

    assert_eq!(outcome, Dispatch::NotCommand);
    assert_eq!(bot.request_count().await, 0);
}

#[tokio::test]
async fn test_random_on_empty_guild() {
    let bot = TestBot::start().await;
    expect_reply(&bot, "No quotes found for this server!").await;

    let outcome = bot.router.handle(&incoming("7", "!random")).await;

    assert_eq!(outcome, Dispatch::Executed("random".into()));
}

#[tokio::test]
async fn test_savequote_stores_previous_message() {
    let bot = TestBot::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(query_param("before", "500"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([message_json("499", "7", "a fine quote")])),
        )
        .mount(&bot.discord)
        .await;
    expect_reply(&bot, "Quote added!").await;

    bot.router.handle(&incoming("8", "!savequote")).await;

    let quotes = bot.quotes().for_guild(GUILD_ID, None).await.unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].message_id, "499");
    assert_eq!(quotes[0].author_id, "7");
    assert_eq!(quotes[0].channel_id, CHANNEL_ID);
}

#[tokio::test]
async fn test_savequote_duplicate_keeps_single_row() {
    let bot = TestBot::start().await;
    bot.quotes()
        .insert(&NewQuote {
            guild_id: GUILD_ID.into(),
            author_id: "7".into(),
            channel_id: CHANNEL_ID.into(),
            message_id: "499".into(),
        })
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages/499", CHANNEL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("499", "7", "again")))
        .mount(&bot.discord)
        .await;
    expect_reply(
        &bot,
        "Invalid message to quote. It's either from this bot or a duplicate quote.",
    )
    .await;

    bot.router.handle(&incoming("8", "!sq 499")).await;

    assert_eq!(bot.quotes().for_guild(GUILD_ID, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_random_quote_is_sent_as_embed() {
    let bot = TestBot::start().await;
    bot.quotes()
        .insert(&NewQuote {
            guild_id: GUILD_ID.into(),
            author_id: "7".into(),
            channel_id: CHANNEL_ID.into(),
            message_id: "499".into(),
        })
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages/499", CHANNEL_ID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(message_json("499", "7", "quotable")),
        )
        .mount(&bot.discord)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{}/members/7", GUILD_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": { "id": "7", "username": "alice" },
            "nick": "Ally",
            "roles": []
        })))
        .mount(&bot.discord)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{
                "description": "quotable",
                "color": 65280,
                "author": {
                    "name": "Ally",
                    "icon_url": "https://cdn.discordapp.com/avatars/7/abc123.png"
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("900", "999", "")))
        .expect(1)
        .mount(&bot.discord)
        .await;

    let outcome = bot.router.handle(&incoming("8", "!r")).await;
    assert_eq!(outcome, Dispatch::Executed("r".into()));
}

#[tokio::test]
async fn test_help_quote_matches_rendered_help() {
    let bot = TestBot::start().await;

    let expected = bot
        .router
        .registry()
        .module_for("quote")
        .and_then(|module: &Module| module.get_help("quote").ok())
        .unwrap();
    expect_reply(&bot, &expected).await;

    let outcome = bot.router.handle(&incoming("7", "!help quote")).await;
    assert_eq!(outcome, Dispatch::Help);
}

#[tokio::test]
async fn test_gated_command_without_role_is_denied() {
    let bot = TestBot::start().await;
    bot.mock_member_roles("7", &["Member"]).await;
    expect_reply(&bot, REJECTED_CALL).await;

    let outcome = bot.router.handle(&incoming("7", "!aiu 42")).await;

    assert_eq!(outcome, Dispatch::Rejected("aiu".into()));
    assert!(!bot.ignored.contains("42"));
}

#[tokio::test]
async fn test_missing_argument_has_no_side_effect() {
    let bot = TestBot::start().await;
    bot.mock_member_roles("7", &[COMMANDER_ROLE]).await;
    expect_reply(&bot, REJECTED_CALL).await;

    let outcome = bot.router.handle(&incoming("7", "!addtopic rust")).await;

    assert_eq!(outcome, Dispatch::Rejected("addtopic".into()));
}

#[tokio::test]
async fn test_commander_ignores_and_restores_user() {
    let bot = TestBot::start().await;
    bot.mock_member_roles("7", &["Member", COMMANDER_ROLE]).await;
    expect_reply(&bot, "User added to ignore list.").await;

    bot.router.handle(&incoming("7", "!addignoreduser 8")).await;
    assert!(bot.ignored.contains("8"));

    let before = bot.request_count().await;
    let outcome = bot.router.handle(&incoming("8", "!random")).await;

    assert_eq!(outcome, Dispatch::Ignored);
    assert_eq!(bot.request_count().await, before);

    expect_reply(&bot, "User removed from ignore list.").await;
    bot.router.handle(&incoming("7", "!removeignoreduser 8")).await;
    assert!(!bot.ignored.contains("8"));

    expect_reply(&bot, "No quotes found for this server!").await;
    let outcome = bot.router.handle(&incoming("8", "!random")).await;

    assert_eq!(outcome, Dispatch::Executed("random".into()));
}

#[tokio::test]
async fn test_power() {
    let bot = TestBot::start().await;
    expect_reply(
        &bot,
        "https://giphy.com/gifs/power-highqualitygifs-unlimited-hokMyu1PAKfJK",
    )
    .await;

    let outcome = bot.router.handle(&incoming("7", "!p")).await;
    assert_eq!(outcome, Dispatch::Executed("p".into()));
}

#[tokio::test]
async fn test_help_lists_commands_for_plain_member() {
    let bot = TestBot::start().await;
    bot.mock_member_roles("7", &["Member"]).await;
    expect_reply(
        &bot,
        "Available commands: savequote, quote, random, power",
    )
    .await;

    let outcome = bot.router.handle(&incoming("7", "!h")).await;
    assert_eq!(outcome, Dispatch::Help);
}

#[tokio::test]
async fn test_receiver_feeds_router() {
    use discord_client::MessageReceiver;
    use tokio_stream::StreamExt;

    let bot = TestBot::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/channels/{}", CHANNEL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": CHANNEL_ID,
            "type": 0,
            "guild_id": GUILD_ID,
            "name": "general"
        })))
        .mount(&bot.discord)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(query_param("after", "500"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([message_json("501", "7", "!random")])),
        )
        .up_to_n_times(1)
        .mount(&bot.discord)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages", CHANNEL_ID)))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([message_json("500", "7", "old")])),
        )
        .mount(&bot.discord)
        .await;
    expect_reply(&bot, "No quotes found for this server!").await;

    let receiver = MessageReceiver::new(
        common::test_discord_client(&bot.discord),
        vec![CHANNEL_ID.into()],
        common::BOT_ID,
        Duration::from_millis(10),
    );
    let mut stream = Box::pin(receiver.stream());

    let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.text, "!random");
    assert_eq!(message.guild_id.as_deref(), Some(GUILD_ID));

    let outcome = bot.router.handle(&message).await;
    assert_eq!(outcome, Dispatch::Executed("random".into()));
}
