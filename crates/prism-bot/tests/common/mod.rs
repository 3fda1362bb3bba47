//! Common test utilities for integration tests.

#![allow(dead_code)]

use chrono::Utc;
use discord_client::{BotMessage, DiscordClient};
use prism_bot::modules::standard_modules;
use prism_bot::{DiscordTransport, IgnoredUsers, ModuleRegistry, Router};
use prism_store::{Database, IgnoredUserRepository, QuoteRepository, SqliteDatabase};
use secrecy::SecretString;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BOT_ID: &str = "999";
pub const GUILD_ID: &str = "1";
pub const CHANNEL_ID: &str = "100";
pub const COMMANDER_ROLE: &str = "Prism Commander";

/// A router wired to a mock Discord API and an in-memory database.
pub struct TestBot {
    pub discord: MockServer,
    pub db: Arc<dyn Database>,
    pub ignored: IgnoredUsers,
    pub router: Router,
}

impl TestBot {
    pub async fn start() -> Self {
        let discord = MockServer::start().await;
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let ignored = IgnoredUsers::load(IgnoredUserRepository::new(db.clone()))
            .await
            .unwrap();

        let client = test_discord_client(&discord);
        let registry =
            ModuleRegistry::new(standard_modules(db.clone(), ignored.clone(), COMMANDER_ROLE))
                .unwrap();
        let router = Router::new(
            registry,
            ignored.clone(),
            Arc::new(DiscordTransport::new(client)),
            BOT_ID,
        );

        Self {
            discord,
            db,
            ignored,
            router,
        }
    }

    pub fn quotes(&self) -> QuoteRepository {
        QuoteRepository::new(self.db.clone())
    }

    /// Mock the member and role lookups for `user_id`.
    pub async fn mock_member_roles(&self, user_id: &str, role_names: &[&str]) {
        let roles: Vec<serde_json::Value> = role_names
            .iter()
            .enumerate()
            .map(|(i, name)| serde_json::json!({ "id": format!("r{}", i), "name": name }))
            .collect();
        let role_ids: Vec<String> = (0..role_names.len()).map(|i| format!("r{}", i)).collect();

        Mock::given(method("GET"))
            .and(path(format!("/guilds/{}/members/{}", GUILD_ID, user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user": { "id": user_id, "username": format!("user{}", user_id) },
                "roles": role_ids
            })))
            .mount(&self.discord)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/guilds/{}/roles", GUILD_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(roles))
            .mount(&self.discord)
            .await;
    }

    /// Requests received by the mock Discord API so far.
    pub async fn request_count(&self) -> usize {
        self.discord
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

/// Create a Discord client configured for a mock server.
pub fn test_discord_client(mock_server: &MockServer) -> DiscordClient {
    DiscordClient::new(mock_server.uri(), &SecretString::new("test-token".into())).unwrap()
}

/// An inbound guild message.
pub fn incoming(author_id: &str, text: &str) -> BotMessage {
    BotMessage {
        message_id: "500".into(),
        channel_id: CHANNEL_ID.into(),
        guild_id: Some(GUILD_ID.into()),
        author_id: author_id.into(),
        author_is_bot: false,
        is_self: author_id == BOT_ID,
        text: text.into(),
        timestamp: Utc::now(),
    }
}

/// A channel message as the REST API returns it.
pub fn message_json(id: &str, author_id: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "channel_id": CHANNEL_ID,
        "author": {
            "id": author_id,
            "username": "alice",
            "discriminator": "0",
            "avatar": "abc123"
        },
        "content": content,
        "timestamp": "2024-03-01T12:00:00.000000+00:00",
        "attachments": []
    })
}
