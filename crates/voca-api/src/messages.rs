use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, info};

use voca_db::Database;
use voca_tokens::TokenChain;
use voca_types::api::{
    AnnotatedMessage, LatestMessageQuery, LatestMessageResponse, SendMessageRequest,
};
use voca_types::events::GatewayEvent;
use voca_types::models::Message;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{bearer_token, group_token};

/// Authorizes message reads and writes from presented tokens.
///
/// Every call starts unauthenticated and re-derives identity and group from
/// the tokens it is handed; nothing carries over between calls.
pub struct MessageGateway<'a> {
    db: &'a Database,
    tokens: &'a TokenChain,
}

impl<'a> MessageGateway<'a> {
    pub fn new(db: &'a Database, tokens: &'a TokenChain) -> Self {
        Self { db, tokens }
    }

    fn resolve_user(&self, user_token: Option<&str>) -> Result<i64, ApiError> {
        user_token
            .and_then(|t| self.tokens.resolve_user_id(t))
            .ok_or(ApiError::Unauthorized)
    }

    /// Store a message. Both tokens must be present and resolve; a message
    /// without a valid group scope is never written.
    pub fn send(
        &self,
        user_token: Option<&str>,
        group_token: Option<&str>,
        text: &str,
    ) -> Result<Message, ApiError> {
        let user_id = user_token.and_then(|t| self.tokens.resolve_user_id(t));
        let group_id = group_token.and_then(|t| self.tokens.resolve_group_id(t));
        let (Some(user_id), Some(group_id)) = (user_id, group_id) else {
            debug!("Message send rejected: token did not resolve");
            return Err(ApiError::Unauthorized);
        };

        let row = self.db.insert_message(user_id, &group_id, text)?;
        Ok(row.into())
    }

    /// Most recent message the caller wrote in `group_id`. No group means
    /// there is nothing to look in, which is not an error.
    pub fn latest_for_user_in_group(
        &self,
        user_token: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Option<Message>, ApiError> {
        let user_id = self.resolve_user(user_token)?;
        let Some(group_id) = group_id else {
            return Ok(None);
        };

        Ok(self.db.latest_message(user_id, group_id)?.map(Message::from))
    }

    /// Every message, oldest first, annotated for the caller. A group token
    /// that fails to resolve only clears the `is_current_group` flags.
    pub fn list_all(
        &self,
        user_token: Option<&str>,
        group_token: Option<&str>,
    ) -> Result<Vec<AnnotatedMessage>, ApiError> {
        let user_id = self.resolve_user(user_token)?;
        let group_id = group_token.and_then(|t| self.tokens.resolve_group_id(t));

        let messages = self
            .db
            .list_messages()?
            .into_iter()
            .map(|row| {
                let message = Message::from(row);
                AnnotatedMessage {
                    is_current_group: group_id.as_deref() == Some(message.group_id.as_str()),
                    is_current_user: message.user_id == user_id,
                    message,
                }
            })
            .collect();

        Ok(messages)
    }
}

/// POST /messages/send
pub async fn send_message(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |s| {
        MessageGateway::new(&s.db, &s.tokens).send(
            req.user_token.as_deref(),
            req.group_token.as_deref(),
            &req.text,
        )
    })
    .await?;

    info!("User {} posted message {} to {}", message.user_id, message.id, message.group_id);

    state.dispatcher.broadcast(GatewayEvent::MessageCreate {
        id: message.id,
        user_id: message.user_id,
        group_id: message.group_id.clone(),
        text: message.text.clone(),
        timestamp: message.created_at,
    });

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages: the caller's latest message in the group named by
/// `?group_id=` or, failing that, by the `X-Group-Token` header.
pub async fn latest_message(
    State(state): State<AppState>,
    Query(query): Query<LatestMessageQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_token = bearer_token(&headers).map(str::to_string);
    let group_id = query
        .group_id
        .filter(|g| !g.is_empty())
        .or_else(|| group_token(&headers).and_then(|t| state.tokens.resolve_group_id(t)));

    let message = blocking(&state, move |s| {
        MessageGateway::new(&s.db, &s.tokens)
            .latest_for_user_in_group(user_token.as_deref(), group_id.as_deref())
    })
    .await?;

    Ok(Json(LatestMessageResponse { message }))
}

/// GET /messages/all
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_token = bearer_token(&headers).map(str::to_string);
    let group = group_token(&headers).map(str::to_string);

    let messages = blocking(&state, move |s| {
        MessageGateway::new(&s.db, &s.tokens).list_all(user_token.as_deref(), group.as_deref())
    })
    .await?;

    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use voca_db::models::NewUser;
    use voca_tokens::SigningKeys;

    use super::*;

    struct Fixture {
        db: Database,
        tokens: TokenChain,
    }

    impl Fixture {
        fn new() -> Self {
            let keys = SigningKeys::new("login-secret", "user-secret", "group-secret").unwrap();
            Self {
                db: Database::open_in_memory().unwrap(),
                tokens: TokenChain::new(&keys),
            }
        }

        fn gateway(&self) -> MessageGateway<'_> {
            MessageGateway::new(&self.db, &self.tokens)
        }

        fn user(&self, username: &str) -> i64 {
            self.db
                .create_user(&NewUser {
                    name: "Test User",
                    email: &format!("{username}@gmail.com"),
                    username,
                    password_hash: "$argon2id$fake",
                    birthdate: None,
                })
                .unwrap()
        }

        /// (user token, group token) as handed out by login.
        fn login(&self, user_id: i64, group_id: &str) -> (String, String) {
            let login = self.tokens.issue_login_token(Some(user_id), Some(group_id)).unwrap();
            (
                self.tokens.derive_user_token(&login).unwrap(),
                self.tokens.derive_group_token(&login).unwrap(),
            )
        }
    }

    #[test]
    fn send_requires_both_tokens() {
        let fx = Fixture::new();
        let ada = fx.user("ada");
        let (user, group) = fx.login(ada, "general");

        let sent = fx.gateway().send(Some(&user), Some(&group), "hello").unwrap();
        assert_eq!(sent.user_id, ada);
        assert_eq!(sent.group_id, "general");

        assert!(matches!(fx.gateway().send(Some("junk"), Some(&group), "x"), Err(ApiError::Unauthorized)));
        assert!(matches!(fx.gateway().send(Some(&user), Some("junk"), "x"), Err(ApiError::Unauthorized)));
        // Swapped tokens never resolve under the other key.
        assert!(matches!(fx.gateway().send(Some(&group), Some(&user), "x"), Err(ApiError::Unauthorized)));
        assert!(matches!(fx.gateway().send(Some(&user), None, "x"), Err(ApiError::Unauthorized)));
        assert!(matches!(fx.gateway().send(None, Some(&group), "x"), Err(ApiError::Unauthorized)));

        assert_eq!(fx.db.list_messages().unwrap().len(), 1);
    }

    #[test]
    fn expired_group_token_blocks_send() {
        let fx = Fixture::new();
        let ada = fx.user("ada");
        let (user, _) = fx.login(ada, "general");
        let expired = fx
            .tokens
            .mint_group_token("general", Utc::now() - Duration::days(8))
            .unwrap();

        let result = fx.gateway().send(Some(&user), Some(&expired), "too late");
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(fx.db.list_messages().unwrap().is_empty());
    }

    #[test]
    fn latest_is_scoped_to_user_and_group() {
        let fx = Fixture::new();
        let ada = fx.user("ada");
        let grace = fx.user("grace");
        let (ada_user, ada_group) = fx.login(ada, "general");
        let (grace_user, grace_group) = fx.login(grace, "general");

        fx.gateway().send(Some(&ada_user), Some(&ada_group), "first").unwrap();
        fx.gateway().send(Some(&ada_user), Some(&ada_group), "second").unwrap();
        fx.gateway().send(Some(&grace_user), Some(&grace_group), "grace").unwrap();

        let latest = fx
            .gateway()
            .latest_for_user_in_group(Some(&ada_user), Some("general"))
            .unwrap()
            .unwrap();
        assert_eq!(latest.text, "second");

        let none = fx
            .gateway()
            .latest_for_user_in_group(Some(&ada_user), Some("random"))
            .unwrap();
        assert!(none.is_none());

        let no_group = fx.gateway().latest_for_user_in_group(Some(&ada_user), None).unwrap();
        assert!(no_group.is_none());

        assert!(matches!(
            fx.gateway().latest_for_user_in_group(None, Some("general")),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn list_all_annotates_without_filtering() {
        let fx = Fixture::new();
        let ada = fx.user("ada");
        let grace = fx.user("grace");
        let (ada_user, ada_group) = fx.login(ada, "general");
        let (grace_user, grace_group) = fx.login(grace, "random");

        for text in ["one", "two", "three"] {
            fx.gateway().send(Some(&ada_user), Some(&ada_group), text).unwrap();
        }
        fx.gateway().send(Some(&grace_user), Some(&grace_group), "elsewhere").unwrap();

        let all = fx.gateway().list_all(Some(&ada_user), Some(&ada_group)).unwrap();
        assert_eq!(all.len(), 4);

        let mine: Vec<&AnnotatedMessage> = all.iter().filter(|m| m.is_current_user).collect();
        assert_eq!(mine.len(), 3);
        assert_eq!(
            mine.iter().map(|m| m.message.text.as_str()).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        assert!(mine.windows(2).all(|w| w[0].message.created_at < w[1].message.created_at));
        assert!(mine.iter().all(|m| m.is_current_group));

        let theirs = &all[3];
        assert!(!theirs.is_current_user);
        assert!(!theirs.is_current_group);
    }

    #[test]
    fn list_all_degrades_without_group() {
        let fx = Fixture::new();
        let ada = fx.user("ada");
        let (user, group) = fx.login(ada, "general");
        fx.gateway().send(Some(&user), Some(&group), "hello").unwrap();

        let all = fx.gateway().list_all(Some(&user), Some("expired-or-junk")).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_current_user);
        assert!(!all[0].is_current_group);

        assert!(matches!(fx.gateway().list_all(None, Some(&group)), Err(ApiError::Unauthorized)));
    }
}
