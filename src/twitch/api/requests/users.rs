use crate::twitch::api::{LookupError, TwitchAPIClient, TwitchUser};

pub async fn get_user_info(
    api_client: &TwitchAPIClient,
    login: &str,
) -> Result<Option<TwitchUser>, LookupError> {
    let users: Vec<TwitchUser> = api_client
        .helix_get("users", &[("login", login)])
        .await?;
    Ok(users.into_iter().next())
}
